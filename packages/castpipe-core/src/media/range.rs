//! `Range` request header parsing.
//!
//! Parsing is deliberately lenient: cast receivers probe with absent or
//! odd headers and expect playback to start anyway, so anything that does
//! not parse degrades to the whole file instead of an error status.

use std::fmt;

use crate::protocol_constants::RANGE_UNIT;

/// A half-open byte interval `[start, end)` within a served file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Creates a range, repairing `end < start` to an empty range at `start`.
    #[must_use]
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// The range covering an entire file of `size` bytes.
    #[must_use]
    pub fn full(size: u64) -> Self {
        Self::new(0, size)
    }

    /// Parses a raw `Range` header value against a nominal file size.
    ///
    /// Accepts `bytes=<start>-<end>` (unit matched case-insensitively) and
    /// treats `<end>` as exclusive. An empty or zero end means "no explicit
    /// end" and extends the range by a full `file_size` span from `start`.
    /// Anything else falls back to [`ByteRange::full`].
    ///
    /// The returned `end` may exceed `file_size`; clamping to the real end
    /// of the file is the reader's job.
    #[must_use]
    pub fn parse(header: Option<&str>, file_size: u64) -> Self {
        let Some(value) = header else {
            return Self::full(file_size);
        };

        match parse_bounds(value) {
            Some((start, None)) => Self::new(start, start.saturating_add(file_size)),
            Some((start, Some(end))) => Self::new(start, end),
            None => {
                log::debug!(
                    "[Range] Unparseable Range header '{}', serving full file",
                    value
                );
                Self::full(file_size)
            }
        }
    }

    /// Number of bytes covered by the range.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Clamps both bounds to `limit` (typically the true end of file).
    #[must_use]
    pub fn clamp_to(self, limit: u64) -> Self {
        Self::new(self.start.min(limit), self.end.min(limit))
    }

    /// Inclusive offset of the last byte, or `None` for an empty range.
    #[must_use]
    pub fn last_byte(&self) -> Option<u64> {
        (!self.is_empty()).then(|| self.end - 1)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Splits `bytes=<start>-<end>` into its integer bounds.
///
/// Returns `Some((start, None))` when the end is empty or the literal `0`.
fn parse_bounds(value: &str) -> Option<(u64, Option<u64>)> {
    let (unit, bounds) = value.trim().split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case(RANGE_UNIT) {
        return None;
    }

    let (start, end) = bounds.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;

    let end = end.trim();
    if end.is_empty() {
        return Some((start, None));
    }

    match end.parse::<u64>().ok()? {
        0 => Some((start, None)),
        end => Some((start, Some(end))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_header_serves_full_file() {
        assert_eq!(ByteRange::parse(None, 1000), ByteRange::new(0, 1000));
    }

    #[test]
    fn explicit_bounds_are_half_open() {
        let range = ByteRange::parse(Some("bytes=100-200"), 1000);
        assert_eq!(range, ByteRange::new(100, 200));
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn zero_end_extends_by_file_size() {
        let range = ByteRange::parse(Some("bytes=500-0"), 1000);
        assert_eq!(range, ByteRange::new(500, 1500));
    }

    #[test]
    fn open_end_extends_by_file_size() {
        let range = ByteRange::parse(Some("bytes=250-"), 1000);
        assert_eq!(range, ByteRange::new(250, 1250));
    }

    #[test]
    fn unit_is_case_insensitive() {
        let range = ByteRange::parse(Some("Bytes=10-20"), 1000);
        assert_eq!(range, ByteRange::new(10, 20));
    }

    #[test]
    fn malformed_headers_fall_back_to_full_file() {
        for header in [
            "",
            "bytes",
            "bytes=",
            "bytes=abc-def",
            "bytes=-500",
            "items=0-10",
            "bytes=1-2-3",
        ] {
            assert_eq!(
                ByteRange::parse(Some(header), 1000),
                ByteRange::full(1000),
                "header {:?}",
                header
            );
        }
    }

    #[test]
    fn inverted_bounds_repair_to_empty_range() {
        let range = ByteRange::parse(Some("bytes=600-100"), 1000);
        assert_eq!(range, ByteRange::new(600, 600));
        assert!(range.is_empty());
    }

    #[test]
    fn huge_start_does_not_overflow() {
        let range = ByteRange::parse(Some(&format!("bytes={}-", u64::MAX)), 1000);
        assert_eq!(range.start, u64::MAX);
        assert_eq!(range.end, u64::MAX);
    }

    #[test]
    fn clamp_limits_both_bounds() {
        assert_eq!(ByteRange::new(500, 1500).clamp_to(1000), ByteRange::new(500, 1000));
        assert_eq!(ByteRange::new(2000, 3000).clamp_to(1000), ByteRange::new(1000, 1000));
    }

    #[test]
    fn last_byte_is_inclusive() {
        assert_eq!(ByteRange::new(500, 1000).last_byte(), Some(999));
        assert_eq!(ByteRange::new(7, 7).last_byte(), None);
    }
}
