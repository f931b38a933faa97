//! Seek-and-read access to a byte range of the served file.
//!
//! A [`RangeReader`] owns the only file handle used by one request. The
//! handle is closed when the reader (or the chunk stream built from it) is
//! dropped, which covers normal completion as well as a client hanging up
//! mid-transfer.

use std::io::{self, SeekFrom};
use std::path::Path;

use async_stream::try_stream;
use bytes::Bytes;
use futures::Stream;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::range::ByteRange;

/// Reader positioned at the start of a clamped byte range.
#[derive(Debug)]
pub struct RangeReader {
    file: File,
    range: ByteRange,
    true_end: u64,
}

impl RangeReader {
    /// Opens `path` and positions the cursor at `requested.start`.
    ///
    /// The true end of file is discovered by seeking to the end, and the
    /// requested range is clamped to it. The parser's range is nominal and
    /// may reach past the real file.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened or
    /// seeked.
    pub async fn open(path: &Path, requested: ByteRange) -> io::Result<Self> {
        let mut file = File::open(path).await?;
        let true_end = file.seek(SeekFrom::End(0)).await?;
        let range = requested.clamp_to(true_end);
        file.seek(SeekFrom::Start(range.start)).await?;

        if range != requested {
            log::debug!(
                "[Media] Clamped range {} to {} (file end {})",
                requested,
                range,
                true_end
            );
        }

        Ok(Self {
            file,
            range,
            true_end,
        })
    }

    /// The range that will actually be read, after clamping.
    #[must_use]
    pub fn range(&self) -> ByteRange {
        self.range
    }

    /// Size of the file as observed when it was opened.
    #[must_use]
    pub fn true_end(&self) -> u64 {
        self.true_end
    }

    /// Reads the whole range into one buffer.
    ///
    /// Returns fewer bytes than [`ByteRange::len`] if end of file arrives
    /// first.
    pub async fn read_bounded(mut self) -> io::Result<Bytes> {
        let len = self.range.len();
        read_exact_or_eof(&mut self.file, len).await
    }

    /// Streams the range in chunks of at most `chunk_size` bytes.
    ///
    /// Each chunk is yielded as soon as it is read, so memory use is bounded
    /// by `chunk_size` regardless of the range length. The stream ends once
    /// the cursor reaches the clamped end or the file runs out early.
    pub fn into_chunks(
        self,
        chunk_size: usize,
    ) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let Self {
            mut file, range, ..
        } = self;
        let chunk_size = chunk_size.max(1) as u64;

        try_stream! {
            let mut cursor = range.start;
            while cursor < range.end {
                let want = (range.end - cursor).min(chunk_size);
                let chunk = read_exact_or_eof(&mut file, want).await?;
                if chunk.is_empty() {
                    log::warn!(
                        "[Media] File ended at {} before expected end {}",
                        cursor,
                        range.end
                    );
                    break;
                }
                cursor += chunk.len() as u64;
                yield chunk;
            }
        }
    }
}

async fn read_exact_or_eof(file: &mut File, len: u64) -> io::Result<Bytes> {
    let capacity = usize::try_from(len).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "range too large for memory")
    })?;
    let mut buf = Vec::with_capacity(capacity);
    file.take(len).read_to_end(&mut buf).await?;
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;

    fn sample_file(len: usize) -> (tempfile::NamedTempFile, Vec<u8>) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        file.flush().unwrap();
        (file, data)
    }

    #[tokio::test]
    async fn bounded_read_returns_requested_bytes() {
        let (file, data) = sample_file(1000);
        let reader = RangeReader::open(file.path(), ByteRange::new(100, 300))
            .await
            .unwrap();

        assert_eq!(reader.true_end(), 1000);
        let body = reader.read_bounded().await.unwrap();
        assert_eq!(&body[..], &data[100..300]);
    }

    #[tokio::test]
    async fn range_past_eof_is_clamped() {
        let (file, data) = sample_file(1000);
        let reader = RangeReader::open(file.path(), ByteRange::new(500, 1500))
            .await
            .unwrap();

        assert_eq!(reader.range(), ByteRange::new(500, 1000));
        let body = reader.read_bounded().await.unwrap();
        assert_eq!(body.len(), 500);
        assert_eq!(&body[..], &data[500..]);
    }

    #[tokio::test]
    async fn start_past_eof_yields_empty_body() {
        let (file, _) = sample_file(100);
        let reader = RangeReader::open(file.path(), ByteRange::new(400, 500))
            .await
            .unwrap();

        assert!(reader.range().is_empty());
        assert!(reader.read_bounded().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chunks_concatenate_to_range() {
        let (file, data) = sample_file(10_000);
        let reader = RangeReader::open(file.path(), ByteRange::new(123, 9_000))
            .await
            .unwrap();

        let chunks: Vec<Bytes> = reader
            .into_chunks(1024)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 1024));
        let joined: Vec<u8> = chunks.concat();
        assert_eq!(joined, &data[123..9_000]);
    }

    #[tokio::test]
    async fn chunks_stop_at_true_end() {
        let (file, data) = sample_file(3_000);
        let reader = RangeReader::open(file.path(), ByteRange::new(0, 6_000))
            .await
            .unwrap();

        let chunks: Vec<Bytes> = reader
            .into_chunks(1_000)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RangeReader::open(&dir.path().join("gone.mp4"), ByteRange::full(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
