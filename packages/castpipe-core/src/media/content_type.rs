//! Content type derivation from the served file's name.

/// Containers whose file extension differs from their registered subtype.
const SUBTYPE_OVERRIDES: &[(&str, &str)] = &[("mkv", "x-matroska")];

/// Resolves a `video/*` content type from a file name.
///
/// The extension is whatever follows the last `.`; a name without a dot is
/// used whole, so `"noext"` resolves to `video/noext`. The served file is
/// always assumed to be video and its bytes are never inspected.
#[must_use]
pub fn resolve_content_type(file_name: &str) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map_or(file_name, |(_, ext)| ext);

    let subtype = SUBTYPE_OVERRIDES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or(extension, |(_, subtype)| subtype);

    format!("video/{subtype}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matroska_is_remapped() {
        assert_eq!(resolve_content_type("movie.mkv"), "video/x-matroska");
    }

    #[test]
    fn known_extensions_pass_through() {
        assert_eq!(resolve_content_type("clip.mp4"), "video/mp4");
        assert_eq!(resolve_content_type("clip.webm"), "video/webm");
    }

    #[test]
    fn last_dot_wins() {
        assert_eq!(resolve_content_type("show.s01e01.mkv"), "video/x-matroska");
    }

    #[test]
    fn missing_extension_uses_whole_name() {
        assert_eq!(resolve_content_type("noext"), "video/noext");
    }
}
