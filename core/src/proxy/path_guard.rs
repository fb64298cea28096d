//! Download path validation

/// Route prefix the raw suffix is cut from
pub const DOWNLOAD_PREFIX: &str = "/api/download/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathRejection {
    #[error("path traversal in segment '{0}'")]
    Traversal(String),

    #[error("dot segment '{0}' would be collapsed before reaching the backend")]
    DotSegment(String),

    #[error("segment '{0}' is not valid percent-encoded UTF-8")]
    Undecodable(String),
}

/// Check the still-encoded suffix after `/api/download/`.
///
/// Each `/`-separated segment is decoded on its own. A segment that decodes to `..`, or
/// that smuggles a `..` component behind an encoded separator (`..%2f`), is rejected.
/// So is a segment that decodes to `.`: URL normalization would drop it and the
/// backend would see a different path than the caller asked for.
pub fn validate_download_path(raw_suffix: &str) -> Result<(), PathRejection> {
    for segment in raw_suffix.split('/') {
        let decoded = urlencoding::decode(segment)
            .map_err(|_| PathRejection::Undecodable(segment.to_string()))?;

        if decoded == ".." || decoded.split(['/', '\\']).any(|part| part == "..") {
            return Err(PathRejection::Traversal(segment.to_string()));
        }
        if decoded == "." {
            return Err(PathRejection::DotSegment(segment.to_string()));
        }
    }
    Ok(())
}
