//! Leaf components of the video ingestion pipeline.
//!
//! Nothing in here knows about HTTP, users, or the metadata store. Each piece
//! is small enough to be tested on its own:
//!
//! - [`aspect`]: buckets stream geometry into a label
//! - [`keys`]: builds collision-resistant storage keys
//! - [`reference`]: the canonical `(bucket, key)` object reference
//! - [`faststart`]: MP4 top-level box inspection
//! - [`tools`]: remux/probe capabilities and their ffmpeg implementations

pub mod aspect;
pub mod faststart;
pub mod keys;
pub mod reference;
pub mod tools;

/// Only container accepted by the video upload path.
pub const VIDEO_MEDIA_TYPE: &str = "video/mp4";

/// Thumbnail formats accepted by the thumbnail upload path.
pub const THUMBNAIL_MEDIA_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Parse a `Content-Type` value down to its lowercase `type/subtype` essence.
///
/// Parameters (`; codecs=...`) are dropped. Returns `None` when the value is
/// not of the form `type/subtype`.
pub fn parse_media_type(value: &str) -> Option<String> {
    let parsed: mime::Mime = value.trim().parse().ok()?;
    Some(parsed.essence_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_parameterised_types() {
        assert_eq!(parse_media_type("video/mp4").as_deref(), Some("video/mp4"));
        assert_eq!(
            parse_media_type("Video/MP4; codecs=\"avc1.42E01E\"").as_deref(),
            Some("video/mp4")
        );
    }

    #[test]
    fn rejects_malformed_types() {
        assert_eq!(parse_media_type(""), None);
        assert_eq!(parse_media_type("video"), None);
        assert_eq!(parse_media_type("video/"), None);
        assert_eq!(parse_media_type("video/mp4/extra"), None);
        assert_eq!(parse_media_type("/mp4"), None);
    }
}
