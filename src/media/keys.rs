//! Storage key construction.
//!
//! Keys look like `<prefix>/<random-id><extension>`. The random id is 32 bytes
//! from the OS CSPRNG encoded as unpadded URL-safe base64, so keys are never
//! derived from user-supplied filenames and never collide in practice.

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Number of random bytes behind every storage key.
pub const RANDOM_ID_BYTES: usize = 32;

/// Extension used when a media type does not split into `type/subtype`.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Key prefix for thumbnails, alongside the aspect labels used for videos.
pub const THUMBNAIL_PREFIX: &str = "thumbnails";

pub fn random_id() -> String {
    let mut bytes = [0u8; RANDOM_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Filename extension for a media type: `video/mp4` becomes `.mp4`.
pub fn extension_for(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    match parts.as_slice() {
        [_, subtype] if !subtype.is_empty() => format!(".{}", subtype),
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

pub fn storage_key(prefix: &str, media_type: &str) -> String {
    format!("{}/{}{}", prefix, random_id(), extension_for(media_type))
}
