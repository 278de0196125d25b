use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Separator between bucket and key in the persisted form.
pub const REFERENCE_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("expected \"<bucket>,<key>\", got {0:?}")]
    Malformed(String),

    #[error("{component} must be non-empty and must not contain ','")]
    InvalidComponent { component: &'static str },
}

/// A `(bucket, key)` pair identifying a stored object.
///
/// This is the only representation written to video records. It is stored as
/// `"<bucket>,<key>"` and is expanded into a presigned URL on read, never
/// persisted as a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectReference {
    bucket: String,
    key: String,
}

impl ObjectReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, ReferenceError> {
        let bucket = bucket.into();
        let key = key.into();

        check_component("bucket", &bucket)?;
        check_component("key", &key)?;

        Ok(Self { bucket, key })
    }

    pub fn parse(value: &str) -> Result<Self, ReferenceError> {
        let parts: Vec<&str> = value.split(REFERENCE_DELIMITER).collect();
        match parts.as_slice() {
            [bucket, key] if !bucket.is_empty() && !key.is_empty() => Ok(Self {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(ReferenceError::Malformed(value.to_string())),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

fn check_component(component: &'static str, value: &str) -> Result<(), ReferenceError> {
    if value.is_empty() || value.contains(REFERENCE_DELIMITER) {
        return Err(ReferenceError::InvalidComponent { component });
    }
    Ok(())
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.bucket, REFERENCE_DELIMITER, self.key)
    }
}

impl FromStr for ObjectReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
