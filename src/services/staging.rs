//! Scoped local scratch files for a single pipeline run.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::IngestError;

const COPY_BUFFER_BYTES: usize = 64 * 1024;

/// Marker carried inside an `io::Error` by body readers when the transport
/// layer's size limit is hit, so staging can report it as `PayloadTooLarge`.
#[derive(Debug)]
pub struct BodyLimitExceeded;

impl fmt::Display for BodyLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request body limit exceeded")
    }
}

impl Error for BodyLimitExceeded {}

fn is_body_limit(err: &io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.is::<BodyLimitExceeded>())
}

/// Owns every temporary file a pipeline run creates.
///
/// Files are registered before anything is written to them, so partially
/// written artifacts are covered too. [`StagingArea::release`] removes them
/// and is called on every exit path; dropping the area removes anything left.
pub struct StagingArea {
    dir: PathBuf,
    files: Vec<TempPath>,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
        }
    }

    /// Copy `body` into a uniquely named file, failing once more than `limit`
    /// bytes arrive.
    pub async fn stage<R>(&mut self, body: &mut R, limit: u64) -> Result<PathBuf, IngestError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let named = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".mp4")
            .tempfile_in(&self.dir)
            .map_err(IngestError::Staging)?;
        let (file, temp_path) = named.into_parts();
        let path = temp_path.to_path_buf();
        self.files.push(temp_path);

        let mut file = tokio::fs::File::from_std(file);
        let mut buf = vec![0u8; COPY_BUFFER_BYTES];
        let mut written: u64 = 0;

        loop {
            let n = match body.read(&mut buf).await {
                Ok(n) => n,
                Err(e) if is_body_limit(&e) => {
                    return Err(IngestError::PayloadTooLarge { limit });
                }
                Err(e) => return Err(IngestError::Staging(e)),
            };
            if n == 0 {
                break;
            }

            written += n as u64;
            if written > limit {
                return Err(IngestError::PayloadTooLarge { limit });
            }
            file.write_all(&buf[..n])
                .await
                .map_err(IngestError::Staging)?;
        }

        file.flush().await.map_err(IngestError::Staging)?;
        tracing::debug!(path = %path.display(), bytes = written, "upload staged");
        Ok(path)
    }

    /// Reserve a sibling of `source` (`upload-x.mp4` -> `upload-x.<tag>.mp4`)
    /// for a tool to write into. The file is owned by this area even if the
    /// tool never creates it.
    pub fn sibling(&mut self, source: &Path, tag: &str) -> PathBuf {
        let path = source.with_extension(format!("{}.mp4", tag));
        self.files.push(TempPath::from_path(&path));
        path
    }

    pub fn release(self) {
        for temp_path in self.files {
            let path = temp_path.to_path_buf();
            match temp_path.close() {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove staged file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn stages_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());

        let mut body: &[u8] = b"ftyp....moov....mdat....";
        let staged = area.stage(&mut body, 1024).await.unwrap();
        assert_eq!(std::fs::read(&staged).unwrap(), b"ftyp....moov....mdat....");

        let sibling = area.sibling(&staged, "faststart");
        std::fs::write(&sibling, b"x").unwrap();
        assert!(sibling.to_string_lossy().ends_with(".faststart.mp4"));
        assert_eq!(entries(dir.path()), 2);

        area.release();
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());

        let data = vec![7u8; 2048];
        let mut body: &[u8] = &data;
        let err = area.stage(&mut body, 1000).await.unwrap_err();
        assert!(matches!(err, IngestError::PayloadTooLarge { limit: 1000 }));

        area.release();
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn transport_limit_marker_is_recognised() {
        let dir = tempfile::tempdir().unwrap();
        let mut area = StagingArea::new(dir.path());

        let mut body = tokio_util::io::StreamReader::new(futures::stream::iter(vec![
            Ok(bytes::Bytes::from_static(b"partial")),
            Err(io::Error::other(BodyLimitExceeded)),
        ]));
        let err = area.stage(&mut body, 1 << 20).await.unwrap_err();
        assert!(matches!(err, IngestError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn dropped_area_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut area = StagingArea::new(dir.path());
            let mut body: &[u8] = b"data";
            area.stage(&mut body, 1024).await.unwrap();
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_a_staging_error() {
        let mut area = StagingArea::new("/nonexistent/staging-dir-for-tests");
        let mut body: &[u8] = b"data";
        let err = area.stage(&mut body, 1024).await.unwrap_err();
        assert!(matches!(err, IngestError::Staging(_)));
    }
}
