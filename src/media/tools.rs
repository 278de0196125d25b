//! Remux and probe capabilities.
//!
//! The pipeline only sees the [`Remuxer`] and [`Prober`] traits. The ffmpeg
//! implementations shell out to `ffmpeg`/`ffprobe`; an embedded media library
//! can replace them without touching pipeline sequencing.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

use crate::media::faststart;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("unreadable tool output: {0}")]
    InvalidOutput(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("invalid stream dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("remuxed output does not place moov before mdat")]
    NotFastStart,
}

/// Pixel size of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Copy the streams of `input` into `output` with the index moved to the front.
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

#[async_trait]
pub trait Prober: Send + Sync {
    /// Width and height of the first video stream in `path`.
    async fn probe_dimensions(&self, path: &Path) -> Result<Dimensions, ToolError>;
}

pub struct FfmpegRemuxer {
    ffmpeg_path: PathBuf,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(tool = %self.ffmpeg_path.display()))]
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let start = Instant::now();

        let result = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-y", "-i"])
            .arg(input)
            .args(["-map", "0", "-c", "copy", "-movflags", "+faststart", "-f", "mp4"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ToolError::Launch {
                tool: self.ffmpeg_path.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::error!(status = %result.status, stderr = %stderr, "ffmpeg remux failed");
            return Err(ToolError::Exit {
                tool: self.ffmpeg_path.display().to_string(),
                status: result.status.to_string(),
                stderr,
            });
        }

        let fast_start = faststart::is_fast_start(output)
            .await
            .map_err(|e| ToolError::InvalidOutput(e.to_string()))?;
        if !fast_start {
            return Err(ToolError::NotFastStart);
        }

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fast-start remux complete"
        );
        Ok(())
    }
}

pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    #[tracing::instrument(skip(self), fields(tool = %self.ffprobe_path.display()))]
    async fn probe_dimensions(&self, path: &Path) -> Result<Dimensions, ToolError> {
        let result = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ToolError::Launch {
                tool: self.ffprobe_path.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::error!(status = %result.status, stderr = %stderr, "ffprobe failed");
            return Err(ToolError::Exit {
                tool: self.ffprobe_path.display().to_string(),
                status: result.status.to_string(),
                stderr,
            });
        }

        parse_probe_output(&result.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Decode `ffprobe -print_format json -show_streams` output.
pub fn parse_probe_output(stdout: &[u8]) -> Result<Dimensions, ToolError> {
    let probe: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| ToolError::InvalidOutput(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .ok_or(ToolError::NoVideoStream)?;

    if stream.width == 0 || stream.height == 0 {
        return Err(ToolError::InvalidDimensions {
            width: stream.width,
            height: stream.height,
        });
    }

    Ok(Dimensions {
        width: stream.width,
        height: stream.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_video_stream() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "sample_rate": "48000"},
                {"index": 1, "codec_type": "video", "width": 1920, "height": 1080},
                {"index": 2, "codec_type": "video", "width": 640, "height": 360}
            ]
        }"#;

        let dims = parse_probe_output(json).unwrap();
        assert_eq!(dims, Dimensions { width: 1920, height: 1080 });
    }

    #[test]
    fn no_streams() {
        assert!(matches!(
            parse_probe_output(br#"{"streams": []}"#),
            Err(ToolError::NoVideoStream)
        ));
        assert!(matches!(
            parse_probe_output(b"{}"),
            Err(ToolError::NoVideoStream)
        ));
    }

    #[test]
    fn zero_dimension() {
        let json = br#"{"streams": [{"codec_type": "video", "width": 0, "height": 720}]}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(ToolError::InvalidDimensions { width: 0, height: 720 })
        ));
    }

    #[test]
    fn garbage_output() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ToolError::InvalidOutput(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let remuxer = FfmpegRemuxer::new("/nonexistent/ffmpeg-for-tests");
        let dir = tempfile::tempdir().unwrap();
        let err = remuxer
            .remux_fast_start(&dir.path().join("in.mp4"), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
    }
}
