//! Runs the real ffmpeg/ffprobe tools. `cargo test -- --ignored` with both on PATH.

use std::path::Path;

use tokio::process::Command;

use video_blob_kit::media::aspect::{classify, AspectRatio};
use video_blob_kit::media::faststart::is_fast_start;
use video_blob_kit::media::tools::{Dimensions, FfmpegRemuxer, FfprobeProber, Prober, Remuxer};

async fn synthesize(path: &Path, size: &str) {
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=size={}:rate=25:duration=1", size))
        .args(["-c:v", "mpeg4", "-f", "mp4"])
        .arg(path)
        .status()
        .await
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe"]
async fn remux_moves_index_to_front() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    let output = dir.path().join("output.mp4");
    synthesize(&input, "320x240").await;

    // ffmpeg writes moov after mdat unless asked otherwise.
    assert!(!is_fast_start(&input).await.unwrap());

    FfmpegRemuxer::new("ffmpeg")
        .remux_fast_start(&input, &output)
        .await
        .unwrap();
    assert!(is_fast_start(&output).await.unwrap());

    let dims = FfprobeProber::new("ffprobe")
        .probe_dimensions(&output)
        .await
        .unwrap();
    assert_eq!(dims, Dimensions { width: 320, height: 240 });
    assert_eq!(classify(dims).unwrap(), AspectRatio::Other);
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe"]
async fn portrait_clip_is_classified() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    synthesize(&input, "360x640").await;

    let dims = FfprobeProber::new("ffprobe")
        .probe_dimensions(&input)
        .await
        .unwrap();
    assert_eq!(classify(dims).unwrap(), AspectRatio::Portrait);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn non_video_input_fails_remux() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"definitely not a movie").unwrap();

    let result = FfmpegRemuxer::new("ffmpeg")
        .remux_fast_start(&input, &dir.path().join("out.mp4"))
        .await;
    assert!(result.is_err());
}
