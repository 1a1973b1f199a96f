use super::*;
use crate::foundation::core::{Fps, OutputDimensions};

fn cfg(w: u32, h: u32) -> EncoderConfig {
    EncoderConfig {
        dimensions: OutputDimensions::new(w, h),
        fps: Fps::new(30000, 1001).unwrap(),
        expected_frames: 1,
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).map(String::as_str)
}

#[test]
fn bitrates_follow_quality_tier() {
    assert_eq!(
        bitrate_args(Mp4Quality::Medium),
        vec!["-b:v", "5000k", "-maxrate", "7500k", "-bufsize", "10000k"]
    );
    assert_eq!(value_after(&bitrate_args(Mp4Quality::Good), "-b:v"), Some("8000k"));
    assert_eq!(
        value_after(&bitrate_args(Mp4Quality::Source), "-b:v"),
        Some("12000k")
    );
}

#[test]
fn args_describe_raw_input_and_h264_output() {
    let args = ffmpeg_args(&cfg(1280, 720), Mp4Quality::Medium, "/tmp/out.mp4");
    assert_eq!(value_after(&args, "-s"), Some("1280x720"));
    assert_eq!(value_after(&args, "-r"), Some("30000/1001"));
    assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
    assert_eq!(value_after(&args, "-profile:v"), Some("high"));
    assert_eq!(value_after(&args, "-movflags"), Some("+faststart"));
    assert!(args.iter().any(|a| a == "-an"));
    assert!(!args.iter().any(|a| a == "-vf"));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
}

#[test]
fn odd_sizes_are_padded_inside_ffmpeg() {
    let args = ffmpeg_args(&cfg(1917, 1081), Mp4Quality::Source, "out.mp4");
    assert_eq!(value_after(&args, "-vf"), Some("pad=ceil(iw/2)*2:ceil(ih/2)*2"));
    assert_eq!(value_after(&args, "-s"), Some("1917x1081"));
}

#[tokio::test]
async fn zero_dimensions_fail_init() {
    let mut enc = Mp4FrameEncoder::new(Mp4Quality::Good);
    assert!(matches!(
        enc.begin(cfg(0, 720)).await,
        Err(ExportError::EncoderInitFailure(_))
    ));
}

#[tokio::test]
async fn push_before_begin_fails() {
    let mut enc = Mp4FrameEncoder::new(Mp4Quality::Good);
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(matches!(
        enc.push_frame(0, &frame).await,
        Err(ExportError::EncoderWriteFailure(_))
    ));
    assert!(enc.finish().await.is_err());
    enc.abort().await;
}
