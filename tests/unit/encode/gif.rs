use super::*;
use crate::foundation::core::{Fps, OutputDimensions};

fn cfg(w: u32, h: u32) -> EncoderConfig {
    EncoderConfig {
        dimensions: OutputDimensions::new(w, h),
        fps: Fps::whole(10).unwrap(),
        expected_frames: 3,
    }
}

fn frame(w: u32, h: u32, rgba: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: rgba.repeat((w * h) as usize),
        premultiplied: true,
    }
}

fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}

fn netscape_loop_count(gif: &[u8]) -> Option<u16> {
    let p = find(gif, b"NETSCAPE2.0")? + 11;
    assert_eq!(&gif[p..p + 2], &[0x03, 0x01]);
    Some(u16::from_le_bytes([gif[p + 2], gif[p + 3]]))
}

async fn encode(mut enc: GifFrameEncoder, frames: usize) -> ExportArtifact {
    enc.begin(cfg(4, 4)).await.unwrap();
    let colors = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];
    for i in 0..frames {
        enc.push_frame(i as u64, &frame(4, 4, colors[i % 3])).await.unwrap();
    }
    enc.finish().await.unwrap()
}

#[tokio::test]
async fn looping_gif_is_well_formed() {
    let art = encode(GifFrameEncoder::new(100, 0), 3).await;
    assert_eq!(art.format, ExportFormat::Gif);
    assert_eq!(art.mime_type(), "image/gif");
    assert!(art.data.starts_with(b"GIF89a"));
    assert_eq!(art.data.last(), Some(&0x3B));
    assert_eq!(netscape_loop_count(&art.data), Some(0));
}

#[tokio::test]
async fn non_looping_gif_plays_once() {
    let art = encode(GifFrameEncoder::new(100, 1), 2).await;
    assert_eq!(netscape_loop_count(&art.data), Some(1));
}

fn written_delay_centis(gif: &[u8]) -> u16 {
    let p = find(gif, &[0x21, 0xF9, 0x04]).expect("graphic control extension");
    u16::from_le_bytes([gif[p + 4], gif[p + 5]])
}

#[tokio::test]
async fn frame_delay_is_rounded_to_centiseconds_for_every_rate() {
    use crate::export::config::GifFrameRate;
    let expected = [
        (GifFrameRate::Fps10, 10),
        (GifFrameRate::Fps15, 7),
        (GifFrameRate::Fps20, 5),
        (GifFrameRate::Fps25, 4),
        (GifFrameRate::Fps30, 3),
    ];
    for (rate, centis) in expected {
        let art = encode(GifFrameEncoder::new(rate.frame_delay_ms(), 0), 1).await;
        assert_eq!(written_delay_centis(&art.data), centis, "{rate:?}");
    }
}

#[test]
fn delay_centis_rounds_half_up() {
    assert_eq!(delay_centis(67), 7);
    assert_eq!(delay_centis(33), 3);
    assert_eq!(delay_centis(45), 5);
    assert_eq!(delay_centis(44), 4);
}

#[tokio::test]
async fn options_drive_delay_and_repeat() {
    let enc = GifFrameEncoder::from_options(&GifOptions {
        frame_rate: crate::export::config::GifFrameRate::Fps15,
        loop_playback: false,
        ..Default::default()
    });
    assert_eq!(enc.delay_ms(), 67);
    assert_eq!(enc.repeat(), 1);
}

#[tokio::test]
async fn invalid_dimensions_fail_init() {
    let mut enc = GifFrameEncoder::new(100, 0);
    assert!(matches!(
        enc.begin(cfg(0, 4)).await,
        Err(ExportError::EncoderInitFailure(_))
    ));
    assert!(matches!(
        enc.begin(cfg(70_000, 4)).await,
        Err(ExportError::EncoderInitFailure(_))
    ));
}

#[tokio::test]
async fn finishing_without_frames_fails() {
    let mut enc = GifFrameEncoder::new(100, 0);
    enc.begin(cfg(4, 4)).await.unwrap();
    assert!(matches!(
        enc.finish().await,
        Err(ExportError::EncoderWriteFailure(_))
    ));
}

#[tokio::test]
async fn frames_must_match_and_advance() {
    let mut enc = GifFrameEncoder::new(100, 0);
    enc.begin(cfg(4, 4)).await.unwrap();
    assert!(matches!(
        enc.push_frame(0, &frame(2, 2, [0, 0, 0, 255])).await,
        Err(ExportError::EncoderWriteFailure(_))
    ));
    enc.push_frame(3, &frame(4, 4, [0, 0, 0, 255])).await.unwrap();
    assert!(matches!(
        enc.push_frame(3, &frame(4, 4, [0, 0, 0, 255])).await,
        Err(ExportError::EncoderWriteFailure(_))
    ));
    assert_eq!(enc.frames_written(), 1);
}

#[tokio::test]
async fn abort_discards_partial_output() {
    let mut enc = GifFrameEncoder::new(100, 0);
    enc.begin(cfg(4, 4)).await.unwrap();
    enc.push_frame(0, &frame(4, 4, [9, 9, 9, 255])).await.unwrap();
    enc.abort().await;
    assert!(enc.push_frame(1, &frame(4, 4, [9, 9, 9, 255])).await.is_err());
    assert!(enc.finish().await.is_err());
}
