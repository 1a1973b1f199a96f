use proptest::prelude::*;

use super::*;

fn hd_source() -> SourceMedia {
    SourceMedia::new(1920, 1080, 12.0)
}

#[test]
fn format_descriptors() {
    assert_eq!(ExportFormat::Mp4.mime_type(), "video/mp4");
    assert_eq!(ExportFormat::Gif.mime_type(), "image/gif");
    assert_eq!(ExportFormat::Mp4.file_extension(), "mp4");
    assert_eq!(ExportFormat::Gif.file_extension(), "gif");
    assert_eq!(ExportFormat::Gif.label(), "GIF Animation");
    assert_eq!(ExportFormat::Mp4.description(), "High quality video file");
}

#[test]
fn frame_delay_table_is_exact() {
    let table: Vec<(u32, u32)> = GifFrameRate::ALL
        .iter()
        .map(|r| (r.per_second(), r.frame_delay_ms()))
        .collect();
    assert_eq!(
        table,
        vec![(10, 100), (15, 67), (20, 50), (25, 40), (30, 33)]
    );
    assert_eq!(frame_delay_ms(0), 0);
}

#[test]
fn labels_for_option_panels() {
    assert_eq!(GifFrameRate::Fps20.label(), "20 FPS");
    assert_eq!(GifSizePreset::Small.label(), "Small (480p)");
    assert_eq!(GifSizePreset::Original.label(), "Original");
    assert_eq!(Mp4Quality::Good.label(), "Good (1080p)");
}

#[test]
fn defaults_match_option_panels() {
    let gif = GifOptions::default();
    assert_eq!(gif.size_preset, GifSizePreset::Medium);
    assert_eq!(gif.frame_rate, GifFrameRate::Fps15);
    assert!(gif.loop_playback);
    assert_eq!(Mp4Options::default().quality, Mp4Quality::Good);
}

#[test]
fn end_to_end_planning_scenario() {
    let cfg = ExportConfig::gif(
        TrimRange::new(2.0, 7.0).unwrap(),
        GifOptions {
            size_preset: GifSizePreset::Medium,
            frame_rate: GifFrameRate::Fps25,
            loop_playback: true,
        },
    );
    let src = hd_source();
    cfg.validate(&src).unwrap();
    assert_eq!(
        cfg.output_dimensions(&src).unwrap(),
        OutputDimensions::new(1280, 720)
    );
    let ts = crate::export::sampler::sample_timestamps(cfg.trim, cfg.sample_rate(&src)).unwrap();
    assert_eq!(ts.len(), 125);
    let OutputOptions::Gif(opts) = cfg.output else {
        panic!("expected gif options");
    };
    assert_eq!(opts.repeat(), 0);
}

#[test]
fn mp4_samples_at_native_rate() {
    let cfg = ExportConfig::mp4(TrimRange::new(0.0, 1.0).unwrap(), Mp4Quality::Medium);
    assert_eq!(cfg.sample_rate(&hd_source()), Fps::whole(30).unwrap());
    let src = hd_source().with_frame_rate(Fps::whole(24).unwrap());
    assert_eq!(cfg.sample_rate(&src), Fps::whole(24).unwrap());
}

#[test]
fn trim_past_source_end_is_invalid() {
    let cfg = ExportConfig::mp4(TrimRange::new(10.0, 14.0).unwrap(), Mp4Quality::Good);
    assert!(matches!(
        cfg.validate(&hd_source()),
        Err(ExportError::InvalidConfig(_))
    ));
}

#[test]
fn zero_sized_source_is_invalid() {
    let cfg = ExportConfig::mp4(TrimRange::new(0.0, 1.0).unwrap(), Mp4Quality::Good);
    assert!(matches!(
        cfg.validate(&SourceMedia::new(0, 1080, 5.0)),
        Err(ExportError::InvalidSourceDimensions { .. })
    ));
}

#[test]
fn json_shape_and_round_trip() {
    let json = r#"{
        "trim": { "start_secs": 2.0, "end_secs": 7.0 },
        "output": { "format": "gif", "size_preset": "small", "frame_rate": 25, "loop": false }
    }"#;
    let cfg = ExportConfig::from_json(json).unwrap();
    assert_eq!(cfg.format(), ExportFormat::Gif);
    assert_eq!(
        cfg.output,
        OutputOptions::Gif(GifOptions {
            size_preset: GifSizePreset::Small,
            frame_rate: GifFrameRate::Fps25,
            loop_playback: false,
        })
    );

    let text = serde_json::to_string(&cfg).unwrap();
    assert!(text.contains(r#""format":"gif""#));
    assert!(text.contains(r#""loop":false"#));
    assert_eq!(ExportConfig::from_json(&text).unwrap(), cfg);
}

#[test]
fn json_fills_defaults() {
    let cfg = ExportConfig::from_json(
        r#"{ "trim": { "start_secs": 0, "end_secs": 1 }, "output": { "format": "mp4" } }"#,
    )
    .unwrap();
    assert_eq!(
        cfg.output,
        OutputOptions::Mp4(Mp4Options {
            quality: Mp4Quality::Good
        })
    );
}

#[test]
fn json_rejects_unknown_frame_rate() {
    let err = ExportConfig::from_json(
        r#"{ "trim": { "start_secs": 0, "end_secs": 1 }, "output": { "format": "gif", "frame_rate": 12 } }"#,
    )
    .unwrap_err();
    assert!(matches!(err, ExportError::InvalidConfig(_)));
    assert!(GifFrameRate::try_from(12).is_err());
}

proptest! {
    #[test]
    fn repeat_is_zero_or_one(loop_playback in any::<bool>()) {
        let r = gif_repeat(loop_playback);
        prop_assert!(r == 0 || r == 1);
        prop_assert_eq!(r == 0, loop_playback);
    }
}
