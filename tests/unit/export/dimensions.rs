use proptest::prelude::*;

use super::*;

const GIF_PRESETS: [GifSizePreset; 4] = GifSizePreset::ALL;

#[test]
fn medium_preset_scales_1080p_to_720p() {
    let d = resolve_dimensions(1920, 1080, SizePolicy::Gif(GifSizePreset::Medium)).unwrap();
    assert_eq!(d, OutputDimensions::new(1280, 720));
}

#[test]
fn mp4_tiers_target_their_height() {
    assert_eq!(
        resolve_dimensions(3840, 2160, SizePolicy::Mp4(Mp4Quality::Medium)).unwrap(),
        OutputDimensions::new(1280, 720)
    );
    assert_eq!(
        resolve_dimensions(3840, 2160, SizePolicy::Mp4(Mp4Quality::Good)).unwrap(),
        OutputDimensions::new(1920, 1080)
    );
    // MP4 tiers also scale up small sources.
    assert_eq!(
        resolve_dimensions(640, 360, SizePolicy::Mp4(Mp4Quality::Good)).unwrap(),
        OutputDimensions::new(1920, 1080)
    );
}

#[test]
fn pass_through_keeps_odd_sizes() {
    assert_eq!(
        resolve_dimensions(1917, 1081, SizePolicy::Mp4(Mp4Quality::Source)).unwrap(),
        OutputDimensions::new(1917, 1081)
    );
    assert_eq!(
        resolve_dimensions(5001, 3333, SizePolicy::Gif(GifSizePreset::Original)).unwrap(),
        OutputDimensions::new(5001, 3333)
    );
}

#[test]
fn gif_never_upscales() {
    assert_eq!(
        resolve_dimensions(641, 361, SizePolicy::Gif(GifSizePreset::Small)).unwrap(),
        OutputDimensions::new(641, 361)
    );
}

#[test]
fn extreme_portrait_width_clamps_to_two() {
    let d = resolve_dimensions(1, 4000, SizePolicy::Gif(GifSizePreset::Small)).unwrap();
    assert_eq!(d, OutputDimensions::new(2, 480));
}

#[test]
fn zero_source_side_is_rejected() {
    for policy in [
        SizePolicy::Gif(GifSizePreset::Medium),
        SizePolicy::Mp4(Mp4Quality::Source),
    ] {
        assert!(matches!(
            resolve_dimensions(0, 1080, policy),
            Err(ExportError::InvalidSourceDimensions { width: 0, height: 1080 })
        ));
        assert!(matches!(
            resolve_dimensions(1920, 0, policy),
            Err(ExportError::InvalidSourceDimensions { .. })
        ));
    }
}

proptest! {
    #[test]
    fn gif_aspect_is_preserved(w in 100u32..=4000, h in 100u32..=4000, p in 0usize..4) {
        let d = resolve_dimensions(w, h, SizePolicy::Gif(GIF_PRESETS[p])).unwrap();
        let src = f64::from(w) / f64::from(h);
        prop_assert!((src - d.aspect()).abs() < 0.02, "{w}x{h} -> {d}");
    }

    #[test]
    fn gif_small_sources_pass_through(w in 100u32..=4000, h in 100u32..=480, p in 0usize..4) {
        let d = resolve_dimensions(w, h, SizePolicy::Gif(GIF_PRESETS[p])).unwrap();
        prop_assert_eq!(d, OutputDimensions::new(w, h));
    }

    #[test]
    fn gif_original_always_passes_through(w in 1u32..=10_000, h in 1u32..=10_000) {
        let d = resolve_dimensions(w, h, SizePolicy::Gif(GifSizePreset::Original)).unwrap();
        prop_assert_eq!(d, OutputDimensions::new(w, h));
    }

    #[test]
    fn gif_medium_caps_height(w in 100u32..=4000, h in 721u32..=4000) {
        let d = resolve_dimensions(w, h, SizePolicy::Gif(GifSizePreset::Medium)).unwrap();
        prop_assert!(d.height <= 722);
        prop_assert!(d.width < w);
    }

    #[test]
    fn gif_scaled_outputs_are_even(w in 100u32..=4000, h in 100u32..=4000, p in 0usize..3) {
        let preset = GIF_PRESETS[p];
        let d = resolve_dimensions(w, h, SizePolicy::Gif(preset)).unwrap();
        if preset.max_height().is_some_and(|max| h > max) {
            prop_assert!(d.is_even(), "{w}x{h} -> {d}");
        }
    }

    #[test]
    fn mp4_tiers_are_even_and_follow_aspect(w in 100u32..=4000, h in 100u32..=4000, q in 0usize..2) {
        let quality = Mp4Quality::ALL[q];
        let d = resolve_dimensions(w, h, SizePolicy::Mp4(quality)).unwrap();
        let target = quality.target_height().unwrap();
        prop_assert_eq!(d.height, (target / 2) * 2);
        prop_assert!(d.width > 0 && d.is_even());
        let src = f64::from(w) / f64::from(h);
        prop_assert!((src - d.aspect()).abs() < 0.05, "{w}x{h} -> {d}");
    }
}
