use crate::export::config::{GifSizePreset, Mp4Quality};
use crate::foundation::core::OutputDimensions;
use crate::foundation::error::{ExportError, ExportResult};
use crate::foundation::math::floor_even;

/// Output size policy for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizePolicy {
    /// Cap the height at the preset's maximum, never upscaling.
    Gif(GifSizePreset),
    /// Target the quality tier's height.
    Mp4(Mp4Quality),
}

/// Map source dimensions to output dimensions under `policy`.
///
/// Scaled outputs are even on both axes (`floor(x / 2) * 2`) so that chroma-subsampled encoders
/// accept them. Pass-through outputs (`Original`, `Source`, or a GIF source already under the
/// cap) keep the raw, possibly odd, source size.
pub fn resolve_dimensions(
    source_width: u32,
    source_height: u32,
    policy: SizePolicy,
) -> ExportResult<OutputDimensions> {
    if source_width == 0 || source_height == 0 {
        return Err(ExportError::InvalidSourceDimensions {
            width: source_width,
            height: source_height,
        });
    }
    let source = OutputDimensions::new(source_width, source_height);

    let target_height = match policy {
        SizePolicy::Gif(preset) => {
            let Some(max_height) = preset.max_height() else {
                return Ok(source);
            };
            let scale = (f64::from(max_height) / f64::from(source_height)).min(1.0);
            if scale >= 1.0 {
                return Ok(source);
            }
            max_height
        }
        SizePolicy::Mp4(quality) => {
            let Some(target) = quality.target_height() else {
                return Ok(source);
            };
            target
        }
    };

    Ok(scale_to_even_height(source, target_height))
}

fn scale_to_even_height(source: OutputDimensions, target_height: u32) -> OutputDimensions {
    let height = floor_even(f64::from(target_height)).max(2);
    // Multiply before dividing so exact ratios (1920x1080 -> 1280x720) stay exact.
    let width =
        floor_even(f64::from(height) * f64::from(source.width) / f64::from(source.height)).max(2);
    OutputDimensions::new(width, height)
}

#[cfg(test)]
#[path = "../../tests/unit/export/dimensions.rs"]
mod tests;
