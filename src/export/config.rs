//! Export configuration: output format, per-format options and trim bounds.
//!
//! A config is assembled once by the caller (UI or CLI) and is read-only for the duration of a
//! run. JSON form:
//!
//! ```json
//! { "trim": { "start_secs": 2.0, "end_secs": 7.0 },
//!   "output": { "format": "gif", "size_preset": "medium", "frame_rate": 25, "loop": true } }
//! ```

use crate::export::dimensions::{SizePolicy, resolve_dimensions};
use crate::foundation::core::{Fps, OutputDimensions, TrimRange};
use crate::foundation::error::{ExportError, ExportResult};
use crate::media::source::SourceMedia;

/// Output container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// H.264 video in an MP4 container.
    Mp4,
    /// Animated GIF.
    Gif,
}

impl ExportFormat {
    /// Every format, in menu order.
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Mp4, ExportFormat::Gif];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Mp4 => "MP4 Video",
            Self::Gif => "GIF Animation",
        }
    }

    /// One-line hint shown under the label.
    pub fn description(self) -> &'static str {
        match self {
            Self::Mp4 => "High quality video file",
            Self::Gif => "Animated image for sharing",
        }
    }

    /// MIME type of the produced artifact.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Gif => "image/gif",
        }
    }

    /// File extension without the dot.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Gif => "gif",
        }
    }
}

/// MP4 quality tier. Each tier names a target output height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mp4Quality {
    /// 720p.
    Medium,
    /// 1080p.
    #[default]
    Good,
    /// Source resolution, unscaled.
    Source,
}

impl Mp4Quality {
    /// Every tier, smallest first.
    pub const ALL: [Mp4Quality; 3] = [Mp4Quality::Medium, Mp4Quality::Good, Mp4Quality::Source];

    /// Target height, `None` for [`Mp4Quality::Source`].
    pub fn target_height(self) -> Option<u32> {
        match self {
            Self::Medium => Some(720),
            Self::Good => Some(1080),
            Self::Source => None,
        }
    }

    /// Average video bitrate in kbit/s handed to the H.264 encoder.
    pub fn bitrate_kbps(self) -> u32 {
        match self {
            Self::Medium => 5_000,
            Self::Good => 8_000,
            Self::Source => 12_000,
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Medium => "Medium (720p)",
            Self::Good => "Good (1080p)",
            Self::Source => "Source",
        }
    }
}

/// Named cap on GIF output height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GifSizePreset {
    /// At most 480 px tall.
    Small,
    /// At most 720 px tall.
    #[default]
    Medium,
    /// At most 1080 px tall.
    Large,
    /// Source size.
    Original,
}

impl GifSizePreset {
    /// Every preset, smallest first.
    pub const ALL: [GifSizePreset; 4] = [
        GifSizePreset::Small,
        GifSizePreset::Medium,
        GifSizePreset::Large,
        GifSizePreset::Original,
    ];

    /// Maximum output height, `None` (unbounded) for [`GifSizePreset::Original`].
    pub fn max_height(self) -> Option<u32> {
        match self {
            Self::Small => Some(480),
            Self::Medium => Some(720),
            Self::Large => Some(1080),
            Self::Original => None,
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "Small (480p)",
            Self::Medium => "Medium (720p)",
            Self::Large => "Large (1080p)",
            Self::Original => "Original",
        }
    }
}

/// Supported GIF frame rates. Serialized as the plain number of frames per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum GifFrameRate {
    /// 10 frames per second.
    Fps10,
    /// 15 frames per second.
    #[default]
    Fps15,
    /// 20 frames per second.
    Fps20,
    /// 25 frames per second.
    Fps25,
    /// 30 frames per second.
    Fps30,
}

impl GifFrameRate {
    /// Every supported rate, slowest first.
    pub const ALL: [GifFrameRate; 5] = [
        GifFrameRate::Fps10,
        GifFrameRate::Fps15,
        GifFrameRate::Fps20,
        GifFrameRate::Fps25,
        GifFrameRate::Fps30,
    ];

    /// Whole frames per second.
    pub fn per_second(self) -> u32 {
        match self {
            Self::Fps10 => 10,
            Self::Fps15 => 15,
            Self::Fps20 => 20,
            Self::Fps25 => 25,
            Self::Fps30 => 30,
        }
    }

    /// The rate as an [`Fps`].
    pub fn fps(self) -> Fps {
        Fps {
            num: self.per_second(),
            den: 1,
        }
    }

    /// Per-frame display time, `round(1000 / rate)` milliseconds.
    pub fn frame_delay_ms(self) -> u32 {
        frame_delay_ms(self.per_second())
    }

    /// Menu label, e.g. `15 FPS`.
    pub fn label(self) -> String {
        format!("{} FPS", self.per_second())
    }
}

impl TryFrom<u32> for GifFrameRate {
    type Error = String;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|r| r.per_second() == v)
            .ok_or_else(|| format!("unsupported GIF frame rate {v} (expected 10, 15, 20, 25 or 30)"))
    }
}

impl From<GifFrameRate> for u32 {
    fn from(r: GifFrameRate) -> u32 {
        r.per_second()
    }
}

/// `round(1000 / rate)` in milliseconds, rounding half away from zero.
pub fn frame_delay_ms(rate: u32) -> u32 {
    if rate == 0 {
        return 0;
    }
    (1000 + rate / 2) / rate
}

/// GIF repeat field for a loop toggle: `0` loops forever, `1` plays once.
pub fn gif_repeat(loop_playback: bool) -> u16 {
    if loop_playback { 0 } else { 1 }
}

/// MP4-only options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mp4Options {
    /// Quality tier; defaults to [`Mp4Quality::Good`].
    #[serde(default)]
    pub quality: Mp4Quality,
}

/// GIF-only options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GifOptions {
    /// Height cap.
    #[serde(default)]
    pub size_preset: GifSizePreset,
    /// Sampling and playback rate.
    #[serde(default)]
    pub frame_rate: GifFrameRate,
    /// Loop forever when `true`, play once otherwise. Serialized as `loop`.
    #[serde(default = "default_loop", rename = "loop")]
    pub loop_playback: bool,
}

fn default_loop() -> bool {
    true
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            size_preset: GifSizePreset::default(),
            frame_rate: GifFrameRate::default(),
            loop_playback: default_loop(),
        }
    }
}

impl GifOptions {
    /// NETSCAPE loop count for these options.
    pub fn repeat(&self) -> u16 {
        gif_repeat(self.loop_playback)
    }
}

/// Format plus the options that only apply to that format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum OutputOptions {
    /// MP4 output.
    Mp4(Mp4Options),
    /// GIF output.
    Gif(GifOptions),
}

impl OutputOptions {
    /// Container the options belong to.
    pub fn format(&self) -> ExportFormat {
        match self {
            Self::Mp4(_) => ExportFormat::Mp4,
            Self::Gif(_) => ExportFormat::Gif,
        }
    }

    /// Sizing rule handed to [`resolve_dimensions`].
    pub fn size_policy(&self) -> SizePolicy {
        match self {
            Self::Mp4(o) => SizePolicy::Mp4(o.quality),
            Self::Gif(o) => SizePolicy::Gif(o.size_preset),
        }
    }
}

/// Input of one export run.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportConfig {
    /// Source range to export.
    pub trim: TrimRange,
    /// Format and format-specific options.
    pub output: OutputOptions,
}

impl ExportConfig {
    /// MP4 export of `trim` at `quality`.
    pub fn mp4(trim: TrimRange, quality: Mp4Quality) -> Self {
        Self {
            trim,
            output: OutputOptions::Mp4(Mp4Options { quality }),
        }
    }

    /// GIF export of `trim` with `opts`.
    pub fn gif(trim: TrimRange, opts: GifOptions) -> Self {
        Self {
            trim,
            output: OutputOptions::Gif(opts),
        }
    }

    /// Output container.
    pub fn format(&self) -> ExportFormat {
        self.output.format()
    }

    /// Parse a JSON config document.
    pub fn from_json(s: &str) -> ExportResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| ExportError::invalid_config(format!("config json parse failed: {e}")))
    }

    /// Check the config against the source it will be applied to.
    pub fn validate(&self, source: &SourceMedia) -> ExportResult<()> {
        source.validate()?;
        self.trim.validate_within(source.duration_secs)
    }

    /// Dimensions the export will be rendered at; also drives the options panel preview.
    pub fn output_dimensions(&self, source: &SourceMedia) -> ExportResult<OutputDimensions> {
        resolve_dimensions(source.width, source.height, self.output.size_policy())
    }

    /// Frame rate the run samples the source at: the GIF rate, or the source's native rate.
    pub fn sample_rate(&self, source: &SourceMedia) -> Fps {
        match &self.output {
            OutputOptions::Gif(o) => o.frame_rate.fps(),
            OutputOptions::Mp4(_) => source.native_fps(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/config.rs"]
mod tests;
