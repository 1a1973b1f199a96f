use crate::foundation::error::{ExportError, ExportResult};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ExportResult<Self> {
        if den == 0 {
            return Err(ExportError::invalid_config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ExportError::invalid_config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole frames per second.
    pub fn whole(num: u32) -> ExportResult<Self> {
        Self::new(num, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Parse an ffprobe style ratio such as `30000/1001` or `25/1`.
    ///
    /// Returns `None` for malformed input and for `0/0`, which ffprobe emits when the rate is
    /// unknown.
    pub fn parse_ratio(s: &str) -> Option<Self> {
        let (num, den) = match s.trim().split_once('/') {
            Some((n, d)) => (n.trim().parse::<u32>().ok()?, d.trim().parse::<u32>().ok()?),
            None => (s.trim().parse::<u32>().ok()?, 1),
        };
        Self::new(num, den).ok()
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Output raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OutputDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl OutputDimensions {
    /// Create dimensions without validation.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Return `true` when both sides are even.
    pub fn is_even(self) -> bool {
        self.width.is_multiple_of(2) && self.height.is_multiple_of(2)
    }

    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

impl std::fmt::Display for OutputDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Half-open trim interval `[start_secs, end_secs)` in source time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrimRange {
    /// Inclusive start in seconds.
    pub start_secs: f64,
    /// Exclusive end in seconds.
    pub end_secs: f64,
}

impl TrimRange {
    /// Create a trim range with `start < end`.
    pub fn new(start_secs: f64, end_secs: f64) -> ExportResult<Self> {
        let r = Self {
            start_secs,
            end_secs,
        };
        r.duration_secs()?;
        Ok(r)
    }

    /// The whole source, `[0, duration)`.
    pub fn full(duration_secs: f64) -> ExportResult<Self> {
        Self::new(0.0, duration_secs)
    }

    /// Effective duration, failing with `EmptyTrimRange` when it is not positive.
    pub fn duration_secs(self) -> ExportResult<f64> {
        let d = self.end_secs - self.start_secs;
        if !self.start_secs.is_finite() || !self.end_secs.is_finite() || d <= 0.0 {
            return Err(ExportError::EmptyTrimRange {
                start_secs: self.start_secs,
                end_secs: self.end_secs,
            });
        }
        Ok(d)
    }

    /// Check the range against the source duration (`0 <= start < end <= duration`).
    pub fn validate_within(self, source_duration_secs: f64) -> ExportResult<()> {
        self.duration_secs()?;
        if self.start_secs < 0.0 {
            return Err(ExportError::invalid_config(format!(
                "trim start {:.3}s is negative",
                self.start_secs
            )));
        }
        // Container durations are rounded to milliseconds; allow that much slack.
        if self.end_secs > source_duration_secs + 1e-3 {
            return Err(ExportError::invalid_config(format!(
                "trim end {:.3}s is past the source duration {:.3}s",
                self.end_secs, source_duration_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
