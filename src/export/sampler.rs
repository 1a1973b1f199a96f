use crate::foundation::core::{Fps, TrimRange};
use crate::foundation::error::ExportResult;

/// Last timestamp is kept this far below the exclusive trim end.
pub const END_EPSILON_SECS: f64 = 1e-6;

// `duration * rate` that is integral in exact arithmetic can land a few ulps above the integer.
const COUNT_GUARD: f64 = 1e-9;

/// Number of frames sampled from `duration_secs` of source at `fps`: `ceil(duration * rate)`.
pub fn frame_count(duration_secs: f64, fps: Fps) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs * fps.as_f64() - COUNT_GUARD).ceil().max(0.0) as u64
}

/// Source timestamps to render for `trim` at `fps`, strictly increasing, within
/// `[start, end - END_EPSILON_SECS]`.
pub fn sample_timestamps(trim: TrimRange, fps: Fps) -> ExportResult<Vec<f64>> {
    let duration = trim.duration_secs()?;
    let n = frame_count(duration, fps);
    let step = fps.frame_duration_secs();
    let last = trim.end_secs - END_EPSILON_SECS;

    let mut out = Vec::with_capacity(n as usize);
    for i in 0..n {
        let t = (trim.start_secs + (i as f64) * step)
            .min(last)
            .max(trim.start_secs);
        out.push(t);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/export/sampler.rs"]
mod tests;
