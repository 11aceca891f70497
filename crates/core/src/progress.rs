//! Synthetic stage progress.
//!
//! The percentage shown for a running stage is a pure function of elapsed
//! time on an ease-in-out curve: slow start, fast middle, slow end. It says
//! nothing about how far the remote work actually is.

use std::time::Duration;

/// Percentage in `[0, 100]` for `elapsed_secs` into a stage of `duration_secs`.
///
/// Non-positive (or NaN) elapsed time yields 0; anything at or past the
/// duration yields 100. The two halves are `100 t²` and `100 - 100 (1 - t)²`,
/// so the bar steps from 25 to 75 at the midpoint. It never moves backwards.
pub fn ease_in_out_percent(elapsed_secs: f64, duration_secs: f64) -> u8 {
    if !(elapsed_secs > 0.0) {
        return 0;
    }
    if elapsed_secs >= duration_secs {
        return 100;
    }
    let t = elapsed_secs / duration_secs;
    let pct = if t < 0.5 {
        100.0 * t * t
    } else {
        100.0 - 100.0 * (1.0 - t) * (1.0 - t)
    };
    pct.round().clamp(0.0, 100.0) as u8
}

/// Samples the curve for one stage duration.
///
/// Owns no timer; the stage runner samples it on its tick interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressAnimator {
    duration: Duration,
}

impl ProgressAnimator {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn sample(&self, elapsed: Duration) -> u8 {
        ease_in_out_percent(elapsed.as_secs_f64(), self.duration.as_secs_f64())
    }
}
