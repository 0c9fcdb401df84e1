//! Speed-ramp curve and the damped approach that steers a device toward it.

use std::time::Duration;

use vxcam_model::{MotionProfile, PlaybackState};

/// Tick period of the ramp loop.
pub const TICK_PERIOD: Duration = Duration::from_millis(50);

/// Fraction of the remaining distance to the target covered per tick.
pub const SMOOTHING: f64 = 0.2;

/// Multiplier applied to `ramp_intensity` outside the slow-down window.
const FAST_SECTION_GAIN: f64 = 0.5;

/// Target playback speed for a position on the clip.
///
/// A zero (or non-finite) duration is treated as one second so the position
/// never divides by zero. The profile must already be validated.
pub fn target_speed(
    current_time: f64,
    duration: f64,
    profile: &MotionProfile,
) -> f64 {
    let duration = if duration > 0.0 && duration.is_finite() {
        duration
    } else {
        1.0
    };
    let position = current_time / duration;
    let dist = (position - profile.ramp_center).abs();

    if dist < profile.ramp_width {
        let curve = (dist / profile.ramp_width).powi(2);
        profile.slow_speed + (1.0 - profile.slow_speed) * curve
    } else {
        fast_section_speed(profile)
    }
}

/// Speed outside the slow-down window.
pub fn fast_section_speed(profile: &MotionProfile) -> f64 {
    1.0 + profile.ramp_intensity * FAST_SECTION_GAIN
}

/// One step of the first-order low-pass toward `target`.
pub fn damp(current_rate: f64, target: f64) -> f64 {
    damp_with(current_rate, target, SMOOTHING)
}

/// [`damp`] with an explicit smoothing factor in `0.0..=1.0`.
pub fn damp_with(current_rate: f64, target: f64, smoothing: f64) -> f64 {
    current_rate + (target - current_rate) * smoothing
}

/// Ticks needed for the damped approach to land within `tolerance`
/// (relative to the initial gap) of a constant target.
pub fn ticks_to_converge(tolerance: f64) -> u32 {
    (tolerance.ln() / (1.0 - SMOOTHING).ln()).ceil() as u32
}

/// Stateless controller applying the ramp to a playback snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RampController;

impl RampController {
    /// Advance `state.current_rate` by one tick and return the target used.
    pub fn step(
        &self,
        state: &mut PlaybackState,
        profile: &MotionProfile,
    ) -> f64 {
        let target =
            target_speed(state.current_time, state.duration, profile);
        state.current_rate = damp(state.current_rate, target);
        target
    }
}
