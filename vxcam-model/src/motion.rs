use crate::error::{ModelError, Result};

/// A single symmetric slow-down window placed on a clip's normalized
/// timeline.
///
/// Outside the window playback runs faster than normal, scaled by
/// `ramp_intensity`. Inside it the speed eases quadratically down to
/// `slow_speed` at `ramp_center`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionProfile {
    /// Aggression of the fast section outside the window, `>= 0`.
    pub ramp_intensity: f64,
    /// Playback rate at the window center, in `(0, 1]`.
    pub slow_speed: f64,
    /// Window center as a fraction of the clip, in `[0, 1]`.
    pub ramp_center: f64,
    /// Window half-width as a fraction of the clip, in `(0, 1]`.
    pub ramp_width: f64,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            ramp_intensity: 0.7,
            slow_speed: 0.25,
            ramp_center: 0.5,
            ramp_width: 0.2,
        }
    }
}

impl MotionProfile {
    pub fn new(
        ramp_intensity: f64,
        slow_speed: f64,
        ramp_center: f64,
        ramp_width: f64,
    ) -> Result<Self> {
        let profile = Self {
            ramp_intensity,
            slow_speed,
            ramp_center,
            ramp_width,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Reject profiles the ramp curve cannot evaluate.
    ///
    /// `ramp_width` must be strictly positive, otherwise the curve divides
    /// by zero.
    pub fn validate(&self) -> Result<()> {
        check_finite("ramp_intensity", self.ramp_intensity)?;
        check_finite("slow_speed", self.slow_speed)?;
        check_finite("ramp_center", self.ramp_center)?;
        check_finite("ramp_width", self.ramp_width)?;

        if self.ramp_intensity < 0.0 {
            return Err(invalid("ramp_intensity", "must be >= 0"));
        }
        if self.slow_speed <= 0.0 || self.slow_speed > 1.0 {
            return Err(invalid("slow_speed", "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.ramp_center) {
            return Err(invalid("ramp_center", "must be in [0, 1]"));
        }
        if self.ramp_width <= 0.0 || self.ramp_width > 1.0 {
            return Err(invalid("ramp_width", "must be in (0, 1]"));
        }
        Ok(())
    }

    /// Normalized bounds of the slow-down window, clamped to the clip.
    pub fn window(&self) -> RampWindow {
        RampWindow {
            start: (self.ramp_center - self.ramp_width).clamp(0.0, 1.0),
            end: (self.ramp_center + self.ramp_width).clamp(0.0, 1.0),
        }
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite number"))
    }
}

fn invalid(field: &'static str, reason: &str) -> ModelError {
    ModelError::InvalidProfile {
        field,
        reason: reason.to_string(),
    }
}

/// Normalized `[start, end]` span of a ramp window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RampWindow {
    pub start: f64,
    pub end: f64,
}

impl RampWindow {
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }
}

/// Snapshot of a playback device as seen by the ramp controller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub current_rate: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            current_rate: 1.0,
        }
    }
}

impl PlaybackState {
    /// Playback position as a fraction of the clip. A zero duration is
    /// treated as one second so the result is never NaN.
    pub fn position(&self) -> f64 {
        let duration = if self.duration > 0.0 && self.duration.is_finite() {
            self.duration
        } else {
            1.0
        };
        self.current_time / duration
    }
}
