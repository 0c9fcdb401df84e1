//! Offline frame schedule for rendering a ramped clip without a live device.

use std::time::Duration;

use vxcam_model::{ModelError, MotionProfile};

use super::ramp::{self, SMOOTHING, TICK_PERIOD};
use crate::error::Result;

/// How many times each source frame is emitted in the retimed output.
///
/// A count of zero drops the frame (fast section), more than one holds it
/// (slow section).
#[derive(Debug, Clone, PartialEq)]
pub struct RetimePlan {
    repeats: Vec<u32>,
    source_duration: Duration,
    output_duration: Duration,
}

impl RetimePlan {
    /// Walk `frame_count` source frames at `fps`, smoothing the speed the
    /// same way the live ramp loop does but at frame granularity.
    pub fn build(
        frame_count: u32,
        fps: f64,
        profile: &MotionProfile,
    ) -> Result<Self> {
        profile.validate()?;
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ModelError::InvalidRetime(format!(
                "fps must be a positive number, got {fps}"
            ))
            .into());
        }

        let frame_dt = 1.0 / fps;
        let duration = f64::from(frame_count) * frame_dt;
        let source_duration = span_of(f64::from(frame_count), fps)?;
        let smoothing = frame_smoothing(frame_dt);

        let mut rate = 1.0;
        let mut carry = 0.0;
        let mut repeats = Vec::with_capacity(frame_count as usize);

        for index in 0..frame_count {
            let time = f64::from(index) * frame_dt;
            let target = ramp::target_speed(time, duration, profile);
            rate = ramp::damp_with(rate, target, smoothing);

            carry += 1.0 / rate;
            let emit = carry.floor();
            carry -= emit;
            repeats.push(emit as u32);
        }

        let output_frames: u64 = repeats.iter().map(|&r| u64::from(r)).sum();
        let output_duration = span_of(output_frames as f64, fps)?;

        Ok(Self {
            repeats,
            source_duration,
            output_duration,
        })
    }

    pub fn repeats(&self) -> &[u32] {
        &self.repeats
    }

    pub fn source_frames(&self) -> usize {
        self.repeats.len()
    }

    pub fn output_frames(&self) -> u64 {
        self.repeats.iter().map(|&r| u64::from(r)).sum()
    }

    pub fn source_duration(&self) -> Duration {
        self.source_duration
    }

    pub fn output_duration(&self) -> Duration {
        self.output_duration
    }
}

/// Play time of `frames` at `fps`, rejected when it cannot be represented.
fn span_of(frames: f64, fps: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(frames / fps).map_err(|err| {
        ModelError::InvalidRetime(format!(
            "{frames} frames at {fps} fps is not a representable duration: {err}"
        ))
        .into()
    })
}

/// Per-frame smoothing factor equivalent to `SMOOTHING` per `TICK_PERIOD`.
fn frame_smoothing(frame_dt: f64) -> f64 {
    1.0 - (1.0 - SMOOTHING).powf(frame_dt / TICK_PERIOD.as_secs_f64())
}
