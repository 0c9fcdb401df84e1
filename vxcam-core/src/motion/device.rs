//! Playback device seam and a headless in-memory implementation.

use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Result, VxError};

/// The media element the ramp controller drives.
///
/// Implementations use interior mutability; the session serializes rate
/// writes against its own pause/seek calls.
pub trait PlaybackDevice: Send + Sync + 'static {
    /// Playhead position in seconds.
    fn current_time(&self) -> f64;
    /// Move the playhead to `seconds`.
    fn set_current_time(&self, seconds: f64);
    /// Clip length in seconds; `0.0` until metadata is known.
    fn duration(&self) -> f64;
    /// Current playback rate multiplier.
    fn playback_rate(&self) -> f64;
    /// Write a new playback rate multiplier.
    fn set_playback_rate(&self, rate: f64);
    /// Start playback. Devices may refuse (e.g. autoplay policy).
    fn play(&self) -> Result<()>;
    /// Stop playback, keeping the playhead where it is.
    fn pause(&self);
}

#[derive(Debug)]
struct SimulatedState {
    current_time: f64,
    duration: f64,
    rate: f64,
    playing: bool,
    refuse_play: bool,
    rate_writes: u64,
}

/// Device whose clock only moves when [`SimulatedDevice::advance`] is
/// called. Used for offline previews and tests.
#[derive(Debug)]
pub struct SimulatedDevice {
    state: Mutex<SimulatedState>,
}

impl SimulatedDevice {
    pub fn new(duration: f64) -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                current_time: 0.0,
                duration: duration.max(0.0),
                rate: 1.0,
                playing: false,
                refuse_play: false,
                rate_writes: 0,
            }),
        }
    }

    /// A device that rejects every `play()` call.
    pub fn with_play_failure(duration: f64) -> Self {
        let device = Self::new(duration);
        device.state.lock().refuse_play = true;
        device
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Number of `set_playback_rate` calls seen so far.
    pub fn rate_writes(&self) -> u64 {
        self.state.lock().rate_writes
    }

    /// Move the clock forward by `elapsed` wall time at the current rate.
    /// Returns `true` when the end of the clip was reached.
    pub fn advance(&self, elapsed: Duration) -> bool {
        let mut state = self.state.lock();
        if !state.playing {
            return false;
        }
        state.current_time += state.rate * elapsed.as_secs_f64();
        if state.current_time >= state.duration {
            state.current_time = state.duration;
            state.playing = false;
            return true;
        }
        false
    }
}

impl PlaybackDevice for SimulatedDevice {
    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        let mut state = self.state.lock();
        state.current_time = seconds.clamp(0.0, state.duration);
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().rate
    }

    fn set_playback_rate(&self, rate: f64) {
        let mut state = self.state.lock();
        state.rate = rate;
        state.rate_writes += 1;
    }

    fn play(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.refuse_play {
            return Err(VxError::Playback(
                "device refused to start playback".to_string(),
            ));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().playing = false;
    }
}
