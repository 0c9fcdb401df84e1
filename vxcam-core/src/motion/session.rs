//! Playback session owning the periodic ramp task.
//!
//! The ticker runs only while the session is playing. Every device write
//! from the ticker happens under the same gate that `pause` and `seek` take,
//! so once `pause` returns no stale tick can touch the device.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};
use vxcam_model::{MotionProfile, PlaybackState};

use super::device::PlaybackDevice;
use super::ramp::{self, TICK_PERIOD};
use crate::error::Result;

/// Paused seeks closer than this to the device position are not pushed.
pub const SEEK_TOLERANCE: f64 = 0.05;

struct Shared<D> {
    device: Arc<D>,
    profile: RwLock<MotionProfile>,
    gate: Mutex<PlaybackState>,
    state_tx: watch::Sender<PlaybackState>,
}

impl<D: PlaybackDevice> Shared<D> {
    /// One ramp tick. Returns `false` once the session is no longer playing.
    fn tick(&self) -> bool {
        let mut state = self.gate.lock();
        if !state.is_playing {
            return false;
        }

        let profile = *self.profile.read();
        state.current_time = self.device.current_time();
        state.duration = self.device.duration();

        let target =
            ramp::target_speed(state.current_time, state.duration, &profile);
        let rate = ramp::damp(self.device.playback_rate(), target);
        self.device.set_playback_rate(rate);
        state.current_rate = rate;

        trace!(
            position = state.current_time,
            target,
            rate,
            "ramp tick"
        );
        self.state_tx.send_replace(*state);
        true
    }
}

/// A clip being previewed on a [`PlaybackDevice`] with the speed ramp
/// applied.
///
/// `play` must be called from within a Tokio runtime.
pub struct PlaybackSession<D: PlaybackDevice> {
    shared: Arc<Shared<D>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    period: Duration,
}

impl<D: PlaybackDevice> fmt::Debug for PlaybackSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("state", &*self.shared.gate.lock())
            .field("profile", &*self.shared.profile.read())
            .field("period", &self.period)
            .finish()
    }
}

impl<D: PlaybackDevice> PlaybackSession<D> {
    /// Session ticking every 50 ms. Fails if `profile` is invalid.
    pub fn new(device: Arc<D>, profile: MotionProfile) -> Result<Self> {
        Self::with_period(device, profile, TICK_PERIOD)
    }

    /// Session with a custom tick period. Offline previews use this to run
    /// the loop faster than real time.
    pub fn with_period(
        device: Arc<D>,
        profile: MotionProfile,
        period: Duration,
    ) -> Result<Self> {
        profile.validate()?;

        let initial = PlaybackState {
            current_time: device.current_time(),
            duration: device.duration(),
            is_playing: false,
            current_rate: device.playback_rate(),
        };
        let (state_tx, _) = watch::channel(initial);

        Ok(Self {
            shared: Arc::new(Shared {
                device,
                profile: RwLock::new(profile),
                gate: Mutex::new(initial),
                state_tx,
            }),
            ticker: Mutex::new(None),
            period,
        })
    }

    /// The device this session drives.
    pub fn device(&self) -> &Arc<D> {
        &self.shared.device
    }

    /// Latest playback snapshot.
    pub fn state(&self) -> PlaybackState {
        *self.shared.gate.lock()
    }

    pub fn is_playing(&self) -> bool {
        self.shared.gate.lock().is_playing
    }

    /// Receiver updated on every tick and every user action.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.shared.state_tx.subscribe()
    }

    /// Motion profile currently in effect.
    pub fn profile(&self) -> MotionProfile {
        *self.shared.profile.read()
    }

    /// Replace the motion profile. Invalid profiles are rejected before the
    /// running loop can see them.
    pub fn set_profile(&self, profile: MotionProfile) -> Result<()> {
        profile.validate()?;
        *self.shared.profile.write() = profile;
        debug!(?profile, "motion profile updated");
        Ok(())
    }

    /// Start playback and the ramp loop. A no-op while already playing.
    pub fn play(&self) -> Result<()> {
        let mut state = self.shared.gate.lock();
        if state.is_playing {
            return Ok(());
        }

        self.shared.device.play()?;
        state.is_playing = true;
        state.duration = self.shared.device.duration();
        self.shared.state_tx.send_replace(*state);

        let handle = tokio::spawn(run_ticker(
            Arc::downgrade(&self.shared),
            self.period,
        ));
        if let Some(stale) = self.ticker.lock().replace(handle) {
            stale.abort();
        }

        info!(position = state.current_time, "playback started");
        Ok(())
    }

    /// Stop playback. No ramp tick runs after this returns.
    pub fn pause(&self) {
        self.halt(true);
    }

    /// Device reported the end of the clip.
    pub fn on_ended(&self) {
        self.halt(false);
    }

    fn halt(&self, pause_device: bool) {
        let mut state = self.shared.gate.lock();
        if !state.is_playing {
            return;
        }

        state.is_playing = false;
        if pause_device {
            self.shared.device.pause();
        }
        state.current_time = self.shared.device.current_time();
        self.shared.state_tx.send_replace(*state);

        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
        info!(position = state.current_time, "playback stopped");
    }

    /// Jump to `seconds`, clamped to the clip.
    pub fn seek(&self, seconds: f64) {
        let mut state = self.shared.gate.lock();
        let duration = self.shared.device.duration().max(0.0);
        let target = seconds.clamp(0.0, duration);

        let device_time = self.shared.device.current_time();
        if state.is_playing || (device_time - target).abs() > SEEK_TOLERANCE
        {
            self.shared.device.set_current_time(target);
        }

        state.current_time = target;
        self.shared.state_tx.send_replace(*state);
        debug!(position = target, "seek");
    }

    /// Jump to a normalized timeline position.
    pub fn seek_fraction(&self, position: f64) {
        let duration = self.shared.device.duration();
        let duration = if duration > 0.0 { duration } else { 1.0 };
        self.seek(position * duration);
    }

    /// Device finished loading and now knows its duration.
    pub fn on_loaded_metadata(&self) {
        let mut state = self.shared.gate.lock();
        state.duration = self.shared.device.duration();
        self.shared.state_tx.send_replace(*state);
    }

    /// Device clock moved. Only pulled while playing; while paused the
    /// session owns the position.
    pub fn on_time_update(&self) {
        let mut state = self.shared.gate.lock();
        if state.is_playing {
            state.current_time = self.shared.device.current_time();
            self.shared.state_tx.send_replace(*state);
        }
    }
}

impl<D: PlaybackDevice> Drop for PlaybackSession<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}

async fn run_ticker<D: PlaybackDevice>(
    shared: Weak<Shared<D>>,
    period: Duration,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.tick() {
            break;
        }
    }
}
