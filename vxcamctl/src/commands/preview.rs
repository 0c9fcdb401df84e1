use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::time::Instant;
use vxcam_core::motion::{
    PlaybackDevice, PlaybackSession, RampController, SimulatedDevice,
    TICK_PERIOD, fast_section_speed, target_speed,
};
use vxcam_model::{MotionProfile, PlaybackState};

use crate::cli::PreviewArgs;
use crate::config::Config;

pub async fn run(config: &Config, args: &PreviewArgs) -> anyhow::Result<()> {
    if !(args.duration.is_finite() && args.duration > 0.0) {
        bail!("--duration must be a positive number of seconds");
    }
    let every = args.every.max(1);
    let profile = config.motion;
    let window = profile.window();
    println!(
        "clip {:.2}s, slow window {:.2}..{:.2} at {:.2}x, fast sections at {:.2}x",
        args.duration,
        window.start,
        window.end,
        profile.slow_speed,
        fast_section_speed(&profile),
    );

    let ticks = if args.realtime {
        run_realtime(profile, args.duration, every).await?
    } else {
        run_offline(profile, args.duration, every)?
    };

    println!(
        "{ticks} ticks, played in {}",
        humantime::format_duration(TICK_PERIOD * ticks)
    );
    Ok(())
}

/// Step the controller directly against simulated time.
fn run_offline(
    profile: MotionProfile,
    duration: f64,
    every: u32,
) -> anyhow::Result<u32> {
    let device = SimulatedDevice::new(duration);
    device.play().context("simulated device refused to play")?;

    let controller = RampController;
    let mut state = PlaybackState {
        duration: device.duration(),
        is_playing: true,
        ..PlaybackState::default()
    };
    let mut ticks = 0;

    loop {
        state.current_time = device.current_time();
        let target = controller.step(&mut state, &profile);
        device.set_playback_rate(state.current_rate);
        ticks += 1;
        if ticks % every == 0 {
            print_row(&state, target);
        }
        if device.advance(TICK_PERIOD) {
            return Ok(ticks);
        }
    }
}

/// Drive a real playback session on the wall clock.
async fn run_realtime(
    profile: MotionProfile,
    duration: f64,
    every: u32,
) -> anyhow::Result<u32> {
    let device = Arc::new(SimulatedDevice::new(duration));
    let session = PlaybackSession::new(Arc::clone(&device), profile)?;
    session.on_loaded_metadata();
    session.play()?;

    let mut states = session.subscribe();
    let mut last = Instant::now();
    let mut ticks = 0;

    while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        if !state.is_playing {
            break;
        }

        let now = Instant::now();
        let ended = device.advance(now - last);
        last = now;
        ticks += 1;
        if ticks % every == 0 {
            let target =
                target_speed(state.current_time, state.duration, &profile);
            print_row(&state, target);
        }
        if ended {
            session.on_ended();
            break;
        }
    }
    Ok(ticks)
}

fn print_row(state: &PlaybackState, target: f64) {
    println!(
        "{:>9.3}s  pos {:>5.3}  target {:>5.3}  rate {:>5.3}",
        state.current_time,
        state.position(),
        target,
        state.current_rate
    );
}
