//! Real-time speed ramp: the curve, the damped approach, the session that
//! runs it against a playback device, and an offline retime planner.

pub mod device;
pub mod ramp;
pub mod retime;
pub mod session;

pub use device::{PlaybackDevice, SimulatedDevice};
pub use ramp::{
    RampController, SMOOTHING, TICK_PERIOD, damp, fast_section_speed,
    target_speed, ticks_to_converge,
};
pub use retime::RetimePlan;
pub use session::PlaybackSession;
