use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vxcam_model::VxStyle;

use crate::config::{ConfigLoaderOptions, ConfigOverrides};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "vxcamctl", version)]
#[command(about = "Submit skate clips for rendering and preview speed ramps")]
pub struct Cli {
    /// Path to a vxcam.toml configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign, upload and render a clip, reporting progress until done
    Submit(SubmitArgs),
    /// Run the speed ramp against a simulated player and print each tick
    Preview(PreviewArgs),
    /// Print the offline frame schedule for a ramped clip
    Retime(RetimeArgs),
}

/// Motion profile overrides shared by the ramp commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RampArgs {
    /// Speed-up strength outside the slow-motion window (>= 0)
    #[arg(long, value_name = "N")]
    pub ramp_intensity: Option<f64>,

    /// Playback rate at the window center, in (0, 1]
    #[arg(long, value_name = "RATE")]
    pub slow_speed: Option<f64>,

    /// Window center as a fraction of the clip, in [0, 1]
    #[arg(long, value_name = "POS")]
    pub ramp_center: Option<f64>,

    /// Window half-width as a fraction of the clip, in (0, 1]
    #[arg(long, value_name = "WIDTH")]
    pub ramp_width: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Video file to submit
    pub file: PathBuf,

    /// Render style (classic_longlens, fisheye_dynamic, raw_mk1)
    #[arg(long)]
    pub style: Option<VxStyle>,

    /// Base URL of the rendering API (overrides config)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Print events and the final job as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Clip length in seconds
    #[arg(long, value_name = "SECS")]
    pub duration: f64,

    #[command(flatten)]
    pub ramp: RampArgs,

    /// Tick on the wall clock instead of as fast as possible
    #[arg(long)]
    pub realtime: bool,

    /// Print every Nth tick
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub every: u32,
}

#[derive(Args, Debug, Clone)]
pub struct RetimeArgs {
    /// Number of source frames
    #[arg(long, value_name = "N")]
    pub frames: u32,

    /// Source frame rate
    #[arg(long, value_name = "FPS")]
    pub fps: f64,

    #[command(flatten)]
    pub ramp: RampArgs,

    /// Also print runs of equal repeat counts
    #[arg(long)]
    pub runs: bool,
}

impl Cli {
    pub fn loader_options(&self) -> ConfigLoaderOptions {
        ConfigLoaderOptions {
            config_path: self.config.clone(),
            env_file: self.env_file.clone(),
        }
    }

    /// Settings given on the command line, which win over env and file.
    pub fn overrides(&self) -> ConfigOverrides {
        match &self.command {
            Command::Submit(args) => ConfigOverrides {
                api_base_url: args.api_url.clone(),
                default_style: args.style,
                ..ConfigOverrides::default()
            },
            Command::Preview(PreviewArgs { ramp, .. })
            | Command::Retime(RetimeArgs { ramp, .. }) => ConfigOverrides {
                ramp_intensity: ramp.ramp_intensity,
                slow_speed: ramp.slow_speed,
                ramp_center: ramp.ramp_center,
                ramp_width: ramp.ramp_width,
                ..ConfigOverrides::default()
            },
        }
    }
}
