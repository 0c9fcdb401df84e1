use std::path::PathBuf;

use vxcam_core::api::ApiConfig;
use vxcam_model::{MotionProfile, VxStyle};

/// Fully resolved settings for one `vxcamctl` run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api: ApiConfig,
    /// Always validated.
    pub motion: MotionProfile,
    pub default_style: VxStyle,
    pub metadata: ConfigMetadata,
}

/// Where the settings came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

/// Values given on the command line. These win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub default_style: Option<VxStyle>,
    pub ramp_intensity: Option<f64>,
    pub slow_speed: Option<f64>,
    pub ramp_center: Option<f64>,
    pub ramp_width: Option<f64>,
}
