use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
///
/// ```toml
/// default_style = "fisheye_dynamic"
///
/// [api]
/// base_url = "https://render.example.com"
/// request_timeout = "30s"
/// upload_stall_timeout = "2m"
///
/// [motion]
/// ramp_intensity = 0.7
/// slow_speed = 0.25
/// ramp_center = 0.5
/// ramp_width = 0.2
/// ```
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api: FileApiConfig,
    #[serde(default)]
    pub motion: FileMotionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_style: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_stall_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileMotionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_center: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_width: Option<f64>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub api_base_url: Option<String>,
    pub request_timeout: Option<String>,
    pub upload_stall_timeout: Option<String>,
    pub default_style: Option<String>,
    /// Motion values stay raw so the loader can report unparseable ones.
    pub ramp_intensity: Option<String>,
    pub slow_speed: Option<String>,
    pub ramp_center: Option<String>,
    pub ramp_width: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name).and_then(|raw| {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
        };
        Self {
            api_base_url: var("VX_API_BASE_URL"),
            request_timeout: var("VX_REQUEST_TIMEOUT"),
            upload_stall_timeout: var("VX_UPLOAD_STALL_TIMEOUT"),
            default_style: var("VX_DEFAULT_STYLE"),
            ramp_intensity: var("VX_RAMP_INTENSITY"),
            slow_speed: var("VX_SLOW_SPEED"),
            ramp_center: var("VX_RAMP_CENTER"),
            ramp_width: var("VX_RAMP_WIDTH"),
            config_path: var("VX_CONFIG_PATH").map(PathBuf::from),
        }
    }
}
