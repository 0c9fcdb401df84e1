use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;
use vxcam_core::api::{ApiConfig, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT};
use vxcam_model::{ModelError, MotionProfile, VxStyle};

use super::{
    models::{Config, ConfigMetadata, ConfigOverrides},
    sources::{EnvConfig, FileConfig},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("vxcam.toml"),
        PathBuf::from("config/vxcam.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Resolves settings with precedence: command line, environment, config
/// file, built-in defaults.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
    overrides: ConfigOverrides,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self {
            options,
            overrides: ConfigOverrides::default(),
        }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Load `.env` (a missing file is fine), read the process environment
    /// and the config file, then compose.
    pub fn load(&self) -> Result<Config, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.load_with_env(EnvConfig::gather(), env_file_loaded)
    }

    /// Compose from an already gathered environment.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<Config, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        self.compose_config(
            file_config.unwrap_or_default(),
            env,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path)
        {
            (Some(explicit), _) => (explicit.clone(), true),
            (None, Some(from_env)) => (from_env.clone(), false),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(found) => (found.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file: FileConfig,
        env: EnvConfig,
        metadata: ConfigMetadata,
    ) -> Result<Config, ConfigLoadError> {
        let overrides = &self.overrides;
        let FileConfig {
            api: file_api,
            motion: file_motion,
            default_style: file_style,
        } = file;

        let raw_url = overrides
            .api_base_url
            .clone()
            .or(env.api_base_url)
            .or(file_api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let base_url = Url::parse(&raw_url).map_err(|source| {
            ConfigLoadError::InvalidUrl {
                value: raw_url.clone(),
                source,
            }
        })?;

        let request_timeout =
            match env.request_timeout.or(file_api.request_timeout) {
                Some(raw) => parse_duration("request_timeout", &raw)?,
                None => DEFAULT_REQUEST_TIMEOUT,
            };

        let upload_stall_timeout =
            match env.upload_stall_timeout.or(file_api.upload_stall_timeout) {
                Some(raw) => parse_optional_duration("upload_stall_timeout", &raw)?,
                None => None,
            };

        let default_style = match overrides.default_style {
            Some(style) => style,
            None => match env.default_style.or(file_style) {
                Some(raw) => raw
                    .parse::<VxStyle>()
                    .map_err(ConfigLoadError::InvalidStyle)?,
                None => VxStyle::default(),
            },
        };

        let defaults = MotionProfile::default();
        let motion = MotionProfile {
            ramp_intensity: overrides
                .ramp_intensity
                .or(parse_number("VX_RAMP_INTENSITY", env.ramp_intensity)?)
                .or(file_motion.ramp_intensity)
                .unwrap_or(defaults.ramp_intensity),
            slow_speed: overrides
                .slow_speed
                .or(parse_number("VX_SLOW_SPEED", env.slow_speed)?)
                .or(file_motion.slow_speed)
                .unwrap_or(defaults.slow_speed),
            ramp_center: overrides
                .ramp_center
                .or(parse_number("VX_RAMP_CENTER", env.ramp_center)?)
                .or(file_motion.ramp_center)
                .unwrap_or(defaults.ramp_center),
            ramp_width: overrides
                .ramp_width
                .or(parse_number("VX_RAMP_WIDTH", env.ramp_width)?)
                .or(file_motion.ramp_width)
                .unwrap_or(defaults.ramp_width),
        };
        motion.validate().map_err(ConfigLoadError::InvalidProfile)?;

        Ok(Config {
            api: ApiConfig {
                base_url,
                request_timeout,
                upload_stall_timeout,
            },
            motion,
            default_style,
            metadata,
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

fn parse_number(
    key: &'static str,
    raw: Option<String>,
) -> Result<Option<f64>, ConfigLoadError> {
    raw.map(|value| {
        value
            .parse()
            .map_err(|source| ConfigLoadError::InvalidNumber {
                key,
                value,
                source,
            })
    })
    .transpose()
}

fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            key,
            value: raw.to_string(),
            source,
        }
    })
}

/// `off`, `none` and zero disable the setting.
fn parse_optional_duration(
    key: &'static str,
    raw: &str,
) -> Result<Option<Duration>, ConfigLoadError> {
    match raw.to_ascii_lowercase().as_str() {
        "off" | "none" | "disabled" => Ok(None),
        _ => {
            let duration = parse_duration(key, raw)?;
            Ok((!duration.is_zero()).then_some(duration))
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid API base URL '{value}'")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid number for {key}: '{value}'")]
    InvalidNumber {
        key: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("invalid default style")]
    InvalidStyle(#[source] ModelError),
    #[error("invalid motion profile")]
    InvalidProfile(#[source] ModelError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
