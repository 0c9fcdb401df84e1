//! Layered configuration: `.env`, environment variables, an optional TOML
//! file and command-line overrides.

pub mod loader;
pub mod models;
pub mod sources;

pub use loader::{ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{Config, ConfigMetadata, ConfigOverrides};
pub use sources::{EnvConfig, FileConfig};
