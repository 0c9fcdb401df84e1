use std::fmt::{self, Display};
use std::path::PathBuf;

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidProfile {
        field: &'static str,
        reason: String,
    },
    InvalidClip(String),
    InvalidRetime(String),
    UnknownStyle(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io { path, source } => {
                write!(f, "io error on {}: {source}", path.display())
            }
            ModelError::InvalidProfile { field, reason } => {
                write!(f, "invalid motion profile: {field} {reason}")
            }
            ModelError::InvalidClip(msg) => write!(f, "invalid clip: {msg}"),
            ModelError::InvalidRetime(msg) => {
                write!(f, "invalid retime request: {msg}")
            }
            ModelError::UnknownStyle(name) => {
                write!(f, "unknown style '{name}'")
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
