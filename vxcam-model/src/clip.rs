use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{ModelError, Result};
use crate::ids::ClipId;

/// MIME type assumed when a clip's extension is not recognized.
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// An imported source clip. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    pub source: PathBuf,
    pub media_url: Url,
    /// True MIME type of the file. Signed upload targets are bound to it.
    pub content_type: String,
}

impl Clip {
    /// Import a clip from a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source =
            path.canonicalize().map_err(|source| ModelError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if !source.is_file() {
            return Err(ModelError::InvalidClip(format!(
                "{} is not a file",
                source.display()
            )));
        }

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ModelError::InvalidClip(format!(
                    "{} has no file name",
                    source.display()
                ))
            })?;

        let media_url = Url::from_file_path(&source).map_err(|_| {
            ModelError::InvalidClip(format!(
                "cannot build a media URL for {}",
                source.display()
            ))
        })?;

        Ok(Self {
            id: ClipId::new(),
            content_type: content_type_for_path(&source).to_string(),
            name,
            source,
            media_url,
        })
    }
}

/// Guess a clip's MIME type from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("m4v") => "video/x-m4v",
        Some("mov") | Some("qt") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
