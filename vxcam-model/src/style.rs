use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;

/// Named render presets understood by the processing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VxStyle {
    /// Long-lens follow cam look
    #[default]
    ClassicLonglens,
    /// Fisheye with dynamic barrel distortion
    FisheyeDynamic,
    /// Untreated MK1 camera look
    RawMk1,
}

impl VxStyle {
    pub const ALL: [VxStyle; 3] = [
        VxStyle::ClassicLonglens,
        VxStyle::FisheyeDynamic,
        VxStyle::RawMk1,
    ];

    /// Wire name sent to the processing endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            VxStyle::ClassicLonglens => "classic_longlens",
            VxStyle::FisheyeDynamic => "fisheye_dynamic",
            VxStyle::RawMk1 => "raw_mk1",
        }
    }
}

impl Display for VxStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VxStyle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        VxStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownStyle(s.to_string()))
    }
}
