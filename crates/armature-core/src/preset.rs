//! Preset file serialization

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::params::JointParameters;
use crate::units::LengthUnit;

/// Current preset file format version
pub const PRESET_VERSION: u32 = 1;

/// A saved set of joint parameters together with the unit they are written in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// File format version
    pub version: u32,
    /// Unit of every length in `parameters`
    #[serde(default)]
    pub unit: LengthUnit,
    pub parameters: JointParameters,
}

impl Default for Preset {
    fn default() -> Self {
        Self::new(LengthUnit::Millimeter, JointParameters::default())
    }
}

impl Preset {
    pub fn new(unit: LengthUnit, parameters: JointParameters) -> Self {
        Self {
            version: PRESET_VERSION,
            unit,
            parameters,
        }
    }

    /// Seed defaults expressed in `unit`
    pub fn defaults(unit: LengthUnit) -> Self {
        Self::new(unit, JointParameters::defaults(unit))
    }

    /// Parameters converted into `unit`
    pub fn parameters_in(&self, unit: LengthUnit) -> JointParameters {
        self.parameters.converted(self.unit, unit)
    }

    /// Save preset to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let content = self.to_bytes()?;
        std::fs::write(path.as_ref(), content).map_err(|e| PresetError::Io(e.to_string()))?;
        Ok(())
    }

    /// Serialize preset to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, PresetError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| PresetError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load preset from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| PresetError::Io(e.to_string()))?;
        Self::parse(&content)
    }

    /// Load preset from bytes
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, PresetError> {
        let content =
            std::str::from_utf8(data).map_err(|e| PresetError::Deserialize(e.to_string()))?;
        Self::parse(content)
    }

    fn parse(content: &str) -> Result<Self, PresetError> {
        let preset: Preset =
            ron::from_str(content).map_err(|e| PresetError::Deserialize(e.to_string()))?;
        if preset.version != PRESET_VERSION {
            return Err(PresetError::UnsupportedVersion(preset.version));
        }
        Ok(preset)
    }
}

/// Preset errors
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Unsupported preset version: {0}")]
    UnsupportedVersion(u32),
}
