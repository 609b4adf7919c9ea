//! Conversion options.
//!
//! Example `convert.toml`:
//! ```toml
//! [format]
//! blank_line_after_imports = true
//!
//! [synthesis]
//! temporary_separator = "_"
//! use_data_flow = false
//!
//! [repair]
//! enabled = true
//!
//! [run]
//! parallel = false
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatConfig {
    /// Blank line between the import block and the first declaration.
    pub blank_line_after_imports: bool,
    /// Blank line when leaving a group of same-kind declarations.
    pub blank_lines_between_groups: bool,
    /// Blank line around every routine and nested type.
    pub blank_line_between_routines: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            blank_line_after_imports: true,
            blank_lines_between_groups: true,
            blank_line_between_routines: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Joins a temporary's prefix and its sequence number.
    pub temporary_separator: String,
    /// Consult the resolver's data-flow capability, when it has one.
    pub use_data_flow: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            temporary_separator: "_".to_string(),
            use_data_flow: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepairConfig {
    pub enabled: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Convert independent files on the rayon pool.
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TriviaConfig {
    /// Trailing comment appended once to a file that lost some formatting.
    pub dropped_formatting_note: String,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            dropped_formatting_note: "Some source formatting could not be carried over".into(),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConvertOptions {
    pub format: FormatConfig,
    pub synthesis: SynthesisConfig,
    pub repair: RepairConfig,
    pub run: RunConfig,
    pub trivia: TriviaConfig,
}

impl ConvertOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
