use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::record::UNKNOWN;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Immutable settings handed to the batch processor at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenameConfig {
    /// Source files must start with this (case-sensitive).
    pub prefix: String,
    /// Source files must end with this; also appended to every target name.
    pub extension: String,
    /// Substituted for any field that could not be extracted.
    pub sentinel: String,
    /// Compute and report targets without moving anything.
    pub dry_run: bool,
    pub tesseract: TesseractConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TesseractConfig {
    /// Executable used by the command-line backend.
    pub command: String,
    /// Directory holding `tessdata`; `None` lets the engine search its defaults.
    pub data_path: Option<String>,
    pub lang: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            prefix: "SCN".to_string(),
            extension: ".jpg".to_string(),
            sentinel: UNKNOWN.to_string(),
            dry_run: false,
            tesseract: TesseractConfig::default(),
        }
    }
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            data_path: None,
            lang: "eng".to_string(),
        }
    }
}

impl RenameConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.is_empty() {
            return Err(ConfigError::Invalid("extension must not be empty".into()));
        }
        if self.sentinel.is_empty() {
            return Err(ConfigError::Invalid("sentinel must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether a directory entry name belongs in the batch.
    pub fn is_eligible(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.prefix) && file_name.ends_with(&self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scanner_output() {
        let c = RenameConfig::default();
        assert_eq!(c.prefix, "SCN");
        assert_eq!(c.extension, ".jpg");
        assert_eq!(c.sentinel, "Unknown");
        assert!(!c.dry_run);
    }

    #[test]
    fn eligibility_filter() {
        let c = RenameConfig::default();
        assert!(c.is_eligible("SCN_0001.jpg"));
        assert!(!c.is_eligible("XYZ_0001.jpg"));
        assert!(!c.is_eligible("SCN_0001.png"));
        assert!(!c.is_eligible("SCN_0001.JPG"));
        assert!(!c.is_eligible("scn_0001.jpg"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = RenameConfig::from_toml("prefix = \"IMG\"\n[tesseract]\nlang = \"deu\"\n").unwrap();
        assert_eq!(c.prefix, "IMG");
        assert_eq!(c.extension, ".jpg");
        assert_eq!(c.tesseract.lang, "deu");
        assert_eq!(c.tesseract.data_path, None);
        assert_eq!(c.tesseract.command, "tesseract");
    }

    #[test]
    fn empty_extension_is_rejected() {
        let err = RenameConfig::from_toml("extension = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = RenameConfig::from_toml("prefix = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_output_reloads_identically() {
        let c = RenameConfig::default().with_dry_run(true);
        let text = c.to_toml().unwrap();
        assert_eq!(RenameConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RenameConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
