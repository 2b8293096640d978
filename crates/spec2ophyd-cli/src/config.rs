//! Settings file loading

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use spec2ophyd_core::DEFAULT_CONFIG_FILE;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// SPEC config file read when none is given on the command line
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// List unrecognized config lines on stderr
    #[serde(default)]
    pub show_unhandled: bool,
    /// Fail when a motor or counter line could not be parsed
    #[serde(default)]
    pub strict: bool,
}

/// What to print on stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ophyd setup statements
    #[default]
    Text,
    /// Parsed configuration as JSON
    Json,
}

/// Load settings from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Settings file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("spec2ophyd.toml")).unwrap();
        assert_eq!(config.input.path, PathBuf::from("config-8idi"));
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.output.show_unhandled);
        assert!(!config.output.strict);
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spec2ophyd.toml");
        std::fs::write(&path, "[output]\nformat = \"json\"\nstrict = true\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.input.path, PathBuf::from("config-8idi"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.strict);
        assert!(!config.output.show_unhandled);
    }

    #[test]
    fn test_load_input_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spec2ophyd.toml");
        std::fs::write(&path, "[input]\npath = \"/data/spec/config-9idc\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.input.path, PathBuf::from("/data/spec/config-9idc"));
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spec2ophyd.toml");
        std::fs::write(&path, "[output]\nformat = \"yaml\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
