//! Layered configuration loading for midiscope.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/midiscope/config.toml` (system)
//! 2. `~/.config/midiscope/config.toml` (user)
//! 3. `./midiscope.toml` (local override), or the path passed with `--config`
//! 4. Environment variables (`MIDISCOPE_*`)
//!
//! Each file only overrides the keys it sets.
//!
//! # Example Config
//!
//! ```toml
//! [analysis]
//! grouping_threshold_ms = 50.0
//! fallback_ppq = 480
//!
//! [telemetry]
//! log_level = "warn"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use settings::{AnalysisConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScopeConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ScopeConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` in place of `./midiscope.toml`.
    ///
    /// System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let (mut config, mut sources) = Self::load_files(&files)?;
        loader::apply_env_overrides(&mut config, &mut sources);
        Ok((config, sources))
    }

    /// Compiled defaults overlaid with `files` in order. No env overrides.
    pub fn load_files(files: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ScopeConfig::default();

        for path in files {
            loader::apply_file(&mut config, path)?;
            sources.files.push(path.clone());
        }

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Build TOML manually for nicer formatting
        let mut output = String::new();

        output.push_str("# midiscope configuration\n\n");

        output.push_str("[analysis]\n");
        output.push_str(&format!(
            "grouping_threshold_ms = {:?}\n",
            self.analysis.grouping_threshold_ms
        ));
        output.push_str(&format!("fallback_ppq = {}\n", self.analysis.fallback_ppq));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = {}\n",
            toml::Value::String(self.telemetry.log_level.clone())
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScopeConfig::default();
        assert_eq!(config.analysis.grouping_threshold_ms, 50.0);
        assert_eq!(config.analysis.fallback_ppq, 480);
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_to_toml() {
        let toml = ScopeConfig::default().to_toml();
        assert!(toml.contains("[analysis]"));
        assert!(toml.contains("grouping_threshold_ms = 50.0"));
        assert!(toml.contains("[telemetry]"));
        assert!(toml.contains("log_level = \"warn\""));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = ScopeConfig::default();
        config.analysis.grouping_threshold_ms = 12.25;
        config.telemetry.log_level = "chord_progression=debug".into();

        let reparsed: ScopeConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_to_toml_escapes_control_characters() {
        let mut config = ScopeConfig::default();
        config.telemetry.log_level = "warn\u{1b}[0m\"\\".into();

        let reparsed: ScopeConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(reparsed.telemetry.log_level, config.telemetry.log_level);
    }

    #[test]
    fn test_load_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        writeln!(
            std::fs::File::create(&first).unwrap(),
            "[analysis]\ngrouping_threshold_ms = 20\nfallback_ppq = 96"
        )
        .unwrap();
        writeln!(
            std::fs::File::create(&second).unwrap(),
            "[analysis]\ngrouping_threshold_ms = 75.0"
        )
        .unwrap();

        let (config, sources) =
            ScopeConfig::load_files(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(config.analysis.grouping_threshold_ms, 75.0);
        assert_eq!(config.analysis.fallback_ppq, 96);
        assert_eq!(sources.files, vec![first, second]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ScopeConfig::load_files(&[missing]).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("midiscope.toml");
        std::fs::write(&path, "[telemetry]\nlog_level = \"trace\"\n").unwrap();

        let (_config, sources) = ScopeConfig::load_with_sources_from(Some(&path)).unwrap();
        assert_eq!(sources.files.last(), Some(&path));
    }
}
