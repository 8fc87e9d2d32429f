//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ScopeConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

pub const ENV_GROUPING_THRESHOLD_MS: &str = "MIDISCOPE_GROUPING_THRESHOLD_MS";
pub const ENV_FALLBACK_PPQ: &str = "MIDISCOPE_FALLBACK_PPQ";
pub const ENV_LOG_LEVEL: &str = "MIDISCOPE_LOG_LEVEL";

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// A CLI path replaces `./midiscope.toml` and is returned even when missing,
/// so that loading it reports the error.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/midiscope/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config on Linux
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("midiscope/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("midiscope.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and apply the keys it sets on top of `config`.
pub fn apply_file(config: &mut ScopeConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Apply the keys present in `contents`; absent keys keep their current value.
pub(crate) fn apply_toml(config: &mut ScopeConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_error(e.to_string()))?;

    if let Some(analysis) = table.get("analysis").and_then(|v| v.as_table()) {
        if let Some(v) = analysis.get("grouping_threshold_ms") {
            config.analysis.grouping_threshold_ms = v
                .as_float()
                .or_else(|| v.as_integer().map(|i| i as f64))
                .filter(|ms| ms.is_finite() && *ms >= 0.0)
                .ok_or_else(|| {
                    parse_error(format!(
                        "analysis.grouping_threshold_ms must be a non-negative number, got {v}"
                    ))
                })?;
        }
        if let Some(v) = analysis.get("fallback_ppq") {
            config.analysis.fallback_ppq = v
                .as_integer()
                .and_then(|i| u16::try_from(i).ok())
                .filter(|ppq| *ppq > 0)
                .ok_or_else(|| {
                    parse_error(format!("analysis.fallback_ppq must be in 1..=65535, got {v}"))
                })?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level") {
            config.telemetry.log_level = v
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| parse_error(format!("telemetry.log_level must be a string, got {v}")))?;
        }
    }

    Ok(())
}

/// Apply `MIDISCOPE_*` environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ScopeConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Overrides read through `lookup`; unparseable values are ignored.
pub(crate) fn apply_overrides_from(
    config: &mut ScopeConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup(ENV_GROUPING_THRESHOLD_MS) {
        if let Ok(ms) = v.parse::<f64>() {
            if ms.is_finite() && ms >= 0.0 {
                config.analysis.grouping_threshold_ms = ms;
                sources.env_overrides.push(ENV_GROUPING_THRESHOLD_MS.to_string());
            }
        }
    }
    if let Some(v) = lookup(ENV_FALLBACK_PPQ) {
        if let Ok(ppq) = v.parse::<u16>() {
            if ppq > 0 {
                config.analysis.fallback_ppq = ppq;
                sources.env_overrides.push(ENV_FALLBACK_PPQ.to_string());
            }
        }
    }
    if let Some(v) = lookup(ENV_LOG_LEVEL) {
        config.telemetry.log_level = v;
        sources.env_overrides.push(ENV_LOG_LEVEL.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(toml: &str) -> Result<ScopeConfig, ConfigError> {
        let mut config = ScopeConfig::default();
        apply_toml(&mut config, toml, Path::new("test.toml"))?;
        Ok(config)
    }

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_cli_path_is_kept_even_if_missing() {
        let missing = Path::new("/definitely/not/here/midiscope.toml");
        let files = discover_config_files_with_override(Some(missing));
        assert_eq!(files.last().map(PathBuf::as_path), Some(missing));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = parse("[analysis]\nfallback_ppq = 96\n").unwrap();
        assert_eq!(config.analysis.fallback_ppq, 96);
        // Other values should be defaults
        assert_eq!(config.analysis.grouping_threshold_ms, 50.0);
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[analysis]
grouping_threshold_ms = 35.5
fallback_ppq = 960

[telemetry]
log_level = "debug"
"#;
        let config = parse(toml).unwrap();
        assert_eq!(config.analysis.grouping_threshold_ms, 35.5);
        assert_eq!(config.analysis.fallback_ppq, 960);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_integer_threshold_is_accepted() {
        let config = parse("[analysis]\ngrouping_threshold_ms = 80\n").unwrap();
        assert_eq!(config.analysis.grouping_threshold_ms, 80.0);
    }

    #[test]
    fn test_layers_only_touch_keys_they_set() {
        let mut config = ScopeConfig::default();
        apply_toml(&mut config, "[analysis]\nfallback_ppq = 96\n", Path::new("a.toml")).unwrap();
        apply_toml(&mut config, "[telemetry]\nlog_level = \"info\"\n", Path::new("b.toml")).unwrap();
        assert_eq!(config.analysis.fallback_ppq, 96);
        assert_eq!(config.telemetry.log_level, "info");

        // Setting a key back to its default value still wins
        apply_toml(&mut config, "[analysis]\nfallback_ppq = 480\n", Path::new("c.toml")).unwrap();
        assert_eq!(config.analysis.fallback_ppq, 480);
    }

    #[test]
    fn test_invalid_values_are_parse_errors() {
        for bad in [
            "[analysis]\nfallback_ppq = 0\n",
            "[analysis]\nfallback_ppq = 70000\n",
            "[analysis]\ngrouping_threshold_ms = -1.0\n",
            "[analysis]\ngrouping_threshold_ms = \"fast\"\n",
            "[telemetry]\nlog_level = 3\n",
            "not toml at all [",
        ] {
            let err = parse(bad).unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }), "{bad:?} gave {err}");
        }
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_GROUPING_THRESHOLD_MS, "12.5"),
            (ENV_FALLBACK_PPQ, "not a number"),
            (ENV_LOG_LEVEL, "midi_events=debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ScopeConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(&mut config, &mut sources, |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.analysis.grouping_threshold_ms, 12.5);
        assert_eq!(config.analysis.fallback_ppq, 480);
        assert_eq!(config.telemetry.log_level, "midi_events=debug");
        assert_eq!(
            sources.env_overrides,
            vec![ENV_GROUPING_THRESHOLD_MS.to_string(), ENV_LOG_LEVEL.to_string()]
        );
    }
}
