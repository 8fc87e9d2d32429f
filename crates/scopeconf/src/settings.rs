//! Configuration sections and their compiled defaults.

use serde::{Deserialize, Serialize};

/// Chord and timing analysis knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Max gap between consecutive notes of one chord.
    /// Default: 50.0
    #[serde(default = "AnalysisConfig::default_grouping_threshold_ms")]
    pub grouping_threshold_ms: f64,

    /// PPQ used for SMPTE-timed files or a declared PPQ of zero.
    /// Default: 480
    #[serde(default = "AnalysisConfig::default_fallback_ppq")]
    pub fallback_ppq: u16,
}

impl AnalysisConfig {
    fn default_grouping_threshold_ms() -> f64 {
        50.0
    }

    fn default_fallback_ppq() -> u16 {
        480
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grouping_threshold_ms: Self::default_grouping_threshold_ms(),
            fallback_ppq: Self::default_fallback_ppq(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    /// Default: warn
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
