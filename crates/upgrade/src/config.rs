//! Upgrade analyzer configuration.
//!
//! The defaults reproduce the standard scoring: 40 points per critical
//! change, 15 per warning, `Unsafe` past two warnings, and
//! recommendations at a 10-point efficiency drop or 10 new slots.
//!
//! # Example
//!
//! ```toml
//! [scoring]
//! critical_penalty = 40
//! warning_penalty = 15
//! unsafe_warning_count = 2
//!
//! [thresholds]
//! efficiency_regression = 10.0
//! slot_growth = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors loading or validating an [`AnalyzerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full analyzer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub scoring: ScoringConfig,
    pub thresholds: ThresholdConfig,
}

/// `[scoring]`: compatibility score penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Points subtracted per critical change.
    pub critical_penalty: u32,
    /// Points subtracted per warning.
    pub warning_penalty: u32,
    /// More warnings than this (and no critical change) is `Unsafe`.
    pub unsafe_warning_count: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            critical_penalty: 40,
            warning_penalty: 15,
            unsafe_warning_count: 2,
        }
    }
}

/// `[thresholds]`: when growth metrics turn into recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Efficiency drop, in percentage points, that triggers a reorder hint.
    pub efficiency_regression: f64,
    /// Slot growth that triggers a gas-cost hint.
    pub slot_growth: i64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            efficiency_regression: 10.0,
            slot_growth: 10,
        }
    }
}

impl AnalyzerConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject penalties above 100 and negative or non-finite thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scoring.critical_penalty > 100 {
            return Err(ConfigError::Invalid(format!(
                "scoring.critical_penalty must be at most 100, got {}",
                self.scoring.critical_penalty
            )));
        }
        if self.scoring.warning_penalty > 100 {
            return Err(ConfigError::Invalid(format!(
                "scoring.warning_penalty must be at most 100, got {}",
                self.scoring.warning_penalty
            )));
        }
        if !self.thresholds.efficiency_regression.is_finite()
            || self.thresholds.efficiency_regression < 0.0
        {
            return Err(ConfigError::Invalid(format!(
                "thresholds.efficiency_regression must be a non-negative number, got {}",
                self.thresholds.efficiency_regression
            )));
        }
        if self.thresholds.slot_growth < 0 {
            return Err(ConfigError::Invalid(format!(
                "thresholds.slot_growth must be non-negative, got {}",
                self.thresholds.slot_growth
            )));
        }
        Ok(())
    }
}
