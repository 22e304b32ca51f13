//! Compatibility score and risk level.

use std::fmt;

use serde::Serialize;

use super::classify::SeverityCounts;
use super::config::ScoringConfig;

/// Coarse upgrade risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompatibilityLevel {
    Safe,
    Caution,
    Unsafe,
    Critical,
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityLevel::Safe => write!(f, "SAFE"),
            CompatibilityLevel::Caution => write!(f, "CAUTION"),
            CompatibilityLevel::Unsafe => write!(f, "UNSAFE"),
            CompatibilityLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// 0-100 score with its level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compatibility {
    pub score: u8,
    pub level: CompatibilityLevel,
    pub description: String,
}

/// Score `counts` under `scoring`.
///
/// Starts at 100, subtracts the per-severity penalties and clamps at 0.
pub fn assess(counts: &SeverityCounts, scoring: &ScoringConfig) -> Compatibility {
    let penalty = counts.critical as u64 * scoring.critical_penalty as u64
        + counts.warning as u64 * scoring.warning_penalty as u64;
    let score = 100u64.saturating_sub(penalty) as u8;

    let level = if counts.critical > 0 {
        CompatibilityLevel::Critical
    } else if counts.warning > scoring.unsafe_warning_count {
        CompatibilityLevel::Unsafe
    } else if counts.warning > 0 {
        CompatibilityLevel::Caution
    } else {
        CompatibilityLevel::Safe
    };

    let description = match level {
        CompatibilityLevel::Critical => format!(
            "{} critical change(s) would corrupt existing storage",
            counts.critical
        ),
        CompatibilityLevel::Unsafe => format!(
            "{} warning(s); the upgrade is likely to cause problems",
            counts.warning
        ),
        CompatibilityLevel::Caution => format!(
            "{} warning(s); review before upgrading",
            counts.warning
        ),
        CompatibilityLevel::Safe => "Storage layout is fully compatible".to_string(),
    };

    Compatibility {
        score,
        level,
        description,
    }
}
