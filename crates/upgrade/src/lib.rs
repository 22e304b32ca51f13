//! slotguard-upgrade: storage compatibility between contract versions.
//!
//! Two layers over [`slotguard_core::SlotMapping`]:
//!
//! - [`compare()`] -- the slot diff engine: added / removed / moved
//!   variables by `(name, type)` identity, plus cross-version byte
//!   collisions, gated into a single `safe` flag.
//! - [`analyze()`] -- the upgrade analyzer: severity per change, name-only
//!   type changes, a 0-100 compatibility score, storage growth and
//!   recommendations.
//!
//! Both are pure, synchronous and deterministic.

pub mod analysis;
pub mod classify;
pub mod compatibility;
pub mod config;
pub mod diff;
pub mod growth;

pub use analysis::{analyze, analyze_models, analyze_with_config, UpgradeAnalysis};
pub use classify::{
    classify_report, detect_type_changes, ChangeKind, Severity, SeverityCounts, UpgradeChange,
};
pub use compatibility::{assess, Compatibility, CompatibilityLevel};
pub use config::{AnalyzerConfig, ConfigError, ScoringConfig, ThresholdConfig};
pub use diff::{compare, ByteRange, Collision, CollisionKind, CollisionReport, MovedVariable};
pub use growth::{storage_growth, LayoutSummary, StorageGrowth};
