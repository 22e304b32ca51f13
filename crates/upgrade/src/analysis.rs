//! Upgrade analyzer.
//!
//! Builds on the diff engine: classifies every change, adds name-only type
//! changes, scores compatibility, measures storage growth and derives
//! recommendations. Everything is recomputed per call.

use serde::Serialize;
use slotguard_core::{calculate_slots, ContractModel, SlotMapping};
use tracing::debug;

use super::classify::{classify_report, detect_type_changes, SeverityCounts, UpgradeChange};
use super::compatibility::{assess, Compatibility, CompatibilityLevel};
use super::config::AnalyzerConfig;
use super::diff::{compare, CollisionReport};
use super::growth::{storage_growth, LayoutSummary, StorageGrowth};

/// Full result of analyzing an upgrade from `v1` to `v2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeAnalysis {
    pub v1: LayoutSummary,
    pub v2: LayoutSummary,
    pub changes: Vec<UpgradeChange>,
    pub summary: SeverityCounts,
    pub report: CollisionReport,
    pub compatibility: Compatibility,
    pub storage_growth: StorageGrowth,
    pub recommendations: Vec<String>,
}

impl UpgradeAnalysis {
    /// True when the upgrade can be deployed without corrupting state.
    pub fn is_deployable(&self) -> bool {
        self.compatibility.level != CompatibilityLevel::Critical
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} -> {}: {} (score {}/100)",
            self.v1.contract_name,
            self.v2.contract_name,
            self.compatibility.level,
            self.compatibility.score
        ));
        lines.push(format!("  {}", self.compatibility.description));
        lines.push(format!(
            "  slots {} -> {} ({:+}), efficiency {:.2}% -> {:.2}% ({:+.2} pts), wasted bytes {:+}",
            self.v1.total_slots,
            self.v2.total_slots,
            self.storage_growth.slots_added,
            self.v1.efficiency,
            self.v2.efficiency,
            self.storage_growth.efficiency_change,
            self.storage_growth.bytes_wasted
        ));
        lines.push(String::new());

        if !self.changes.is_empty() {
            lines.push(format!(
                "{} change(s): {} critical, {} warning, {} safe",
                self.summary.total(),
                self.summary.critical,
                self.summary.warning,
                self.summary.safe
            ));
            for change in &self.changes {
                lines.push(format!(
                    "  [{}] {}: {}",
                    change.severity,
                    change.kind.label(),
                    change.description
                ));
            }
            lines.push(String::new());
        }

        lines.push("Recommendations:".to_string());
        for rec in &self.recommendations {
            lines.push(format!("  - {}", rec));
        }

        lines.join("\n")
    }
}

/// Analyze an upgrade with the default configuration.
pub fn analyze(v1: &SlotMapping, v2: &SlotMapping) -> UpgradeAnalysis {
    analyze_with_config(v1, v2, &AnalyzerConfig::default())
}

/// Compute both layouts, then analyze the upgrade between them.
pub fn analyze_models(v1: &ContractModel, v2: &ContractModel) -> UpgradeAnalysis {
    analyze(&calculate_slots(v1), &calculate_slots(v2))
}

/// Analyze an upgrade from `v1` to `v2`.
pub fn analyze_with_config(
    v1: &SlotMapping,
    v2: &SlotMapping,
    config: &AnalyzerConfig,
) -> UpgradeAnalysis {
    let report = compare(v1, v2);

    let mut changes = classify_report(&report);
    changes.extend(detect_type_changes(v1, v2));

    let summary = SeverityCounts::tally(&changes);
    let compatibility = assess(&summary, &config.scoring);
    let storage_growth = storage_growth(v1, v2);
    let recommendations = recommend(&summary, &storage_growth, config);

    debug!(
        contract = %v2.contract_name,
        score = compatibility.score,
        level = %compatibility.level,
        critical = summary.critical,
        warning = summary.warning,
        "analyzed upgrade"
    );

    UpgradeAnalysis {
        v1: LayoutSummary::of(v1),
        v2: LayoutSummary::of(v2),
        changes,
        summary,
        report,
        compatibility,
        storage_growth,
        recommendations,
    }
}

/// Deterministic recommendations from the counts and growth figures.
fn recommend(
    summary: &SeverityCounts,
    growth: &StorageGrowth,
    config: &AnalyzerConfig,
) -> Vec<String> {
    let mut recs = Vec::new();

    if summary.critical > 0 {
        recs.push(format!(
            "Do not deploy this upgrade: {} critical change(s) would corrupt existing storage",
            summary.critical
        ));
        recs.push(
            "Use a new contract and migrate state instead of upgrading in place".to_string(),
        );
    }

    if summary.warning > 0 {
        recs.push(format!(
            "Test the upgrade thoroughly against a copy of production state ({} warning(s))",
            summary.warning
        ));
    }

    if growth.efficiency_change < -config.thresholds.efficiency_regression {
        recs.push(format!(
            "Packing efficiency dropped by {:.2} points; reorder variables so smaller types share slots",
            -growth.efficiency_change
        ));
    }

    if growth.slots_added > config.thresholds.slot_growth {
        recs.push(format!(
            "Storage grows by {} slots; consider the extra gas cost to callers",
            growth.slots_added
        ));
    }

    if recs.is_empty() {
        recs.push("Storage layout is compatible; the upgrade is safe to deploy".to_string());
    }

    recs
}
