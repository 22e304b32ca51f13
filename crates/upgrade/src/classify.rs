//! Severity classification of layout changes.
//!
//! Turns a [`CollisionReport`] into a flat list of [`UpgradeChange`]s and
//! adds the name-only type-change signal. The two signals are independent:
//! a variable whose type changes is one removal plus one addition to the
//! diff engine (different identity), and a `TypeChanged` entry here.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use slotguard_core::{canonical_type_name, SlotMapping, StorageVariable};

use super::diff::{Collision, CollisionReport};

/// How dangerous a change is to existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Safe,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Safe => write!(f, "SAFE"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// What changed, with the variables involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeKind {
    Added {
        variable: StorageVariable,
    },
    Removed {
        variable: StorageVariable,
    },
    Moved {
        previous: StorageVariable,
        current: StorageVariable,
    },
    TypeChanged {
        previous: StorageVariable,
        current: StorageVariable,
    },
    Collision {
        collision: Collision,
    },
}

impl ChangeKind {
    /// The variable as it exists after the upgrade (or before, if removed).
    pub fn variable(&self) -> &StorageVariable {
        match self {
            ChangeKind::Added { variable } | ChangeKind::Removed { variable } => variable,
            ChangeKind::Moved { current, .. } | ChangeKind::TypeChanged { current, .. } => current,
            ChangeKind::Collision { collision } => &collision.current,
        }
    }

    /// Short label for text output.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Added { .. } => "added",
            ChangeKind::Removed { .. } => "removed",
            ChangeKind::Moved { .. } => "moved",
            ChangeKind::TypeChanged { .. } => "type changed",
            ChangeKind::Collision { .. } => "collision",
        }
    }
}

/// A single classified change between two layout versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeChange {
    #[serde(flatten)]
    pub kind: ChangeKind,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

/// Counts of changes per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub safe: usize,
}

impl SeverityCounts {
    pub fn tally(changes: &[UpgradeChange]) -> Self {
        let mut counts = SeverityCounts::default();
        for change in changes {
            match change.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Safe => counts.safe += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.safe
    }
}

/// Translate a diff report into classified changes.
///
/// Collisions and moves are critical, removals are warnings, additions are
/// safe. Output order: collisions, moved, removed, added.
pub fn classify_report(report: &CollisionReport) -> Vec<UpgradeChange> {
    let mut changes = Vec::with_capacity(
        report.collisions.len() + report.moved.len() + report.removed.len() + report.added.len(),
    );

    for collision in &report.collisions {
        changes.push(UpgradeChange {
            severity: Severity::Critical,
            description: format!("Storage collision at slot {}: {}", collision.slot, collision.reason),
            recommendation: format!(
                "Restore {} {} at slot {} offset {} and declare new variables after all existing ones",
                collision.previous.type_name,
                collision.previous.name,
                collision.previous.slot,
                collision.previous.offset
            ),
            kind: ChangeKind::Collision {
                collision: collision.clone(),
            },
        });
    }

    for moved in &report.moved {
        changes.push(UpgradeChange {
            severity: Severity::Critical,
            description: format!(
                "'{}' moved from slot {} offset {} to slot {} offset {}",
                moved.current.name,
                moved.previous.slot,
                moved.previous.offset,
                moved.current.slot,
                moved.current.offset
            ),
            recommendation: format!(
                "Keep '{}' at its original position; reordering or inserting declarations shifts existing state",
                moved.current.name
            ),
            kind: ChangeKind::Moved {
                previous: moved.previous.clone(),
                current: moved.current.clone(),
            },
        });
    }

    for variable in &report.removed {
        changes.push(UpgradeChange {
            severity: Severity::Warning,
            description: format!(
                "'{}' ({}) was removed; slot {} offset {} is left holding stale data",
                variable.name, variable.type_name, variable.slot, variable.offset
            ),
            recommendation: format!(
                "Keep a placeholder for '{}' (e.g. a deprecated gap variable) so the slot is not reused",
                variable.name
            ),
            kind: ChangeKind::Removed {
                variable: variable.clone(),
            },
        });
    }

    for variable in &report.added {
        changes.push(UpgradeChange {
            severity: Severity::Safe,
            description: format!(
                "'{}' ({}) added at slot {} offset {}",
                variable.name, variable.type_name, variable.slot, variable.offset
            ),
            recommendation: "Initialize the new variable explicitly after upgrading".to_string(),
            kind: ChangeKind::Added {
                variable: variable.clone(),
            },
        });
    }

    changes
}

/// Name-only comparison: every variable present in both versions whose
/// declared type differs, regardless of where it is stored. A repeated
/// name is paired by occurrence; types are compared in canonical form.
///
/// Reported in new declaration order.
pub fn detect_type_changes(v1: &SlotMapping, v2: &SlotMapping) -> Vec<UpgradeChange> {
    let previous_by_name: BTreeMap<(&str, usize), &StorageVariable> = by_name_occurrence(v1)
        .into_iter()
        .zip(&v1.variables)
        .collect();

    by_name_occurrence(v2)
        .into_iter()
        .zip(&v2.variables)
        .filter_map(|(id, current)| {
            let previous = previous_by_name.get(&id)?;
            let same = canonical_type_name(&previous.type_name)
                == canonical_type_name(&current.type_name);
            if same {
                return None;
            }
            Some(UpgradeChange {
                severity: Severity::Critical,
                description: format!(
                    "'{}' changed type from {} to {}; existing bytes will be reinterpreted",
                    current.name, previous.type_name, current.type_name
                ),
                recommendation: format!(
                    "Keep '{}' as {} and introduce a new variable for the {} value",
                    current.name, previous.type_name, current.type_name
                ),
                kind: ChangeKind::TypeChanged {
                    previous: (*previous).clone(),
                    current: current.clone(),
                },
            })
        })
        .collect()
}

/// `(name, n)` for the n-th declaration of each name, in declaration order.
fn by_name_occurrence(mapping: &SlotMapping) -> Vec<(&str, usize)> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    mapping
        .variables
        .iter()
        .map(|v| {
            let counter = seen.entry(v.name.as_str()).or_insert(0);
            let nth = *counter;
            *counter += 1;
            (v.name.as_str(), nth)
        })
        .collect()
}
