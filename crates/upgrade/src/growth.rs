//! Storage growth between two layout versions.

use serde::Serialize;
use slotguard_core::SlotMapping;

/// Per-version layout figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    pub contract_name: String,
    pub variable_count: usize,
    pub total_slots: u64,
    pub packed_slots: Vec<u64>,
    pub bytes_used: u64,
    pub bytes_wasted: u64,
    /// Percentage, rounded to two decimals.
    pub efficiency: f64,
}

impl LayoutSummary {
    pub fn of(mapping: &SlotMapping) -> Self {
        LayoutSummary {
            contract_name: mapping.contract_name.clone(),
            variable_count: mapping.variables.len(),
            total_slots: mapping.total_slots,
            packed_slots: mapping.packed_slots.clone(),
            bytes_used: mapping.bytes_used(),
            bytes_wasted: mapping.bytes_wasted(),
            efficiency: round2(mapping.efficiency()),
        }
    }
}

/// Deltas from v1 to v2. Negative values mean the layout shrank or improved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageGrowth {
    pub slots_added: i64,
    /// Change in allocated-but-unused bytes.
    pub bytes_wasted: i64,
    /// Percentage-point change in packing efficiency.
    pub efficiency_change: f64,
}

pub fn storage_growth(v1: &SlotMapping, v2: &SlotMapping) -> StorageGrowth {
    StorageGrowth {
        slots_added: v2.total_slots as i64 - v1.total_slots as i64,
        bytes_wasted: v2.bytes_wasted() as i64 - v1.bytes_wasted() as i64,
        efficiency_change: round2(v2.efficiency() - v1.efficiency()),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
