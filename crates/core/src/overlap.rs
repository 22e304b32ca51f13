//! Sanity check for a single layout.
//!
//! The calculator never produces a slot holding more than 32 bytes, so on
//! its output this finds nothing. It exists for mappings that were built or
//! edited by hand (imported JSON, test fixtures), where a slot can be
//! overfilled or a variable can run past the end of its slot.

use serde::Serialize;

use crate::layout::{SlotMapping, StorageVariable};
use crate::types::SLOT_SIZE;

/// A slot whose occupants do not fit in 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotOverfill {
    pub slot: u64,
    pub occupants: Vec<StorageVariable>,
    /// Sum of occupant sizes.
    pub total_bytes: u32,
    /// Occupants whose `offset + size` passes the slot boundary.
    pub overruns: Vec<String>,
}

/// Report every overfilled slot of `mapping`, ascending by slot.
pub fn find_overfilled_slots(mapping: &SlotMapping) -> Vec<SlotOverfill> {
    let mut findings = Vec::new();

    for (slot, occupants) in mapping.occupancy() {
        let total_bytes: u32 = occupants.iter().map(|v| v.size as u32).sum();
        let overruns: Vec<String> = occupants
            .iter()
            .filter(|v| v.end() > SLOT_SIZE as u16)
            .map(|v| v.name.clone())
            .collect();

        if total_bytes > SLOT_SIZE as u32 || !overruns.is_empty() {
            tracing::debug!(
                contract = %mapping.contract_name,
                slot,
                total_bytes,
                "slot is overfilled"
            );
            findings.push(SlotOverfill {
                slot,
                occupants: occupants.into_iter().cloned().collect(),
                total_bytes,
                overruns,
            });
        }
    }

    findings
}
