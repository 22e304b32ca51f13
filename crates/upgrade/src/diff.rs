//! Slot diff engine.
//!
//! Compares two layouts of the same contract and reports, by `(name, type)`
//! identity, which variables were added, removed or moved, plus every byte
//! range that a materially different variable now occupies.
//!
//! Additions and removals alone never make an upgrade unsafe: removed
//! variables leave dead but intact bytes, and appended variables land in
//! previously unused slots. Only movement and true overlap corrupt data.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use slotguard_core::{SlotMapping, StorageVariable, VariableKey, SLOT_SIZE};
use tracing::debug;

/// Half-open byte range `[start, end)` within a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: u8,
    pub end: u8,
}

impl ByteRange {
    pub fn len(&self) -> u8 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Why two variables collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionKind {
    /// A differently named variable now occupies the bytes.
    DifferentVariable,
    /// The same name was redeclared with another type over the bytes.
    TypeMismatch,
}

/// Overlapping byte ranges of two different variables across versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collision {
    pub slot: u64,
    /// Occupant in the old layout.
    pub previous: StorageVariable,
    /// Occupant in the new layout.
    pub current: StorageVariable,
    pub overlap: ByteRange,
    pub kind: CollisionKind,
    pub reason: String,
}

/// A variable present in both versions at different coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovedVariable {
    pub previous: StorageVariable,
    pub current: StorageVariable,
}

/// Result of comparing two layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionReport {
    pub contract: String,
    pub collisions: Vec<Collision>,
    pub moved: Vec<MovedVariable>,
    pub added: Vec<StorageVariable>,
    pub removed: Vec<StorageVariable>,
    /// False iff anything moved or collided.
    pub safe: bool,
}

impl CollisionReport {
    /// True when no variable was added, removed, moved or collided.
    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
            && self.moved.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{}: {} ({} collision(s), {} moved, {} added, {} removed)",
            self.contract,
            if self.safe { "SAFE" } else { "UNSAFE" },
            self.collisions.len(),
            self.moved.len(),
            self.added.len(),
            self.removed.len()
        ));

        for c in &self.collisions {
            lines.push(format!(
                "  ! slot {} bytes {}..{}: {}",
                c.slot, c.overlap.start, c.overlap.end, c.reason
            ));
        }
        for m in &self.moved {
            lines.push(format!(
                "  ~ {} {}: slot {} offset {} -> slot {} offset {}",
                m.current.type_name,
                m.current.name,
                m.previous.slot,
                m.previous.offset,
                m.current.slot,
                m.current.offset
            ));
        }
        for v in &self.added {
            lines.push(format!(
                "  + {} {} at slot {} offset {}",
                v.type_name, v.name, v.slot, v.offset
            ));
        }
        for v in &self.removed {
            lines.push(format!(
                "  - {} {} at slot {} offset {}",
                v.type_name, v.name, v.slot, v.offset
            ));
        }

        lines.join("\n")
    }
}

/// Identity key plus its occurrence number among equal keys.
///
/// A repeated `(name, type)` pairs with the same repeat in the other
/// version, so the n-th copy is only ever matched with the n-th copy.
type Identity = (VariableKey, usize);

/// Identity of every variable, in declaration order.
fn identify(mapping: &SlotMapping) -> Vec<(Identity, &StorageVariable)> {
    let mut seen: BTreeMap<VariableKey, usize> = BTreeMap::new();
    mapping
        .variables
        .iter()
        .map(|v| {
            let key = v.key();
            let counter = seen.entry(key.clone()).or_insert(0);
            let nth = *counter;
            *counter += 1;
            ((key, nth), v)
        })
        .collect()
}

/// Compare two layouts of a contract.
///
/// Pure and total; `compare(m, m)` is always safe with every list empty.
pub fn compare(old: &SlotMapping, new: &SlotMapping) -> CollisionReport {
    let old_ids = identify(old);
    let new_ids = identify(new);
    let old_index: BTreeMap<&Identity, &StorageVariable> =
        old_ids.iter().map(|(id, v)| (id, *v)).collect();
    let new_index: BTreeSet<&Identity> = new_ids.iter().map(|(id, _)| id).collect();

    // Removed: in old only, reported in old declaration order.
    let removed: Vec<StorageVariable> = old_ids
        .iter()
        .filter(|(id, _)| !new_index.contains(id))
        .map(|(_, v)| (*v).clone())
        .collect();

    // Added and moved: reported in new declaration order.
    let mut added = Vec::new();
    let mut moved = Vec::new();
    let mut moved_ids: BTreeSet<&Identity> = BTreeSet::new();
    for (id, current) in &new_ids {
        match old_index.get(id) {
            None => added.push((*current).clone()),
            Some(previous) if !previous.same_position(current) => {
                moved.push(MovedVariable {
                    previous: (*previous).clone(),
                    current: (*current).clone(),
                });
                moved_ids.insert(id);
            }
            Some(_) => {}
        }
    }

    let collisions = find_collisions(&old_ids, &new_ids, &moved_ids);
    let safe = moved.is_empty() && collisions.is_empty();

    debug!(
        contract = %new.contract_name,
        collisions = collisions.len(),
        moved = moved.len(),
        added = added.len(),
        removed = removed.len(),
        safe,
        "compared storage layouts"
    );

    CollisionReport {
        contract: new.contract_name.clone(),
        collisions,
        moved,
        added,
        removed,
        safe,
    }
}

/// Group identified variables by slot, keeping declaration order per slot.
fn by_slot<'a>(
    ids: &'a [(Identity, &'a StorageVariable)],
) -> BTreeMap<u64, Vec<&'a (Identity, &'a StorageVariable)>> {
    let mut slots: BTreeMap<u64, Vec<_>> = BTreeMap::new();
    for entry in ids {
        slots.entry(entry.1.slot).or_default().push(entry);
    }
    slots
}

/// Cross-version overlap scan, slot by slot.
///
/// Pairs involving a moved variable are skipped: its old footprint is
/// expected to be vacated and is already reported as a move.
fn find_collisions(
    old_ids: &[(Identity, &StorageVariable)],
    new_ids: &[(Identity, &StorageVariable)],
    moved_ids: &BTreeSet<&Identity>,
) -> Vec<Collision> {
    let old_slots = by_slot(old_ids);
    let new_slots = by_slot(new_ids);

    let mut collisions = Vec::new();
    for (slot, previous_occupants) in &old_slots {
        let Some(current_occupants) = new_slots.get(slot) else {
            continue;
        };

        for (previous_id, previous) in previous_occupants.iter().copied() {
            if moved_ids.contains(previous_id) {
                continue;
            }
            for (current_id, current) in current_occupants.iter().copied() {
                if moved_ids.contains(current_id) || previous_id == current_id {
                    continue;
                }
                if !previous.overlaps(current) {
                    continue;
                }
                collisions.push(build_collision(*slot, previous, current));
            }
        }
    }
    collisions
}

fn build_collision(slot: u64, previous: &StorageVariable, current: &StorageVariable) -> Collision {
    // Bytes past the slot boundary are not part of this slot.
    let end = previous.end().min(current.end()).min(SLOT_SIZE as u16);
    let overlap = ByteRange {
        start: previous.offset.max(current.offset),
        end: end as u8,
    };

    let (kind, reason) = if previous.name == current.name {
        (
            CollisionKind::TypeMismatch,
            format!(
                "'{}' changed type from {} to {} over the same bytes",
                current.name, previous.type_name, current.type_name
            ),
        )
    } else {
        (
            CollisionKind::DifferentVariable,
            format!(
                "{} {} now occupies bytes previously held by {} {}",
                current.type_name, current.name, previous.type_name, previous.name
            ),
        )
    };

    Collision {
        slot,
        previous: previous.clone(),
        current: current.clone(),
        overlap,
        kind,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotguard_core::{calculate_slots, ContractModel};

    fn layout(vars: &[(&str, &str)]) -> SlotMapping {
        let model = vars
            .iter()
            .fold(ContractModel::new("Vault"), |c, (name, ty)| {
                c.with_variable(name, ty)
            });
        calculate_slots(&model)
    }

    #[test]
    fn identical_layouts_are_safe_and_empty() {
        let m = layout(&[("owner", "address"), ("paused", "bool"), ("value", "uint256")]);
        let report = compare(&m, &m);
        assert!(report.safe);
        assert!(report.is_empty());
    }

    #[test]
    fn empty_layouts_compare_cleanly() {
        let report = compare(&SlotMapping::empty("A"), &SlotMapping::empty("A"));
        assert!(report.safe);
        assert!(report.is_empty());
    }

    #[test]
    fn swapped_variables_are_moved() {
        let v1 = layout(&[("owner", "address"), ("value", "uint256")]);
        let v2 = layout(&[("value", "uint256"), ("owner", "address")]);
        let report = compare(&v1, &v2);
        assert_eq!(report.moved.len(), 2);
        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
        // Both occupants of each slot are moved, so no collision is reported.
        assert!(report.collisions.is_empty());
        assert!(!report.safe);
        assert_eq!(report.moved[0].current.name, "value");
        assert_eq!(report.moved[0].previous.slot, 1);
        assert_eq!(report.moved[0].current.slot, 0);
    }

    #[test]
    fn appended_variable_is_added_and_safe() {
        let v1 = layout(&[("owner", "address"), ("value", "uint256")]);
        let v2 = layout(&[("owner", "address"), ("value", "uint256"), ("newVar", "uint256")]);
        let report = compare(&v1, &v2);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].name, "newVar");
        assert!(report.moved.is_empty());
        assert!(report.collisions.is_empty());
        assert!(report.safe);
    }

    #[test]
    fn removal_alone_is_safe() {
        let v1 = layout(&[("owner", "address"), ("value", "uint256"), ("legacy", "uint256")]);
        let v2 = layout(&[("owner", "address"), ("value", "uint256")]);
        let report = compare(&v1, &v2);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].name, "legacy");
        assert!(report.safe);
    }

    #[test]
    fn inserted_variable_shifts_later_ones() {
        let v1 = layout(&[("owner", "address"), ("value", "uint256")]);
        let v2 = layout(&[("owner", "address"), ("fee", "uint256"), ("value", "uint256")]);
        let report = compare(&v1, &v2);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.moved[0].current.name, "value");
        // `fee` takes slot 1 from `value`, which moved: skipped, not a collision.
        assert!(report.collisions.is_empty());
        assert!(!report.safe);
    }

    #[test]
    fn replacing_a_variable_in_place_collides() {
        let v1 = layout(&[("owner", "address"), ("value", "uint256")]);
        let v2 = layout(&[("owner", "address"), ("price", "uint256")]);
        let report = compare(&v1, &v2);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.collisions.len(), 1);
        let c = &report.collisions[0];
        assert_eq!(c.slot, 1);
        assert_eq!(c.kind, CollisionKind::DifferentVariable);
        assert_eq!(c.overlap, ByteRange { start: 0, end: 32 });
        assert_eq!(
            c.reason,
            "uint256 price now occupies bytes previously held by uint256 value"
        );
        assert!(!report.safe);
    }

    #[test]
    fn same_name_new_type_is_a_type_mismatch() {
        let v1 = layout(&[("owner", "address"), ("value", "uint256")]);
        let v2 = layout(&[("owner", "address"), ("value", "int256")]);
        let report = compare(&v1, &v2);
        // Different identity: one removed, one added, overlapping in slot 1.
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].kind, CollisionKind::TypeMismatch);
        assert!(report.collisions[0].reason.contains("changed type from uint256 to int256"));
    }

    #[test]
    fn partial_overlap_within_packed_slot() {
        // v1: a(uint128) @0..16, b(uint128) @16..32
        // v2: a(uint128) @0..16, c(uint64) @16..24, d(uint64) @24..32
        let v1 = layout(&[("a", "uint128"), ("b", "uint128")]);
        let v2 = layout(&[("a", "uint128"), ("c", "uint64"), ("d", "uint64")]);
        let report = compare(&v1, &v2);
        assert_eq!(report.collisions.len(), 2);
        assert_eq!(report.collisions[0].current.name, "c");
        assert_eq!(report.collisions[0].overlap, ByteRange { start: 16, end: 24 });
        assert_eq!(report.collisions[1].current.name, "d");
        assert_eq!(report.collisions[1].overlap, ByteRange { start: 24, end: 32 });
        assert_eq!(report.collisions[1].overlap.len(), 8);
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        // `b` removed from bytes 20..21; `c` added at bytes 20..21 would overlap,
        // but here `c` is placed after `b`'s old range.
        let v1 = layout(&[("a", "address"), ("b", "bool")]);
        let v2 = layout(&[("a", "address"), ("b", "bool"), ("c", "uint8")]);
        let report = compare(&v1, &v2);
        assert!(report.collisions.is_empty());
        assert_eq!(report.added[0].offset, 21);
        assert!(report.safe);
    }

    #[test]
    fn report_names_the_new_contract_and_serializes() {
        let v1 = layout(&[("a", "uint256")]);
        let mut v2 = layout(&[("a", "uint256")]);
        v2.contract_name = "VaultV2".to_string();
        let report = compare(&v1, &v2);
        assert_eq!(report.contract, "VaultV2");
        let json = report.to_json();
        assert_eq!(json["safe"], true);
        assert!(json["collisions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn text_summary_marks_each_change() {
        let v1 = layout(&[("owner", "address"), ("value", "uint256")]);
        let v2 = layout(&[("owner", "address"), ("price", "uint256")]);
        let text = compare(&v1, &v2).to_text();
        assert!(text.starts_with("Vault: UNSAFE (1 collision(s), 0 moved, 1 added, 1 removed)"));
        assert!(text.contains("  ! slot 1 bytes 0..32:"));
        assert!(text.contains("  + uint256 price at slot 1 offset 0"));
        assert!(text.contains("  - uint256 value at slot 1 offset 0"));
    }

    fn placed(name: &str, type_name: &str, slot: u64, offset: u8, size: u8) -> StorageVariable {
        StorageVariable {
            name: name.to_string(),
            type_name: type_name.to_string(),
            slot,
            offset,
            size,
            is_state_variable: true,
            packed: size < 32,
        }
    }

    fn mapping(variables: Vec<StorageVariable>) -> SlotMapping {
        SlotMapping {
            contract_name: "Patched".to_string(),
            total_slots: variables.iter().map(|v| v.slot + 1).max().unwrap_or(0),
            packed_slots: Vec::new(),
            variables,
        }
    }

    #[test]
    fn repeated_identity_compared_with_itself_is_safe() {
        let m = layout(&[("x", "uint256"), ("x", "uint256"), ("flag", "bool")]);
        let report = compare(&m, &m);
        assert!(report.safe);
        assert!(report.is_empty());
    }

    #[test]
    fn repeated_identity_matches_by_occurrence() {
        let v1 = layout(&[("x", "uint256"), ("x", "uint256")]);
        let v2 = layout(&[("x", "uint256")]);
        let report = compare(&v1, &v2);
        assert!(report.moved.is_empty());
        assert!(report.collisions.is_empty());
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].slot, 1);
        assert!(report.safe);
    }

    #[test]
    fn type_spelling_changes_are_not_changes() {
        let v1 = layout(&[("total", "uint"), ("balances", "mapping (address => uint)")]);
        let v2 = layout(&[("total", "uint256"), ("balances", "mapping(address=>uint256)")]);
        let report = compare(&v1, &v2);
        assert!(report.safe);
        assert!(report.is_empty());
    }

    #[test]
    fn overlap_is_clipped_to_the_slot() {
        // `limit` runs past the slot end in a hand-built mapping
        let v1 = mapping(vec![placed("limit", "uint128", 0, 20, 16)]);
        let v2 = mapping(vec![placed("cap", "uint64", 0, 24, 8)]);
        let report = compare(&v1, &v2);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].overlap, ByteRange { start: 24, end: 32 });
        assert_eq!(report.collisions[0].overlap.len(), 8);
    }

    #[test]
    fn out_of_range_offsets_do_not_panic() {
        let v1 = mapping(vec![placed("a", "uint256", 0, 250, 32)]);
        let v2 = mapping(vec![placed("b", "uint256", 0, 250, 32)]);
        let report = compare(&v1, &v2);
        assert_eq!(report.collisions.len(), 1);
        let overlap = report.collisions[0].overlap;
        assert_eq!(overlap.len(), 0);
        assert!(overlap.is_empty());
    }
}
