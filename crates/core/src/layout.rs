//! Layout calculator: assigns declared variables to (slot, offset, size).
//!
//! Variables are placed in declaration order with a running cursor. A
//! variable that does not fit in the remainder of the current slot starts
//! a fresh one; nothing ever spans two slots. Variables are never
//! reordered, so packing quality depends entirely on declaration order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::ContractModel;
use crate::types::{canonical_type_name, SolType, SLOT_SIZE};

/// A variable with its assigned storage coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub slot: u64,
    /// Byte offset within the slot (0..=31).
    pub offset: u8,
    /// Size in bytes (1..=32).
    pub size: u8,
    pub is_state_variable: bool,
    /// Shares its slot, or leaves part of it unused.
    pub packed: bool,
}

impl StorageVariable {
    /// Identity used when matching variables across versions.
    ///
    /// The type part is canonical, so `uint` and `uint256` are one identity.
    pub fn key(&self) -> VariableKey {
        VariableKey {
            name: self.name.clone(),
            type_name: canonical_type_name(&self.type_name),
        }
    }

    /// Exclusive end of the variable's byte range within its slot.
    pub fn end(&self) -> u16 {
        self.offset as u16 + self.size as u16
    }

    /// Whether `self` and `other` share at least one byte of the same slot.
    pub fn overlaps(&self, other: &StorageVariable) -> bool {
        self.slot == other.slot
            && (self.offset as u16) < other.end()
            && (other.offset as u16) < self.end()
    }

    /// Same storage coordinates.
    pub fn same_position(&self, other: &StorageVariable) -> bool {
        self.slot == other.slot && self.offset == other.offset
    }
}

/// Cross-version identity of a variable: name and canonical type.
///
/// A variable whose type changes is a different entity under this key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableKey {
    pub name: String,
    pub type_name: String,
}

impl std::fmt::Display for VariableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.name, self.type_name)
    }
}

/// The storage layout of one contract version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotMapping {
    pub contract_name: String,
    /// In declaration order, not slot order.
    pub variables: Vec<StorageVariable>,
    pub total_slots: u64,
    /// Slots holding more than one variable, ascending.
    pub packed_slots: Vec<u64>,
}

impl SlotMapping {
    /// An empty layout for `contract_name`.
    pub fn empty(contract_name: impl Into<String>) -> Self {
        SlotMapping {
            contract_name: contract_name.into(),
            variables: Vec::new(),
            total_slots: 0,
            packed_slots: Vec::new(),
        }
    }

    /// Slot index to occupants. Occupants keep declaration order.
    pub fn occupancy(&self) -> BTreeMap<u64, Vec<&StorageVariable>> {
        let mut slots: BTreeMap<u64, Vec<&StorageVariable>> = BTreeMap::new();
        for var in &self.variables {
            slots.entry(var.slot).or_default().push(var);
        }
        slots
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&StorageVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Bytes actually holding variable data.
    pub fn bytes_used(&self) -> u64 {
        self.variables.iter().map(|v| v.size as u64).sum()
    }

    /// Bytes reserved by the slots the layout touches.
    pub fn bytes_allocated(&self) -> u64 {
        self.total_slots * SLOT_SIZE as u64
    }

    /// Allocated but unused bytes.
    pub fn bytes_wasted(&self) -> u64 {
        self.bytes_allocated().saturating_sub(self.bytes_used())
    }

    /// Packing efficiency as a percentage (0 for an empty layout).
    pub fn efficiency(&self) -> f64 {
        let allocated = self.bytes_allocated();
        if allocated == 0 {
            return 0.0;
        }
        self.bytes_used() as f64 / allocated as f64 * 100.0
    }
}

/// Compute the storage layout of `contract`.
///
/// Total and deterministic: unknown types are sized at a full slot and an
/// empty contract yields an empty mapping. Constant and immutable
/// declarations are skipped.
pub fn calculate_slots(contract: &ContractModel) -> SlotMapping {
    let mut variables = Vec::with_capacity(contract.variables.len());
    let mut slot: u64 = 0;
    let mut offset: u8 = 0;

    for declared in &contract.variables {
        if !declared.occupies_storage() {
            trace!(
                contract = %contract.name,
                variable = %declared.name,
                "skipping constant/immutable declaration"
            );
            continue;
        }

        let ty = SolType::parse(&declared.type_name);
        if ty.is_unknown() {
            debug!(
                contract = %contract.name,
                variable = %declared.name,
                type_name = %declared.type_name,
                "unrecognised type, assuming a full slot"
            );
        }
        let size = ty.size();

        if offset as u16 + size as u16 > SLOT_SIZE as u16 {
            slot += 1;
            offset = 0;
        }

        let packed = offset > 0 || size < SLOT_SIZE;
        trace!(variable = %declared.name, slot, offset, size, "placed variable");
        variables.push(StorageVariable {
            name: declared.name.clone(),
            type_name: declared.type_name.clone(),
            slot,
            offset,
            size,
            is_state_variable: true,
            packed,
        });

        offset += size;
        if offset >= SLOT_SIZE {
            slot += 1;
            offset = 0;
        }
    }

    let total_slots = variables.iter().map(|v| v.slot + 1).max().unwrap_or(0);
    let mut mapping = SlotMapping {
        contract_name: contract.name.clone(),
        variables,
        total_slots,
        packed_slots: Vec::new(),
    };
    mapping.packed_slots = mapping
        .occupancy()
        .into_iter()
        .filter(|(_, occupants)| occupants.len() > 1)
        .map(|(slot, _)| slot)
        .collect();

    debug!(
        contract = %mapping.contract_name,
        variables = mapping.variables.len(),
        total_slots = mapping.total_slots,
        packed_slots = mapping.packed_slots.len(),
        "calculated storage layout"
    );
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeclaredVariable;

    fn contract(vars: &[(&str, &str)]) -> ContractModel {
        vars.iter()
            .fold(ContractModel::new("Test"), |c, (name, ty)| {
                c.with_variable(name, ty)
            })
    }

    #[test]
    fn packs_small_values_after_full_slot() {
        let mapping = calculate_slots(&contract(&[
            ("value", "uint256"),
            ("owner", "address"),
            ("isActive", "bool"),
            ("smallNumber", "uint8"),
        ]));

        let coords: Vec<(&str, u64, u8, u8)> = mapping
            .variables
            .iter()
            .map(|v| (v.name.as_str(), v.slot, v.offset, v.size))
            .collect();
        assert_eq!(
            coords,
            vec![
                ("value", 0, 0, 32),
                ("owner", 1, 0, 20),
                ("isActive", 1, 20, 1),
                ("smallNumber", 1, 21, 1),
            ]
        );
        assert_eq!(mapping.total_slots, 2);
        assert_eq!(mapping.packed_slots, vec![1]);
        assert!(!mapping.variables[0].packed);
        assert!(mapping.variables[1].packed);
        assert!(mapping.variables[3].packed);
    }

    #[test]
    fn empty_contract_has_no_slots() {
        let mapping = calculate_slots(&ContractModel::new("Empty"));
        assert_eq!(mapping.total_slots, 0);
        assert!(mapping.variables.is_empty());
        assert!(mapping.packed_slots.is_empty());
        assert_eq!(mapping.efficiency(), 0.0);
    }

    #[test]
    fn variable_that_does_not_fit_starts_new_slot() {
        // 20 + 20 > 32, so the second address cannot share slot 0.
        let mapping = calculate_slots(&contract(&[
            ("a", "address"),
            ("b", "address"),
            ("c", "uint96"),
        ]));
        assert_eq!((mapping.variables[0].slot, mapping.variables[0].offset), (0, 0));
        assert_eq!((mapping.variables[1].slot, mapping.variables[1].offset), (1, 0));
        assert_eq!((mapping.variables[2].slot, mapping.variables[2].offset), (1, 20));
        assert_eq!(mapping.total_slots, 2);
        assert_eq!(mapping.packed_slots, vec![1]);
    }

    #[test]
    fn exact_fill_rolls_over() {
        let mapping = calculate_slots(&contract(&[
            ("a", "uint128"),
            ("b", "uint128"),
            ("c", "uint8"),
        ]));
        assert_eq!(mapping.variables[1].slot, 0);
        assert_eq!(mapping.variables[1].offset, 16);
        assert_eq!(mapping.variables[2].slot, 1);
        assert_eq!(mapping.variables[2].offset, 0);
        // A lone small variable is still packed: it leaves most of its slot unused.
        assert!(mapping.variables[2].packed);
        assert_eq!(mapping.packed_slots, vec![0]);
    }

    #[test]
    fn dynamic_and_unknown_types_take_full_slots() {
        let mapping = calculate_slots(&contract(&[
            ("flag", "bool"),
            ("balances", "mapping(address => uint256)"),
            ("config", "Config"),
            ("names", "string[]"),
        ]));
        let slots: Vec<u64> = mapping.variables.iter().map(|v| v.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
        assert_eq!(mapping.total_slots, 4);
        assert!(mapping.packed_slots.is_empty());
    }

    #[test]
    fn skips_constants_and_immutables() {
        let model = ContractModel::new("Token")
            .with_declaration(DeclaredVariable::constant("MAX", "uint256"))
            .with_variable("owner", "address")
            .with_declaration(DeclaredVariable::immutable("factory", "address"))
            .with_variable("paused", "bool");
        let mapping = calculate_slots(&model);
        assert_eq!(mapping.variables.len(), 2);
        assert_eq!(mapping.variables[1].name, "paused");
        assert_eq!((mapping.variables[1].slot, mapping.variables[1].offset), (0, 20));
        assert_eq!(mapping.total_slots, 1);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let model = contract(&[("a", "uint8"), ("b", "bytes4"), ("c", "uint256")]);
        assert_eq!(calculate_slots(&model), calculate_slots(&model));
    }

    #[test]
    fn no_slot_exceeds_capacity() {
        let model = contract(&[
            ("a", "uint8"),
            ("b", "address"),
            ("c", "uint64"),
            ("d", "bytes12"),
            ("e", "bool"),
            ("f", "uint256"),
            ("g", "int16"),
            ("h", "bytes31"),
            ("i", "uint24"),
        ]);
        let mapping = calculate_slots(&model);
        for (slot, occupants) in mapping.occupancy() {
            let total: u32 = occupants.iter().map(|v| v.size as u32).sum();
            assert!(total <= 32, "slot {} holds {} bytes", slot, total);
            assert!(occupants.iter().all(|v| v.end() <= 32));
        }
    }

    #[test]
    fn usage_metrics() {
        let mapping = calculate_slots(&contract(&[("owner", "address"), ("value", "uint256")]));
        assert_eq!(mapping.bytes_used(), 52);
        assert_eq!(mapping.bytes_allocated(), 64);
        assert_eq!(mapping.bytes_wasted(), 12);
        assert!((mapping.efficiency() - 81.25).abs() < 1e-9);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mapping = calculate_slots(&contract(&[("owner", "address")]));
        let json = serde_json::to_value(&mapping).unwrap();
        assert_eq!(json["contractName"], "Test");
        assert_eq!(json["totalSlots"], 1);
        assert_eq!(json["variables"][0]["type"], "address");
        assert_eq!(json["variables"][0]["isStateVariable"], true);
    }

    #[test]
    fn key_ignores_type_spelling() {
        let a = calculate_slots(&contract(&[
            ("total", "uint"),
            ("balances", "mapping (address => uint)"),
        ]));
        let b = calculate_slots(&contract(&[
            ("total", "uint256"),
            ("balances", "mapping(address=>uint256)"),
        ]));
        assert_eq!(a.variables[0].key(), b.variables[0].key());
        assert_eq!(a.variables[1].key(), b.variables[1].key());
        assert_eq!(a.variables[0].key().to_string(), "total|uint256");
        // the declared spelling is kept for output
        assert_eq!(a.variables[0].type_name, "uint");
    }
}
