//! slotguard-core: storage layout model and calculator.
//!
//! Turns an ordered list of declared state variables into the
//! (slot, offset, size) assignment a Solidity compiler would produce,
//! using the packing rules for 32-byte storage slots.
//!
//! # Public API
//!
//! - [`calculate_slots()`] -- compute a [`SlotMapping`] from a [`ContractModel`]
//! - [`find_overfilled_slots()`] -- sanity check for hand-built mappings
//! - [`SolType`] / [`type_size()`] -- the type-to-byte-size table
//!
//! Everything here is pure and total: no function returns an error.

pub mod layout;
pub mod model;
pub mod overlap;
pub mod types;

pub use layout::{calculate_slots, SlotMapping, StorageVariable, VariableKey};
pub use model::{ContractModel, DeclaredVariable};
pub use overlap::{find_overfilled_slots, SlotOverfill};
pub use types::{canonical_type_name, type_size, SolType, SLOT_SIZE};
