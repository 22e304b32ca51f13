//! slotguard-interchange: loading contract models from interchange JSON.
//!
//! The parsing collaborator (a grammar-based parser, a compiler AST import,
//! or a hand-written fixture) describes each contract as an ordered list of
//! declared state variables. This crate turns that JSON into
//! [`ContractModel`](slotguard_core::ContractModel)s, and reads back
//! serialized [`SlotMapping`](slotguard_core::SlotMapping)s.

pub mod deserialize;
pub mod types;

pub use deserialize::{
    from_interchange, load_document, load_slot_mapping, load_slot_mapping_file, InterchangeError,
};
pub use types::InterchangeDocument;
