//! Deserialization of interchange JSON into contract models.
//!
//! The main entry point is [`from_interchange`], which accepts either a
//! document with a `contracts` array or a bare single-contract object and
//! produces an [`InterchangeDocument`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use slotguard_core::{ContractModel, DeclaredVariable, SlotMapping, SLOT_SIZE};

use crate::types::InterchangeDocument;

/// Errors while loading interchange input.
#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    /// The file could not be read.
    #[error("could not read '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("invalid JSON in '{}': {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document is missing a required top-level field.
    #[error("document missing required field: '{field}'")]
    MissingField { field: String },

    /// A variable declaration is malformed.
    #[error("contract '{contract}', variable #{index}: {message}")]
    InvalidVariable {
        contract: String,
        index: usize,
        message: String,
    },

    /// No contract with the requested name.
    #[error("contract '{name}' not found (available: {available})")]
    ContractNotFound { name: String, available: String },

    /// The document holds no contracts at all.
    #[error("document contains no contracts")]
    NoContracts,

    /// Several contracts and no name to pick one.
    #[error("document contains several contracts ({available}); select one by name")]
    AmbiguousContract { available: String },

    /// A serialized slot mapping could not be read back.
    #[error("invalid slot mapping: {0}")]
    InvalidMapping(String),
}

/// Deserialize an interchange document.
///
/// Accepts `{"contracts": [..]}` or a single `{"name", "variables"}` object.
pub fn from_interchange(document: &Value) -> Result<InterchangeDocument, InterchangeError> {
    let contracts = match document.get("contracts") {
        Some(arr) => arr
            .as_array()
            .ok_or_else(|| InterchangeError::MissingField {
                field: "contracts".to_string(),
            })?
            .iter()
            .map(parse_contract)
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![parse_contract(document)?],
    };

    Ok(InterchangeDocument { contracts })
}

/// Read and deserialize an interchange document from `path`.
pub fn load_document(path: &Path) -> Result<InterchangeDocument, InterchangeError> {
    let value = read_json(path)?;
    from_interchange(&value)
}

/// Deserialize a previously serialized [`SlotMapping`].
///
/// Nothing is recomputed: the mapping is taken as written, which is what
/// makes hand-edited fixtures checkable. Only the coordinate ranges are
/// enforced (offset 0..=31, size 1..=32); a variable may still run past
/// the end of its slot.
pub fn load_slot_mapping(value: &Value) -> Result<SlotMapping, InterchangeError> {
    let mapping: SlotMapping = serde_json::from_value(value.clone())
        .map_err(|e| InterchangeError::InvalidMapping(e.to_string()))?;

    for v in &mapping.variables {
        if v.offset >= SLOT_SIZE {
            return Err(InterchangeError::InvalidMapping(format!(
                "variable '{}': offset {} is outside 0..={}",
                v.name,
                v.offset,
                SLOT_SIZE - 1
            )));
        }
        if v.size == 0 || v.size > SLOT_SIZE {
            return Err(InterchangeError::InvalidMapping(format!(
                "variable '{}': size {} is outside 1..={}",
                v.name, v.size, SLOT_SIZE
            )));
        }
    }
    Ok(mapping)
}

/// Read and deserialize a [`SlotMapping`] from `path`.
pub fn load_slot_mapping_file(path: &Path) -> Result<SlotMapping, InterchangeError> {
    let value = read_json(path)?;
    load_slot_mapping(&value)
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn read_json(path: &Path) -> Result<Value, InterchangeError> {
    let content = std::fs::read_to_string(path).map_err(|source| InterchangeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| InterchangeError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_contract(obj: &Value) -> Result<ContractModel, InterchangeError> {
    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| InterchangeError::MissingField {
            field: "name".to_string(),
        })?
        .to_string();

    let variables = match obj.get("variables") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(arr)) => arr
            .iter()
            .enumerate()
            .map(|(index, v)| parse_variable(&name, index, v))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(InterchangeError::MissingField {
                field: format!("{}.variables", name),
            })
        }
    };

    let mut seen = BTreeSet::new();
    for (index, var) in variables.iter().enumerate() {
        if !seen.insert(var.name.as_str()) {
            return Err(InterchangeError::InvalidVariable {
                contract: name.clone(),
                index,
                message: format!("duplicate variable name '{}'", var.name),
            });
        }
    }

    Ok(ContractModel { name, variables })
}

fn parse_variable(
    contract: &str,
    index: usize,
    obj: &Value,
) -> Result<DeclaredVariable, InterchangeError> {
    let invalid = |message: String| InterchangeError::InvalidVariable {
        contract: contract.to_string(),
        index,
        message,
    };

    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("missing 'name' field".to_string()))?;

    // Some exporters write `type` instead of `typeName`.
    let type_name = obj
        .get("typeName")
        .or_else(|| obj.get("type"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| invalid(format!("'{}' is missing 'typeName'", name)))?;

    let is_constant = optional_bool(obj, "isConstant").map_err(invalid)?;
    let is_immutable = optional_bool(obj, "isImmutable").map_err(invalid)?;

    Ok(DeclaredVariable {
        name: name.to_string(),
        type_name: type_name.to_string(),
        is_constant,
        is_immutable,
    })
}

fn optional_bool(obj: &Value, field: &str) -> Result<bool, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(format!("'{}' must be a boolean, got {}", field, other)),
    }
}
