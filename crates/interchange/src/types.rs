//! Typed form of an interchange document.

use serde::Serialize;
use slotguard_core::ContractModel;

use crate::deserialize::InterchangeError;

/// All contracts found in one interchange document, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterchangeDocument {
    pub contracts: Vec<ContractModel>,
}

impl InterchangeDocument {
    /// Contract names in document order.
    pub fn contract_names(&self) -> Vec<&str> {
        self.contracts.iter().map(|c| c.name.as_str()).collect()
    }

    /// Select a contract by name.
    pub fn contract(&self, name: &str) -> Result<&ContractModel, InterchangeError> {
        self.contracts
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| InterchangeError::ContractNotFound {
                name: name.to_string(),
                available: self.contract_names().join(", "),
            })
    }

    /// The document's only contract.
    pub fn single(&self) -> Result<&ContractModel, InterchangeError> {
        match self.contracts.as_slice() {
            [only] => Ok(only),
            [] => Err(InterchangeError::NoContracts),
            _ => Err(InterchangeError::AmbiguousContract {
                available: self.contract_names().join(", "),
            }),
        }
    }

    /// `contract(name)` when a name is given, otherwise `single()`.
    pub fn select(&self, name: Option<&str>) -> Result<&ContractModel, InterchangeError> {
        match name {
            Some(name) => self.contract(name),
            None => self.single(),
        }
    }
}
