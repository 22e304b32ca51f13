//! Contract model handed to the calculator by the parsing collaborator.
//!
//! The model is a flat, ordered list of state variable declarations. How it
//! was produced (grammar parser, compiler AST import, hand-built fixture)
//! does not matter; only declaration order and the constant/immutable flags
//! are relied upon.

use serde::{Deserialize, Serialize};

use crate::types::SolType;

/// A single state variable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredVariable {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub is_constant: bool,
    #[serde(default)]
    pub is_immutable: bool,
}

impl DeclaredVariable {
    /// A plain (mutable, storage-backed) declaration.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        DeclaredVariable {
            name: name.into(),
            type_name: type_name.into(),
            is_constant: false,
            is_immutable: false,
        }
    }

    /// A `constant` declaration.
    pub fn constant(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        DeclaredVariable {
            is_constant: true,
            ..DeclaredVariable::new(name, type_name)
        }
    }

    /// An `immutable` declaration.
    pub fn immutable(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        DeclaredVariable {
            is_immutable: true,
            ..DeclaredVariable::new(name, type_name)
        }
    }

    /// Whether this declaration is assigned a storage slot.
    pub fn occupies_storage(&self) -> bool {
        !self.is_constant && !self.is_immutable
    }

    /// Parsed form of `type_name`.
    pub fn sol_type(&self) -> SolType {
        SolType::parse(&self.type_name)
    }
}

/// A contract and its declared state variables, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractModel {
    pub name: String,
    #[serde(default)]
    pub variables: Vec<DeclaredVariable>,
}

impl ContractModel {
    pub fn new(name: impl Into<String>) -> Self {
        ContractModel {
            name: name.into(),
            variables: Vec::new(),
        }
    }

    /// Builder-style append of a storage-backed declaration.
    pub fn with_variable(mut self, name: &str, type_name: &str) -> Self {
        self.variables.push(DeclaredVariable::new(name, type_name));
        self
    }

    /// Builder-style append of an arbitrary declaration.
    pub fn with_declaration(mut self, variable: DeclaredVariable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Declarations that are assigned storage, in declaration order.
    pub fn storage_variables(&self) -> impl Iterator<Item = &DeclaredVariable> {
        self.variables.iter().filter(|v| v.occupies_storage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constants_and_immutables_do_not_occupy_storage() {
        let model = ContractModel::new("Token")
            .with_variable("owner", "address")
            .with_declaration(DeclaredVariable::constant("DECIMALS", "uint8"))
            .with_declaration(DeclaredVariable::immutable("deployedAt", "uint256"))
            .with_variable("supply", "uint256");

        let names: Vec<&str> = model.storage_variables().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["owner", "supply"]);
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let model: ContractModel = serde_json::from_value(json!({
            "name": "Vault",
            "variables": [
                { "name": "owner", "typeName": "address" },
                { "name": "FEE", "typeName": "uint16", "isConstant": true }
            ]
        }))
        .unwrap();

        assert_eq!(model.variables.len(), 2);
        assert!(model.variables[0].occupies_storage());
        assert!(model.variables[1].is_constant);
        assert!(!model.variables[1].is_immutable);
    }
}
