//! Solidity type names and their slot-local byte sizes.
//!
//! Only the size a declaration occupies *inside its own slot* matters to
//! the layout calculator. Dynamic types (`bytes`, `string`, mappings,
//! dynamic arrays) keep their contents at a derived location and leave a
//! 32-byte header in the declared slot. Anything the table does not
//! recognise is sized at a full slot: over-allocating is harmless to the
//! packing invariant, under-allocating is not.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bytes in a single storage slot.
pub const SLOT_SIZE: u8 = 32;

/// A parsed type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SolType {
    Bool,
    /// Unsigned integer with the given bit width.
    Uint(u16),
    /// Signed integer with the given bit width.
    Int(u16),
    Address,
    /// `bytes1` .. `bytes32`.
    FixedBytes(u8),
    /// Dynamic `bytes`.
    Bytes,
    String,
    Mapping,
    DynamicArray,
    /// Structs, enums, contract/interface types, fixed-size arrays and
    /// anything malformed.
    Other(String),
}

impl SolType {
    /// Parse a type name as written in a declaration.
    ///
    /// Parsing is total: unrecognised names become [`SolType::Other`].
    pub fn parse(type_name: &str) -> SolType {
        let normalized = normalize(type_name);
        let name = normalized.as_str();

        if name.starts_with("mapping(") {
            return SolType::Mapping;
        }
        if name.ends_with("[]") {
            return SolType::DynamicArray;
        }

        match name {
            "bool" => SolType::Bool,
            "address" | "address payable" => SolType::Address,
            "bytes" => SolType::Bytes,
            "string" => SolType::String,
            "uint" => SolType::Uint(256),
            "int" => SolType::Int(256),
            _ => {
                if let Some(bits) = name.strip_prefix("uint").and_then(parse_int_width) {
                    SolType::Uint(bits)
                } else if let Some(bits) = name.strip_prefix("int").and_then(parse_int_width) {
                    SolType::Int(bits)
                } else if let Some(width) = name.strip_prefix("bytes").and_then(parse_bytes_width)
                {
                    SolType::FixedBytes(width)
                } else {
                    SolType::Other(name.to_string())
                }
            }
        }
    }

    /// Bytes the type occupies within its declared slot (1..=32).
    pub fn size(&self) -> u8 {
        match self {
            SolType::Bool => 1,
            SolType::Uint(bits) | SolType::Int(bits) => (bits / 8) as u8,
            SolType::Address => 20,
            SolType::FixedBytes(width) => *width,
            SolType::Bytes
            | SolType::String
            | SolType::Mapping
            | SolType::DynamicArray
            | SolType::Other(_) => SLOT_SIZE,
        }
    }

    /// True for types whose contents live at a derived location.
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            SolType::Bytes | SolType::String | SolType::Mapping | SolType::DynamicArray
        )
    }

    /// True when the size came from the conservative full-slot fallback.
    pub fn is_unknown(&self) -> bool {
        matches!(self, SolType::Other(_))
    }
}

impl From<&str> for SolType {
    fn from(type_name: &str) -> Self {
        SolType::parse(type_name)
    }
}

impl fmt::Display for SolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolType::Bool => write!(f, "bool"),
            SolType::Uint(bits) => write!(f, "uint{}", bits),
            SolType::Int(bits) => write!(f, "int{}", bits),
            SolType::Address => write!(f, "address"),
            SolType::FixedBytes(width) => write!(f, "bytes{}", width),
            SolType::Bytes => write!(f, "bytes"),
            SolType::String => write!(f, "string"),
            SolType::Mapping => write!(f, "mapping"),
            SolType::DynamicArray => write!(f, "dynamic array"),
            SolType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Byte size of a declared type name. Shorthand for `SolType::parse(..).size()`.
pub fn type_size(type_name: &str) -> u8 {
    SolType::parse(type_name).size()
}

/// Spelling-independent form of a type name, used for identity.
///
/// Whitespace only survives between two words, `uint`/`int` become
/// `uint256`/`int256` wherever they appear, and `address payable` becomes
/// `address`. `mapping (address => uint)` and `mapping(address=>uint256)`
/// are the same type.
pub fn canonical_type_name(type_name: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut word = String::new();
    for c in type_name.chars() {
        if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }

    let mut out = String::with_capacity(type_name.len());
    let mut prev_word: Option<&str> = None;
    for token in &tokens {
        let is_word = token.chars().all(|c| c.is_alphanumeric() || "_$.".contains(c));
        if is_word {
            if token == "payable" && prev_word == Some("address") {
                continue;
            }
            if prev_word.is_some() {
                out.push(' ');
            }
            out.push_str(match token.as_str() {
                "uint" => "uint256",
                "int" => "int256",
                other => other,
            });
            prev_word = Some(token.as_str());
        } else {
            out.push_str(token);
            prev_word = None;
        }
    }
    out
}

/// Collapse runs of whitespace and strip the spaces parsers leave around
/// punctuation, so `mapping (address => uint)` and `uint256 [ ]` match.
fn normalize(type_name: &str) -> String {
    let collapsed = type_name.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let chars: Vec<char> = collapsed.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if *c == ' ' {
            let prev = if i > 0 { chars[i - 1] } else { ' ' };
            let next = chars.get(i + 1).copied().unwrap_or(' ');
            if "()[]".contains(next) || "([".contains(prev) {
                continue;
            }
        }
        out.push(*c);
    }
    out
}

/// `8`, `16`, ..., `256`.
fn parse_int_width(digits: &str) -> Option<u16> {
    let bits: u16 = digits.parse().ok()?;
    if (8..=256).contains(&bits) && bits % 8 == 0 && !digits.starts_with('0') {
        Some(bits)
    } else {
        None
    }
}

/// `1` ..= `32`.
fn parse_bytes_width(digits: &str) -> Option<u8> {
    let width: u8 = digits.parse().ok()?;
    if (1..=SLOT_SIZE).contains(&width) && !digits.starts_with('0') {
        Some(width)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types() {
        assert_eq!(type_size("bool"), 1);
        assert_eq!(type_size("uint8"), 1);
        assert_eq!(type_size("int8"), 1);
        assert_eq!(type_size("uint16"), 2);
        assert_eq!(type_size("uint32"), 4);
        assert_eq!(type_size("uint64"), 8);
        assert_eq!(type_size("int128"), 16);
        assert_eq!(type_size("uint256"), 32);
        assert_eq!(type_size("uint"), 32);
        assert_eq!(type_size("int"), 32);
        assert_eq!(type_size("uint24"), 3);
    }

    #[test]
    fn addresses() {
        assert_eq!(type_size("address"), 20);
        assert_eq!(type_size("address payable"), 20);
        assert_eq!(type_size("address   payable"), 20);
    }

    #[test]
    fn fixed_and_dynamic_bytes() {
        assert_eq!(type_size("bytes1"), 1);
        assert_eq!(type_size("bytes4"), 4);
        assert_eq!(type_size("bytes32"), 32);
        assert_eq!(type_size("bytes"), 32);
        assert!(SolType::parse("bytes").is_dynamic());
        assert!(!SolType::parse("bytes20").is_dynamic());
    }

    #[test]
    fn dynamic_types_take_a_full_slot() {
        for name in [
            "string",
            "mapping(address => uint256)",
            "mapping (address => mapping(address => uint256))",
            "uint256[]",
            "address [ ]",
        ] {
            let ty = SolType::parse(name);
            assert!(ty.is_dynamic(), "{} should be dynamic", name);
            assert_eq!(ty.size(), 32, "{}", name);
        }
    }

    #[test]
    fn unknown_types_default_to_full_slot() {
        for name in [
            "MyStruct",
            "IERC20",
            "uint256[4]",
            "uint7",
            "uint512",
            "bytes33",
            "bytes0",
            "uint08",
        ] {
            let ty = SolType::parse(name);
            assert!(ty.is_unknown(), "{} should be unknown", name);
            assert_eq!(ty.size(), 32);
        }
    }

    #[test]
    fn canonical_names_ignore_spelling() {
        assert_eq!(canonical_type_name("uint"), "uint256");
        assert_eq!(canonical_type_name(" int "), "int256");
        assert_eq!(canonical_type_name("address payable"), "address");
        assert_eq!(
            canonical_type_name("mapping (address => uint)"),
            "mapping(address=>uint256)"
        );
        assert_eq!(
            canonical_type_name("mapping(address=>uint256)"),
            canonical_type_name("mapping( address  =>  uint256 )")
        );
        assert_eq!(canonical_type_name("uint [ ]"), "uint256[]");
        assert_eq!(canonical_type_name("contract IERC20"), "contract IERC20");
        assert_ne!(canonical_type_name("uint128"), canonical_type_name("uint256"));
        assert_ne!(canonical_type_name("uint256"), canonical_type_name("int256"));
    }

    #[test]
    fn display_round_trips_canonical_names() {
        assert_eq!(SolType::parse("uint").to_string(), "uint256");
        assert_eq!(SolType::parse("bytes4").to_string(), "bytes4");
        assert_eq!(SolType::parse("address payable").to_string(), "address");
    }
}
