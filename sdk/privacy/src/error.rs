//! Validation errors for field parsing, tree access and hashing.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrivacyError {
    /// Decimal/hex string that does not denote an element of the BN254 scalar field
    #[error("Invalid field element '{value}': {reason}")]
    InvalidFieldElement { value: String, reason: String },

    /// Malformed hexadecimal identifier
    #[error("Invalid hex string '{0}'")]
    InvalidHex(String),

    /// Byte sequence with an unexpected length
    #[error("Invalid length: expected at most {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// Leaf index outside the populated range of the tree
    #[error("Index {index} out of bounds for tree with {len} leaves")]
    IndexOutOfBounds { index: u64, len: u64 },

    /// Index or leaf count beyond the fixed tree capacity
    #[error("Index {index} exceeds tree capacity {capacity}")]
    CapacityExceeded { index: u64, capacity: u64 },

    /// Failure inside the Poseidon hasher
    #[error("Hash error: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, PrivacyError>;
