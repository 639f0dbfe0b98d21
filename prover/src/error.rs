use num_bigint::BigUint;
use thiserror::Error;
use vortex_privacy::PrivacyError;

/// Errors raised while selecting inputs and assembling prover input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProverError {
    /// Unspent notes do not cover the requested amount
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        available: BigUint,
        required: BigUint,
    },

    /// Selected inputs sum below the target (internal invariant violation)
    #[error("Selected inputs total {selected} is below target {target}")]
    NegativeChange { selected: BigUint, target: BigUint },

    /// Proof input that the circuit would reject
    #[error("Invalid proof input: {0}")]
    Validation(String),

    #[error(transparent)]
    Privacy(#[from] PrivacyError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure reported by the external proving function
    #[error("Prover call failed: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, ProverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProverError::InsufficientBalance {
            available: BigUint::from(0u8),
            required: BigUint::from(1u8),
        };
        assert_eq!(err.to_string(), "Insufficient balance: available 0, required 1");

        let err = ProverError::from(PrivacyError::InvalidHex("0xq".into()));
        assert_eq!(err.to_string(), "Invalid hex string '0xq'");
    }
}
