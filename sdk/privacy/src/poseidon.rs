//! FieldHash: circom-compatible Poseidon over the BN254 scalar field
//!
//! ```text
//! H1(x)          key derivation      publicKey = H1(sk)
//! H2(a, b)       tree nodes, keys    encryptionKey = H2(sk, 1)
//! H3(a, b, c)    signature, nullifier
//! H4(a, b, c, d) commitment
//! ```
//!
//! Each arity uses the circomlib parameter set (width = arity + 1), so
//! hashes match the circuit and the Move verifier bit for bit.

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};

use crate::error::{PrivacyError, Result};
use crate::field::{field_to_decimal, parse_field};

/// Largest arity used by the scheme (commitments)
pub const MAX_ARITY: usize = 4;

fn poseidon(inputs: &[Fr]) -> Result<Fr> {
    let mut hasher =
        Poseidon::<Fr>::new_circom(inputs.len()).map_err(|e| PrivacyError::Hash(e.to_string()))?;
    hasher
        .hash(inputs)
        .map_err(|e| PrivacyError::Hash(e.to_string()))
}

pub fn hash1(a: &Fr) -> Result<Fr> {
    poseidon(&[*a])
}

pub fn hash2(a: &Fr, b: &Fr) -> Result<Fr> {
    poseidon(&[*a, *b])
}

pub fn hash3(a: &Fr, b: &Fr, c: &Fr) -> Result<Fr> {
    poseidon(&[*a, *b, *c])
}

pub fn hash4(a: &Fr, b: &Fr, c: &Fr, d: &Fr) -> Result<Fr> {
    poseidon(&[*a, *b, *c, *d])
}

/// Hash 1..=4 decimal/hex field elements, returning the decimal digest.
pub fn hash_decimal(inputs: &[&str]) -> Result<String> {
    if inputs.is_empty() || inputs.len() > MAX_ARITY {
        return Err(PrivacyError::Hash(format!(
            "arity must be between 1 and {MAX_ARITY}, got {}",
            inputs.len()
        )));
    }

    let elements = inputs
        .iter()
        .map(|s| parse_field(s))
        .collect::<Result<Vec<_>>>()?;

    poseidon(&elements).map(|h| field_to_decimal(&h))
}
