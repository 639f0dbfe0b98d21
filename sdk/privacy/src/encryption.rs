//! Output payload codec
//!
//! Delivers an output's `(amount, blinding)` to its owner inside the
//! commitment event.
//!
//! ```text
//! plaintext  = {"amount":"<decimal>","blinding":"<decimal>"}
//! keystream  = encryptionKey as 32-byte big-endian
//! ciphertext = plaintext XOR keystream (repeated)
//! ```
//!
//! There is no authentication tag: decrypting with the wrong key produces
//! bytes that do not parse, and that failure is the ownership test. It is
//! reported as `None`, never as an error.

use ark_bn254::Fr;
use num_bigint::BigUint;
use serde::Deserialize;

use crate::field::{FIELD_BYTES, field_from_biguint, field_to_be_bytes, parse_biguint};
use crate::keypair::Keypair;
use crate::utxo::Utxo;

/// The secret part of an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub amount: BigUint,
    pub blinding: BigUint,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PayloadWire {
    amount: String,
    blinding: String,
}

impl Payload {
    pub fn new(amount: BigUint, blinding: BigUint) -> Self {
        Self { amount, blinding }
    }

    pub fn from_utxo(utxo: &Utxo) -> Self {
        Self::new(utxo.amount().clone(), utxo.blinding().clone())
    }

    /// Canonical plaintext bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            r#"{{"amount":"{}","blinding":"{}"}}"#,
            self.amount, self.blinding
        )
        .into_bytes()
    }

    /// Strict inverse of [`Payload::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(bytes).ok()?;
        let wire: PayloadWire = serde_json::from_str(text).ok()?;

        let amount = parse_decimal(&wire.amount)?;
        let blinding = parse_decimal(&wire.blinding)?;
        let payload = Self::new(amount, blinding);

        // anything that re-encodes differently was not produced by `to_bytes`
        (payload.to_bytes() == bytes).then_some(payload)
    }
}

fn parse_decimal(value: &str) -> Option<BigUint> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let parsed = parse_biguint(value).ok()?;
    field_from_biguint(&parsed).ok()?;
    Some(parsed)
}

/// 32-byte keystream block derived from an encryption key.
pub fn keystream(encryption_key: &Fr) -> [u8; FIELD_BYTES] {
    field_to_be_bytes(encryption_key)
}

fn apply_keystream(data: &[u8], encryption_key: &Fr) -> Vec<u8> {
    let key = keystream(encryption_key);
    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}

/// Encrypt a payload for the holder of `encryption_key`.
pub fn encrypt_payload(payload: &Payload, encryption_key: &Fr) -> Vec<u8> {
    apply_keystream(&payload.to_bytes(), encryption_key)
}

/// Attempt to open a payload with an explicit encryption key.
pub fn decrypt_payload_with_key(ciphertext: &[u8], encryption_key: &Fr) -> Option<Payload> {
    if ciphertext.is_empty() {
        return None;
    }
    Payload::from_bytes(&apply_keystream(ciphertext, encryption_key))
}

/// Attempt to open a payload as `keypair`; `None` means "not mine".
pub fn decrypt_payload(ciphertext: &[u8], keypair: &Keypair) -> Option<Payload> {
    decrypt_payload_with_key(ciphertext, keypair.encryption_key())
}
