//! BN254 scalar field helpers
//!
//! Field elements travel as decimal strings (the prover's JSON contract),
//! pool identifiers as big-endian hex, and on-chain arguments as 32-byte
//! little-endian U256 values.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use ark_std::UniformRand;
use num_bigint::BigUint;
use num_traits::Num;
use rand::Rng;

use crate::error::{PrivacyError, Result};

/// The BN254 scalar field modulus `p`.
pub const FIELD_MODULUS: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Byte width of a serialized field element / U256 argument
pub const FIELD_BYTES: usize = 32;

pub fn modulus() -> BigUint {
    BigUint::from(Fr::MODULUS)
}

/// Parse an unsigned integer given in decimal or `0x`-prefixed hex.
pub fn parse_biguint(value: &str) -> Result<BigUint> {
    let s = value.trim();
    let invalid = |reason: &str| PrivacyError::InvalidFieldElement {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };

    if digits.is_empty() {
        return Err(invalid("empty"));
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid("unexpected character"));
    }

    BigUint::from_str_radix(digits, radix).map_err(|e| invalid(&e.to_string()))
}

/// Convert an integer into the field, rejecting values `>= p`.
pub fn field_from_biguint(value: &BigUint) -> Result<Fr> {
    if value >= &modulus() {
        return Err(PrivacyError::InvalidFieldElement {
            value: value.to_string(),
            reason: "not below the field modulus".into(),
        });
    }
    Ok(Fr::from(value.clone()))
}

/// Parse a canonical field element (decimal or `0x` hex, strictly below `p`).
pub fn parse_field(value: &str) -> Result<Fr> {
    field_from_biguint(&parse_biguint(value)?)
}

pub fn field_to_biguint(value: &Fr) -> BigUint {
    BigUint::from(*value)
}

/// Decimal representation used throughout the prover input.
pub fn field_to_decimal(value: &Fr) -> String {
    field_to_biguint(value).to_string()
}

/// Sample a uniformly random field element (blinding factors, fresh keys).
pub fn random_field_element<R: Rng + ?Sized>(rng: &mut R) -> Fr {
    Fr::rand(rng)
}

/// Reduce a hex pool identifier into the field.
///
/// The identifier is read as a big-endian integer and taken modulo `p`, so
/// object ids wider than the field still map to a valid element.
pub fn vortex_id_field(pool_id: &str) -> Result<Fr> {
    let s = pool_id.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PrivacyError::InvalidHex(pool_id.to_string()));
    }

    let raw = BigUint::from_str_radix(digits, 16)
        .map_err(|_| PrivacyError::InvalidHex(pool_id.to_string()))?;

    Ok(Fr::from(raw % modulus()))
}

/// Normalise a big-endian magnitude to exactly 32 bytes.
///
/// A 33-byte input with a leading zero (sign byte) loses that byte; shorter
/// inputs are zero-padded on the left.
pub fn fixed_be_bytes(bytes: &[u8]) -> Result<[u8; FIELD_BYTES]> {
    let trimmed = match bytes {
        [0, rest @ ..] if bytes.len() == FIELD_BYTES + 1 => rest,
        _ => bytes,
    };

    if trimmed.len() > FIELD_BYTES {
        return Err(PrivacyError::InvalidLength {
            expected: FIELD_BYTES,
            got: bytes.len(),
        });
    }

    let mut out = [0u8; FIELD_BYTES];
    out[FIELD_BYTES - trimmed.len()..].copy_from_slice(trimmed);
    Ok(out)
}

/// 32-byte big-endian encoding of a field element.
pub fn field_to_be_bytes(value: &Fr) -> [u8; FIELD_BYTES] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_BYTES];
    out[FIELD_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// U256 argument encoding: 32 bytes, little-endian.
pub fn u256_le_bytes(value: &str) -> Result<[u8; FIELD_BYTES]> {
    let magnitude = parse_biguint(value)?.to_bytes_be();
    let mut out = fixed_be_bytes(&magnitude)?;
    out.reverse();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};

    #[test]
    fn test_modulus_constant() {
        assert_eq!(modulus().to_string(), FIELD_MODULUS);
    }

    #[test]
    fn test_parse_field_decimal_and_hex() {
        assert_eq!(parse_field("42").unwrap(), Fr::from(42u64));
        assert_eq!(parse_field("0x2a").unwrap(), Fr::from(42u64));
        assert_eq!(parse_field(" 7 ").unwrap(), Fr::from(7u64));
        assert_eq!(parse_field("0").unwrap(), Fr::zero());
    }

    #[test]
    fn test_parse_field_rejects_garbage() {
        assert!(parse_field("").is_err());
        assert!(parse_field("-1").is_err());
        assert!(parse_field("+1").is_err());
        assert!(parse_field("12a").is_err());
        assert!(parse_field("0x").is_err());
        assert!(parse_field(FIELD_MODULUS).is_err());
    }

    #[test]
    fn test_decimal_roundtrip_of_zero_and_max() {
        assert_eq!(field_to_decimal(&Fr::zero()), "0");

        let max = modulus() - BigUint::one();
        let fr = field_from_biguint(&max).unwrap();
        assert_eq!(field_to_decimal(&fr), max.to_string());
    }

    #[test]
    fn test_vortex_id_reduces_modulo_p() {
        let above = modulus() + BigUint::from(5u8);
        let hex_id = format!("0x{}", above.to_str_radix(16));
        assert_eq!(vortex_id_field(&hex_id).unwrap(), Fr::from(5u64));

        // Sui object ids are 32 bytes and routinely exceed p
        let id = "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
        let reduced = field_to_biguint(&vortex_id_field(id).unwrap());
        assert!(reduced < modulus());
    }

    #[test]
    fn test_vortex_id_is_idempotent() {
        let id = "0x9a3f1b6c0d2e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f90";
        let once = vortex_id_field(id).unwrap();
        let hex_once = format!("0x{}", field_to_biguint(&once).to_str_radix(16));
        let twice = vortex_id_field(&hex_once).unwrap();
        assert_eq!(once, twice);

        assert_eq!(vortex_id_field("2f3c").unwrap(), Fr::from(0x2f3cu64));
    }

    #[test]
    fn test_vortex_id_rejects_bad_hex() {
        assert!(matches!(
            vortex_id_field("0xnothex"),
            Err(PrivacyError::InvalidHex(_))
        ));
        assert!(vortex_id_field("").is_err());
    }

    #[test]
    fn test_fixed_be_bytes() {
        let padded = fixed_be_bytes(&[1, 2]).unwrap();
        assert_eq!(padded[30..], [1, 2]);
        assert!(padded[..30].iter().all(|b| *b == 0));

        let mut signed = vec![0u8];
        signed.extend_from_slice(&[0xff; 32]);
        assert_eq!(fixed_be_bytes(&signed).unwrap(), [0xff; 32]);

        assert!(matches!(
            fixed_be_bytes(&[1u8; 33]),
            Err(PrivacyError::InvalidLength { expected: 32, got: 33 })
        ));
    }

    #[test]
    fn test_u256_le_bytes() {
        let bytes = u256_le_bytes("258").unwrap();
        assert_eq!(bytes[0], 2);
        assert_eq!(bytes[1], 1);
        assert!(bytes[2..].iter().all(|b| *b == 0));

        assert_eq!(u256_le_bytes("0").unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_field_to_be_bytes_matches_u256() {
        let fr = Fr::from(0x0102_0304u64);
        let be = field_to_be_bytes(&fr);
        let mut le = u256_le_bytes("16909060").unwrap();
        le.reverse();
        assert_eq!(be, le);
    }
}
