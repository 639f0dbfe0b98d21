//! Spend keypair
//!
//! ```text
//! privateKey     sk                (never leaves the client)
//! publicKey      H1(sk)            (output owner in commitments)
//! encryptionKey  H2(sk, 1)         (payload keystream)
//! ```

use ark_bn254::Fr;
use ark_ff::One;
use rand::Rng;
use std::fmt;

use crate::error::Result;
use crate::field::{field_to_decimal, parse_field, random_field_element};
use crate::poseidon::{hash1, hash2, hash3};

/// A spend keypair with its derived public and encryption keys.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    private_key: Fr,
    public_key: Fr,
    encryption_key: Fr,
}

impl Keypair {
    pub fn from_field(private_key: Fr) -> Result<Self> {
        Ok(Self {
            private_key,
            public_key: hash1(&private_key)?,
            encryption_key: Self::derive_encryption_key(&private_key)?,
        })
    }

    /// Parse a private key given as a decimal (or `0x` hex) field element.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        Self::from_field(parse_field(private_key)?)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        Self::from_field(random_field_element(rng))
    }

    /// `H2(sk, 1)`: the symmetric key recipients publish for payload delivery.
    pub fn derive_encryption_key(private_key: &Fr) -> Result<Fr> {
        hash2(private_key, &Fr::one())
    }

    pub fn private_key(&self) -> &Fr {
        &self.private_key
    }

    pub fn public_key(&self) -> &Fr {
        &self.public_key
    }

    pub fn encryption_key(&self) -> &Fr {
        &self.encryption_key
    }

    pub fn private_key_decimal(&self) -> String {
        field_to_decimal(&self.private_key)
    }

    pub fn public_key_decimal(&self) -> String {
        field_to_decimal(&self.public_key)
    }

    pub fn encryption_key_decimal(&self) -> String {
        field_to_decimal(&self.encryption_key)
    }

    /// `H3(sk, commitment, index)`, the spend authorisation bound to a leaf.
    pub fn sign(&self, commitment: &Fr, index: &Fr) -> Result<Fr> {
        hash3(&self.private_key, commitment, index)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_decimal())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SK: &str = "12345";
    const PK: &str =
        "4267533774488295900887461483015112262021273608761099826938271132511348470966";
    const ENC: &str =
        "4213355460611018654523924795294902999663126022355729006200928612083214729114";

    #[test]
    fn test_derivation_vectors() {
        let kp = Keypair::from_private_key(SK).unwrap();
        assert_eq!(kp.private_key_decimal(), SK);
        assert_eq!(kp.public_key_decimal(), PK);
        assert_eq!(kp.encryption_key_decimal(), ENC);
    }

    #[test]
    fn test_random_keypairs_differ() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Keypair::random(&mut rng).unwrap();
        let b = Keypair::random(&mut rng).unwrap();
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(a.encryption_key(), b.encryption_key());
    }

    #[test]
    fn test_debug_hides_private_key() {
        let kp = Keypair::from_private_key(SK).unwrap();
        let rendered = format!("{kp:?}");
        assert!(rendered.contains(PK));
        assert!(!rendered.contains("private_key"));
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(Keypair::from_private_key("abc").is_err());
    }
}
