//! Shielded UTXOs
//!
//! ```text
//! commitment = H4(amount, publicKey, blinding, vortexId)
//! signature  = H3(privateKey, commitment, index)
//! nullifier  = H3(commitment, index, signature)
//! ```
//!
//! A UTXO is either a fresh output (random blinding, not yet in the tree) or
//! one recovered from a decrypted commitment event at a known tree index.

use ark_bn254::Fr;
use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;

use crate::error::{PrivacyError, Result};
use crate::field::{field_from_biguint, field_to_biguint, random_field_element};
use crate::keypair::Keypair;
use crate::merkle::TREE_CAPACITY;
use crate::poseidon::{hash3, hash4};

/// Output commitment for an arbitrary owner.
pub fn commitment(amount: &Fr, public_key: &Fr, blinding: &Fr, vortex_id: &Fr) -> Result<Fr> {
    hash4(amount, public_key, blinding, vortex_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    amount: BigUint,
    blinding: BigUint,
    index: u64,
    keypair: Keypair,
}

impl Utxo {
    /// Build a UTXO, checking that amount and blinding are field elements.
    pub fn new(keypair: Keypair, amount: BigUint, blinding: BigUint, index: u64) -> Result<Self> {
        field_from_biguint(&amount)?;
        field_from_biguint(&blinding)?;
        Ok(Self {
            amount,
            blinding,
            index,
            keypair,
        })
    }

    /// A new output with a freshly sampled blinding factor.
    pub fn fresh<R: Rng + ?Sized>(keypair: Keypair, amount: BigUint, rng: &mut R) -> Result<Self> {
        let blinding = field_to_biguint(&random_field_element(rng));
        Self::new(keypair, amount, blinding, 0)
    }

    /// Zero-amount filler for an unused input slot (path index 0).
    pub fn dummy<R: Rng + ?Sized>(keypair: Keypair, rng: &mut R) -> Self {
        Self {
            amount: BigUint::zero(),
            blinding: field_to_biguint(&random_field_element(rng)),
            index: 0,
            keypair,
        }
    }

    pub fn amount(&self) -> &BigUint {
        &self.amount
    }

    pub fn blinding(&self) -> &BigUint {
        &self.blinding
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn is_dummy(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn amount_field(&self) -> Fr {
        Fr::from(self.amount.clone())
    }

    pub fn blinding_field(&self) -> Fr {
        Fr::from(self.blinding.clone())
    }

    pub fn index_field(&self) -> Fr {
        Fr::from(self.index)
    }

    pub fn commitment(&self, vortex_id: &Fr) -> Result<Fr> {
        commitment(
            &self.amount_field(),
            self.keypair.public_key(),
            &self.blinding_field(),
            vortex_id,
        )
    }

    pub fn signature(&self, vortex_id: &Fr) -> Result<Fr> {
        self.keypair
            .sign(&self.commitment(vortex_id)?, &self.index_field())
    }

    pub fn nullifier(&self, vortex_id: &Fr) -> Result<Fr> {
        let commitment = self.commitment(vortex_id)?;
        let index = self.index_field();
        let signature = self.keypair.sign(&commitment, &index)?;
        hash3(&commitment, &index, &signature)
    }

    /// Fails when the index lies beyond the tree, where no path can exist.
    pub fn ensure_provable(&self) -> Result<()> {
        if self.index >= TREE_CAPACITY {
            return Err(PrivacyError::CapacityExceeded {
                index: self.index,
                capacity: TREE_CAPACITY,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{field_to_decimal, vortex_id_field};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample() -> (Utxo, Fr) {
        let kp = Keypair::from_private_key("12345").unwrap();
        let utxo = Utxo::new(kp, BigUint::from(1000u32), BigUint::from(777u32), 5).unwrap();
        (utxo, vortex_id_field("0x2f3c").unwrap())
    }

    #[test]
    fn test_commitment_signature_nullifier_vectors() {
        let (utxo, vortex) = sample();
        assert_eq!(
            field_to_decimal(&utxo.commitment(&vortex).unwrap()),
            "7110654982243662263458183271639006482211935194730427045154648942838965694183"
        );
        assert_eq!(
            field_to_decimal(&utxo.signature(&vortex).unwrap()),
            "10482205128991446275461086897392415365393368982389819479031799633691673601539"
        );
        assert_eq!(
            field_to_decimal(&utxo.nullifier(&vortex).unwrap()),
            "14010067824644724411304809347396821571328984610733165015592290542383084518689"
        );
    }

    #[test]
    fn test_nullifier_depends_on_index() {
        let (utxo, vortex) = sample();
        let moved = Utxo::new(
            utxo.keypair().clone(),
            utxo.amount().clone(),
            utxo.blinding().clone(),
            6,
        )
        .unwrap();
        assert_eq!(
            utxo.commitment(&vortex).unwrap(),
            moved.commitment(&vortex).unwrap()
        );
        assert_ne!(
            utxo.nullifier(&vortex).unwrap(),
            moved.nullifier(&vortex).unwrap()
        );
    }

    #[test]
    fn test_dummy_has_zero_amount_commitment() {
        let mut rng = StdRng::seed_from_u64(1);
        let kp = Keypair::random(&mut rng).unwrap();
        let dummy = Utxo::dummy(kp, &mut rng);
        let vortex = Fr::from(9u64);

        assert!(dummy.is_dummy());
        assert_eq!(dummy.index(), 0);
        // still a real commitment over a zero amount
        let expected = commitment(
            &Fr::from(0u64),
            dummy.keypair().public_key(),
            &dummy.blinding_field(),
            &vortex,
        )
        .unwrap();
        assert_eq!(dummy.commitment(&vortex).unwrap(), expected);
    }

    #[test]
    fn test_rejects_amount_outside_field() {
        let kp = Keypair::from_private_key("1").unwrap();
        let too_big = crate::field::modulus();
        assert!(Utxo::new(kp, too_big, BigUint::from(1u8), 0).is_err());
    }

    #[test]
    fn test_capacity_boundary() {
        let kp = Keypair::from_private_key("1").unwrap();
        let last = Utxo::new(kp.clone(), BigUint::from(1u8), BigUint::from(1u8), TREE_CAPACITY - 1)
            .unwrap();
        assert!(last.ensure_provable().is_ok());

        let beyond = Utxo::new(kp, BigUint::from(1u8), BigUint::from(1u8), TREE_CAPACITY).unwrap();
        assert!(matches!(
            beyond.ensure_provable(),
            Err(PrivacyError::CapacityExceeded { .. })
        ));
    }
}
