use ark_bn254::Fr;
use rand::Rng;
use vortex_privacy::{
    Keypair, MerklePath, Utxo, hash3, random_field_element, utxo::commitment,
};

use crate::error::{ProverError, Result};

/// A spent note as the circuit sees it.
#[derive(Clone, Debug)]
pub struct InputWitness {
    pub private_key: Fr,
    pub public_key: Fr,
    pub amount: Fr,
    pub blinding: Fr,
    /// Leaf position of the note (0 for dummies)
    pub path_index: u64,
    pub merkle_path: MerklePath,
}

impl InputWitness {
    /// Pair a UTXO with its authentication path.
    pub fn from_utxo(utxo: &Utxo, merkle_path: MerklePath) -> Result<Self> {
        utxo.ensure_provable()?;
        if merkle_path.index() != utxo.index() {
            return Err(ProverError::Validation(format!(
                "path for index {} supplied for note at index {}",
                merkle_path.index(),
                utxo.index()
            )));
        }

        let keypair = utxo.keypair();
        Ok(Self {
            private_key: *keypair.private_key(),
            public_key: *keypair.public_key(),
            amount: utxo.amount_field(),
            blinding: utxo.blinding_field(),
            path_index: utxo.index(),
            merkle_path,
        })
    }

    pub fn commitment(&self, vortex_id: &Fr) -> Result<Fr> {
        Ok(commitment(
            &self.amount,
            &self.public_key,
            &self.blinding,
            vortex_id,
        )?)
    }

    pub fn signature(&self, vortex_id: &Fr) -> Result<Fr> {
        let index = Fr::from(self.path_index);
        Ok(hash3(&self.private_key, &self.commitment(vortex_id)?, &index)?)
    }

    pub fn nullifier(&self, vortex_id: &Fr) -> Result<Fr> {
        let commitment = self.commitment(vortex_id)?;
        let index = Fr::from(self.path_index);
        let signature = hash3(&self.private_key, &commitment, &index)?;
        Ok(hash3(&commitment, &index, &signature)?)
    }
}

/// A new note addressed to `public_key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputWitness {
    pub public_key: Fr,
    pub amount: Fr,
    pub blinding: Fr,
}

impl OutputWitness {
    pub fn new(public_key: Fr, amount: Fr, blinding: Fr) -> Self {
        Self {
            public_key,
            amount,
            blinding,
        }
    }

    /// Output with a freshly sampled blinding factor.
    pub fn random<R: Rng + ?Sized>(public_key: Fr, amount: Fr, rng: &mut R) -> Self {
        Self::new(public_key, amount, random_field_element(rng))
    }

    /// Output paying back to `keypair` (change, deposits).
    pub fn to_self<R: Rng + ?Sized>(keypair: &Keypair, amount: Fr, rng: &mut R) -> Self {
        Self::random(*keypair.public_key(), amount, rng)
    }

    pub fn commitment(&self, vortex_id: &Fr) -> Result<Fr> {
        Ok(commitment(
            &self.amount,
            &self.public_key,
            &self.blinding,
            vortex_id,
        )?)
    }
}
