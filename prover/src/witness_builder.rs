//! Proof input builder
//!
//! Derives nullifiers and commitments for the two inputs and two outputs and
//! lays everything out in the prover's JSON contract. Pure: all blinding
//! factors are sampled by the caller.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use num_bigint::BigUint;
use vortex_privacy::{field::field_from_biguint, field_to_decimal, hash1};

use crate::constants::{MAX_AMOUNT_BITS, MERKLE_TREE_LEVEL, N_INS, N_OUTS};
use crate::error::{ProverError, Result};
use crate::prover_inputs::ProofInput;
use crate::witness::{InputWitness, OutputWitness};

/// Net value entering the pool: `deposit - withdraw (mod p)`.
pub fn public_amount(deposit: &BigUint, withdraw: &BigUint) -> Result<Fr> {
    Ok(field_from_biguint(deposit)? - field_from_biguint(withdraw)?)
}

fn ensure_amount_bits(label: &str, amount: &Fr) -> Result<()> {
    let bits = amount.into_bigint().num_bits() as u64;
    if bits > MAX_AMOUNT_BITS {
        return Err(ProverError::Validation(format!(
            "{label} uses {bits} bits, limit is {MAX_AMOUNT_BITS}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ProofInputBuilder {
    vortex_id: Fr,
    root: Fr,
    public_amount: Fr,
    account_secret: Fr,
}

impl ProofInputBuilder {
    pub fn new(vortex_id: Fr, root: Fr) -> Self {
        Self {
            vortex_id,
            root,
            public_amount: Fr::zero(),
            account_secret: Fr::zero(),
        }
    }

    pub fn with_public_amount(mut self, public_amount: Fr) -> Self {
        self.public_amount = public_amount;
        self
    }

    /// Bind the proof to an account secret; `hashedAccountSecret = H1(secret)`.
    pub fn with_account_secret(mut self, account_secret: Fr) -> Self {
        self.account_secret = account_secret;
        self
    }

    fn hashed_account_secret(&self) -> Result<Fr> {
        if self.account_secret.is_zero() {
            return Ok(Fr::zero());
        }
        Ok(hash1(&self.account_secret)?)
    }

    pub fn build(
        &self,
        inputs: &[InputWitness; N_INS],
        outputs: &[OutputWitness; N_OUTS],
    ) -> Result<ProofInput> {
        for (i, input) in inputs.iter().enumerate() {
            if input.merkle_path.len() != MERKLE_TREE_LEVEL {
                return Err(ProverError::Validation(format!(
                    "merkle path {i} has {} levels, expected {MERKLE_TREE_LEVEL}",
                    input.merkle_path.len()
                )));
            }
            if input.path_index >= vortex_privacy::TREE_CAPACITY {
                return Err(vortex_privacy::PrivacyError::CapacityExceeded {
                    index: input.path_index,
                    capacity: vortex_privacy::TREE_CAPACITY,
                }
                .into());
            }
            ensure_amount_bits(&format!("input amount {i}"), &input.amount)?;
        }
        for (i, output) in outputs.iter().enumerate() {
            ensure_amount_bits(&format!("output amount {i}"), &output.amount)?;
        }

        let nullifiers = [
            inputs[0].nullifier(&self.vortex_id)?,
            inputs[1].nullifier(&self.vortex_id)?,
        ];
        if nullifiers[0] == nullifiers[1] {
            return Err(ProverError::Validation(
                "both inputs share a nullifier".into(),
            ));
        }

        let sum_ins: Fr = inputs.iter().map(|i| i.amount).sum();
        let sum_outs: Fr = outputs.iter().map(|o| o.amount).sum();
        if sum_ins + self.public_amount != sum_outs {
            return Err(ProverError::Validation(format!(
                "unbalanced: inputs {} + public {} != outputs {}",
                field_to_decimal(&sum_ins),
                field_to_decimal(&self.public_amount),
                field_to_decimal(&sum_outs)
            )));
        }

        let commitments = [
            outputs[0].commitment(&self.vortex_id)?,
            outputs[1].commitment(&self.vortex_id)?,
        ];

        let [in0, in1] = inputs;
        let [out0, out1] = outputs;
        let dec = field_to_decimal;

        Ok(ProofInput {
            vortex: dec(&self.vortex_id),
            root: dec(&self.root),
            public_amount: dec(&self.public_amount),
            input_nullifier_0: dec(&nullifiers[0]),
            input_nullifier_1: dec(&nullifiers[1]),
            output_commitment_0: dec(&commitments[0]),
            output_commitment_1: dec(&commitments[1]),
            hashed_account_secret: dec(&self.hashed_account_secret()?),

            account_secret: dec(&self.account_secret),
            in_private_key_0: dec(&in0.private_key),
            in_private_key_1: dec(&in1.private_key),
            in_amount_0: dec(&in0.amount),
            in_amount_1: dec(&in1.amount),
            in_blinding_0: dec(&in0.blinding),
            in_blinding_1: dec(&in1.blinding),
            in_path_index_0: in0.path_index.to_string(),
            in_path_index_1: in1.path_index.to_string(),
            merkle_path_0: in0.merkle_path.to_decimal_pairs(),
            merkle_path_1: in1.merkle_path.to_decimal_pairs(),

            out_public_key_0: dec(&out0.public_key),
            out_public_key_1: dec(&out1.public_key),
            out_amount_0: dec(&out0.amount),
            out_amount_1: dec(&out1.amount),
            out_blinding_0: dec(&out0.blinding),
            out_blinding_1: dec(&out1.blinding),
        })
    }
}
