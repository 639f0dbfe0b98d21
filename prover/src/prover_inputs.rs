//! JSON contract consumed by the external proving function.
//!
//! Every scalar is a decimal field element; merkle paths are 26
//! `[left, right]` pairs, leaf level first.

use serde::{Deserialize, Serialize};

use crate::constants::PUBLIC_INPUT_COUNT;
use crate::error::{ProverError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofInput {
    // Public inputs
    pub vortex: String,
    pub root: String,
    pub public_amount: String,
    pub input_nullifier_0: String,
    pub input_nullifier_1: String,
    pub output_commitment_0: String,
    pub output_commitment_1: String,
    pub hashed_account_secret: String,

    // Private inputs: spent notes
    pub account_secret: String,
    pub in_private_key_0: String,
    pub in_private_key_1: String,
    pub in_amount_0: String,
    pub in_amount_1: String,
    pub in_blinding_0: String,
    pub in_blinding_1: String,
    pub in_path_index_0: String,
    pub in_path_index_1: String,
    pub merkle_path_0: Vec<[String; 2]>,
    pub merkle_path_1: Vec<[String; 2]>,

    // Private inputs: new notes
    pub out_public_key_0: String,
    pub out_public_key_1: String,
    pub out_amount_0: String,
    pub out_amount_1: String,
    pub out_blinding_0: String,
    pub out_blinding_1: String,
}

impl ProofInput {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProverError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ProverError::Serialization(e.to_string()))
    }

    /// Public inputs in circuit allocation order.
    pub fn public_inputs(&self) -> [&str; PUBLIC_INPUT_COUNT] {
        [
            &self.vortex,
            &self.root,
            &self.public_amount,
            &self.input_nullifier_0,
            &self.input_nullifier_1,
            &self.output_commitment_0,
            &self.output_commitment_1,
            &self.hashed_account_secret,
        ]
    }

    pub fn input_nullifiers(&self) -> [&str; 2] {
        [&self.input_nullifier_0, &self.input_nullifier_1]
    }

    pub fn output_commitments(&self) -> [&str; 2] {
        [&self.output_commitment_0, &self.output_commitment_1]
    }
}
