//! Boundary to the external Groth16 prover.
//!
//! The prover is a black box `prove(input_json, proving_key) -> output_json`;
//! this module feeds it a [`ProofInput`] and decodes what comes back into
//! the byte arrays the pool contract takes.

use serde::{Deserialize, Serialize};
use vortex_privacy::{field::FIELD_BYTES, u256_le_bytes};

use crate::constants::ONCHAIN_PUBLIC_INPUTS;
use crate::error::{ProverError, Result};
use crate::prover_inputs::ProofInput;

/// Prover output, as emitted by the proving function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOutput {
    /// Compressed G1 point
    pub proof_a: Vec<u8>,
    /// Compressed G2 point
    pub proof_b: Vec<u8>,
    /// Compressed G1 point
    pub proof_c: Vec<u8>,
    /// Decimal public inputs in circuit order
    pub public_inputs: Vec<String>,
    pub proof_serialized_hex: String,
    pub public_inputs_serialized_hex: String,
}

impl ProofOutput {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ProverError::Serialization(e.to_string()))
    }

    /// Serialized Groth16 proof bytes.
    pub fn proof_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.proof_serialized_hex)
            .map_err(|e| ProverError::Serialization(format!("proof hex: {e}")))
    }

    pub fn public_inputs_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.public_inputs_serialized_hex)
            .map_err(|e| ProverError::Serialization(format!("public inputs hex: {e}")))
    }

    /// Root, public amount, both nullifiers and both commitments as
    /// little-endian U256 transaction arguments.
    pub fn onchain_public_inputs(&self) -> Result<Vec<[u8; FIELD_BYTES]>> {
        let selected = self
            .public_inputs
            .get(ONCHAIN_PUBLIC_INPUTS)
            .ok_or_else(|| {
                ProverError::Serialization(format!(
                    "expected at least {} public inputs, got {}",
                    ONCHAIN_PUBLIC_INPUTS.end,
                    self.public_inputs.len()
                ))
            })?;

        selected
            .iter()
            .map(|value| u256_le_bytes(value).map_err(ProverError::from))
            .collect()
    }
}

/// The external proving function.
pub trait Prover {
    fn prove(&self, input_json: &str, proving_key: &[u8]) -> Result<String>;
}

impl<F> Prover for F
where
    F: Fn(&str, &[u8]) -> Result<String>,
{
    fn prove(&self, input_json: &str, proving_key: &[u8]) -> Result<String> {
        self(input_json, proving_key)
    }
}

/// Serialize `input`, run the prover and decode its output.
pub fn prove_input<P: Prover + ?Sized>(
    prover: &P,
    input: &ProofInput,
    proving_key: &[u8],
) -> Result<ProofOutput> {
    let json = input.to_json()?;
    log::debug!("invoking prover ({} byte input)", json.len());

    let output = prover.prove(&json, proving_key)?;
    ProofOutput::from_json(&output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> ProofOutput {
        ProofOutput {
            proof_a: vec![1; 32],
            proof_b: vec![2; 64],
            proof_c: vec![3; 32],
            public_inputs: (0..8).map(|i| (i * 256 + 1).to_string()).collect(),
            proof_serialized_hex: "deadbeef".into(),
            public_inputs_serialized_hex: "00ff".into(),
        }
    }

    #[test]
    fn test_output_json_field_names() {
        let json = serde_json::to_value(sample_output()).unwrap();
        assert!(json.get("proofA").is_some());
        assert!(json.get("publicInputs").is_some());
        assert!(json.get("proofSerializedHex").is_some());
        assert!(json.get("publicInputsSerializedHex").is_some());
    }

    #[test]
    fn test_onchain_public_inputs() {
        let inputs = sample_output().onchain_public_inputs().unwrap();
        assert_eq!(inputs.len(), 6);
        // "257" = 0x0101 little-endian
        assert_eq!(inputs[0][..3], [1, 1, 0]);
        // index 6 = 1537 = 0x0601
        assert_eq!(inputs[5][..2], [1, 6]);
    }

    #[test]
    fn test_short_public_inputs() {
        let mut output = sample_output();
        output.public_inputs.truncate(5);
        assert!(matches!(
            output.onchain_public_inputs(),
            Err(ProverError::Serialization(_))
        ));
    }

    #[test]
    fn test_proof_bytes() {
        let output = sample_output();
        assert_eq!(output.proof_bytes().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(output.public_inputs_bytes().unwrap(), vec![0x00, 0xff]);

        let mut bad = output;
        bad.proof_serialized_hex = "xyz".into();
        assert!(bad.proof_bytes().is_err());
    }

    #[test]
    fn test_prover_errors_propagate() {
        let failing = |_: &str, _: &[u8]| -> Result<String> {
            Err(ProverError::External("key mismatch".into()))
        };
        let input: ProofInput = serde_json::from_value(serde_json::json!({
            "vortex": "1", "root": "0", "publicAmount": "0",
            "inputNullifier0": "1", "inputNullifier1": "2",
            "outputCommitment0": "3", "outputCommitment1": "4",
            "hashedAccountSecret": "0", "accountSecret": "0",
            "inPrivateKey0": "1", "inPrivateKey1": "1",
            "inAmount0": "0", "inAmount1": "0",
            "inBlinding0": "5", "inBlinding1": "6",
            "inPathIndex0": "0", "inPathIndex1": "0",
            "merklePath0": [], "merklePath1": [],
            "outPublicKey0": "7", "outPublicKey1": "8",
            "outAmount0": "0", "outAmount1": "0",
            "outBlinding0": "9", "outBlinding1": "10"
        }))
        .unwrap();

        let err = prove_input(&failing, &input, &[]).unwrap_err();
        assert_eq!(err, ProverError::External("key mismatch".into()));

        let echo = |_: &str, _: &[u8]| -> Result<String> {
            Ok(serde_json::to_string(&sample_output()).unwrap())
        };
        assert_eq!(prove_input(&echo, &input, &[]).unwrap(), sample_output());
    }
}
