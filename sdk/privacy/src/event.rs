use ark_bn254::Fr;

/// A `NewCommitment` event: one leaf appended to the pool tree together with
/// the encrypted payload addressed to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentEvent {
    /// Leaf position; insertion order of the tree
    pub index: u64,
    pub commitment: Fr,
    pub encrypted_output: Vec<u8>,
}

impl CommitmentEvent {
    pub fn new(index: u64, commitment: Fr, encrypted_output: Vec<u8>) -> Self {
        Self {
            index,
            commitment,
            encrypted_output,
        }
    }
}
