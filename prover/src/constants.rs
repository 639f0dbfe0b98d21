/// Inputs consumed per transaction; unused slots are zero-amount dummies.
pub const N_INS: usize = 2;

/// Outputs created per transaction.
pub const N_OUTS: usize = 2;

/// Depth of the commitment tree the circuit checks paths against.
pub const MERKLE_TREE_LEVEL: usize = vortex_privacy::MERKLE_TREE_HEIGHT;

/// Amounts are range-checked to this many bits inside the circuit.
pub const MAX_AMOUNT_BITS: u64 = 248;

/// Number of public inputs the circuit exposes, in order:
/// vortex, root, publicAmount, inputNullifier0, inputNullifier1,
/// outputCommitment0, outputCommitment1, hashedAccountSecret.
pub const PUBLIC_INPUT_COUNT: usize = 8;

/// Public inputs passed as transaction arguments (root through outputCommitment1).
pub const ONCHAIN_PUBLIC_INPUTS: std::ops::Range<usize> = 1..7;
