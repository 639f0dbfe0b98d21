//! Vortex Privacy SDK
//!
//! UTXO primitives for the Vortex shielded pool over the BN254 scalar field.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Shielded Transaction                      │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │  Nullifiers  │  │ Commitments  │  │   Encrypted Outputs   │  │
//! │  │ H3(cm,i,sig) │  │ H4(a,pk,b,v) │  │  payload XOR H2(sk,1) │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘  │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │     Commitment tree (height 26, Poseidon H2 nodes)      │    │
//! │  │  • Merkle paths as (left, right) pairs per level        │    │
//! │  │  • Empty subtrees hashed from a zero leaf               │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod encryption;
pub mod error;
pub mod event;
pub mod field;
pub mod keypair;
pub mod merkle;
pub mod poseidon;
pub mod utxo;

pub use ark_bn254::Fr;
pub use encryption::{Payload, decrypt_payload, decrypt_payload_with_key, encrypt_payload};
pub use error::{PrivacyError, Result};
pub use event::CommitmentEvent;
pub use field::{
    FIELD_MODULUS, field_to_decimal, parse_field, random_field_element, u256_le_bytes,
    vortex_id_field,
};
pub use keypair::Keypair;
pub use merkle::{CommitmentTree, MERKLE_TREE_HEIGHT, MerklePath, TREE_CAPACITY};
pub use poseidon::{hash1, hash2, hash3, hash4, hash_decimal};
pub use utxo::Utxo;
