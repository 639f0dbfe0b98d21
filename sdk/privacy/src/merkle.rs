//! Commitment Merkle tree
//!
//! Fixed-height binary tree over commitment leaves, rebuilt level by level
//! after every insertion. Paths carry both nodes of each pair because the
//! circuit recomputes every hash itself.
//!
//! ```text
//!   level 2           R
//!                   /   \
//!   level 1       H01    H2e          e = empty subtree hash of level 0
//!                /  \    /  \
//!   level 0     C0  C1  C2   e
//! ```

use ark_bn254::Fr;
use ark_ff::Zero;

use crate::error::{PrivacyError, Result};
use crate::event::CommitmentEvent;
use crate::field::field_to_decimal;
use crate::poseidon::hash2;

/// Tree height (2^26 leaves)
pub const MERKLE_TREE_HEIGHT: usize = 26;

/// Number of leaves the tree can hold
pub const TREE_CAPACITY: u64 = 1 << MERKLE_TREE_HEIGHT;

/// Value of an unoccupied leaf
pub fn empty_leaf() -> Fr {
    Fr::zero()
}

/// `empty[0] = empty_leaf`, `empty[i] = H2(empty[i-1], empty[i-1])` for `i` in `1..=height`.
pub fn empty_subtree_hashes(height: usize) -> Result<Vec<Fr>> {
    let mut hashes = Vec::with_capacity(height + 1);
    let mut current = empty_leaf();
    hashes.push(current);

    for _ in 0..height {
        current = hash2(&current, &current)?;
        hashes.push(current);
    }

    Ok(hashes)
}

/// Authentication path: one `(left, right)` pair per level, leaf level first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePath {
    index: u64,
    pairs: Vec<(Fr, Fr)>,
}

impl MerklePath {
    pub fn new(index: u64, pairs: Vec<(Fr, Fr)>) -> Self {
        Self { index, pairs }
    }

    /// All-zero path used for zero-amount inputs, whose membership the circuit skips.
    pub fn zeroed() -> Self {
        Self {
            index: 0,
            pairs: vec![(Fr::zero(), Fr::zero()); MERKLE_TREE_HEIGHT],
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn pairs(&self) -> &[(Fr, Fr)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Root obtained by hashing `leaf` upwards, placing the running hash on
    /// the side given by the index bit of each level.
    pub fn calculate_root(&self, leaf: &Fr) -> Result<Fr> {
        let mut current = *leaf;
        let mut index = self.index;

        for (left, right) in &self.pairs {
            current = if index & 1 == 0 {
                hash2(&current, right)?
            } else {
                hash2(left, &current)?
            };
            index >>= 1;
        }

        Ok(current)
    }

    /// True when every pair holds the running hash on the expected side and
    /// the final hash equals `root`.
    pub fn verify(&self, leaf: &Fr, root: &Fr) -> Result<bool> {
        let mut current = *leaf;
        let mut index = self.index;

        for (left, right) in &self.pairs {
            let on_path = if index & 1 == 0 { left } else { right };
            if *on_path != current {
                return Ok(false);
            }
            current = hash2(left, right)?;
            index >>= 1;
        }

        Ok(current == *root)
    }

    /// `[left, right]` decimal pairs as consumed by the prover.
    pub fn to_decimal_pairs(&self) -> Vec<[String; 2]> {
        self.pairs
            .iter()
            .map(|(l, r)| [field_to_decimal(l), field_to_decimal(r)])
            .collect()
    }
}

/// Append-only commitment tree of height [`MERKLE_TREE_HEIGHT`].
///
/// `levels[0]` holds the leaves; `levels[i]` has `ceil(len(levels[i-1]) / 2)`
/// nodes. A tree instance is owned by the scan or transaction that built it.
#[derive(Debug, Clone)]
pub struct CommitmentTree {
    levels: Vec<Vec<Fr>>,
    empty: Vec<Fr>,
}

impl CommitmentTree {
    pub fn new() -> Result<Self> {
        let empty = empty_subtree_hashes(MERKLE_TREE_HEIGHT)?;
        let mut tree = Self {
            levels: vec![Vec::new()],
            empty,
        };
        tree.rebuild()?;
        Ok(tree)
    }

    /// Rebuild a tree from scanned events, ordered by their on-chain index.
    ///
    /// The root only matches the ledger when `events` covers every leaf.
    pub fn from_events(events: &[CommitmentEvent]) -> Result<Self> {
        let mut sorted: Vec<&CommitmentEvent> = events.iter().collect();
        sorted.sort_by_key(|e| e.index);

        let commitments: Vec<Fr> = sorted.iter().map(|e| e.commitment).collect();
        let mut tree = Self::new()?;
        tree.bulk_insert(&commitments)?;
        Ok(tree)
    }

    pub fn height(&self) -> usize {
        MERKLE_TREE_HEIGHT
    }

    pub fn capacity(&self) -> u64 {
        TREE_CAPACITY
    }

    pub fn leaves(&self) -> &[Fr] {
        &self.levels[0]
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn levels(&self) -> &[Vec<Fr>] {
        &self.levels
    }

    /// Empty-subtree hash for `level` (0 = leaf level).
    pub fn empty_hash(&self, level: usize) -> Option<&Fr> {
        self.empty.get(level)
    }

    /// Append all commitments, then rebuild.
    pub fn bulk_insert(&mut self, commitments: &[Fr]) -> Result<()> {
        let new_len = (self.len() + commitments.len()) as u64;
        if new_len > TREE_CAPACITY {
            return Err(PrivacyError::CapacityExceeded {
                index: new_len - 1,
                capacity: TREE_CAPACITY,
            });
        }

        self.levels[0].extend_from_slice(commitments);
        self.rebuild()
    }

    /// Append exactly two leaves (the two outputs of one transaction).
    pub fn insert_pair(&mut self, first: Fr, second: Fr) -> Result<()> {
        self.bulk_insert(&[first, second])
    }

    pub fn root(&self) -> Fr {
        self.levels
            .get(MERKLE_TREE_HEIGHT)
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(self.empty[MERKLE_TREE_HEIGHT])
    }

    pub fn path(&self, index: u64) -> Result<MerklePath> {
        let len = self.len() as u64;
        if index >= len {
            return Err(PrivacyError::IndexOutOfBounds { index, len });
        }

        let mut pairs = Vec::with_capacity(MERKLE_TREE_HEIGHT);
        let mut position = index as usize;

        for level in 0..MERKLE_TREE_HEIGHT {
            let nodes = &self.levels[level];
            let left_pos = position & !1;
            let node_or_empty = |pos: usize| nodes.get(pos).copied().unwrap_or(self.empty[level]);

            pairs.push((node_or_empty(left_pos), node_or_empty(left_pos + 1)));
            position >>= 1;
        }

        Ok(MerklePath::new(index, pairs))
    }

    fn rebuild(&mut self) -> Result<()> {
        self.levels.truncate(1);

        for level in 1..=MERKLE_TREE_HEIGHT {
            let previous = &self.levels[level - 1];

            let next = if previous.is_empty() {
                vec![self.empty[level]]
            } else {
                previous
                    .chunks(2)
                    .map(|pair| {
                        let right = pair.get(1).unwrap_or(&self.empty[level - 1]);
                        hash2(&pair[0], right)
                    })
                    .collect::<Result<Vec<_>>>()?
            };

            self.levels.push(next);
        }

        Ok(())
    }
}
