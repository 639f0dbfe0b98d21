//! Input selection for 2-in/2-out transactions
//!
//! Largest notes first, at most two of them, stopping as soon as the target
//! is covered. Empty slots get a zero-amount dummy.

use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;
use vortex_privacy::{Keypair, Utxo};

use crate::constants::N_INS;
use crate::error::{ProverError, Result};

/// Chosen inputs for one transaction.
#[derive(Debug, Clone)]
pub struct Selection {
    pub inputs: [Utxo; N_INS],
    /// Sum of the selected amounts
    pub total: BigUint,
    /// `total - target`, paid back to the owner
    pub change: BigUint,
}

impl Selection {
    pub fn dummy_count(&self) -> usize {
        self.inputs.iter().filter(|u| u.is_dummy()).count()
    }
}

/// Sum of all amounts in `utxos`.
pub fn total_amount(utxos: &[Utxo]) -> BigUint {
    utxos.iter().map(Utxo::amount).sum()
}

/// Pick up to two notes covering `target`, padding with dummies owned by `owner`.
pub fn select_inputs<R: Rng + ?Sized>(
    unspent: &[Utxo],
    target: &BigUint,
    owner: &Keypair,
    rng: &mut R,
) -> Result<Selection> {
    let available = total_amount(unspent);
    if &available < target {
        return Err(ProverError::InsufficientBalance {
            available,
            required: target.clone(),
        });
    }

    let mut sorted: Vec<&Utxo> = unspent.iter().collect();
    sorted.sort_by(|a, b| b.amount().cmp(a.amount()));

    let mut chosen: Vec<Utxo> = Vec::with_capacity(N_INS);
    let mut total = BigUint::zero();
    for utxo in sorted {
        if chosen.len() == N_INS || &total >= target {
            break;
        }
        total += utxo.amount();
        chosen.push(utxo.clone());
    }

    // more than two notes may be needed to cover the target
    if &total < target {
        return Err(ProverError::NegativeChange {
            selected: total,
            target: target.clone(),
        });
    }
    let change = &total - target;

    while chosen.len() < N_INS {
        chosen.push(Utxo::dummy(owner.clone(), rng));
    }
    let inputs: [Utxo; N_INS] = chosen.try_into().map_err(|_| {
        ProverError::Validation(format!("expected exactly {N_INS} inputs"))
    })?;

    log::debug!(
        "selected {} real input(s), total {total}, change {change}",
        N_INS - inputs.iter().filter(|u| u.is_dummy()).count()
    );

    Ok(Selection {
        inputs,
        total,
        change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn owner() -> Keypair {
        Keypair::from_private_key("12345").unwrap()
    }

    fn notes(amounts: &[u64]) -> Vec<Utxo> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                Utxo::new(owner(), BigUint::from(*a), BigUint::from(i as u64 + 1), i as u64)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_selects_both_largest_first() {
        let mut rng = StdRng::seed_from_u64(0);
        let unspent = notes(&[500_000, 700_000]);

        let sel = select_inputs(&unspent, &BigUint::from(1_000_000u64), &owner(), &mut rng)
            .unwrap();
        assert_eq!(sel.inputs[0].amount(), &BigUint::from(700_000u64));
        assert_eq!(sel.inputs[1].amount(), &BigUint::from(500_000u64));
        assert_eq!(sel.change, BigUint::from(200_000u64));
        assert_eq!(sel.dummy_count(), 0);
    }

    #[test]
    fn test_empty_set_is_insufficient() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = select_inputs(&[], &BigUint::from(1u8), &owner(), &mut rng).unwrap_err();
        assert_eq!(
            err,
            ProverError::InsufficientBalance {
                available: BigUint::zero(),
                required: BigUint::from(1u8),
            }
        );
    }

    #[test]
    fn test_single_note_padded_with_dummy() {
        let mut rng = StdRng::seed_from_u64(0);
        let unspent = notes(&[100, 900, 300]);

        let sel = select_inputs(&unspent, &BigUint::from(800u32), &owner(), &mut rng).unwrap();
        assert_eq!(sel.inputs[0].amount(), &BigUint::from(900u32));
        assert!(sel.inputs[1].is_dummy());
        assert_eq!(sel.inputs[1].index(), 0);
        assert_eq!(sel.change, BigUint::from(100u32));
        assert_eq!(sel.dummy_count(), 1);
    }

    #[test]
    fn test_takes_first_two_not_optimal_pair() {
        let mut rng = StdRng::seed_from_u64(0);
        let unspent = notes(&[60, 50, 45]);

        let sel = select_inputs(&unspent, &BigUint::from(95u32), &owner(), &mut rng).unwrap();
        assert_eq!(sel.total, BigUint::from(110u32));
        assert_eq!(sel.change, BigUint::from(15u32));
    }

    #[test]
    fn test_two_notes_not_enough() {
        let mut rng = StdRng::seed_from_u64(0);
        let unspent = notes(&[5, 5, 5]);

        let err = select_inputs(&unspent, &BigUint::from(12u32), &owner(), &mut rng).unwrap_err();
        assert_eq!(
            err,
            ProverError::NegativeChange {
                selected: BigUint::from(10u32),
                target: BigUint::from(12u32),
            }
        );
    }

    #[test]
    fn test_zero_target_uses_dummies() {
        let mut rng = StdRng::seed_from_u64(0);
        let sel = select_inputs(&notes(&[10]), &BigUint::zero(), &owner(), &mut rng).unwrap();
        assert_eq!(sel.dummy_count(), 2);
        assert!(sel.change.is_zero());
    }
}
