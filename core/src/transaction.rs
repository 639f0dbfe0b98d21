//! Transaction pipeline
//!
//! scan -> tree -> select -> paths -> proof input, for one keypair.
//!
//! Scanning is async and produces a [`Snapshot`] that the pipeline's sync
//! `prepare_*` calls consume. Every spend reserves the indices of the notes it
//! selected until its [`Reservation`] is dropped, so two spends prepared from
//! the same pipeline never pick the same note.

use anyhow::{Context, Result, anyhow};
use dashmap::DashSet;
use log::{debug, info, warn};
use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;
use std::sync::Arc;
use vortex_config::VortexConfig;
use vortex_privacy::field::{field_from_biguint, field_to_biguint};
use vortex_privacy::{
    CommitmentEvent, CommitmentTree, Fr, Keypair, MerklePath, Payload, Utxo, encrypt_payload,
    random_field_element, vortex_id_field,
};
use vortex_prover::{
    InputWitness, OutputWitness, ProofInput, ProofInputBuilder, ProofOutput, Prover,
    prove_input, public_amount, select_inputs, total_amount,
};

use crate::scanner::{EventScanner, EventSource, ScanBudget, get_unspent_utxos};

/// Pool state as seen by one scan. Owned by the spend that uses it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub events: Vec<CommitmentEvent>,
    pub tree: CommitmentTree,
    /// Non-zero notes owned by the pipeline's keypair, in event order
    pub unspent: Vec<Utxo>,
    pub cursor: Option<String>,
    /// The scan reached the end of the event history
    pub complete: bool,
}

impl Snapshot {
    pub fn root(&self) -> Fr {
        self.tree.root()
    }

    pub fn balance(&self) -> BigUint {
        total_amount(&self.unspent)
    }
}

/// Holds note indices out of selection until dropped.
#[derive(Debug)]
pub struct Reservation {
    indices: Vec<u64>,
    reserved: Arc<DashSet<u64>>,
    kept: bool,
}

impl Reservation {
    fn empty(reserved: Arc<DashSet<u64>>) -> Self {
        Self {
            indices: Vec::new(),
            reserved,
            kept: false,
        }
    }

    /// Reserve every index or none of them.
    fn acquire(reserved: Arc<DashSet<u64>>, indices: &[u64]) -> Result<Self> {
        let mut guard = Self::empty(reserved);
        for &index in indices {
            if !guard.reserved.insert(index) {
                // guard drops here and releases what it took
                return Err(anyhow!("note {} is reserved by another transaction", index));
            }
            guard.indices.push(index);
        }
        Ok(guard)
    }

    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Keep the indices reserved for the lifetime of the pipeline, e.g. once
    /// the transaction has been submitted and the notes are spent.
    pub fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        for index in &self.indices {
            self.reserved.remove(index);
        }
        if !self.indices.is_empty() {
            debug!("released reservation on {:?}", self.indices);
        }
    }
}

/// A transaction ready for the prover.
#[derive(Debug)]
pub struct PreparedTransaction {
    pub proof_input: ProofInput,
    pub root: Fr,
    pub input_nullifiers: [Fr; 2],
    pub output_commitments: [Fr; 2],
    /// Payload ciphertexts in output order
    pub encrypted_outputs: [Vec<u8>; 2],
    pub change: BigUint,
    pub reservation: Reservation,
}

impl PreparedTransaction {
    pub fn prove<P: Prover + ?Sized>(&self, prover: &P, proving_key: &[u8]) -> Result<ProofOutput> {
        prove_input(prover, &self.proof_input, proving_key).context("Proof generation failed")
    }
}

struct Output {
    witness: OutputWitness,
    ciphertext: Vec<u8>,
}

impl Output {
    fn new<R: Rng + ?Sized>(
        public_key: Fr,
        encryption_key: &Fr,
        amount: &BigUint,
        rng: &mut R,
    ) -> Result<Self> {
        let blinding = random_field_element(rng);
        let witness = OutputWitness::new(public_key, field_from_biguint(amount)?, blinding);
        let payload = Payload::new(amount.clone(), field_to_biguint(&blinding));
        Ok(Self {
            witness,
            ciphertext: encrypt_payload(&payload, encryption_key),
        })
    }
}

pub struct TransactionPipeline<S> {
    scanner: EventScanner<S>,
    keypair: Keypair,
    vortex_id: Fr,
    budget: ScanBudget,
    full_scan_before_spend: bool,
    reserved: Arc<DashSet<u64>>,
}

impl<S: EventSource> TransactionPipeline<S> {
    pub fn new(scanner: EventScanner<S>, keypair: Keypair, vortex_id: Fr) -> Self {
        Self {
            scanner,
            keypair,
            vortex_id,
            budget: ScanBudget::unbounded(),
            full_scan_before_spend: true,
            reserved: Arc::new(DashSet::new()),
        }
    }

    pub fn from_config(source: S, keypair: Keypair, config: &VortexConfig) -> Result<Self> {
        let vortex_id = vortex_id_field(&config.pool.vortex_id)
            .with_context(|| format!("Invalid vortex id '{}'", config.pool.vortex_id))?;
        let budget = ScanBudget {
            max_pages: Some(config.scan.page_budget),
            stop_on_owned: config.scan.stop_on_owned,
        };

        Ok(Self::new(EventScanner::from_config(source, config), keypair, vortex_id)
            .with_budget(budget)
            .with_full_scan(config.scan.full_scan_before_spend))
    }

    /// Page ceiling used when full scans are off.
    pub fn with_budget(mut self, budget: ScanBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_full_scan(mut self, full_scan: bool) -> Self {
        self.full_scan_before_spend = full_scan;
        self
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn vortex_id(&self) -> &Fr {
        &self.vortex_id
    }

    pub fn scanner(&self) -> &EventScanner<S> {
        &self.scanner
    }

    pub fn is_reserved(&self, index: u64) -> bool {
        self.reserved.contains(&index)
    }

    /// Scan the pool and rebuild the tree.
    ///
    /// With full scans off the tree only covers the pages read, and a root
    /// built from it may not be one the pool has seen.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let scan = if self.full_scan_before_spend {
            self.scanner.scan_all().await?
        } else {
            self.scanner
                .scan_with_budget(None, &self.budget, &self.keypair)
                .await?
        };

        if !scan.is_complete() {
            warn!(
                "scan stopped after {} pages with more events pending; root may be stale",
                scan.pages
            );
        }

        let tree = CommitmentTree::from_events(&scan.events)?;
        let unspent: Vec<Utxo> = get_unspent_utxos(&scan.events, &self.keypair)
            .into_iter()
            .filter(|utxo| !utxo.amount().is_zero())
            .collect();

        info!(
            "snapshot: {} leaves, {} spendable notes, balance {}",
            tree.len(),
            unspent.len(),
            total_amount(&unspent)
        );

        Ok(Snapshot {
            complete: scan.is_complete(),
            cursor: scan.cursor,
            events: scan.events,
            tree,
            unspent,
        })
    }

    /// Move `amount` from outside into a note owned by this keypair.
    pub fn prepare_deposit<R: Rng + ?Sized>(
        &self,
        snapshot: &Snapshot,
        amount: &BigUint,
        rng: &mut R,
    ) -> Result<PreparedTransaction> {
        let inputs = [
            Utxo::dummy(self.keypair.clone(), rng),
            Utxo::dummy(self.keypair.clone(), rng),
        ];
        let outputs = [
            self.self_output(amount, rng)?,
            self.self_output(&BigUint::zero(), rng)?,
        ];

        self.assemble(
            snapshot,
            &inputs,
            outputs,
            public_amount(amount, &BigUint::zero())?,
            BigUint::zero(),
            Reservation::empty(self.reserved.clone()),
        )
    }

    /// Pay `amount` to another keypair, returning change to this one.
    pub fn prepare_transfer<R: Rng + ?Sized>(
        &self,
        snapshot: &Snapshot,
        recipient_public_key: Fr,
        recipient_encryption_key: &Fr,
        amount: &BigUint,
        rng: &mut R,
    ) -> Result<PreparedTransaction> {
        let (selection, reservation) = self.select(snapshot, amount, rng)?;
        let outputs = [
            Output::new(recipient_public_key, recipient_encryption_key, amount, rng)?,
            self.self_output(&selection.change, rng)?,
        ];

        self.assemble(
            snapshot,
            &selection.inputs,
            outputs,
            public_amount(&BigUint::zero(), &BigUint::zero())?,
            selection.change,
            reservation,
        )
    }

    /// Take `amount` out of the pool.
    pub fn prepare_withdraw<R: Rng + ?Sized>(
        &self,
        snapshot: &Snapshot,
        amount: &BigUint,
        rng: &mut R,
    ) -> Result<PreparedTransaction> {
        let (selection, reservation) = self.select(snapshot, amount, rng)?;
        let outputs = [
            self.self_output(&selection.change, rng)?,
            self.self_output(&BigUint::zero(), rng)?,
        ];

        self.assemble(
            snapshot,
            &selection.inputs,
            outputs,
            public_amount(&BigUint::zero(), amount)?,
            selection.change,
            reservation,
        )
    }

    fn self_output<R: Rng + ?Sized>(&self, amount: &BigUint, rng: &mut R) -> Result<Output> {
        Output::new(
            *self.keypair.public_key(),
            self.keypair.encryption_key(),
            amount,
            rng,
        )
    }

    fn select<R: Rng + ?Sized>(
        &self,
        snapshot: &Snapshot,
        amount: &BigUint,
        rng: &mut R,
    ) -> Result<(vortex_prover::Selection, Reservation)> {
        let available: Vec<Utxo> = snapshot
            .unspent
            .iter()
            .filter(|utxo| !self.reserved.contains(&utxo.index()))
            .cloned()
            .collect();

        let selection = select_inputs(&available, amount, &self.keypair, rng)?;
        let indices: Vec<u64> = selection
            .inputs
            .iter()
            .filter(|utxo| !utxo.is_dummy())
            .map(Utxo::index)
            .collect();

        let reservation = Reservation::acquire(self.reserved.clone(), &indices)?;
        Ok((selection, reservation))
    }

    fn assemble(
        &self,
        snapshot: &Snapshot,
        inputs: &[Utxo; 2],
        outputs: [Output; 2],
        public_amount: Fr,
        change: BigUint,
        reservation: Reservation,
    ) -> Result<PreparedTransaction> {
        let root = snapshot.root();

        let mut witnesses = Vec::with_capacity(inputs.len());
        for utxo in inputs {
            let path = if utxo.is_dummy() {
                // membership is only enforced for non-zero input amounts
                MerklePath::zeroed()
            } else {
                let path = snapshot
                    .tree
                    .path(utxo.index())
                    .with_context(|| format!("No tree path for note {}", utxo.index()))?;
                if !path.verify(&utxo.commitment(&self.vortex_id)?, &root)? {
                    return Err(anyhow!(
                        "note {} does not match the tree leaf at its index",
                        utxo.index()
                    ));
                }
                path
            };
            witnesses.push(InputWitness::from_utxo(utxo, path)?);
        }
        let input_witnesses: [InputWitness; 2] = witnesses
            .try_into()
            .map_err(|_| anyhow!("expected two input witnesses"))?;

        let [out0, out1] = outputs;
        let output_witnesses = [out0.witness, out1.witness];

        let proof_input = ProofInputBuilder::new(self.vortex_id, root)
            .with_public_amount(public_amount)
            .build(&input_witnesses, &output_witnesses)?;

        let input_nullifiers = [
            input_witnesses[0].nullifier(&self.vortex_id)?,
            input_witnesses[1].nullifier(&self.vortex_id)?,
        ];
        let output_commitments = [
            output_witnesses[0].commitment(&self.vortex_id)?,
            output_witnesses[1].commitment(&self.vortex_id)?,
        ];

        debug!(
            "prepared transaction against root {} reserving {:?}",
            proof_input.root,
            reservation.indices()
        );

        Ok(PreparedTransaction {
            proof_input,
            root,
            input_nullifiers,
            output_commitments,
            encrypted_outputs: [out0.ciphertext, out1.ciphertext],
            change,
            reservation,
        })
    }
}
