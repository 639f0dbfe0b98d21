//! Vortex client core
//!
//! ```text
//! ┌──────────────┐   pages   ┌──────────────┐  events  ┌────────────────────┐
//! │ EventSource  │ ────────► │ EventScanner │ ───────► │ TransactionPipeline│
//! │ (GraphQL)    │           └──────────────┘          │  tree + selection  │
//! └──────────────┘                  │                  └─────────┬──────────┘
//!                                   ▼                            ▼
//!                             InboxState (JSON)           PreparedTransaction
//!                                                          └─► Prover
//! ```

pub mod inbox;
pub mod scanner;
pub mod transaction;

pub use inbox::{InboxState, UtxoRecord};
pub use scanner::{
    CommitmentPage, EventScanner, EventSource, GraphQlEventSource, RawEventPage, ScanBudget,
    ScanResult, commitment_event_type, get_unspent_utxos,
};
pub use transaction::{PreparedTransaction, Reservation, Snapshot, TransactionPipeline};
