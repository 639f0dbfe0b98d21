//! Commitment event scanner
//!
//! Walks the pool's `NewCommitment` events page by page and recovers the
//! notes a keypair can open.
//!
//! ```text
//! EventSource ──page──► parse_event ──► CommitmentPage
//!                                            │
//!              scan_all / scan_with_budget ◄─┘
//!                          │
//!                          ▼
//!            get_unspent_utxos(events, keypair) ──► Vec<Utxo>
//! ```

pub mod graphql;
pub mod source;

use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use vortex_config::VortexConfig;
use vortex_privacy::{CommitmentEvent, Keypair, TREE_CAPACITY, Utxo, decrypt_payload};

pub use graphql::GraphQlEventSource;
pub use source::{EventSource, RawEventPage, commitment_event_type, parse_event};

/// A single parsed page of the scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitmentPage {
    pub events: Vec<CommitmentEvent>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
}

/// Ceiling for interactive scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBudget {
    /// `None` scans to the end of history
    pub max_pages: Option<usize>,
    /// Stop after the first page that holds a note the keypair can open
    pub stop_on_owned: bool,
}

impl ScanBudget {
    pub fn unbounded() -> Self {
        Self {
            max_pages: None,
            stop_on_owned: false,
        }
    }

    pub fn interactive(max_pages: usize) -> Self {
        Self {
            max_pages: Some(max_pages),
            stop_on_owned: true,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_pages.is_none() && !self.stop_on_owned
    }
}

impl Default for ScanBudget {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Events gathered over one or more pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub events: Vec<CommitmentEvent>,
    /// Cursor to resume from
    pub cursor: Option<String>,
    /// More events exist past `cursor`
    pub has_next: bool,
    pub pages: usize,
}

impl ScanResult {
    /// True when the scan reached the end of the event history.
    pub fn is_complete(&self) -> bool {
        !self.has_next
    }
}

pub struct EventScanner<S> {
    source: S,
    event_type: String,
    page_size: usize,
}

impl<S: EventSource> EventScanner<S> {
    pub fn new(source: S, event_type: impl Into<String>, page_size: usize) -> Self {
        Self {
            source,
            event_type: event_type.into(),
            page_size: page_size.max(1),
        }
    }

    pub fn from_config(source: S, config: &VortexConfig) -> Self {
        let event_type = commitment_event_type(&config.pool.package_id, &config.pool.coin_type);
        Self::new(source, event_type, config.scan.page_size)
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and parse one page. Unparseable records are dropped; the cursor
    /// and has-more flag come back exactly as the source reported them.
    pub async fn scan_page(&self, cursor: Option<&str>) -> Result<CommitmentPage> {
        let raw = self
            .source
            .fetch_events(&self.event_type, cursor, self.page_size)
            .await?;

        let total = raw.nodes.len();
        let events: Vec<CommitmentEvent> = raw.nodes.iter().filter_map(parse_event).collect();
        if events.len() < total {
            debug!("dropped {} of {} event records", total - events.len(), total);
        }

        Ok(CommitmentPage {
            events,
            next_cursor: raw.end_cursor,
            has_next: raw.has_next_page,
        })
    }

    /// Every event from the start of history. Unbounded.
    pub async fn scan_all(&self) -> Result<ScanResult> {
        self.scan_from(None, &ScanBudget::unbounded(), None).await
    }

    /// Interactive scan: stops at the page budget, or after the first page
    /// holding a note `keypair` can open when `budget.stop_on_owned` is set.
    pub async fn scan_with_budget(
        &self,
        start: Option<String>,
        budget: &ScanBudget,
        keypair: &Keypair,
    ) -> Result<ScanResult> {
        self.scan_from(start, budget, Some(keypair)).await
    }

    async fn scan_from(
        &self,
        start: Option<String>,
        budget: &ScanBudget,
        keypair: Option<&Keypair>,
    ) -> Result<ScanResult> {
        let mut result = ScanResult {
            cursor: start,
            has_next: true,
            ..Default::default()
        };

        while result.has_next {
            if budget.max_pages.is_some_and(|max| result.pages >= max) {
                info!("scan budget of {} pages reached", result.pages);
                break;
            }

            let page = self.scan_page(result.cursor.as_deref()).await?;
            result.pages += 1;

            if page.has_next && (page.next_cursor.is_none() || page.next_cursor == result.cursor) {
                return Err(anyhow!(
                    "event source reported more pages without advancing the cursor (page {}, cursor {:?})",
                    result.pages,
                    result.cursor
                ));
            }

            let owned = match keypair {
                Some(kp) if budget.stop_on_owned => page
                    .events
                    .iter()
                    .any(|e| decrypt_payload(&e.encrypted_output, kp).is_some()),
                _ => false,
            };

            debug!(
                "page {}: {} events, has_next={}",
                result.pages,
                page.events.len(),
                page.has_next
            );

            result.events.extend(page.events);
            result.cursor = page.next_cursor;
            result.has_next = page.has_next;

            if owned {
                info!("owned note found on page {}, stopping scan", result.pages);
                break;
            }
        }

        info!(
            "scanned {} events over {} pages (complete: {})",
            result.events.len(),
            result.pages,
            result.is_complete()
        );
        Ok(result)
    }
}

/// Notes in `events` that `keypair` can decrypt, in event order.
///
/// Events at or beyond tree capacity are skipped, they can never be proven.
pub fn get_unspent_utxos(events: &[CommitmentEvent], keypair: &Keypair) -> Vec<Utxo> {
    events
        .iter()
        .filter_map(|event| {
            if event.index >= TREE_CAPACITY {
                debug!("skipping event {} beyond tree capacity", event.index);
                return None;
            }
            let payload = decrypt_payload(&event.encrypted_output, keypair)?;
            match Utxo::new(keypair.clone(), payload.amount, payload.blinding, event.index) {
                Ok(utxo) => Some(utxo),
                Err(e) => {
                    warn!("discarding note {}: {}", event.index, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use vortex_privacy::{Fr, Payload, encrypt_payload};

    fn keypair(sk: u64) -> Keypair {
        Keypair::from_field(Fr::from(sk)).unwrap()
    }

    fn event_for(kp: &Keypair, index: u64, amount: u64, blinding: u64) -> CommitmentEvent {
        let payload = Payload::new(BigUint::from(amount), BigUint::from(blinding));
        CommitmentEvent::new(
            index,
            Fr::from(index + 1),
            encrypt_payload(&payload, kp.encryption_key()),
        )
    }

    #[test]
    fn test_get_unspent_round_trip() {
        let mine = keypair(12345);
        let other = keypair(999);
        let events = vec![
            event_for(&mine, 4, 10, 11),
            event_for(&other, 5, 20, 21),
            event_for(&mine, 2, 30, 31),
        ];

        let utxos = get_unspent_utxos(&events, &mine);
        assert_eq!(utxos.len(), 2);
        assert_eq!(utxos[0].index(), 4);
        assert_eq!(utxos[0].amount(), &BigUint::from(10u8));
        assert_eq!(utxos[0].blinding(), &BigUint::from(11u8));
        // event order, not index order
        assert_eq!(utxos[1].index(), 2);
        assert_eq!(utxos[1].amount(), &BigUint::from(30u8));
    }

    #[test]
    fn test_capacity_boundary() {
        let kp = keypair(7);
        let events = vec![
            event_for(&kp, TREE_CAPACITY - 1, 1, 1),
            event_for(&kp, TREE_CAPACITY, 2, 2),
        ];
        let utxos = get_unspent_utxos(&events, &kp);
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].index(), TREE_CAPACITY - 1);
    }

    #[test]
    fn test_garbage_ciphertext_is_not_owned() {
        let kp = keypair(7);
        let events = vec![CommitmentEvent::new(0, Fr::from(1u8), vec![0xff; 40])];
        assert!(get_unspent_utxos(&events, &kp).is_empty());
    }

    #[test]
    fn test_budget_constructors() {
        assert!(ScanBudget::default().is_unbounded());
        let budget = ScanBudget::interactive(3);
        assert_eq!(budget.max_pages, Some(3));
        assert!(budget.stop_on_owned);
        assert!(!budget.is_unbounded());
    }
}
