//! Persisted scan state for one keypair.
//!
//! Keeps the notes recovered so far plus the cursor to resume scanning from,
//! so a wallet does not walk the whole event history on every start.

use anyhow::{Context, Result};
use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use vortex_privacy::{Keypair, Utxo};

use crate::scanner::{ScanResult, get_unspent_utxos};

/// A recovered note, amounts as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoRecord {
    pub amount: String,
    pub blinding: String,
    #[serde(with = "decimal_index")]
    pub index: u64,
}

/// Leaf indices travel as decimal strings like the amounts.
mod decimal_index {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(index: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(index)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(D::Error::custom(format!("'{value}' is not a decimal index")));
        }
        value.parse().map_err(D::Error::custom)
    }
}

impl From<&Utxo> for UtxoRecord {
    fn from(utxo: &Utxo) -> Self {
        Self {
            amount: utxo.amount().to_str_radix(10),
            blinding: utxo.blinding().to_str_radix(10),
            index: utxo.index(),
        }
    }
}

impl UtxoRecord {
    pub fn amount(&self) -> Result<BigUint> {
        parse_decimal(&self.amount).with_context(|| format!("note {} amount", self.index))
    }

    pub fn blinding(&self) -> Result<BigUint> {
        parse_decimal(&self.blinding).with_context(|| format!("note {} blinding", self.index))
    }
}

fn parse_decimal(value: &str) -> Result<BigUint> {
    BigUint::parse_bytes(value.as_bytes(), 10)
        .with_context(|| format!("'{value}' is not a decimal integer"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxState {
    /// Resume point for the next scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub utxos: Vec<UtxoRecord>,
}

impl InboxState {
    pub fn from_utxos(utxos: &[Utxo]) -> Self {
        Self {
            utxos: utxos.iter().map(UtxoRecord::from).collect(),
            ..Default::default()
        }
    }

    /// Rebuild the notes for `keypair`.
    pub fn to_utxos(&self, keypair: &Keypair) -> Result<Vec<Utxo>> {
        self.utxos
            .iter()
            .map(|record| {
                Utxo::new(
                    keypair.clone(),
                    record.amount()?,
                    record.blinding()?,
                    record.index,
                )
                .with_context(|| format!("invalid note at index {}", record.index))
            })
            .collect()
    }

    /// Merge an incremental scan. Notes already known by index are skipped,
    /// new ones are appended in event order. Returns how many were added.
    pub fn absorb(&mut self, scan: &ScanResult, keypair: &Keypair) -> usize {
        let mut known: HashSet<u64> = self.utxos.iter().map(|r| r.index).collect();

        let before = self.utxos.len();
        for utxo in get_unspent_utxos(&scan.events, keypair) {
            if known.insert(utxo.index()) {
                self.utxos.push(UtxoRecord::from(&utxo));
            }
        }

        if scan.cursor.is_some() {
            self.cursor = scan.cursor.clone();
        }
        self.has_next = scan.has_next;

        let added = self.utxos.len() - before;
        debug!("inbox absorbed {} new note(s), {} total", added, self.utxos.len());
        added
    }

    pub fn balance(&self) -> Result<BigUint> {
        self.utxos.iter().map(UtxoRecord::amount).sum()
    }

    /// Read state from `path`; a missing file is an empty inbox.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no inbox at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read inbox: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse inbox: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write inbox: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vortex_privacy::{CommitmentEvent, Fr, Payload, encrypt_payload};

    fn keypair() -> Keypair {
        Keypair::from_field(Fr::from(12345u64)).unwrap()
    }

    fn event(kp: &Keypair, index: u64, amount: u64) -> CommitmentEvent {
        let payload = Payload::new(BigUint::from(amount), BigUint::from(index + 100));
        CommitmentEvent::new(index, Fr::from(index), encrypt_payload(&payload, kp.encryption_key()))
    }

    #[test]
    fn test_camel_case_layout() {
        let state = InboxState {
            cursor: Some("c1".into()),
            has_next: true,
            utxos: vec![UtxoRecord {
                amount: "5".into(),
                blinding: "6".into(),
                index: 3,
            }],
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["hasNext"], true);
        assert_eq!(json["cursor"], "c1");
        assert_eq!(json["utxos"][0]["amount"], "5");
        assert_eq!(json["utxos"][0]["index"], "3");

        let fresh = serde_json::to_value(InboxState::default()).unwrap();
        assert!(fresh.get("cursor").is_none());
    }

    #[test]
    fn test_loads_decimal_string_layout() {
        let state: InboxState = serde_json::from_str(
            r#"{"hasNext":false,"utxos":[{"amount":"5","blinding":"6","index":"3"}]}"#,
        )
        .unwrap();
        assert_eq!(state.cursor, None);
        assert_eq!(state.utxos[0].index, 3);
        assert_eq!(state.balance().unwrap(), BigUint::from(5u8));

        let with_null: InboxState = serde_json::from_str(
            r#"{"cursor":null,"hasNext":true,"utxos":[{"amount":"5","blinding":"6","index":"12"}]}"#,
        )
        .unwrap();
        assert!(with_null.has_next);
        assert_eq!(with_null.utxos[0].index, 12);

        for bad in ["3", "\"-3\"", "\"3x\"", "\"\""] {
            let json = format!(r#"{{"utxos":[{{"amount":"5","blinding":"6","index":{bad}}}]}}"#);
            assert!(serde_json::from_str::<InboxState>(&json).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_absorb_dedupes_by_index() {
        let kp = keypair();
        let mut state = InboxState::default();

        let first = ScanResult {
            events: vec![event(&kp, 0, 10), event(&kp, 1, 20)],
            cursor: Some("p1".into()),
            has_next: true,
            pages: 1,
        };
        assert_eq!(state.absorb(&first, &kp), 2);

        let second = ScanResult {
            events: vec![event(&kp, 1, 20), event(&kp, 2, 30)],
            cursor: None,
            has_next: false,
            pages: 1,
        };
        assert_eq!(state.absorb(&second, &kp), 1);

        assert_eq!(state.cursor.as_deref(), Some("p1"));
        assert!(!state.has_next);
        assert_eq!(state.balance().unwrap(), BigUint::from(60u8));
        let indices: Vec<u64> = state.utxos.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_to_utxos() {
        let kp = keypair();
        let utxo = Utxo::new(kp.clone(), BigUint::from(42u8), BigUint::from(7u8), 9).unwrap();
        let state = InboxState::from_utxos(std::slice::from_ref(&utxo));
        assert_eq!(state.to_utxos(&kp).unwrap(), vec![utxo]);

        let mut broken = state;
        broken.utxos[0].amount = "4x".into();
        assert!(broken.to_utxos(&kp).is_err());
        assert!(broken.balance().is_err());
    }
}
