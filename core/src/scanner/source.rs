//! Event source boundary
//!
//! Raw commitment events arrive as JSON objects:
//!
//! ```text
//! { "index": "42", "commitment": "<decimal>", "encrypted_output": "<base64>" }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use serde_json::Value;
use vortex_privacy::{CommitmentEvent, parse_field};

/// One page of raw events as returned by the ledger query service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEventPage {
    pub nodes: Vec<Value>,
    /// Opaque cursor of the last node, passed back verbatim as `after`
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Paginated read access to events of one type.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(
        &self,
        event_type: &str,
        after: Option<&str>,
        first: usize,
    ) -> Result<RawEventPage>;
}

/// `"<package>::vortex_events::NewCommitment<CoinType>"`
pub fn commitment_event_type(package_id: &str, coin_type: &str) -> String {
    format!("{package_id}::vortex_events::NewCommitment<{coin_type}>")
}

/// Parse one raw node; `None` when a field is absent or malformed.
pub fn parse_event(node: &Value) -> Option<CommitmentEvent> {
    let field = |name: &str| node.get(name).and_then(Value::as_str);

    let (Some(index), Some(commitment), Some(encrypted)) = (
        field("index"),
        field("commitment"),
        field("encrypted_output"),
    ) else {
        debug!("dropping event without index/commitment/encrypted_output");
        return None;
    };

    let index = match index.parse::<u64>() {
        Ok(i) => i,
        Err(e) => {
            warn!("dropping event with bad index '{}': {}", index, e);
            return None;
        }
    };
    let commitment = match parse_field(commitment) {
        Ok(c) => c,
        Err(e) => {
            warn!("dropping event {}: {}", index, e);
            return None;
        }
    };
    let encrypted_output = match STANDARD.decode(encrypted) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("dropping event {}: bad encrypted_output: {}", index, e);
            return None;
        }
    };

    Some(CommitmentEvent::new(index, commitment, encrypted_output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vortex_privacy::Fr;

    #[test]
    fn test_event_type() {
        assert_eq!(
            commitment_event_type("0xabc", "0x2::sui::SUI"),
            "0xabc::vortex_events::NewCommitment<0x2::sui::SUI>"
        );
    }

    #[test]
    fn test_parse_event() {
        let node = json!({
            "index": "7",
            "commitment": "12345",
            "encrypted_output": STANDARD.encode([1u8, 2, 3]),
        });
        let event = parse_event(&node).unwrap();
        assert_eq!(event.index, 7);
        assert_eq!(event.commitment, Fr::from(12345u64));
        assert_eq!(event.encrypted_output, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_fields_are_dropped() {
        assert!(parse_event(&json!({"index": "1", "commitment": "2"})).is_none());
        assert!(parse_event(&json!({"commitment": "2", "encrypted_output": ""})).is_none());
        assert!(parse_event(&Value::Null).is_none());
    }

    #[test]
    fn test_malformed_fields_are_dropped() {
        let base = |index: &str, commitment: &str, out: &str| {
            json!({"index": index, "commitment": commitment, "encrypted_output": out})
        };
        assert!(parse_event(&base("x", "1", "AQID")).is_none());
        assert!(parse_event(&base("1", "nope", "AQID")).is_none());
        assert!(parse_event(&base("1", "1", "%%%")).is_none());
        // numbers instead of strings
        assert!(parse_event(&json!({"index": 1, "commitment": "1", "encrypted_output": "AQID"})).is_none());
    }
}
