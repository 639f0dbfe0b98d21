//! GraphQL event source
//!
//! Pages through `events(filter: { type })` on the ledger's GraphQL
//! endpoint and hands back each event's `contents.json`.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use vortex_config::NetworkConfig;

use super::source::{EventSource, RawEventPage};

pub const EVENTS_QUERY: &str = r#"
query Events($type: String!, $first: Int, $after: String) {
  events(filter: { type: $type }, first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    nodes { contents { json } }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<EventsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct EventsData {
    events: EventConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventConnection {
    page_info: PageInfo,
    nodes: Vec<EventNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventNode {
    contents: Option<EventContents>,
}

#[derive(Debug, Deserialize)]
struct EventContents {
    json: Value,
}

/// Turn a raw GraphQL response body into a page.
fn into_page(body: Value) -> Result<RawEventPage> {
    let response: GraphQlResponse =
        serde_json::from_value(body).context("Malformed GraphQL response")?;

    if let Some(first) = response.errors.first() {
        return Err(anyhow!(
            "GraphQL query failed ({} errors): {}",
            response.errors.len(),
            first.message
        ));
    }

    let events = response
        .data
        .ok_or_else(|| anyhow!("GraphQL response carried no data"))?
        .events;

    let nodes = events
        .nodes
        .into_iter()
        .filter_map(|node| match node.contents {
            Some(contents) => Some(contents.json),
            None => {
                warn!("Skipping event node without contents");
                None
            }
        })
        .collect();

    Ok(RawEventPage {
        nodes,
        end_cursor: events.page_info.end_cursor,
        has_next_page: events.page_info.has_next_page,
    })
}

/// [`EventSource`] backed by a GraphQL endpoint.
pub struct GraphQlEventSource {
    url: String,
    client: reqwest::Client,
}

impl GraphQlEventSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        Self::new(
            config.graphql_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSource for GraphQlEventSource {
    async fn fetch_events(
        &self,
        event_type: &str,
        after: Option<&str>,
        first: usize,
    ) -> Result<RawEventPage> {
        debug!(event_type, ?after, first, "Querying events");

        let request = json!({
            "query": EVENTS_QUERY,
            "variables": { "type": event_type, "first": first, "after": after },
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to GraphQL endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GraphQL endpoint returned {}: {}", status, body));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse GraphQL response")?;

        into_page(body)
    }
}
