// src/output/bulk_sink.rs

use crate::core::models::FlatRow;
use crate::error::ConvertError;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};
use url::Url;

pub const DEFAULT_INDEX: &str = "vuls_index";
pub const DEFAULT_TYPE: &str = "vuls_type";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_IDLE_CONNECTIONS: usize = 3;

/// The parts of a `_bulk` response the sink looks at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Pairs every row with an `{"index":{}}` action descriptor.
pub fn bulk_actions(rows: &[FlatRow]) -> Result<Vec<Value>, ConvertError> {
    let mut actions = Vec::with_capacity(rows.len() * 2);
    for row in rows {
        actions.push(json!({ "index": {} }));
        actions.push(serde_json::to_value(row).map_err(|e| ConvertError::Sink(e.to_string()))?);
    }
    Ok(actions)
}

/// Serialises bulk actions as newline-delimited JSON, one action per line.
pub fn to_ndjson(actions: &[Value]) -> String {
    let mut body = String::new();
    for action in actions {
        body.push_str(&action.to_string());
        body.push('\n');
    }
    body
}

/// `<endpoint>/<index>/<type>/_bulk`, keeping any path prefix of the endpoint.
pub fn bulk_url(endpoint: &Url, index: &str, doc_type: &str) -> Result<Url, ConvertError> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| ConvertError::config(format!("esEndPoint cannot be used as a base URL: {endpoint}")))?
        .pop_if_empty()
        .extend([index, doc_type, "_bulk"]);
    Ok(url)
}

/// Posts one bulk body and checks the response for per-item failures.
pub async fn post_bulk(client: &reqwest::Client, url: &Url, body: String) -> Result<BulkResponse, ConvertError> {
    let response = client
        .post(url.clone())
        .header(CONTENT_TYPE, "application/x-ndjson")
        .body(body)
        .send()
        .await?
        .error_for_status()?;

    let parsed: BulkResponse = response.json().await?;
    if parsed.errors {
        let first = parsed.items.iter().find_map(|item| {
            item.get("index").and_then(|i| i.get("error")).map(Value::to_string)
        });
        return Err(ConvertError::Sink(first.unwrap_or_else(|| "bulk response reported errors".to_string())));
    }
    Ok(parsed)
}

/// Fire-and-forget submission of each file's rows to the bulk endpoint.
///
/// Submissions run as independent tasks and may complete out of order; a
/// failure is logged and never retried. [`BulkSink::finish`] waits for the
/// in-flight ones before the program exits.
pub struct BulkSink {
    client: reqwest::Client,
    url: Url,
    pending: Vec<JoinHandle<bool>>,
}

impl BulkSink {
    pub fn new(endpoint: &Url, index: &str, doc_type: &str) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .build()?;
        Ok(Self { client, url: bulk_url(endpoint, index, doc_type)?, pending: Vec::new() })
    }

    /// Spawns the submission of `rows`; returns without waiting for it.
    pub fn submit(&mut self, rows: &[FlatRow], source: &str) -> Result<(), ConvertError> {
        if rows.is_empty() {
            debug!(source, "No rows to index.");
            return Ok(());
        }

        let body = to_ndjson(&bulk_actions(rows)?);
        let client = self.client.clone();
        let url = self.url.clone();
        let count = rows.len();
        let span = info_span!("bulk", source = %source, rows = count);

        let handle = tokio::spawn(
            async move {
                match post_bulk(&client, &url, body).await {
                    Ok(response) => {
                        info!(took = response.took, items = response.items.len(), "Bulk submission indexed.");
                        true
                    }
                    Err(e) => {
                        error!(error = %e, cause = ?e, "Bulk submission failed.");
                        false
                    }
                }
            }
            .instrument(span),
        );
        self.pending.push(handle);
        Ok(())
    }

    /// Waits for every spawned submission; returns how many failed.
    pub async fn finish(self) -> usize {
        let mut failed = 0;
        for handle in self.pending {
            match handle.await {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    error!(error = %e, "Bulk submission task aborted.");
                    failed += 1;
                }
            }
        }
        failed
    }
}
