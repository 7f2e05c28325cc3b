//! Elasticsearch client for esdump
//!
//! This module wraps the cluster's scroll REST API behind a small typed
//! surface:
//! - Open a scrolled search over an index (optionally narrowed to one
//!   mapping type)
//! - Fetch the next page of an open scroll
//! - Release a scroll's server-side resources
//!
//! Transport concerns (connection handling, TLS, timeouts) live in the
//! underlying HTTP client; error bodies from the cluster are classified in
//! [`crate::error::es`].

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{Result, classify_response};

/// One record returned by a scroll fetch.
///
/// The source body is kept as raw JSON; the pipeline never interprets it,
/// only re-serializes it.
#[derive(Debug, Clone)]
pub struct Hit {
    /// Document identifier, unique within the index
    pub id: String,

    /// Original document body
    pub source: Value,
}

/// One page of scroll results.
#[derive(Debug, Clone)]
pub struct ScrollPage {
    /// Handle for the next fetch on this cursor
    pub scroll_id: Option<String>,

    /// Total number of matching documents, when the server reports it
    pub total: Option<u64>,

    /// Records in server return order
    pub hits: Vec<Hit>,
}

impl ScrollPage {
    /// Whether this page signals the end of the scan.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Elasticsearch HTTP client
///
/// Owns a configured `reqwest` client and the cluster base URL. The client
/// is cheap to clone and holds no per-scan state; scroll handles are owned
/// by the scan that opened them.
#[derive(Debug, Clone)]
pub struct EsClient {
    /// Underlying HTTP client
    http: reqwest::Client,

    /// Cluster base URL without trailing slash
    base_url: String,
}

impl EsClient {
    /// Create a new client against a cluster base URL
    ///
    /// # Arguments
    /// * `url` - Cluster base URL, e.g. `http://localhost:9200`
    /// * `config` - Connection configuration (timeouts)
    ///
    /// # Returns
    /// * `Result<Self>` - New client instance or error
    pub fn new(url: &str, config: &ConnectionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the cluster base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a scrolled search over an index
    ///
    /// Returns the first page together with the scroll handle for
    /// subsequent fetches. A missing index surfaces as
    /// [`ClientError::InvalidTarget`](crate::error::ClientError).
    ///
    /// # Arguments
    /// * `index` - Index to scan
    /// * `doc_type` - Optional mapping type to narrow the scan to
    /// * `size` - Page size requested per shard
    /// * `keep_alive` - Scroll validity window
    pub async fn open_scroll(
        &self,
        index: &str,
        doc_type: Option<&str>,
        size: u32,
        keep_alive: Duration,
    ) -> Result<ScrollPage> {
        let url = format!(
            "{}/{}/_search?scroll={}",
            self.base_url,
            index,
            scroll_param(keep_alive)
        );

        let query = match doc_type {
            Some(doc_type) => json!({ "term": { "_type": doc_type } }),
            None => json!({ "match_all": {} }),
        };
        let body = json!({ "size": size, "query": query });

        debug!("Opening scroll over '{}' (size {})", index, size);

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &text, index).into());
        }

        let raw: SearchResponse = response.json().await?;
        Ok(raw.into_page())
    }

    /// Fetch the next page of an open scroll
    ///
    /// # Arguments
    /// * `scroll_id` - Handle returned by the previous fetch
    /// * `keep_alive` - Scroll validity window to extend the cursor by
    pub async fn continue_scroll(
        &self,
        scroll_id: &str,
        keep_alive: Duration,
    ) -> Result<ScrollPage> {
        let url = format!("{}/_search/scroll", self.base_url);
        let body = json!({
            "scroll": scroll_param(keep_alive),
            "scroll_id": scroll_id,
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &text, "scroll").into());
        }

        let raw: SearchResponse = response.json().await?;
        Ok(raw.into_page())
    }

    /// Release a scroll's server-side resources
    ///
    /// # Arguments
    /// * `scroll_id` - Handle of the scroll to clear
    pub async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        let url = format!("{}/_search/scroll", self.base_url);
        let body = json!({ "scroll_id": [scroll_id] });

        let response = self.http.delete(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &text, "scroll").into());
        }

        debug!("Cleared scroll context");
        Ok(())
    }
}

/// Format a validity window as an Elasticsearch time value.
fn scroll_param(keep_alive: Duration) -> String {
    format!("{}s", keep_alive.as_secs())
}

/* ========================= Wire format ========================= */

/// Raw search/scroll response, limited to the fields the scan consumes.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Option<TotalHits>,
    hits: Vec<RawHit>,
}

/// Pre-7.x clusters report the total as a bare number, later ones as an
/// object with a relation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Legacy(u64),
    Tracked { value: u64 },
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Legacy(value) => *value,
            TotalHits::Tracked { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl SearchResponse {
    fn into_page(self) -> ScrollPage {
        ScrollPage {
            scroll_id: self.scroll_id,
            total: self.hits.total.as_ref().map(TotalHits::value),
            hits: self
                .hits
                .hits
                .into_iter()
                .map(|hit| Hit {
                    id: hit.id,
                    source: hit.source,
                })
                .collect(),
        }
    }
}
