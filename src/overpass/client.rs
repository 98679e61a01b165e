//! Overpass interpreter client.

use anyhow::Context;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::query::{build_query, parse_response};
use crate::config::OverpassConfig;
use crate::error::QueryError;
use crate::models::{BoundingBox, FeatureSet};

/// Anything that can answer a spatial feature query.
///
/// The session drives queries through this trait so the loop can be
/// exercised without a network.
pub trait FeatureSource: Send + Sync {
    /// Fetch the named point features inside `bbox`.
    fn fetch_features(
        &self,
        bbox: &BoundingBox,
    ) -> impl Future<Output = Result<FeatureSet, QueryError>> + Send;
}

/// Longest error body written to the log, in bytes.
const MAX_LOGGED_BODY: usize = 512;

/// Queries a live Overpass API endpoint.
#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: Url,
    server_timeout_secs: u32,
}

impl OverpassClient {
    pub fn new(config: &OverpassConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid Overpass endpoint '{}'", config.endpoint))?;
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        info!("Overpass endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            server_timeout_secs: config.server_timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl FeatureSource for OverpassClient {
    async fn fetch_features(&self, bbox: &BoundingBox) -> Result<FeatureSet, QueryError> {
        if bbox.is_degenerate() {
            return Err(QueryError::EmptyViewport);
        }

        let query = build_query(bbox, self.server_timeout_secs);
        debug!("Overpass query: {}", query);

        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("data", &query);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                warn!("Overpass request failed: {}", e);
                QueryError::TransportFailure(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Overpass query failed with status {}: {}",
                status,
                truncate_body(&text, MAX_LOGGED_BODY)
            );
            return Err(QueryError::InvalidResponse(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| QueryError::TransportFailure(format!("Failed to read response: {}", e)))?;

        let features = parse_response(&body)?;
        debug!("Overpass returned {} features for {}", features.len(), bbox);
        Ok(features)
    }
}

/// Cut `body` to at most `max` bytes on a char boundary.
fn truncate_body(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
