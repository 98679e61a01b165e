//! Overpass QL construction and response parsing.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::QueryError;
use crate::models::{BoundingBox, FeatureSet, GeoFeature, GeoPoint, Tags, DEFAULT_TAG};

/// Named nodes inside `bbox`, with full tag bodies.
///
/// `~"."` requires a non-empty value, so nodes tagged `name=""` are not
/// returned.
pub fn build_query(bbox: &BoundingBox, server_timeout_secs: u32) -> String {
    format!(
        r#"[out:json][timeout:{}];node["{}"~"."]{};out body;"#,
        server_timeout_secs, DEFAULT_TAG, bbox
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<RawElement>,
    /// Set by the server when the query was cut short (timeout, memory)
    #[serde(default)]
    remark: Option<String>,
}

/// Remark prefixes meaning `elements` is incomplete.
const FAILURE_REMARKS: &[&str] = &["runtime error", "runtime remark"];

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Parse an interpreter JSON body into features, in response order.
pub fn parse_response(body: &[u8]) -> Result<FeatureSet, QueryError> {
    let response: OverpassResponse = serde_json::from_slice(body)
        .map_err(|e| QueryError::InvalidResponse(format!("malformed payload: {}", e)))?;

    if let Some(remark) = response.remark {
        if FAILURE_REMARKS.iter().any(|p| remark.starts_with(p)) {
            return Err(QueryError::InvalidResponse(remark));
        }
        debug!("Overpass remark: {}", remark);
    }

    let total = response.elements.len();
    let features: FeatureSet = response
        .elements
        .into_iter()
        .filter_map(into_feature)
        .collect();

    if features.len() < total {
        debug!(
            "Dropped {} of {} elements (not a named node with coordinates)",
            total - features.len(),
            total
        );
    }

    Ok(features)
}

fn into_feature(raw: RawElement) -> Option<GeoFeature> {
    if raw.element_type != "node" {
        return None;
    }
    let (lat, lon) = (raw.lat?, raw.lon?);

    // Empty keys and values are dropped here
    let tags: Tags = raw.tags.into_iter().collect();

    if !tags.contains(DEFAULT_TAG) {
        return None;
    }

    Some(GeoFeature::new(raw.id, GeoPoint { lat, lon }, tags))
}
