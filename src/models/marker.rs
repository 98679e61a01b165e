//! Marker records handed to the map's marker layer.

use serde::Serialize;

use super::{GeoFeature, GeoPoint};

/// One `tag: value` line of a marker popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoLine {
    pub tag: String,
    pub value: String,
}

/// A feature as the marker layer displays it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// OSM node ID of the underlying feature
    pub id: i64,
    pub position: GeoPoint,
    /// Hover title (the feature's `name`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Popup content, one line per tag in key order
    pub info: Vec<InfoLine>,
}

impl Marker {
    pub fn from_feature(feature: &GeoFeature) -> Self {
        Self {
            id: feature.id,
            position: feature.position,
            title: feature.name().map(str::to_string),
            info: feature
                .tags
                .iter()
                .map(|(tag, value)| InfoLine {
                    tag: tag.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}
