//! OSM point features and their tags.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::error::TagNameError;

/// Longest key OSM accepts.
const MAX_TAG_NAME_CHARS: usize = 255;

/// Tag selected at session start.
pub const DEFAULT_TAG: &str = "name";

/// A validated OSM tag key (e.g. `name`, `cuisine`, `addr:street`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    pub fn new(name: impl Into<String>) -> Result<Self, TagNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TagNameError::Empty);
        }
        let chars = name.chars().count();
        if chars > MAX_TAG_NAME_CHARS {
            return Err(TagNameError::TooLong(chars));
        }
        if name.chars().any(char::is_control) {
            return Err(TagNameError::ControlCharacter);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TagName {
    fn default() -> Self {
        Self(DEFAULT_TAG.to_string())
    }
}

impl TryFrom<String> for TagName {
    type Error = TagNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TagName> for String {
    fn from(value: TagName) -> Self {
        value.0
    }
}

impl Borrow<str> for TagName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tags of one feature. Keys and values are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tags(BTreeMap<TagName, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag. Returns `false` (and stores nothing) if the key is not
    /// a valid tag name or the value is empty.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() {
            return false;
        }
        match TagName::new(key) {
            Ok(name) => {
                self.0.insert(name, value);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Tag names in key order.
    pub fn names(&self) -> impl Iterator<Item = &TagName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagName, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tags = Tags::new();
        for (k, v) in iter {
            tags.insert(k.as_ref(), v);
        }
        tags
    }
}

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A single OSM node returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFeature {
    /// OSM node ID
    pub id: i64,
    pub position: GeoPoint,
    pub tags: Tags,
}

impl GeoFeature {
    pub fn new(id: i64, position: GeoPoint, tags: Tags) -> Self {
        Self { id, position, tags }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    /// Value of the `name` tag, used as the marker title
    pub fn name(&self) -> Option<&str> {
        self.tags.get(DEFAULT_TAG)
    }
}

/// Features returned by the most recent accepted query, in response order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet(Vec<GeoFeature>);

impl FeatureSet {
    pub fn new(features: Vec<GeoFeature>) -> Self {
        Self(features)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoFeature> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[GeoFeature] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<GeoFeature> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = GeoFeature>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a GeoFeature;
    type IntoIter = std::slice::Iter<'a, GeoFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
