//! Core data models for the tag explorer.

pub mod bbox;
pub mod feature;
pub mod marker;

pub use bbox::{BoundingBox, Viewport};
pub use feature::{FeatureSet, GeoFeature, GeoPoint, TagName, Tags, DEFAULT_TAG};
pub use marker::{InfoLine, Marker};
