//! Tagscope - explore OpenStreetMap tags in the visible map area
//!
//! This library provides the viewport-driven query, tag aggregation and
//! marker filtering loop used by the `explorer` binary.

pub mod aggregate;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod models;
pub mod overpass;
pub mod selection;
pub mod session;

pub use controller::{Event, Phase, QuerySeq, ViewSink, ViewportController};
pub use error::QueryError;
pub use models::{BoundingBox, FeatureSet, GeoFeature, TagName, Viewport};
