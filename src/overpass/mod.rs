//! Feature queries against the Overpass API.

mod client;
mod query;

pub use client::{FeatureSource, OverpassClient};
pub use query::{build_query, parse_response};
