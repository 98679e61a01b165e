//! Error types shared by the query loop.

use thiserror::Error;

/// Failure of a single feature query.
///
/// Every failure mode of the remote feature source is folded into one of
/// these variants at the client boundary, so the controller only ever sees
/// a typed result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Network unreachable or timed out
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Non-success status or a payload that could not be parsed
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Degenerate bounding box; nothing to query
    #[error("viewport has no area")]
    EmptyViewport,
}

/// Viewport bounds that cannot be turned into a query region.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("viewport bounds must be finite numbers")]
    NonFinite,

    #[error("south ({south}) is north of north ({north})")]
    Inverted { south: f64, north: f64 },
}

/// Rejected tag name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagNameError {
    #[error("tag name is empty")]
    Empty,

    #[error("tag name is {0} characters long (max 255)")]
    TooLong(usize),

    #[error("tag name contains a control character")]
    ControlCharacter,
}
