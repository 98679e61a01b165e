//! Viewport extents and the query bounding box derived from them.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::BoundsError;

/// Tile edge in pixels used by slippy-map widgets.
const TILE_SIZE: f64 = 256.0;

/// Raw bounds reported by the map widget after a pan/zoom settles.
///
/// Values are taken as-is: longitudes may run past ±180 after panning
/// across the antimeridian, and nothing guarantees `south <= north`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Viewport {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Bounds of a `width_px` x `height_px` Web Mercator view centered on
    /// (`lat`, `lon`) at `zoom`.
    pub fn around(lat: f64, lon: f64, zoom: u8, width_px: u32, height_px: u32) -> Self {
        let world = TILE_SIZE * 2f64.powi(i32::from(zoom));
        let cx = (lon + 180.0) / 360.0 * world;
        let sin = lat.to_radians().sin();
        let cy = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * world;

        let half_w = f64::from(width_px) / 2.0;
        let half_h = f64::from(height_px) / 2.0;

        let to_lon = |x: f64| x / world * 360.0 - 180.0;
        let to_lat = |y: f64| (PI * (1.0 - 2.0 * y / world)).sinh().atan().to_degrees();

        Self {
            south: to_lat(cy + half_h),
            west: to_lon(cx - half_w),
            north: to_lat(cy - half_h),
            east: to_lon(cx + half_w),
        }
    }
}

/// Query region: (south, west, north, east) in degrees.
///
/// `south <= north` always holds. `west > east` means the box crosses the
/// antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl BoundingBox {
    /// Derive the query region from the current viewport.
    pub fn from_viewport(viewport: &Viewport) -> Result<Self, BoundsError> {
        let Viewport {
            south,
            west,
            north,
            east,
        } = *viewport;

        if ![south, west, north, east].iter().all(|v| v.is_finite()) {
            return Err(BoundsError::NonFinite);
        }
        if south > north {
            return Err(BoundsError::Inverted { south, north });
        }

        // A box already given in wrapped form (west > east) passes through
        // the wrap unchanged and keeps its crossing span.
        let (west, east) = if east - west >= 360.0 {
            (-180.0, 180.0)
        } else {
            (wrap_lon(west), wrap_lon(east))
        };

        Ok(Self {
            south: south.clamp(-90.0, 90.0),
            west,
            north: north.clamp(-90.0, 90.0),
            east,
        })
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// True when the box has no area and a query would return nothing.
    pub fn is_degenerate(&self) -> bool {
        self.south == self.north || self.west == self.east
    }
}

/// Overpass bbox filter form: `(south,west,north,east)`.
impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.south, self.west, self.north, self.east
        )
    }
}

/// Wrap a longitude into [-180, 180].
fn wrap_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}
