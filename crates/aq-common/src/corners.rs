//! Display corner coordinates for raster placement.

use serde::{Deserialize, Serialize};

/// The four display corners of a raster, as (longitude, latitude) pairs in
/// the fixed order top-left, top-right, bottom-right, bottom-left.
///
/// Every consumer (raster placement, vector bounds) relies on this ordering;
/// it is never reordered after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayCorners([[f64; 2]; 4]);

impl DisplayCorners {
    /// Build from a descriptor coordinate array. Returns None unless the
    /// array has exactly four entries.
    pub fn from_coordinates(coords: &[[f64; 2]]) -> Option<Self> {
        if coords.len() != 4 {
            return None;
        }
        Some(Self([coords[0], coords[1], coords[2], coords[3]]))
    }

    pub fn top_left(&self) -> [f64; 2] {
        self.0[0]
    }

    pub fn top_right(&self) -> [f64; 2] {
        self.0[1]
    }

    pub fn bottom_right(&self) -> [f64; 2] {
        self.0[2]
    }

    pub fn bottom_left(&self) -> [f64; 2] {
        self.0[3]
    }

    /// The corners in placement order.
    pub fn as_array(&self) -> [[f64; 2]; 4] {
        self.0
    }
}
