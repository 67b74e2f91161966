//! Geographic values in lon/lat order, as the map and the API use them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("bounding box needs 4 values (lon_min, lat_min, lon_max, lat_max), got {0}")]
    BoxLength(usize),
}

/// A point as (longitude, latitude). Serialized as `[lon, lat]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(p: LonLat) -> Self {
        [p.lon, p.lat]
    }
}

/// Rectangular filter. Serialized as `[lon_min, lat_min, lon_max, lat_max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl From<[f64; 4]> for BoundingBox {
    fn from([lon_min, lat_min, lon_max, lat_max]: [f64; 4]) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.lon_min, b.lat_min, b.lon_max, b.lat_max]
    }
}

impl BoundingBox {
    /// Empty slice means no restriction.
    pub fn from_slice(values: &[f64]) -> Result<Option<Self>, GeoError> {
        match values {
            [] => Ok(None),
            [a, b, c, d] => Ok(Some(Self::from([*a, *b, *c, *d]))),
            other => Err(GeoError::BoxLength(other.len())),
        }
    }
}

/// serde helpers for `Option<BoundingBox>` stored as `[]` or a 4-array.
pub mod optional_bbox {
    use super::*;

    pub fn serialize<S: Serializer>(bbox: &Option<BoundingBox>, s: S) -> Result<S::Ok, S::Error> {
        match bbox {
            Some(b) => <[f64; 4]>::from(*b).serialize(s),
            None => <[f64; 0]>::default().serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BoundingBox>, D::Error> {
        let values = Option::<Vec<f64>>::deserialize(d)?.unwrap_or_default();
        BoundingBox::from_slice(&values).map_err(serde::de::Error::custom)
    }
}
