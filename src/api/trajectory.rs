use std::collections::BTreeMap;

use chrono::NaiveDate;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{ApiClient, ApiError};
use crate::config::ApiConfig;
use crate::geo::{BoundingBox, LonLat};
use crate::params::{DATE_FORMAT, PropulsionType, VesselType};

#[derive(Debug, Error, PartialEq)]
pub enum TranslateError {
    #[error("invalid parameter: {0}")]
    UnknownKey(String),
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// One internal (UI-named) parameter of a single trajectory request.
#[derive(Clone, Debug, PartialEq)]
pub enum TrajectoryParam {
    DeparturePoint(LonLat),
    DestinationPoint(LonLat),
    JourneyLength(u32),
    PropulsionType(PropulsionType),
    VesselType(VesselType),
    PaddlingSpeed(f64),
    StartDate(NaiveDate),
    Timestep(u32),
    BoundingBox(BoundingBox),
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, TranslateError> {
    T::deserialize(value).map_err(|e| TranslateError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl TrajectoryParam {
    /// Decode one keyed parameter. Unknown keys fail; `null` and an empty
    /// bounding box mean "not set" and yield `None`.
    pub fn from_json(key: &str, value: &Value) -> Result<Option<Self>, TranslateError> {
        if !Self::is_known_key(key) {
            return Err(TranslateError::UnknownKey(key.to_string()));
        }
        if value.is_null() {
            return Ok(None);
        }
        let param = match key {
            "departurePoint" => TrajectoryParam::DeparturePoint(decode(key, value)?),
            "destinationPoint" => TrajectoryParam::DestinationPoint(decode(key, value)?),
            "journeyLength" => TrajectoryParam::JourneyLength(decode(key, value)?),
            "propulsionType" => TrajectoryParam::PropulsionType(decode(key, value)?),
            "vesselType" => TrajectoryParam::VesselType(decode(key, value)?),
            "paddlingSpeed" => TrajectoryParam::PaddlingSpeed(decode(key, value)?),
            "start_date" => TrajectoryParam::StartDate(decode(key, value)?),
            "timestep" => TrajectoryParam::Timestep(decode(key, value)?),
            _ => {
                let values: Vec<f64> = decode(key, value)?;
                match BoundingBox::from_slice(&values) {
                    Ok(Some(bbox)) => TrajectoryParam::BoundingBox(bbox),
                    Ok(None) => return Ok(None),
                    Err(e) => {
                        return Err(TranslateError::InvalidValue {
                            key: key.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        };
        Ok(Some(param))
    }

    pub fn is_known_key(key: &str) -> bool {
        matches!(
            key,
            "departurePoint"
                | "destinationPoint"
                | "journeyLength"
                | "propulsionType"
                | "vesselType"
                | "paddlingSpeed"
                | "start_date"
                | "timestep"
                | "boundingBox"
                | "bbox"
        )
    }

    fn write(&self, out: &mut TranslatedRequest) {
        match self {
            TrajectoryParam::DeparturePoint(p) => {
                out.insert("departure_lon", p.lon);
                out.insert("departure_lat", p.lat);
            }
            TrajectoryParam::DestinationPoint(p) => {
                out.insert("destination_lon", p.lon);
                out.insert("destination_lat", p.lat);
            }
            TrajectoryParam::JourneyLength(days) => out.insert("duration", *days),
            TrajectoryParam::PropulsionType(mode) => out.insert("mode", mode.mode()),
            TrajectoryParam::VesselType(craft) => out.insert("craft", craft.0),
            TrajectoryParam::PaddlingSpeed(speed) => out.insert("speed", *speed),
            TrajectoryParam::StartDate(date) => {
                out.insert("start_date", date.format(DATE_FORMAT).to_string())
            }
            TrajectoryParam::Timestep(secs) => out.insert("timestep", *secs),
            TrajectoryParam::BoundingBox(b) => {
                out.insert("lon_min", b.lon_min);
                out.insert("lon_max", b.lon_max);
                out.insert("lat_min", b.lat_min);
                out.insert("lat_max", b.lat_max);
            }
        }
    }
}

/// Flat query in the API's naming, built fresh for every request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TranslatedRequest(BTreeMap<&'static str, Value>);

impl TranslatedRequest {
    fn insert(&mut self, key: &'static str, value: impl Into<Value>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

pub fn translate(params: &[TrajectoryParam]) -> TranslatedRequest {
    let mut out = TranslatedRequest::default();
    for p in params {
        p.write(&mut out);
    }
    out
}

/// Keys that already carry the API's name; their values go out as given.
fn passthrough_name(key: &str) -> Option<&'static str> {
    match key {
        "start_date" => Some("start_date"),
        "timestep" => Some("timestep"),
        _ => None,
    }
}

/// Keyed form of `translate`. Fails on the first key the API does not know.
pub fn translate_json(params: &Map<String, Value>) -> Result<TranslatedRequest, TranslateError> {
    let mut out = TranslatedRequest::default();
    for (key, value) in params {
        if let Some(name) = passthrough_name(key) {
            if !value.is_null() {
                out.insert(name, value.clone());
            }
            continue;
        }
        if let Some(p) = TrajectoryParam::from_json(key, value)? {
            p.write(&mut out);
        }
    }
    Ok(out)
}

fn feature_collection() -> String {
    "FeatureCollection".to_string()
}

fn feature() -> String {
    "Feature".to_string()
}

fn line_string() -> String {
    "LineString".to_string()
}

/// GeoJSON as returned by the trajectory endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryCollection {
    #[serde(rename = "type", default = "feature_collection")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<TrajectoryFeature>,
}

impl Default for TrajectoryCollection {
    fn default() -> Self {
        Self {
            kind: feature_collection(),
            features: Vec::new(),
        }
    }
}

impl TrajectoryCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn extend(&mut self, other: TrajectoryCollection) {
        self.features.extend(other.features);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFeature {
    #[serde(rename = "type", default = "feature")]
    pub kind: String,
    pub geometry: LineString,
    #[serde(default)]
    pub properties: TrajectoryProperties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type", default = "line_string")]
    pub kind: String,
    /// (lon, lat) pairs.
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestep: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct TrajectoryApi {
    client: ApiClient,
}

impl TrajectoryApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(config, &config.trajectory_path)?,
        })
    }

    pub fn url(&self) -> &Url {
        self.client.url()
    }

    pub async fn get(&self, request: &TranslatedRequest) -> Result<TrajectoryCollection, ApiError> {
        self.client.get(request).await
    }

    /// Translate then GET.
    pub async fn fetch(&self, params: &[TrajectoryParam]) -> Result<TrajectoryCollection, ApiError> {
        self.get(&translate(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keyed(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn departure_point_splits_into_lon_lat() {
        let out = translate_json(&keyed(json!({"departurePoint": [10, 20]}))).unwrap();
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"departure_lon": 10.0, "departure_lat": 20.0})
        );
    }

    #[test]
    fn bounding_box_takes_min_max_by_index() {
        let out = translate_json(&keyed(json!({"boundingBox": [1, 2, 3, 4]}))).unwrap();
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"lon_min": 1.0, "lon_max": 3.0, "lat_min": 2.0, "lat_max": 4.0})
        );
        let same = translate_json(&keyed(json!({"bbox": [1, 2, 3, 4]}))).unwrap();
        assert_eq!(out, same);
        assert!(translate_json(&keyed(json!({"bbox": []}))).unwrap().is_empty());
    }

    #[test]
    fn external_names_pass_through() {
        let input = json!({"start_date": "2017-01-01", "timestep": 3600});
        let out = translate_json(&keyed(input.clone())).unwrap();
        assert_eq!(serde_json::to_value(&out).unwrap(), input);

        let loose = json!({"start_date": "2017-1-5", "timestep": "3600"});
        let out = translate_json(&keyed(loose.clone())).unwrap();
        assert_eq!(serde_json::to_value(&out).unwrap(), loose);
    }

    #[test]
    fn renames_follow_the_table() {
        let out = translate_json(&keyed(json!({
            "destinationPoint": [1, 54],
            "journeyLength": 7,
            "propulsionType": "paddling",
            "vesselType": 2,
            "paddlingSpeed": 1.5,
        })))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({
                "destination_lon": 1.0,
                "destination_lat": 54.0,
                "duration": 7,
                "mode": "paddling",
                "craft": 2,
                "speed": 1.5,
            })
        );
    }

    #[test]
    fn unknown_keys_fail_fast() {
        let err = translate_json(&keyed(json!({"timestep": 3600, "colour": "red"}))).unwrap_err();
        assert_eq!(err, TranslateError::UnknownKey("colour".into()));
        // already-external names other than start_date/timestep are not accepted
        assert!(translate_json(&keyed(json!({"duration": 7}))).is_err());
    }

    #[test]
    fn malformed_values_fail() {
        assert!(matches!(
            translate_json(&keyed(json!({"departurePoint": "north"}))),
            Err(TranslateError::InvalidValue { .. })
        ));
        assert!(matches!(
            translate_json(&keyed(json!({"bbox": [1, 2, 3]}))),
            Err(TranslateError::InvalidValue { .. })
        ));
    }

    #[test]
    fn nulls_are_skipped() {
        let out = translate_json(&keyed(json!({"destinationPoint": null, "timestep": 60}))).unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["timestep"]);
    }

    #[test]
    fn drifting_goes_out_as_drift() {
        let out = translate(&[TrajectoryParam::PropulsionType(PropulsionType::Drifting)]);
        assert_eq!(out.get("mode"), Some(&json!("drift")));
    }

    #[test]
    fn collection_decodes_backend_geojson() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[4.4, 58.9], [4.5, 58.8]]},
                "properties": {
                    "start_date": "2017-01-01",
                    "stop_date": "2017-01-08",
                    "timestep": 3600,
                    "distance": 12.5,
                    "mean_speed": 0.8,
                    "destination": [1, 54],
                    "route": [[4.4, 58.9]],
                    "craft": 2
                }
            }]
        });
        let c: TrajectoryCollection = serde_json::from_value(body).unwrap();
        assert_eq!(c.len(), 1);
        let f = &c.features[0];
        assert_eq!(f.geometry.coordinates[1], [4.5, 58.8]);
        assert_eq!(f.properties.start_date.as_deref(), Some("2017-01-01"));
        assert_eq!(f.properties.timestep, Some(3600.0));
        assert_eq!(f.properties.extra.get("craft"), Some(&json!(2)));
    }
}
