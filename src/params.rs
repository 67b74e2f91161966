use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{BoundingBox, LonLat, optional_bbox};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const RANGE_SEPARATOR: char = '~';

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter '{0}'")]
    UnknownKey(String),
    #[error("unknown propulsion type '{0}'")]
    UnknownPropulsion(String),
    #[error("'{0}' is not a date range (expected YYYY-MM-DD ~ YYYY-MM-DD)")]
    BadDateRange(String),
}

/// Names of the form fields, as the UI spells them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKey {
    DeparturePoints,
    DestinationPoint,
    Dates,
    LaunchInterval,
    JourneyLength,
    Timestep,
    PropulsionType,
    VesselType,
    PaddlingSpeed,
    #[serde(rename = "bbox", alias = "boundingBox")]
    BoundingBox,
}

impl ParamKey {
    pub const ALL: [ParamKey; 10] = [
        ParamKey::DeparturePoints,
        ParamKey::DestinationPoint,
        ParamKey::Dates,
        ParamKey::LaunchInterval,
        ParamKey::JourneyLength,
        ParamKey::Timestep,
        ParamKey::PropulsionType,
        ParamKey::VesselType,
        ParamKey::PaddlingSpeed,
        ParamKey::BoundingBox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::DeparturePoints => "departurePoints",
            ParamKey::DestinationPoint => "destinationPoint",
            ParamKey::Dates => "dates",
            ParamKey::LaunchInterval => "launchInterval",
            ParamKey::JourneyLength => "journeyLength",
            ParamKey::Timestep => "timestep",
            ParamKey::PropulsionType => "propulsionType",
            ParamKey::VesselType => "vesselType",
            ParamKey::PaddlingSpeed => "paddlingSpeed",
            ParamKey::BoundingBox => "bbox",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "boundingBox" {
            return Ok(ParamKey::BoundingBox);
        }
        ParamKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParamError::UnknownKey(s.to_string()))
    }
}

/// How the vessels move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropulsionType {
    Sailing,
    Paddling,
    #[serde(alias = "drift")]
    Drifting,
}

impl PropulsionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropulsionType::Sailing => "sailing",
            PropulsionType::Paddling => "paddling",
            PropulsionType::Drifting => "drifting",
        }
    }

    /// Mode name understood by the simulation backend.
    pub fn mode(&self) -> &'static str {
        match self {
            PropulsionType::Sailing => "sailing",
            PropulsionType::Paddling => "paddling",
            PropulsionType::Drifting => "drift",
        }
    }

    /// Drifting vessels follow winds and currents; the others steer for a target.
    pub fn requires_destination(&self) -> bool {
        !matches!(self, PropulsionType::Drifting)
    }
}

impl fmt::Display for PropulsionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropulsionType {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sailing" => Ok(PropulsionType::Sailing),
            "paddling" => Ok(PropulsionType::Paddling),
            "drifting" | "drift" => Ok(PropulsionType::Drifting),
            _ => Err(ParamError::UnknownPropulsion(s.to_string())),
        }
    }
}

/// Craft profile id; the backend looks it up per propulsion type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselType(pub u32);

impl fmt::Display for VesselType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Start and end day of a simulation batch. Ordering is not enforced here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[NaiveDate; 2]", into = "[NaiveDate; 2]")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl From<[NaiveDate; 2]> for DateRange {
    fn from([start, end]: [NaiveDate; 2]) -> Self {
        Self { start, end }
    }
}

impl From<DateRange> for [NaiveDate; 2] {
    fn from(r: DateRange) -> Self {
        [r.start, r.end]
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.start.format(DATE_FORMAT),
            RANGE_SEPARATOR,
            self.end.format(DATE_FORMAT)
        )
    }
}

impl FromStr for DateRange {
    type Err = ParamError;

    /// Parses `start ~ end`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParamError::BadDateRange(s.to_string());
        let (start, end) = s.split_once(RANGE_SEPARATOR).ok_or_else(bad)?;
        let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT).map_err(|_| bad())?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT).map_err(|_| bad())?;
        Ok(Self { start, end })
    }
}

/// Everything the form collects for one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub departure_points: Vec<LonLat>,
    pub destination_point: Option<LonLat>,
    #[serde(rename = "dates")]
    pub date_range: DateRange,
    /// Days between launches.
    pub launch_interval: u32,
    /// Max simulated days per vessel.
    pub journey_length: u32,
    /// Seconds per simulation step.
    pub timestep: u32,
    pub propulsion_type: PropulsionType,
    pub vessel_type: VesselType,
    pub paddling_speed: Option<f64>,
    #[serde(rename = "bbox", with = "optional_bbox", default)]
    pub bounding_box: Option<BoundingBox>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            departure_points: Vec::new(),
            destination_point: None,
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2017, 5, 1).unwrap_or_default(),
                NaiveDate::from_ymd_opt(2017, 5, 30).unwrap_or_default(),
            ),
            launch_interval: 5,
            journey_length: 30,
            timestep: 8 * 3600,
            propulsion_type: PropulsionType::Sailing,
            vessel_type: VesselType(1),
            paddling_speed: None,
            bounding_box: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keys_round_trip_through_names() {
        for key in ParamKey::ALL {
            assert_eq!(key.as_str().parse::<ParamKey>(), Ok(key));
        }
        assert_eq!("boundingBox".parse::<ParamKey>(), Ok(ParamKey::BoundingBox));
        assert_eq!(
            "colour".parse::<ParamKey>(),
            Err(ParamError::UnknownKey("colour".into()))
        );
    }

    #[test]
    fn drifting_is_sent_as_drift() {
        assert_eq!(PropulsionType::Drifting.mode(), "drift");
        assert_eq!("drift".parse::<PropulsionType>(), Ok(PropulsionType::Drifting));
        assert_eq!("Paddling".parse::<PropulsionType>(), Ok(PropulsionType::Paddling));
        assert!(!PropulsionType::Drifting.requires_destination());
        assert!(PropulsionType::Sailing.requires_destination());
        assert!(PropulsionType::Paddling.requires_destination());
    }

    #[test]
    fn date_range_text_form() {
        let r: DateRange = " 2017-05-01 ~2017-05-30 ".parse().unwrap();
        assert_eq!(r, DateRange::new(ymd(2017, 5, 1), ymd(2017, 5, 30)));
        assert_eq!(r.to_string(), "2017-05-01 ~ 2017-05-30");
        assert!("2017-05-01".parse::<DateRange>().is_err());
        assert!("2017-05-01 ~ soon".parse::<DateRange>().is_err());
    }

    #[test]
    fn defaults_match_the_form() {
        let p = SimulationParameters::default();
        assert!(p.departure_points.is_empty());
        assert_eq!(p.destination_point, None);
        assert_eq!(p.date_range.to_string(), "2017-05-01 ~ 2017-05-30");
        assert_eq!(p.launch_interval, 5);
        assert_eq!(p.journey_length, 30);
        assert_eq!(p.timestep, 28_800);
        assert_eq!(p.propulsion_type, PropulsionType::Sailing);
        assert_eq!(p.vessel_type, VesselType(1));
        assert_eq!(p.paddling_speed, None);
        assert_eq!(p.bounding_box, None);
    }

    #[test]
    fn snapshot_json_uses_ui_names() {
        let v = serde_json::to_value(SimulationParameters::default()).unwrap();
        assert_eq!(v["dates"], json!(["2017-05-01", "2017-05-30"]));
        assert_eq!(v["propulsionType"], json!("sailing"));
        assert_eq!(v["vesselType"], json!(1));
        assert_eq!(v["bbox"], json!([]));
        assert_eq!(v["destinationPoint"], json!(null));

        let back: SimulationParameters = serde_json::from_value(v).unwrap();
        assert_eq!(back, SimulationParameters::default());
    }
}
