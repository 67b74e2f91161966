//! The form's parameter state.
//!
//! One owned `ParameterStore` per UI session; pass it (or an `Arc` of it) to
//! whatever needs it. Writers replace one field at a time and subscribers are
//! woken on every change.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::geo::{BoundingBox, LonLat};
use crate::params::{DateRange, ParamKey, PropulsionType, SimulationParameters, VesselType};
use crate::rules;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: ParamKey, reason: String },
}

/// A replacement value for exactly one field.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamUpdate {
    DeparturePoints(Vec<LonLat>),
    DestinationPoint(Option<LonLat>),
    Dates(DateRange),
    LaunchInterval(u32),
    JourneyLength(u32),
    Timestep(u32),
    PropulsionType(PropulsionType),
    VesselType(VesselType),
    PaddlingSpeed(Option<f64>),
    BoundingBox(Option<BoundingBox>),
}

fn invalid(field: ParamKey, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn decode<T: DeserializeOwned>(field: ParamKey, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| invalid(field, e.to_string()))
}

/// Whole, non-negative numbers given as JSON numbers or form text. Values
/// that cannot be stored report the field's rule message when it has one.
fn count(field: ParamKey, value: &Value) -> Result<u32, StoreError> {
    match rules::as_number(value) {
        Some(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => Ok(n as u32),
        _ => Err(match rules::check(field, value) {
            Err(e) => invalid(field, e.message),
            Ok(()) => invalid(field, "expected a whole number"),
        }),
    }
}

/// Like `count`, but fractional; `null` and blank text clear the field.
fn optional_number(field: ParamKey, value: &Value) -> Result<Option<f64>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        other => rules::as_number(other)
            .map(Some)
            .ok_or_else(|| invalid(field, "expected a number")),
    }
}

impl ParamUpdate {
    pub fn key(&self) -> ParamKey {
        match self {
            ParamUpdate::DeparturePoints(_) => ParamKey::DeparturePoints,
            ParamUpdate::DestinationPoint(_) => ParamKey::DestinationPoint,
            ParamUpdate::Dates(_) => ParamKey::Dates,
            ParamUpdate::LaunchInterval(_) => ParamKey::LaunchInterval,
            ParamUpdate::JourneyLength(_) => ParamKey::JourneyLength,
            ParamUpdate::Timestep(_) => ParamKey::Timestep,
            ParamUpdate::PropulsionType(_) => ParamKey::PropulsionType,
            ParamUpdate::VesselType(_) => ParamKey::VesselType,
            ParamUpdate::PaddlingSpeed(_) => ParamKey::PaddlingSpeed,
            ParamUpdate::BoundingBox(_) => ParamKey::BoundingBox,
        }
    }

    /// Decode a UI payload (`{which, value}`) into a typed update.
    pub fn from_json(key: ParamKey, value: Value) -> Result<Self, StoreError> {
        let update = match key {
            ParamKey::DeparturePoints => ParamUpdate::DeparturePoints(decode(key, value)?),
            ParamKey::DestinationPoint => ParamUpdate::DestinationPoint(decode(key, value)?),
            ParamKey::Dates => match value {
                // the date field shows the range as "start ~ end"
                Value::String(s) => ParamUpdate::Dates(
                    s.parse::<DateRange>()
                        .map_err(|e: crate::params::ParamError| invalid(key, e.to_string()))?,
                ),
                other => ParamUpdate::Dates(decode(key, other)?),
            },
            ParamKey::LaunchInterval => ParamUpdate::LaunchInterval(count(key, &value)?),
            ParamKey::JourneyLength => ParamUpdate::JourneyLength(count(key, &value)?),
            ParamKey::Timestep => ParamUpdate::Timestep(count(key, &value)?),
            ParamKey::PropulsionType => ParamUpdate::PropulsionType(decode(key, value)?),
            ParamKey::VesselType => ParamUpdate::VesselType(VesselType(count(key, &value)?)),
            ParamKey::PaddlingSpeed => ParamUpdate::PaddlingSpeed(optional_number(key, &value)?),
            ParamKey::BoundingBox => {
                let values: Option<Vec<f64>> = decode(key, value)?;
                let bbox = BoundingBox::from_slice(&values.unwrap_or_default())
                    .map_err(|e| invalid(key, e.to_string()))?;
                ParamUpdate::BoundingBox(bbox)
            }
        };
        Ok(update)
    }

    fn apply(self, p: &mut SimulationParameters) {
        match self {
            ParamUpdate::DeparturePoints(v) => p.departure_points = v,
            ParamUpdate::DestinationPoint(v) => p.destination_point = v,
            ParamUpdate::Dates(v) => p.date_range = v,
            ParamUpdate::LaunchInterval(v) => p.launch_interval = v,
            ParamUpdate::JourneyLength(v) => p.journey_length = v,
            ParamUpdate::Timestep(v) => p.timestep = v,
            ParamUpdate::PropulsionType(v) => p.propulsion_type = v,
            ParamUpdate::VesselType(v) => p.vessel_type = v,
            ParamUpdate::PaddlingSpeed(v) => p.paddling_speed = v,
            ParamUpdate::BoundingBox(v) => p.bounding_box = v,
        }
    }
}

/// Current form values. No validation happens here; see `rules`.
pub struct ParameterStore {
    tx: watch::Sender<SimulationParameters>,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(SimulationParameters::default())
    }
}

impl ParameterStore {
    pub fn new(initial: SimulationParameters) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> SimulationParameters {
        self.tx.borrow().clone()
    }

    pub fn set(&self, update: ParamUpdate) {
        debug!(field = %update.key(), "parameter updated");
        self.tx.send_modify(|p| update.apply(p));
    }

    /// Keyed entry point for UI payloads. Unknown names are rejected.
    pub fn set_field(&self, name: &str, value: Value) -> Result<(), StoreError> {
        let key: ParamKey = name
            .parse()
            .map_err(|_| StoreError::UnknownField(name.to_string()))?;
        self.set(ParamUpdate::from_json(key, value)?);
        Ok(())
    }

    /// Right-click "add a departure point" on the map.
    pub fn add_departure_point(&self, point: LonLat) {
        debug!(lon = point.lon, lat = point.lat, "departure point added");
        self.tx.send_modify(|p| p.departure_points.push(point));
    }

    /// The map's "clear" button: drops departure points and the destination.
    pub fn clear_points(&self) {
        debug!("points cleared");
        self.tx.send_modify(|p| {
            p.departure_points.clear();
            p.destination_point = None;
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<SimulationParameters> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_replaces_only_the_named_field() {
        let store = ParameterStore::default();
        store.set(ParamUpdate::Timestep(3600));
        let p = store.get();
        assert_eq!(p.timestep, 3600);
        assert_eq!(
            SimulationParameters {
                timestep: 28_800,
                ..p
            },
            SimulationParameters::default()
        );
    }

    #[test]
    fn store_does_not_validate() {
        let store = ParameterStore::default();
        store.set(ParamUpdate::LaunchInterval(0));
        assert_eq!(store.get().launch_interval, 0);
    }

    #[test]
    fn set_field_decodes_ui_payloads() {
        let store = ParameterStore::default();
        store.set_field("departurePoints", json!([[10, 20], [4.474, 58.962]])).unwrap();
        store.set_field("destinationPoint", json!([1, 54])).unwrap();
        store.set_field("dates", json!("2017-01-01 ~ 2017-01-30")).unwrap();
        store.set_field("propulsionType", json!("paddling")).unwrap();
        store.set_field("paddlingSpeed", json!(1.2)).unwrap();
        store.set_field("vesselType", json!(2)).unwrap();
        store.set_field("bbox", json!([-10, 50, 15, 65])).unwrap();

        let p = store.get();
        assert_eq!(
            p.departure_points,
            vec![LonLat::new(10.0, 20.0), LonLat::new(4.474, 58.962)]
        );
        assert_eq!(p.destination_point, Some(LonLat::new(1.0, 54.0)));
        assert_eq!(p.date_range.to_string(), "2017-01-01 ~ 2017-01-30");
        assert_eq!(p.propulsion_type, PropulsionType::Paddling);
        assert_eq!(p.paddling_speed, Some(1.2));
        assert_eq!(p.vessel_type, VesselType(2));
        assert_eq!(
            p.bounding_box,
            Some(BoundingBox::from([-10.0, 50.0, 15.0, 65.0]))
        );

        store.set_field("bbox", json!([])).unwrap();
        store.set_field("destinationPoint", json!(null)).unwrap();
        let p = store.get();
        assert_eq!(p.bounding_box, None);
        assert_eq!(p.destination_point, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let store = ParameterStore::default();
        let before = store.get();
        assert_eq!(
            store.set_field("colour", json!("red")),
            Err(StoreError::UnknownField("colour".into()))
        );
        assert_eq!(store.get(), before);
    }

    #[test]
    fn numbers_may_arrive_as_form_text() {
        let store = ParameterStore::default();
        store.set_field("timestep", json!("3600")).unwrap();
        store.set_field("launchInterval", json!(" 8 ")).unwrap();
        store.set_field("journeyLength", json!(12.0)).unwrap();
        store.set_field("vesselType", json!("2")).unwrap();
        store.set_field("paddlingSpeed", json!("1.5")).unwrap();
        let p = store.get();
        assert_eq!(p.timestep, 3600);
        assert_eq!(p.launch_interval, 8);
        assert_eq!(p.journey_length, 12);
        assert_eq!(p.vessel_type, VesselType(2));
        assert_eq!(p.paddling_speed, Some(1.5));

        store.set_field("paddlingSpeed", json!("")).unwrap();
        assert_eq!(store.get().paddling_speed, None);
    }

    #[test]
    fn unstorable_counts_carry_the_rule_message() {
        let store = ParameterStore::default();
        assert_eq!(
            store.set_field("timestep", json!(-5)),
            Err(invalid(ParamKey::Timestep, rules::MUST_BE_POSITIVE))
        );
        assert_eq!(
            store.set_field("launchInterval", json!("-1")),
            Err(invalid(ParamKey::LaunchInterval, rules::LAUNCH_INTERVAL_POSITIVE))
        );
        assert_eq!(
            store.set_field("journeyLength", json!("")),
            Err(invalid(ParamKey::JourneyLength, rules::JOURNEY_LENGTH_REQUIRED))
        );
        assert_eq!(
            store.set_field("timestep", json!(0.5)),
            Err(invalid(ParamKey::Timestep, "expected a whole number"))
        );
        assert_eq!(store.get(), SimulationParameters::default());
    }

    #[test]
    fn bad_values_are_rejected() {
        let store = ParameterStore::default();
        assert!(store.set_field("paddlingSpeed", json!("fast")).is_err());
        assert!(store.set_field("bbox", json!([1, 2, 3])).is_err());
        assert!(store.set_field("dates", json!("2017-01-01")).is_err());
        assert!(store.set_field("propulsionType", json!("rowing")).is_err());
        assert_eq!(store.get(), SimulationParameters::default());
    }

    #[test]
    fn points_are_added_in_order_and_cleared() {
        let store = ParameterStore::default();
        store.add_departure_point(LonLat::new(4.474, 58.962));
        store.add_departure_point(LonLat::new(7.655, 54.718));
        store.set(ParamUpdate::DestinationPoint(Some(LonLat::new(1.0, 54.0))));
        assert_eq!(store.get().departure_points[1], LonLat::new(7.655, 54.718));

        store.clear_points();
        let p = store.get();
        assert!(p.departure_points.is_empty());
        assert_eq!(p.destination_point, None);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = ParameterStore::default();
        let mut rx = store.subscribe();
        store.set(ParamUpdate::PropulsionType(PropulsionType::Drifting));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().propulsion_type, PropulsionType::Drifting);
    }
}
