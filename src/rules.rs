//! Form validation.
//!
//! Each rule takes a candidate value and returns `Ok(())` or the message to
//! show under the field. A field is valid when all of its rules pass; the
//! first failure wins.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::params::{DATE_FORMAT, DateRange, ParamKey, RANGE_SEPARATOR, SimulationParameters, VesselType};

pub type RuleResult = Result<(), &'static str>;

pub const DATES_REQUIRED: &str = "Please specify a date range.";
pub const DATES_NOT_A_RANGE: &str = "Specify a range of dates.";
pub const DATES_UNPARSEABLE: &str = "Dates must be written as YYYY-MM-DD ~ YYYY-MM-DD.";
pub const DATES_OUT_OF_WINDOW: &str = "Date range must be between 1993 and 2018.";
pub const DATES_UNORDERED: &str = "End date must be later than the start date.";
pub const PROPULSION_REQUIRED: &str = "Please choose a mode of propulsion.";
pub const VESSEL_REQUIRED: &str = "Please choose a vessel type.";
pub const LAUNCH_INTERVAL_REQUIRED: &str = "A launch interval is required.";
pub const LAUNCH_INTERVAL_POSITIVE: &str = "Boats must be launched at least 1 day apart";
pub const JOURNEY_LENGTH_REQUIRED: &str = "A max journey length is required.";
pub const TIMESTEP_REQUIRED: &str = "A simulation timestep is required.";
pub const PADDLING_SPEED_REQUIRED: &str = "A mean speed is required when paddling.";
pub const MUST_BE_POSITIVE: &str = "Must be a positive number.";
pub const DESTINATION_REQUIRED: &str = "A destination is required when sailing or paddling.";
pub const DEPARTURE_REQUIRED: &str = "Add at least one departure point.";

/// First and last day covered by the wind and current data.
pub fn data_window() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(1993, 1, 1).unwrap_or(NaiveDate::MIN),
        NaiveDate::from_ymd_opt(2018, 12, 31).unwrap_or(NaiveDate::MAX),
    )
}

#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: ParamKey,
    pub message: &'static str,
}

impl ValidationError {
    pub fn new(field: ParamKey, message: &'static str) -> Self {
        Self { field, message }
    }
}

struct Positive {
    required: &'static str,
    positive: &'static str,
}

impl Positive {
    /// Zero counts as missing, like an empty input.
    fn check(&self, value: Option<f64>) -> RuleResult {
        let v = match value {
            Some(v) if v != 0.0 && !v.is_nan() => v,
            _ => return Err(self.required),
        };
        if v > 0.0 { Ok(()) } else { Err(self.positive) }
    }
}

const LAUNCH_INTERVAL: Positive = Positive {
    required: LAUNCH_INTERVAL_REQUIRED,
    positive: LAUNCH_INTERVAL_POSITIVE,
};
const JOURNEY_LENGTH: Positive = Positive {
    required: JOURNEY_LENGTH_REQUIRED,
    positive: MUST_BE_POSITIVE,
};
const TIMESTEP: Positive = Positive {
    required: TIMESTEP_REQUIRED,
    positive: MUST_BE_POSITIVE,
};
const PADDLING_SPEED: Positive = Positive {
    required: PADDLING_SPEED_REQUIRED,
    positive: MUST_BE_POSITIVE,
};

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// `start ~ end` as typed into the date field.
pub fn dates(value: Option<&str>) -> RuleResult {
    let text = value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(DATES_REQUIRED)?;
    let Some((start, end)) = text.split_once(RANGE_SEPARATOR) else {
        return match parse_date(text) {
            Some(_) => Err(DATES_NOT_A_RANGE),
            None => Err(DATES_UNPARSEABLE),
        };
    };
    match (parse_date(start), parse_date(end)) {
        (Some(start), Some(end)) => date_range(&DateRange::new(start, end)),
        _ => Err(DATES_UNPARSEABLE),
    }
}

/// Window first, then ordering.
pub fn date_range(range: &DateRange) -> RuleResult {
    let (first, last) = data_window();
    let window = first..=last;
    if !window.contains(&range.start) || !window.contains(&range.end) {
        return Err(DATES_OUT_OF_WINDOW);
    }
    if range.end <= range.start {
        return Err(DATES_UNORDERED);
    }
    Ok(())
}

pub fn propulsion_type(value: Option<&str>) -> RuleResult {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(()),
        _ => Err(PROPULSION_REQUIRED),
    }
}

/// Vessel ids start at 1; 0 is the unselected dropdown.
pub fn vessel_type(value: Option<VesselType>) -> RuleResult {
    match value {
        Some(VesselType(id)) if id != 0 => Ok(()),
        _ => Err(VESSEL_REQUIRED),
    }
}

pub fn launch_interval(value: Option<f64>) -> RuleResult {
    LAUNCH_INTERVAL.check(value)
}

pub fn journey_length(value: Option<f64>) -> RuleResult {
    JOURNEY_LENGTH.check(value)
}

pub fn timestep(value: Option<f64>) -> RuleResult {
    TIMESTEP.check(value)
}

pub fn paddling_speed(value: Option<f64>) -> RuleResult {
    PADDLING_SPEED.check(value)
}

fn as_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Form inputs hand numbers over as strings as often as not.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn dates_value(value: &Value) -> RuleResult {
    match value {
        Value::Null => dates(None),
        Value::String(s) => dates(Some(s.as_str())),
        Value::Array(items) => {
            let parts: Option<Vec<&str>> = items.iter().map(as_text).collect();
            match parts.as_deref() {
                Some([]) => dates(None),
                Some([single]) => dates(Some(*single)),
                Some([start, end]) => dates(Some(&format!("{start} {RANGE_SEPARATOR} {end}"))),
                _ => Err(DATES_UNPARSEABLE),
            }
        }
        _ => Err(DATES_UNPARSEABLE),
    }
}

/// Run the rules assigned to `key` on a raw UI value. Fields without rules
/// (points, bbox) always pass here.
pub fn check(key: ParamKey, value: &Value) -> Result<(), ValidationError> {
    let result = match key {
        ParamKey::Dates => dates_value(value),
        ParamKey::PropulsionType => propulsion_type(as_text(value)),
        ParamKey::VesselType => vessel_type(
            as_number(value)
                .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
                .map(|n| VesselType(n as u32)),
        ),
        ParamKey::LaunchInterval => launch_interval(as_number(value)),
        ParamKey::JourneyLength => journey_length(as_number(value)),
        ParamKey::Timestep => timestep(as_number(value)),
        ParamKey::PaddlingSpeed => paddling_speed(as_number(value)),
        ParamKey::DeparturePoints | ParamKey::DestinationPoint | ParamKey::BoundingBox => Ok(()),
    };
    result.map_err(|message| ValidationError::new(key, message))
}

/// Everything that must hold before a run is submitted, including the
/// cross-field constraints. Reports every failing field.
pub fn validate_parameters(params: &SimulationParameters) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut push = |key: ParamKey, result: RuleResult| {
        if let Err(message) = result {
            errors.push(ValidationError::new(key, message));
        }
    };

    if params.departure_points.is_empty() {
        push(ParamKey::DeparturePoints, Err(DEPARTURE_REQUIRED));
    }
    if params.propulsion_type.requires_destination() && params.destination_point.is_none() {
        push(ParamKey::DestinationPoint, Err(DESTINATION_REQUIRED));
    }
    push(ParamKey::Dates, date_range(&params.date_range));
    push(
        ParamKey::PropulsionType,
        propulsion_type(Some(params.propulsion_type.as_str())),
    );
    push(ParamKey::VesselType, vessel_type(Some(params.vessel_type)));
    push(
        ParamKey::LaunchInterval,
        launch_interval(Some(f64::from(params.launch_interval))),
    );
    push(
        ParamKey::JourneyLength,
        journey_length(Some(f64::from(params.journey_length))),
    );
    push(ParamKey::Timestep, timestep(Some(f64::from(params.timestep))));
    if params.propulsion_type == crate::params::PropulsionType::Paddling {
        push(ParamKey::PaddlingSpeed, paddling_speed(params.paddling_speed));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
