//! Turning the form into trajectory requests.
//!
//! A run launches a vessel from every departure point on every launch day
//! (start, start + interval, ... up to the end date). Each launch is one
//! request to the trajectory endpoint; the answers are merged into a single
//! feature collection.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Days, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::api::{ApiError, TrajectoryApi, TrajectoryCollection, TrajectoryParam};
use crate::geo::LonLat;
use crate::params::{DateRange, PropulsionType, SimulationParameters};
use crate::rules::{ValidationError, validate_parameters};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{} parameter(s) failed validation", .0.len())]
    Invalid(Vec<ValidationError>),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Launch days from `range.start` every `interval_days`, not past `range.end`.
pub fn launch_dates(range: &DateRange, interval_days: u32) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    if interval_days == 0 {
        return dates;
    }
    let mut day = range.start;
    while day <= range.end {
        dates.push(day);
        match day.checked_add_days(Days::new(u64::from(interval_days))) {
            Some(next) => day = next,
            None => break,
        }
    }
    dates
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedRequest {
    pub launch: NaiveDate,
    pub departure: LonLat,
    pub params: Vec<TrajectoryParam>,
}

/// One request per launch day and departure point, launch day major.
pub fn plan(params: &SimulationParameters) -> Vec<PlannedRequest> {
    let mut shared = vec![
        TrajectoryParam::JourneyLength(params.journey_length),
        TrajectoryParam::PropulsionType(params.propulsion_type),
        TrajectoryParam::VesselType(params.vessel_type),
        TrajectoryParam::Timestep(params.timestep),
    ];
    if params.propulsion_type.requires_destination() {
        if let Some(dest) = params.destination_point {
            shared.push(TrajectoryParam::DestinationPoint(dest));
        }
    }
    if params.propulsion_type == PropulsionType::Paddling {
        if let Some(speed) = params.paddling_speed {
            shared.push(TrajectoryParam::PaddlingSpeed(speed));
        }
    }
    if let Some(bbox) = params.bounding_box {
        shared.push(TrajectoryParam::BoundingBox(bbox));
    }

    let mut out = Vec::new();
    for launch in launch_dates(&params.date_range, params.launch_interval) {
        for &departure in &params.departure_points {
            let mut request = shared.clone();
            request.push(TrajectoryParam::DeparturePoint(departure));
            request.push(TrajectoryParam::StartDate(launch));
            out.push(PlannedRequest {
                launch,
                departure,
                params: request,
            });
        }
    }
    out
}

/// Validate, then send the planned requests one after another. The first
/// failing request aborts the run.
#[instrument(name = "submit", skip_all, fields(departures = params.departure_points.len()))]
pub async fn submit(
    api: &TrajectoryApi,
    params: &SimulationParameters,
) -> Result<TrajectoryCollection, SubmitError> {
    validate_parameters(params).map_err(SubmitError::Invalid)?;

    let requests = plan(params);
    info!(
        requests = requests.len(),
        mode = params.propulsion_type.mode(),
        dates = %params.date_range,
        "submitting simulation"
    );

    let mut merged = TrajectoryCollection::default();
    for request in &requests {
        debug!(launch = %request.launch, lon = request.departure.lon, lat = request.departure.lat, "launch");
        merged.extend(api.fetch(&request.params).await?);
    }
    info!(trajectories = merged.len(), "simulation complete");
    Ok(merged)
}

/// Orders overlapping submissions so a slow, older run cannot replace the
/// results of a newer one.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True while no newer submission has begun.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
