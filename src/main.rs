//! Voyager CLI - run trajectory simulations against the Voyager API.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use voyager::api::{TrajectoryApi, VesselsApi};
use voyager::config::ApiConfig;
use voyager::logging::init_tracing;
use voyager::rules::{ValidationError, validate_parameters};
use voyager::{
    BoundingBox, DateRange, LonLat, ParamUpdate, ParameterStore, PropulsionType, SubmitError,
    VesselType,
};

#[derive(Parser)]
#[command(name = "voyager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the simulation API (overrides VOYAGER_API_BASE).
    #[arg(long, global = true)]
    api: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate trajectories and print the GeoJSON result.
    Run {
        #[command(flatten)]
        params: ParamArgs,

        /// Write the GeoJSON here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate parameters without contacting the API.
    Check {
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Print the vessel catalog.
    Vessels,
}

#[derive(Args)]
struct ParamArgs {
    /// Departure point as LON,LAT. Repeat for several.
    #[arg(short, long = "departure", value_parser = parse_lonlat, allow_hyphen_values = true)]
    departures: Vec<LonLat>,

    /// Destination as LON,LAT (required for sailing and paddling).
    #[arg(long, value_parser = parse_lonlat, allow_hyphen_values = true)]
    destination: Option<LonLat>,

    /// Date range, e.g. "2017-01-01 ~ 2017-01-30".
    #[arg(long)]
    dates: Option<DateRange>,

    /// sailing, paddling or drifting.
    #[arg(short, long)]
    mode: Option<PropulsionType>,

    /// Vessel type id.
    #[arg(long)]
    craft: Option<u32>,

    /// Days between launches.
    #[arg(long)]
    launch_interval: Option<u32>,

    /// Max journey length in days.
    #[arg(long)]
    journey_length: Option<u32>,

    /// Simulation timestep in seconds.
    #[arg(long)]
    timestep: Option<u32>,

    /// Mean paddling speed.
    #[arg(long)]
    speed: Option<f64>,

    /// Bounding box as LON_MIN,LAT_MIN,LON_MAX,LAT_MAX.
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,
}

fn parse_numbers(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("'{}': {e}", part.trim()))
        })
        .collect()
}

fn parse_lonlat(s: &str) -> Result<LonLat, String> {
    match parse_numbers(s)?.as_slice() {
        [lon, lat] => Ok(LonLat::new(*lon, *lat)),
        _ => Err(format!("expected LON,LAT, got '{s}'")),
    }
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    match BoundingBox::from_slice(&parse_numbers(s)?) {
        Ok(Some(b)) => Ok(b),
        Ok(None) => Err("empty bounding box".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

impl ParamArgs {
    /// Defaults from the form, overridden by whatever was given.
    fn into_store(self) -> ParameterStore {
        let store = ParameterStore::default();
        if !self.departures.is_empty() {
            store.set(ParamUpdate::DeparturePoints(self.departures));
        }
        if let Some(p) = self.destination {
            store.set(ParamUpdate::DestinationPoint(Some(p)));
        }
        if let Some(d) = self.dates {
            store.set(ParamUpdate::Dates(d));
        }
        if let Some(m) = self.mode {
            store.set(ParamUpdate::PropulsionType(m));
        }
        if let Some(c) = self.craft {
            store.set(ParamUpdate::VesselType(VesselType(c)));
        }
        if let Some(v) = self.launch_interval {
            store.set(ParamUpdate::LaunchInterval(v));
        }
        if let Some(v) = self.journey_length {
            store.set(ParamUpdate::JourneyLength(v));
        }
        if let Some(v) = self.timestep {
            store.set(ParamUpdate::Timestep(v));
        }
        if let Some(v) = self.speed {
            store.set(ParamUpdate::PaddlingSpeed(Some(v)));
        }
        if let Some(b) = self.bbox {
            store.set(ParamUpdate::BoundingBox(Some(b)));
        }
        store
    }
}

fn report(errors: &[ValidationError]) {
    for e in errors {
        eprintln!("  {:18} {}", e.field.as_str(), e.message);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let mut api = ApiConfig::from_env();
    if let Some(base) = cli.api {
        api.base_url = base;
    }

    match cli.command {
        Commands::Check { params } => {
            let params = params.into_store().get();
            match validate_parameters(&params) {
                Ok(()) => {
                    eprintln!("Parameters are valid.");
                    Ok(ExitCode::SUCCESS)
                }
                Err(errors) => {
                    eprintln!("Invalid parameters:");
                    report(&errors);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Run { params, out } => {
            let params = params.into_store().get();
            let trajectories = TrajectoryApi::new(&api)?;
            info!(url = %trajectories.url(), "using trajectory endpoint");
            let results = match voyager::submit(&trajectories, &params).await {
                Ok(r) => r,
                Err(SubmitError::Invalid(errors)) => {
                    eprintln!("Invalid parameters:");
                    report(&errors);
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            };
            let body = serde_json::to_string_pretty(&results)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, body)?;
                    eprintln!("Saved {} trajectories to {}", results.len(), path.display());
                }
                None => println!("{body}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Vessels => {
            let vessels = VesselsApi::new(&api)?;
            let catalog = vessels.get(&[] as &[(&str, &str)]).await?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
