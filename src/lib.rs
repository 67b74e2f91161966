pub mod api;
pub mod app;
pub mod config;
pub mod geo;
pub mod logging;
pub mod params;
pub mod rules;
pub mod store;
pub mod submit;

pub use api::{ApiError, TrajectoryApi, TrajectoryCollection, VesselsApi};
pub use config::{ApiConfig, Config};
pub use geo::{BoundingBox, LonLat};
pub use params::{DateRange, ParamKey, PropulsionType, SimulationParameters, VesselType};
pub use store::{ParamUpdate, ParameterStore, StoreError};
pub use submit::{SubmitError, submit};
