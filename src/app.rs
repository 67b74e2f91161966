//! HTTP surface for the browser UI: the parameter store, field validation,
//! simulation runs and the vessel catalog.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::api::{ApiError, TrajectoryApi, TrajectoryCollection, VesselsApi};
use crate::config::Config;
use crate::geo::LonLat;
use crate::params::{ParamKey, SimulationParameters};
use crate::rules::{self, ValidationError};
use crate::store::{ParameterStore, StoreError};
use crate::submit::{Sequencer, SubmitError, submit};

struct Inner {
    config: Config,
    store: ParameterStore,
    trajectory: TrajectoryApi,
    vessels: VesselsApi,
    sequencer: Sequencer,
    latest: RwLock<Option<TrajectoryCollection>>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        Self::with_store(config, ParameterStore::default())
    }

    pub fn with_store(config: Config, store: ParameterStore) -> Result<Self, ApiError> {
        let trajectory = TrajectoryApi::new(&config.api)?;
        let vessels = VesselsApi::new(&config.api)?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                store,
                trajectory,
                vessels,
                sequencer: Sequencer::new(),
                latest: RwLock::new(None),
            }),
        })
    }

    pub fn store(&self) -> &ParameterStore {
        &self.inner.store
    }
}

pub enum AppError {
    Store(StoreError),
    Invalid(Vec<ValidationError>),
    Upstream(ApiError),
    NotFound(&'static str),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Invalid(errors) => AppError::Invalid(errors),
            SubmitError::Api(e) => AppError::Upstream(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Store(e) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
            }
            AppError::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            AppError::Upstream(e) => {
                warn!(error = %e, "upstream failure");
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
            }
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": what }))).into_response()
            }
        }
    }
}

/// Same shape as the UI's `updateState` payload.
#[derive(Deserialize)]
struct SetParamRequest {
    which: String,
    value: Value,
}

#[derive(Deserialize)]
struct ValidateRequest {
    field: String,
    #[serde(default)]
    value: Value,
}

async fn config_handler(State(state): State<AppState>) -> Json<Config> {
    Json(state.inner.config.clone())
}

async fn get_params(State(state): State<AppState>) -> Json<SimulationParameters> {
    Json(state.store().get())
}

async fn set_param(
    State(state): State<AppState>,
    Json(req): Json<SetParamRequest>,
) -> Result<Json<SimulationParameters>, AppError> {
    state.store().set_field(&req.which, req.value)?;
    Ok(Json(state.store().get()))
}

async fn add_departure(
    State(state): State<AppState>,
    Json(point): Json<LonLat>,
) -> Json<SimulationParameters> {
    state.store().add_departure_point(point);
    Json(state.store().get())
}

async fn clear_points(State(state): State<AppState>) -> Json<SimulationParameters> {
    state.store().clear_points();
    Json(state.store().get())
}

async fn validate_handler(Json(req): Json<ValidateRequest>) -> Result<Json<Value>, AppError> {
    let key: ParamKey = req
        .field
        .parse()
        .map_err(|_| StoreError::UnknownField(req.field.clone()))?;
    let body = match rules::check(key, &req.value) {
        Ok(()) => json!({ "valid": true }),
        Err(e) => json!({ "valid": false, "message": e.message }),
    };
    Ok(Json(body))
}

async fn run_handler(State(state): State<AppState>) -> Result<Json<TrajectoryCollection>, AppError> {
    let params = state.store().get();
    // a rejected run must not outrank one still in flight
    rules::validate_parameters(&params).map_err(AppError::Invalid)?;
    let ticket = state.inner.sequencer.begin();
    let results = submit(&state.inner.trajectory, &params).await?;
    let mut latest = state.inner.latest.write().await;
    if state.inner.sequencer.is_current(ticket) {
        *latest = Some(results.clone());
    } else {
        info!("newer run started, results not kept as latest");
    }
    drop(latest);
    Ok(Json(results))
}

async fn results_handler(
    State(state): State<AppState>,
) -> Result<Json<TrajectoryCollection>, AppError> {
    state
        .inner
        .latest
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or(AppError::NotFound("no results yet"))
}

async fn vessels_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    state
        .inner
        .vessels
        .get(&query)
        .await
        .map(Json)
        .map_err(AppError::Upstream)
}

/// API routes under `/api`; anything else is served from `frontend` when given.
pub fn build_router(state: AppState, frontend: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/api/config", get(config_handler))
        .route("/api/params", get(get_params).post(set_param))
        .route("/api/params/departure", post(add_departure))
        .route("/api/params/points", delete(clear_points))
        .route("/api/validate", post(validate_handler))
        .route("/api/run", post(run_handler))
        .route("/api/results", get(results_handler))
        .route("/api/vessels", get(vessels_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);
    match frontend {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}
