#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

/// Query strings the stub upstream has received, in arrival order.
pub type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

pub async fn spawn(app: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

async fn trajectory(
    State(seen): State<Seen>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let start = q.get("start_date").cloned().unwrap_or_default();
    let lon: f64 = q
        .get("departure_lon")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    let lat: f64 = q
        .get("departure_lat")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    seen.lock().expect("seen lock").push(q);
    Json(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[lon, lat], [lon - 1.0, lat - 1.0]]},
            "properties": {"start_date": start, "distance": 140.2, "mean_speed": 1.1}
        }]
    }))
}

async fn vessels(
    State(seen): State<Seen>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.lock().expect("seen lock").push(q);
    Json(json!({
        "sailing": {"1": {"name": "log boat"}, "2": {"name": "plank boat"}},
        "paddling": {"1": {"name": "skin boat"}}
    }))
}

/// A well-behaved simulation API under `/api/`.
pub async fn upstream() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/api/trajectory/", get(trajectory))
        .route("/api/vessels/", get(vessels))
        .with_state(seen.clone());
    let addr = spawn(app).await;
    (format!("http://{addr}/api/"), seen)
}

/// Like `trajectory`, but answers after `departure_lon` tenths of a second,
/// so tests can decide which of two overlapping runs finishes first.
async fn slow_trajectory(seen: State<Seen>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let lon: f64 = q
        .get("departure_lon")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    tokio::time::sleep(Duration::from_secs_f64(lon.max(0.0) / 10.0)).await;
    trajectory(seen, Query(q)).await
}

pub async fn slow_upstream() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/api/trajectory/", get(slow_trajectory))
        .with_state(seen.clone());
    let addr = spawn(app).await;
    (format!("http://{addr}/api/"), seen)
}

/// An API whose endpoints all answer with `status` and `body`.
pub async fn broken_upstream(status: StatusCode, body: &'static str) -> String {
    let handler = move || async move { (status, body) };
    let app = Router::new()
        .route("/api/trajectory/", get(handler.clone()))
        .route("/api/vessels/", get(handler));
    let addr = spawn(app).await;
    format!("http://{addr}/api/")
}

/// A base URL nothing is listening on.
pub async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/api/")
}
