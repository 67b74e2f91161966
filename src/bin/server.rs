use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use voyager::app::{AppState, build_router};
use voyager::config::{ApiConfig, Config};
use voyager::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config {
        api: ApiConfig::from_env(),
        ..Config::default()
    };
    let frontend = PathBuf::from(std::env::var("VOYAGER_FRONTEND").unwrap_or_else(|_| "frontend".into()));
    let addr: SocketAddr = std::env::var("VOYAGER_BIND")
        .unwrap_or_else(|_| "127.0.0.1:3000".into())
        .parse()?;

    info!(api = %config.api.base_url, frontend = %frontend.display(), "starting");
    let state = AppState::new(config)?;
    let app = build_router(state, Some(frontend));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("voyager server at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
