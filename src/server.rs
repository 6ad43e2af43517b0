//! HTTP API exposing the resource snapshot

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::config::CollectorConfig;
use crate::openstack::Connector;
use crate::resource::collect;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: CollectorConfig,
    pub connector: Arc<dyn Connector>,
}

impl AppState {
    pub fn new(config: CollectorConfig, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }
}

/// Fresh snapshot on every request. The error shape is still a 200 so
/// clients only need to look for the `error` key.
async fn resource(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = collect(&state.config, state.connector.as_ref()).await;
    (StatusCode::OK, Json(result))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/resource", get(resource))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
