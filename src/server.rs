use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tracing::info;

use crate::{Res, api, pipeline::PlaylistPipeline};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PlaylistPipeline>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/create-playlist", post(api::create_playlist))
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn start_api_server(addr: &str, pipeline: Arc<PlaylistPipeline>) -> Res<()> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| format!("Failed to parse server address '{}': {}", addr, e))?;

    let app = build_router(AppState { pipeline });
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Playlist service listening");

    axum::serve(listener, app).await?;
    Ok(())
}
