pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
mod sweeper;

pub use config::{BridgeConfig, ConfigError};
pub use error::ApiError;
pub use server::{BridgeServer, LifecycleError, ServerState};

use axum::Router;
use eabridge_queue::QueueStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum application router over `store`.
pub fn build_router(store: Arc<QueueStore>, config: &BridgeConfig) -> Router {
    let app_state = Arc::new(state::AppState::new(store, config.default_ea_id.clone()));

    let router = routes::api_routes().layer(TraceLayer::new_for_http());

    let router = if config.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(app_state)
}
