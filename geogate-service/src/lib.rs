//! Geogate Service Library
//!
//! HTTP handlers, inbound parameter shapes and the route table of the
//! GeoServer gateway. This library is used by both the geogate-service
//! binary and integration tests.

pub mod handlers;
pub mod params;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use geogate::GeoServerClient;

/// Application state shared across handlers.
pub struct AppState {
    /// Client for the GeoServer instance behind the gateway.
    pub client: GeoServerClient,
}

/// Build the gateway routes.
///
/// Documentation and middleware layers are added by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/wmservice",
            post(handlers::post_map_image).get(handlers::get_map_image),
        )
        .route(
            "/features/:workspace/:layername/:featureName/:featureValue",
            get(handlers::get_features_by_attribute),
        )
        .route("/features", get(handlers::get_features))
        .route(
            "/graphic/:workspace/:layername",
            get(handlers::get_legend_by_layer),
        )
        .route("/graphic", get(handlers::get_legend))
        .route(
            "/capabilities/:workspace/:layerName",
            get(handlers::get_capabilities),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{ErrorResponse, HealthResponse, LayerSummaryResponse};
