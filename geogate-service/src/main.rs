//! Geogate Service - HTTP gateway in front of GeoServer.
//!
//! Forwards WMS and WFS requests to one GeoServer instance and normalizes
//! its XML answers into JSON.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GEOGATE_GEOSERVER_URL` | GeoServer base URL | `http://localhost:8080/geoserver` |
//! | `GEOGATE_TIMEOUT_SECS` | Upstream timeout in seconds | 30 |
//! | `GEOGATE_PORT` | HTTP server port (falls back to `PORT`) | 3000 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /wmservice` - Map image for a workspace layer (JSON body)
//! - `GET /wmservice` - WMS passthrough
//! - `GET /features/{workspace}/{layername}/{featureName}/{featureValue}` - Attribute query
//! - `GET /features` - WFS passthrough
//! - `GET /graphic/{workspace}/{layername}` - Legend graphic
//! - `GET /graphic` - Legend passthrough
//! - `GET /capabilities/{workspace}/{layerName}` - Layer summary
//! - `GET /health` - Health check
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use geogate::GeoServerClientBuilder;
use geogate_service::{handlers, params, router, AppState};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// GeoServer used when `GEOGATE_GEOSERVER_URL` is not set.
const DEFAULT_GEOSERVER_URL: &str = "http://localhost:8080/geoserver";

/// OpenAPI documentation for the gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geogate",
        version = "0.1.0",
        description = "HTTP gateway forwarding WMS and WFS requests to GeoServer.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::post_map_image,
        handlers::get_map_image,
        handlers::get_features_by_attribute,
        handlers::get_features,
        handlers::get_legend_by_layer,
        handlers::get_legend,
        handlers::get_capabilities,
        handlers::health_check,
    ),
    components(
        schemas(
            params::MapImageBody,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::LayerSummaryResponse,
        )
    ),
    tags(
        (name = "wms", description = "Map, legend and capabilities endpoints"),
        (name = "wfs", description = "Feature query endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geogate_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("GEOGATE_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);

    // The library reads GEOGATE_GEOSERVER_URL and GEOGATE_TIMEOUT_SECS
    let client = match GeoServerClientBuilder::from_env() {
        Ok(builder) => builder.build()?,
        Err(_) => {
            tracing::warn!(
                url = DEFAULT_GEOSERVER_URL,
                "GEOGATE_GEOSERVER_URL not set, using default"
            );
            GeoServerClientBuilder::new(DEFAULT_GEOSERVER_URL).build()?
        }
    };

    tracing::info!(
        geoserver = %client.base_url(),
        timeout_secs = client.timeout().as_secs_f64(),
        port = port,
        "Starting geogate service"
    );

    let state = Arc::new(AppState { client });

    let app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(router(state))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
