//! HTTP request handlers for the GeoServer gateway.
//!
//! Each operation has one shared `serve_*` function doing the upstream
//! round trip, and one `*_error_response` function deciding what each
//! failure looks like on that route. The route handlers themselves only
//! adapt their inbound shape into the core request model.

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use geogate::{
    find_layer, CapabilitiesRequest, FeatureQuery, GatewayError, GeoServerClient, LayerInfo,
    LegendRequest, MapRequest, Payload,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::params::{
    rejected, CapabilitiesPath, FeatureOptions, FeaturePath, LegendParams, LegendPath,
    MapImageBody, WfsParams, WmsParams,
};
use crate::AppState;

/// Content type sent for map bodies that arrive without one.
const FALLBACK_IMAGE_TYPE: &str = "image/png";

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Summary of one layer from a WMS capabilities document.
#[derive(Debug, Serialize, ToSchema)]
pub struct LayerSummaryResponse {
    /// Workspace-qualified layer name.
    #[serde(rename = "layerName")]
    pub layer_name: String,
    /// Layer title, possibly empty.
    pub title: String,
    /// Layer abstract, or `"No abstract"`.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Attributes of the first bounding box, or `"No bounding box"`.
    #[serde(rename = "boundingBox")]
    #[schema(value_type = Object)]
    pub bounding_box: serde_json::Value,
}

impl LayerSummaryResponse {
    fn new(layer_name: String, info: LayerInfo) -> Self {
        Self {
            layer_name,
            title: info.title,
            abstract_text: info
                .abstract_text
                .unwrap_or_else(|| "No abstract".to_string()),
            bounding_box: match info.bounding_box {
                Some(attributes) => serde_json::json!(attributes),
                None => serde_json::Value::String("No bounding box".to_string()),
            },
        }
    }
}

/// Render a map for one workspace layer.
///
/// # Returns
///
/// - `200 OK` with the image bytes and GeoServer's content type
/// - `400 Bad Request` if a field is missing or the bbox is malformed
/// - `404 Not Found` with the exception text if GeoServer reports one
/// - `504 Gateway Timeout` if GeoServer does not answer in time
#[utoipa::path(
    post,
    path = "/wmservice",
    tag = "wms",
    request_body = MapImageBody,
    responses(
        (status = 200, description = "Map image"),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 404, description = "GeoServer service exception", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse),
        (status = 504, description = "GeoServer timed out", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn post_map_image(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MapImageBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => MapImageBody::default(),
        Err(rejection) => return map_error_response(rejected("body", rejection.body_text())),
    };
    tracing::debug!(
        workspace = ?body.workspace,
        layer = ?body.layer_name,
        "Map image request"
    );

    match MapRequest::try_from(body) {
        Ok(request) => serve_map(&state.client, request).await,
        Err(e) => map_error_response(e),
    }
}

/// Relay a flat set of WMS parameters to GeoServer.
///
/// `LAYERS`, `BBOX` and one of `CRS`/`SRS` are required; everything else
/// falls back to the GetMap defaults. Non-image answers such as
/// GetFeatureInfo documents are relayed as they arrive.
#[utoipa::path(
    get,
    path = "/wmservice",
    tag = "wms",
    params(WmsParams),
    responses(
        (status = 200, description = "GeoServer response body"),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 404, description = "GeoServer service exception", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse),
        (status = 504, description = "GeoServer timed out", body = ErrorResponse)
    )
)]
pub async fn get_map_image(
    State(state): State<Arc<AppState>>,
    params: Result<Query<WmsParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return map_error_response(rejected("query", rejection.body_text())),
    };
    tracing::debug!(layers = ?params.layers, bbox = ?params.bbox, "WMS passthrough request");

    match MapRequest::try_from(params) {
        Ok(request) => serve_map(&state.client, request).await,
        Err(e) => map_error_response(e),
    }
}

async fn fetch_map(client: &GeoServerClient, request: &MapRequest) -> geogate::Result<Payload> {
    client.dispatch(request).await?.ensure_success()?.normalize()
}

async fn serve_map(client: &GeoServerClient, request: MapRequest) -> Response {
    match fetch_map(client, &request).await {
        Ok(payload) => {
            let (content_type, bytes) = match payload {
                Payload::Image {
                    content_type,
                    bytes,
                } => (content_type, bytes),
                Payload::Other {
                    content_type,
                    bytes,
                } => (
                    content_type.unwrap_or_else(|| FALLBACK_IMAGE_TYPE.to_string()),
                    bytes,
                ),
            };
            tracing::info!(
                layers = request.layers(),
                content_type = %content_type,
                bytes = bytes.len(),
                "Map fetched"
            );
            binary_response(content_type, bytes)
        }
        Err(e) => map_error_response(e),
    }
}

/// Create an error response for map requests.
fn map_error_response(e: GatewayError) -> Response {
    let (status, message) = match &e {
        err if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
        GatewayError::ServiceException(message) => (StatusCode::NOT_FOUND, message.clone()),
        GatewayError::UpstreamStatus { status, reason } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            format!("Error fetching WMS data: {reason}"),
        ),
        GatewayError::NoResponse(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching WMS data: No response received from server".to_string(),
        ),
        GatewayError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "Error fetching WMS data: upstream timed out".to_string(),
        ),
        GatewayError::MalformedXml(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error parsing server response".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching WMS data: Request setup error".to_string(),
        ),
    };

    log_failure("map", status, &e);
    error_response(status, message)
}

/// Query features by one attribute equality.
///
/// The predicate is built with the attribute as an identifier and the
/// value as a quoted literal, so the value cannot extend the filter.
#[utoipa::path(
    get,
    path = "/features/{workspace}/{layername}/{featureName}/{featureValue}",
    tag = "wfs",
    params(FeaturePath, FeatureOptions),
    responses(
        (status = 200, description = "GeoJSON feature collection"),
        (status = 400, description = "Empty attribute, value or invalid maxFeatures", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
        (status = 504, description = "GeoServer timed out", body = ErrorResponse)
    )
)]
pub async fn get_features_by_attribute(
    State(state): State<Arc<AppState>>,
    path: Result<Path<FeaturePath>, PathRejection>,
    options: Result<Query<FeatureOptions>, QueryRejection>,
) -> Response {
    let (Path(path), Query(options)) = match (path, options) {
        (Ok(path), Ok(options)) => (path, options),
        (Err(rejection), _) => {
            return features_error_response(rejected("path", rejection.body_text()))
        }
        (_, Err(rejection)) => {
            return features_error_response(rejected("query", rejection.body_text()))
        }
    };
    tracing::debug!(
        workspace = %path.workspace,
        layer = %path.layername,
        attribute = %path.feature_name,
        "Feature query"
    );

    match FeatureQuery::try_from(path).and_then(|query| options.apply(query)) {
        Ok(query) => serve_features(&state.client, query).await,
        Err(e) => features_error_response(e),
    }
}

/// Relay a flat set of WFS parameters to GeoServer.
///
/// `CQL_FILTER` is forwarded as written by the caller.
#[utoipa::path(
    get,
    path = "/features",
    tag = "wfs",
    params(WfsParams),
    responses(
        (status = 200, description = "GeoJSON feature collection"),
        (status = 400, description = "Missing typeName or invalid maxFeatures", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
        (status = 504, description = "GeoServer timed out", body = ErrorResponse)
    )
)]
pub async fn get_features(
    State(state): State<Arc<AppState>>,
    params: Result<Query<WfsParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return features_error_response(rejected("query", rejection.body_text())),
    };
    tracing::debug!(type_name = ?params.type_name, "WFS passthrough request");

    match FeatureQuery::try_from(params) {
        Ok(query) => serve_features(&state.client, query).await,
        Err(e) => features_error_response(e),
    }
}

async fn fetch_features(client: &GeoServerClient, query: &FeatureQuery) -> geogate::Result<Bytes> {
    client.dispatch(query).await?.ensure_success()?.into_json()
}

async fn serve_features(client: &GeoServerClient, query: FeatureQuery) -> Response {
    match fetch_features(client, &query).await {
        Ok(body) => {
            tracing::info!(
                type_name = query.type_name(),
                bytes = body.len(),
                "Features fetched"
            );
            binary_response("application/json".to_string(), body)
        }
        Err(e) => features_error_response(e),
    }
}

/// Create an error response for feature queries.
fn features_error_response(e: GatewayError) -> Response {
    let (status, message) = match &e {
        err if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
        GatewayError::Timeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout".to_string())
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        ),
    };

    log_failure("features", status, &e);
    error_response(status, message)
}

/// Fetch the legend graphic of one workspace layer.
///
/// # Returns
///
/// - `200 OK` with the legend image
/// - `404 Not Found` with the exception text if GeoServer reports one
/// - `500 Internal Server Error` for non-image answers or upstream 5xx
#[utoipa::path(
    get,
    path = "/graphic/{workspace}/{layername}",
    tag = "wms",
    params(LegendPath),
    responses(
        (status = 200, description = "Legend image"),
        (status = 400, description = "Malformed path", body = ErrorResponse),
        (status = 404, description = "GeoServer service exception", body = ErrorResponse),
        (status = 500, description = "Unexpected response format", body = ErrorResponse),
        (status = 504, description = "GeoServer timed out", body = ErrorResponse)
    )
)]
pub async fn get_legend_by_layer(
    State(state): State<Arc<AppState>>,
    path: Result<Path<LegendPath>, PathRejection>,
) -> Response {
    let Path(path) = match path {
        Ok(path) => path,
        Err(rejection) => return legend_error_response(rejected("path", rejection.body_text())),
    };
    tracing::debug!(workspace = %path.workspace, layer = %path.layername, "Legend request");

    serve_legend(&state.client, LegendRequest::from(path)).await
}

/// Fetch a legend graphic from flat WMS parameters.
#[utoipa::path(
    get,
    path = "/graphic",
    tag = "wms",
    params(LegendParams),
    responses(
        (status = 200, description = "Legend image"),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 404, description = "GeoServer service exception", body = ErrorResponse),
        (status = 500, description = "Unexpected response format", body = ErrorResponse),
        (status = 504, description = "GeoServer timed out", body = ErrorResponse)
    )
)]
pub async fn get_legend(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LegendParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return legend_error_response(rejected("query", rejection.body_text())),
    };
    tracing::debug!(layer = ?params.layer, "Legend passthrough request");

    match LegendRequest::try_from(params) {
        Ok(request) => serve_legend(&state.client, request).await,
        Err(e) => legend_error_response(e),
    }
}

async fn fetch_legend(
    client: &GeoServerClient,
    request: &LegendRequest,
) -> geogate::Result<(String, Bytes)> {
    client
        .dispatch(request)
        .await?
        .ensure_status(|status| !status.is_server_error())?
        .normalize()?
        .into_image()
}

async fn serve_legend(client: &GeoServerClient, request: LegendRequest) -> Response {
    match fetch_legend(client, &request).await {
        Ok((content_type, bytes)) => {
            tracing::info!(
                layer = request.layer(),
                bytes = bytes.len(),
                "Legend fetched"
            );
            binary_response(content_type, bytes)
        }
        Err(e) => legend_error_response(e),
    }
}

/// Create an error response for legend requests.
fn legend_error_response(e: GatewayError) -> Response {
    let (status, message) = match &e {
        err if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
        GatewayError::ServiceException(message) => (StatusCode::NOT_FOUND, message.clone()),
        GatewayError::MalformedXml(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error parsing server response".to_string(),
        ),
        GatewayError::UnexpectedContentType(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected response format".to_string(),
        ),
        GatewayError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "Error fetching legend graphic: GeoServer did not respond in time".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching legend graphic".to_string(),
        ),
    };

    log_failure("legend", status, &e);
    error_response(status, message)
}

/// Look up one layer in its workspace's WMS capabilities document.
///
/// # Returns
///
/// - `200 OK` with the layer summary
/// - `404 Not Found` if the document has no such layer
/// - `500 Internal Server Error` if the document cannot be parsed or fetched
/// - `502 Bad Gateway` if the document lacks the expected structure
#[utoipa::path(
    get,
    path = "/capabilities/{workspace}/{layerName}",
    tag = "wms",
    params(CapabilitiesPath),
    responses(
        (status = 200, description = "Layer summary", body = LayerSummaryResponse),
        (status = 400, description = "Malformed path", body = ErrorResponse),
        (status = 404, description = "Layer not found in the capabilities document.", body = ErrorResponse),
        (status = 500, description = "Error parsing XML", body = ErrorResponse),
        (status = 502, description = "Unexpected capabilities document", body = ErrorResponse),
        (status = 504, description = "GeoServer timed out", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn get_capabilities(
    State(state): State<Arc<AppState>>,
    path: Result<Path<CapabilitiesPath>, PathRejection>,
) -> Response {
    let Path(path) = match path {
        Ok(path) => path,
        Err(rejection) => {
            return capabilities_error_response(rejected("path", rejection.body_text()))
        }
    };
    tracing::debug!(workspace = %path.workspace, layer = %path.layer_name, "Capabilities lookup");

    let request = CapabilitiesRequest::from(path);
    match fetch_layer(&state.client, &request).await {
        Ok(info) => {
            tracing::info!(layer = %request.qualified_layer(), "Layer found");
            (
                StatusCode::OK,
                Json(LayerSummaryResponse::new(request.qualified_layer(), info)),
            )
                .into_response()
        }
        Err(e) => capabilities_error_response(e),
    }
}

async fn fetch_layer(
    client: &GeoServerClient,
    request: &CapabilitiesRequest,
) -> geogate::Result<LayerInfo> {
    let response = client.dispatch(request).await?.ensure_success()?;
    find_layer(response.text()?, request.layer())
}

/// Create an error response for capabilities lookups.
fn capabilities_error_response(e: GatewayError) -> Response {
    let (status, message) = match &e {
        err if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
        GatewayError::LayerNotFound { .. } => (
            StatusCode::NOT_FOUND,
            "Layer not found in the capabilities document.".to_string(),
        ),
        GatewayError::MalformedXml(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error parsing XML".to_string(),
        ),
        GatewayError::UnexpectedDocument(_) => (StatusCode::BAD_GATEWAY, e.to_string()),
        GatewayError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "Error fetching capabilities: GeoServer did not respond in time".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching capabilities".to_string(),
        ),
    };

    log_failure("capabilities", status, &e);
    error_response(status, message)
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn binary_response(content_type: String, body: Bytes) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

fn log_failure(route: &str, status: StatusCode, e: &GatewayError) {
    if status.is_server_error() {
        tracing::error!(route, status = status.as_u16(), error = %e, "Request failed");
    } else {
        tracing::warn!(route, status = status.as_u16(), error = %e, "Request rejected");
    }
}
