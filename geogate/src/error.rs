//! Error types for the geogate library.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while translating, dispatching, or normalizing
/// a GeoServer request.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// One or more required inbound parameters were absent.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),

    /// Bounding box did not decompose into four ordered numbers.
    #[error("Invalid BBOX format. It should be in the format: minx,miny,maxx,maxy ({reason})")]
    InvalidBoundingBox { reason: String },

    /// A parameter was present but could not be used.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The upstream server answered with a non-success status.
    #[error("Upstream returned HTTP {status}: {reason}")]
    UpstreamStatus { status: u16, reason: String },

    /// The upstream server did not answer within the configured bound.
    #[error("Upstream did not respond within {timeout:?}")]
    Timeout { timeout: Duration },

    /// The request was sent but no response was received.
    #[error("No response received from server: {0}")]
    NoResponse(String),

    /// The outbound request could not be constructed.
    #[error("Request setup error: {0}")]
    RequestSetup(String),

    /// An upstream XML payload was not well-formed.
    #[error("Error parsing XML: {0}")]
    MalformedXml(String),

    /// An upstream XML payload was well-formed but not shaped as expected.
    #[error("Unexpected capabilities document: {0}")]
    UnexpectedDocument(String),

    /// The upstream declared a content type the caller cannot relay.
    #[error("Unexpected response format: {0}")]
    UnexpectedContentType(String),

    /// The upstream answered with an OGC service exception report.
    #[error("{0}")]
    ServiceException(String),

    /// The requested layer is absent from the capabilities document.
    #[error("Layer {layer} not found in the capabilities document")]
    LayerNotFound { layer: String },

    /// The upstream body was expected to be JSON but was not.
    #[error("Upstream body is not valid JSON: {0}")]
    InvalidJson(String),

    /// Client configuration is missing or unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether this error was caused by the inbound request rather than
    /// by the upstream server or the gateway itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GatewayError::MissingParameters(_)
                | GatewayError::InvalidBoundingBox { .. }
                | GatewayError::InvalidParameter { .. }
        )
    }
}

/// Result type alias using [`GatewayError`].
pub type Result<T> = std::result::Result<T, GatewayError>;
