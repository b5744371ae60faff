//! OGC service exception reports.
//!
//! GeoServer answers a failed WMS operation with a document such as:
//!
//! ```xml
//! <ServiceExceptionReport version="1.1.1">
//!   <ServiceException code="LayerNotDefined" locator="layer">
//!     Could not find layer ws:roads
//!   </ServiceException>
//! </ServiceExceptionReport>
//! ```

use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// MIME type GeoServer declares for WMS 1.1.x exception reports.
pub const SERVICE_EXCEPTION_MIME: &str = "application/vnd.ogc.se_xml";

/// Message used when a report carries no readable exception text.
pub const FALLBACK_MESSAGE: &str = "Layer not found";

#[derive(Debug, Deserialize)]
struct ServiceExceptionReport {
    #[serde(rename = "ServiceException", default)]
    exceptions: Vec<ServiceExceptionEntry>,
}

#[derive(Debug, Deserialize)]
struct ServiceExceptionEntry {
    #[serde(rename = "@code")]
    code: Option<String>,
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

/// The first exception of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceException {
    /// OGC exception code, e.g. `LayerNotDefined`.
    pub code: Option<String>,
    /// Trimmed message text, if non-empty.
    pub message: Option<String>,
}

impl ServiceException {
    /// The message, or [`FALLBACK_MESSAGE`] when there is none.
    pub fn message_or_fallback(&self) -> &str {
        self.message.as_deref().unwrap_or(FALLBACK_MESSAGE)
    }
}

/// Parse a service exception report and return its first exception.
///
/// Returns `Ok(None)` for a well-formed document without any
/// `ServiceException` element.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedXml`] if the document is not well-formed.
pub fn parse_service_exception(xml: &str) -> Result<Option<ServiceException>> {
    let report: ServiceExceptionReport =
        quick_xml::de::from_str(xml).map_err(|e| GatewayError::MalformedXml(e.to_string()))?;

    Ok(report.exceptions.into_iter().next().map(|entry| {
        let message = entry
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        ServiceException {
            code: entry.code,
            message,
        }
    }))
}
