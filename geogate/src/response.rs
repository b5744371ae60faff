//! Upstream responses and their normalization.

use bytes::Bytes;
use reqwest::StatusCode;

use crate::error::{GatewayError, Result};
use crate::exception::{parse_service_exception, FALLBACK_MESSAGE, SERVICE_EXCEPTION_MIME};

/// A fully-read response from GeoServer.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status returned upstream.
    pub status: StatusCode,
    /// Reason phrase sent with the status line, when it differs from the
    /// canonical one.
    pub reason: Option<String>,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Raw body.
    pub body: Bytes,
}

/// A successfully classified upstream payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An image, relayed byte-for-byte.
    Image { content_type: String, bytes: Bytes },
    /// Anything that is neither an image nor a service exception.
    Other {
        content_type: Option<String>,
        bytes: Bytes,
    },
}

impl Payload {
    /// The image's content type and bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnexpectedContentType`] for non-image payloads.
    pub fn into_image(self) -> Result<(String, Bytes)> {
        match self {
            Payload::Image {
                content_type,
                bytes,
            } => Ok((content_type, bytes)),
            Payload::Other { content_type, .. } => Err(GatewayError::UnexpectedContentType(
                content_type.unwrap_or_else(|| "none".to_string()),
            )),
        }
    }
}

impl UpstreamResponse {
    /// Whether the upstream status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Pass through 2xx responses, turn anything else into
    /// [`GatewayError::UpstreamStatus`] carrying the status text.
    ///
    /// The status text is the upstream's own reason phrase when it sent a
    /// non-canonical one.
    pub fn ensure_success(self) -> Result<Self> {
        self.ensure_status(|status| status.is_success())
    }

    /// Pass the response through when `accept` holds for its status,
    /// otherwise fail as [`ensure_success`](Self::ensure_success) does.
    pub fn ensure_status(self, accept: impl FnOnce(StatusCode) -> bool) -> Result<Self> {
        if accept(self.status) {
            return Ok(self);
        }
        let reason = match self.reason {
            Some(reason) => reason,
            None => self
                .status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
        };
        Err(GatewayError::UpstreamStatus {
            status: self.status.as_u16(),
            reason,
        })
    }

    /// Whether the declared content type contains `needle` (case-insensitive).
    pub fn content_type_contains(&self, needle: &str) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(needle))
    }

    /// Classify the payload by its declared content type.
    ///
    /// Service exception reports become [`GatewayError::ServiceException`]
    /// carrying the first exception's text; image types become
    /// [`Payload::Image`]; everything else becomes [`Payload::Other`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedXml`] for an exception report that
    /// is not well-formed, and [`GatewayError::ServiceException`] for one
    /// that is.
    pub fn normalize(self) -> Result<Payload> {
        if self.content_type_contains(SERVICE_EXCEPTION_MIME) {
            let xml = std::str::from_utf8(&self.body)
                .map_err(|e| GatewayError::MalformedXml(e.to_string()))?;
            let message = parse_service_exception(xml)?
                .and_then(|exception| exception.message)
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            return Err(GatewayError::ServiceException(message));
        }

        match self.content_type {
            Some(content_type) if content_type.to_ascii_lowercase().starts_with("image/") => {
                Ok(Payload::Image {
                    content_type,
                    bytes: self.body,
                })
            }
            content_type => Ok(Payload::Other {
                content_type,
                bytes: self.body,
            }),
        }
    }

    /// Check the body is JSON and return it untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidJson`] if the body does not parse.
    pub fn into_json(self) -> Result<Bytes> {
        serde_json::from_slice::<serde::de::IgnoredAny>(&self.body)
            .map_err(|e| GatewayError::InvalidJson(e.to_string()))?;
        Ok(self.body)
    }

    /// The body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedXml`] if the body is not UTF-8;
    /// text bodies handled here are always XML documents.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body).map_err(|e| GatewayError::MalformedXml(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: Option<&str>, body: &'static [u8]) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::from_u16(status).unwrap(),
            reason: None,
            content_type: content_type.map(str::to_string),
            body: Bytes::from_static(body),
        }
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    #[test]
    fn test_ensure_success() {
        assert!(response(200, None, b"").ensure_success().is_ok());

        let err = response(503, None, b"").ensure_success().unwrap_err();
        match err {
            GatewayError::UpstreamStatus { status, reason } => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_upstream_reason_phrase_is_relayed() {
        let mut upstream = response(503, None, b"");
        upstream.reason = Some("Layer Offline".to_string());

        match upstream.ensure_success().unwrap_err() {
            GatewayError::UpstreamStatus { status, reason } => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Layer Offline");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ensure_status_below_server_error() {
        let below_500 = |status: StatusCode| !status.is_server_error();
        assert!(response(404, None, b"").ensure_status(below_500).is_ok());
        assert!(matches!(
            response(500, None, b"").ensure_status(below_500),
            Err(GatewayError::UpstreamStatus { status: 500, .. })
        ));
    }

    #[test]
    fn test_image_passthrough() {
        let payload = response(200, Some("image/png"), PNG).normalize().unwrap();
        let (content_type, bytes) = payload.into_image().unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(&bytes[..], PNG);
    }

    #[test]
    fn test_service_exception_extracted() {
        let body = br#"<ServiceExceptionReport><ServiceException code="LayerNotDefined">Could not find layer ws:nope</ServiceException></ServiceExceptionReport>"#;
        let err = response(200, Some("application/vnd.ogc.se_xml;charset=UTF-8"), body)
            .normalize()
            .unwrap_err();
        match err {
            GatewayError::ServiceException(message) => {
                assert_eq!(message, "Could not find layer ws:nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_service_exception_without_text() {
        let body = br#"<ServiceExceptionReport version="1.1.1"/>"#;
        let err = response(200, Some("application/vnd.ogc.se_xml"), body)
            .normalize()
            .unwrap_err();
        assert_eq!(err.to_string(), "Layer not found");
    }

    #[test]
    fn test_malformed_service_exception() {
        let body = b"<ServiceExceptionReport><ServiceException>oops</Wrong>";
        let err = response(200, Some("application/vnd.ogc.se_xml"), body)
            .normalize()
            .unwrap_err();
        assert!(matches!(err, GatewayError::MalformedXml(_)));
    }

    #[test]
    fn test_other_payload_is_not_an_image() {
        let payload = response(200, Some("text/html"), b"<html/>").normalize().unwrap();
        assert!(matches!(payload, Payload::Other { .. }));
        let err = payload.into_image().unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedContentType(ref ct) if ct == "text/html"));

        let payload = response(200, None, b"?").normalize().unwrap();
        assert_eq!(
            payload,
            Payload::Other {
                content_type: None,
                bytes: Bytes::from_static(b"?")
            }
        );
    }

    #[test]
    fn test_into_json() {
        let body = br#"{"type":"FeatureCollection","features":[]}"#;
        let bytes = response(200, Some("application/json"), body)
            .into_json()
            .unwrap();
        assert_eq!(&bytes[..], &body[..]);

        let err = response(200, Some("text/xml"), b"<xml/>").into_json().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidJson(_)));
    }
}
