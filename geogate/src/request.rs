//! The common shape of every outbound OGC request.

use reqwest::Method;

/// OGC service path segment under the GeoServer base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// `.../wms`
    Wms,
    /// `.../wfs`
    Wfs,
    /// `.../ows` (GeoServer's combined dispatcher)
    Ows,
}

impl Service {
    /// Path segment for this service.
    pub fn segment(self) -> &'static str {
        match self {
            Service::Wms => "wms",
            Service::Wfs => "wfs",
            Service::Ows => "ows",
        }
    }
}

/// Where a request is sent, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `{base}/{service}`
    Global(Service),
    /// `{base}/{workspace}/{service}` (GeoServer virtual service)
    Workspace(String, Service),
}

impl Endpoint {
    /// Path segments to append to the base URL, unescaped.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Endpoint::Global(service) => vec![service.segment()],
            Endpoint::Workspace(workspace, service) => vec![workspace.as_str(), service.segment()],
        }
    }
}

/// An outbound request to GeoServer.
///
/// Implementations describe *what* to ask for; the client turns this into
/// an escaped URL and performs the call.
pub trait OwsRequest {
    /// Target endpoint.
    fn endpoint(&self) -> Endpoint;

    /// HTTP method for the outbound call.
    fn method(&self) -> Method {
        Method::GET
    }

    /// Ordered query parameters, unescaped.
    fn query_pairs(&self) -> Vec<(String, String)>;
}

/// Qualify a layer name with its workspace, e.g. `topp:states`.
pub fn qualified_name(workspace: &str, layer: &str) -> String {
    format!("{workspace}:{layer}")
}

pub(crate) fn pair(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}
