//! WMS requests: `GetMap`, `GetLegendGraphic`, and `GetCapabilities`.

use reqwest::Method;

use crate::bbox::BoundingBox;
use crate::error::{GatewayError, Result};
use crate::request::{pair, qualified_name, Endpoint, OwsRequest, Service};

/// Default `GetMap` image width in pixels.
pub const DEFAULT_MAP_WIDTH: u32 = 768;
/// Default `GetMap` image height in pixels.
pub const DEFAULT_MAP_HEIGHT: u32 = 666;
/// Default legend graphic edge length in pixels.
pub const DEFAULT_LEGEND_SIZE: u32 = 20;
/// Default output format for images.
pub const DEFAULT_IMAGE_FORMAT: &str = "image/png";
/// WMS version used for `GetMap` when the caller does not choose one.
pub const DEFAULT_MAP_VERSION: &str = "1.1.0";
/// WMS version used for `GetLegendGraphic` when the caller does not choose one.
pub const DEFAULT_LEGEND_VERSION: &str = "1.0.0";
/// WMS version used for `GetCapabilities`.
pub const CAPABILITIES_VERSION: &str = "1.1.0";

/// Parameter name carrying the spatial reference.
///
/// WMS 1.1.x calls it `SRS`, WMS 1.3.0 calls it `CRS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrsKey {
    Srs,
    Crs,
}

/// A spatial reference identifier such as `EPSG:3857`.
///
/// The code is forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialRef {
    key: SrsKey,
    code: String,
}

impl SpatialRef {
    /// A WMS 1.1.x `SRS` value.
    pub fn srs(code: impl Into<String>) -> Self {
        Self {
            key: SrsKey::Srs,
            code: code.into(),
        }
    }

    /// A WMS 1.3.0 `CRS` value.
    pub fn crs(code: impl Into<String>) -> Self {
        Self {
            key: SrsKey::Crs,
            code: code.into(),
        }
    }

    /// The identifier, e.g. `EPSG:4326`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The query parameter name this value is sent under.
    pub fn param_name(&self) -> &'static str {
        match self.key {
            SrsKey::Srs => "SRS",
            SrsKey::Crs => "CRS",
        }
    }
}

/// A map image request.
#[derive(Debug, Clone)]
pub struct MapRequest {
    workspace: Option<String>,
    layers: String,
    bbox: BoundingBox,
    spatial_ref: SpatialRef,
    width: u32,
    height: u32,
    styles: String,
    format: String,
    transparent: Option<bool>,
    service: String,
    version: String,
    request: String,
    extra: Vec<(String, String)>,
    method: Method,
}

impl MapRequest {
    /// A `GetMap` request against the global `{base}/wms` endpoint.
    ///
    /// `layers` is sent as-is, so it should already be workspace-qualified.
    pub fn new(layers: impl Into<String>, bbox: BoundingBox, spatial_ref: SpatialRef) -> Self {
        Self {
            workspace: None,
            layers: layers.into(),
            bbox,
            spatial_ref,
            width: DEFAULT_MAP_WIDTH,
            height: DEFAULT_MAP_HEIGHT,
            styles: String::new(),
            format: DEFAULT_IMAGE_FORMAT.to_string(),
            transparent: None,
            service: "WMS".to_string(),
            version: DEFAULT_MAP_VERSION.to_string(),
            request: "GetMap".to_string(),
            extra: Vec::new(),
            method: Method::GET,
        }
    }

    /// A transparent PNG of one layer from a workspace virtual service,
    /// sent as a POST to `{base}/{workspace}/wms`.
    pub fn for_workspace_layer(
        workspace: &str,
        layer: &str,
        bbox: BoundingBox,
        spatial_ref: SpatialRef,
    ) -> Self {
        Self::new(qualified_name(workspace, layer), bbox, spatial_ref)
            .workspace(workspace)
            .transparent(true)
            .http_method(Method::POST)
    }

    /// Route the request through a workspace virtual service.
    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Set the image size.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidParameter`] if either dimension is zero.
    pub fn size(mut self, width: u32, height: u32) -> Result<Self> {
        self.width = nonzero("WIDTH", width)?;
        self.height = nonzero("HEIGHT", height)?;
        Ok(self)
    }

    /// Set the comma-separated style list.
    pub fn styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = styles.into();
        self
    }

    /// Set the output MIME type.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Request a transparent background.
    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = Some(transparent);
        self
    }

    /// Override the `SERVICE` parameter.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Override the WMS version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Override the WMS operation, e.g. `GetFeatureInfo`.
    pub fn request(mut self, request: impl Into<String>) -> Self {
        self.request = request.into();
        self
    }

    /// Append an extra parameter after the standard ones.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Set the outbound HTTP method.
    pub fn http_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Layer list as sent upstream.
    pub fn layers(&self) -> &str {
        &self.layers
    }

    /// Requested extent.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Requested output MIME type.
    pub fn output_format(&self) -> &str {
        &self.format
    }
}

impl OwsRequest for MapRequest {
    fn endpoint(&self) -> Endpoint {
        match &self.workspace {
            Some(workspace) => Endpoint::Workspace(workspace.clone(), Service::Wms),
            None => Endpoint::Global(Service::Wms),
        }
    }

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            pair("SERVICE", self.service.as_str()),
            pair("VERSION", self.version.as_str()),
            pair("REQUEST", self.request.as_str()),
            pair("LAYERS", self.layers.as_str()),
            pair("STYLES", self.styles.as_str()),
            pair("FORMAT", self.format.as_str()),
        ];
        if let Some(transparent) = self.transparent {
            pairs.push(pair("TRANSPARENT", transparent.to_string()));
        }
        pairs.push(pair(self.spatial_ref.param_name(), self.spatial_ref.code()));
        pairs.push(pair("BBOX", self.bbox.to_string()));
        pairs.push(pair("WIDTH", self.width.to_string()));
        pairs.push(pair("HEIGHT", self.height.to_string()));
        pairs.extend(self.extra.iter().cloned());
        pairs
    }
}

/// A legend graphic request against `{base}/wms`.
#[derive(Debug, Clone)]
pub struct LegendRequest {
    layer: String,
    width: u32,
    height: u32,
    format: String,
    version: String,
}

impl LegendRequest {
    /// A 20x20 PNG legend for an already-qualified layer name.
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            width: DEFAULT_LEGEND_SIZE,
            height: DEFAULT_LEGEND_SIZE,
            format: DEFAULT_IMAGE_FORMAT.to_string(),
            version: DEFAULT_LEGEND_VERSION.to_string(),
        }
    }

    /// A 20x20 PNG legend for `workspace:layer`.
    pub fn for_workspace_layer(workspace: &str, layer: &str) -> Self {
        Self::new(qualified_name(workspace, layer))
    }

    /// Set the legend size.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidParameter`] if either dimension is zero.
    pub fn size(mut self, width: u32, height: u32) -> Result<Self> {
        self.width = nonzero("WIDTH", width)?;
        self.height = nonzero("HEIGHT", height)?;
        Ok(self)
    }

    /// Set the output MIME type.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Override the WMS version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Qualified layer name.
    pub fn layer(&self) -> &str {
        &self.layer
    }
}

impl OwsRequest for LegendRequest {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Global(Service::Wms)
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            pair("SERVICE", "WMS"),
            pair("REQUEST", "GetLegendGraphic"),
            pair("VERSION", self.version.as_str()),
            pair("FORMAT", self.format.as_str()),
            pair("WIDTH", self.width.to_string()),
            pair("HEIGHT", self.height.to_string()),
            pair("LAYER", self.layer.as_str()),
        ]
    }
}

/// A capabilities document request for one workspace.
#[derive(Debug, Clone)]
pub struct CapabilitiesRequest {
    workspace: String,
    layer: String,
}

impl CapabilitiesRequest {
    /// Look up `layer` in the capabilities of `workspace`.
    pub fn new(workspace: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            layer: layer.into(),
        }
    }

    /// Unqualified layer name, as listed in the workspace's capabilities.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// `workspace:layer`.
    pub fn qualified_layer(&self) -> String {
        qualified_name(&self.workspace, &self.layer)
    }
}

impl OwsRequest for CapabilitiesRequest {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Workspace(self.workspace.clone(), Service::Wms)
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            pair("service", "WMS"),
            pair("version", CAPABILITIES_VERSION),
            pair("request", "GetCapabilities"),
        ]
    }
}

/// Parse a pixel dimension, rejecting zero and non-integers.
pub fn parse_dimension(name: &'static str, raw: &str) -> Result<u32> {
    let value = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| GatewayError::InvalidParameter {
            name,
            reason: format!("'{raw}' is not a positive integer"),
        })?;
    nonzero(name, value)
}

/// Parse a WMS boolean flag (`true`/`false`, any case).
pub fn parse_flag(name: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(GatewayError::InvalidParameter {
            name,
            reason: format!("'{raw}' is not true or false"),
        }),
    }
}

fn nonzero(name: &'static str, value: u32) -> Result<u32> {
    if value == 0 {
        return Err(GatewayError::InvalidParameter {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(-84.8, 39.2, -83.1, 40.8).unwrap()
    }

    fn value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_workspace_layer_map_defaults() {
        let request =
            MapRequest::for_workspace_layer("ws", "Parcels", bbox(), SpatialRef::srs("EPSG:4326"));

        assert_eq!(
            request.endpoint(),
            Endpoint::Workspace("ws".to_string(), Service::Wms)
        );
        assert_eq!(request.method(), Method::POST);

        let pairs = request.query_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "SERVICE",
                "VERSION",
                "REQUEST",
                "LAYERS",
                "STYLES",
                "FORMAT",
                "TRANSPARENT",
                "SRS",
                "BBOX",
                "WIDTH",
                "HEIGHT"
            ]
        );
        assert_eq!(value(&pairs, "LAYERS"), Some("ws:Parcels"));
        assert_eq!(value(&pairs, "VERSION"), Some("1.1.0"));
        assert_eq!(value(&pairs, "STYLES"), Some(""));
        assert_eq!(value(&pairs, "TRANSPARENT"), Some("true"));
        assert_eq!(value(&pairs, "SRS"), Some("EPSG:4326"));
        assert_eq!(value(&pairs, "BBOX"), Some("-84.8,39.2,-83.1,40.8"));
        assert_eq!(value(&pairs, "WIDTH"), Some("768"));
        assert_eq!(value(&pairs, "HEIGHT"), Some("666"));
    }

    #[test]
    fn test_generic_map_request() {
        let request = MapRequest::new("ws:roads", bbox(), SpatialRef::crs("EPSG:3857"))
            .version("1.3.0")
            .request("GetFeatureInfo")
            .size(256, 256)
            .unwrap()
            .param("QUERY_LAYERS", "ws:roads")
            .param("I", "10");

        assert_eq!(request.endpoint(), Endpoint::Global(Service::Wms));
        assert_eq!(request.method(), Method::GET);

        let pairs = request.query_pairs();
        assert_eq!(value(&pairs, "CRS"), Some("EPSG:3857"));
        assert_eq!(value(&pairs, "SRS"), None);
        assert_eq!(value(&pairs, "TRANSPARENT"), None);
        assert_eq!(value(&pairs, "REQUEST"), Some("GetFeatureInfo"));
        assert_eq!(value(&pairs, "WIDTH"), Some("256"));
        assert_eq!(pairs.last().map(|(k, _)| k.as_str()), Some("I"));
    }

    #[test]
    fn test_zero_size_rejected() {
        let result = MapRequest::new("a:b", bbox(), SpatialRef::srs("EPSG:4326")).size(0, 10);
        assert!(matches!(
            result,
            Err(GatewayError::InvalidParameter { name: "WIDTH", .. })
        ));
        assert!(LegendRequest::new("a:b").size(10, 0).is_err());
    }

    #[test]
    fn test_legend_defaults() {
        let request = LegendRequest::for_workspace_layer("ws", "roads");
        assert_eq!(request.endpoint(), Endpoint::Global(Service::Wms));
        let pairs = request.query_pairs();
        assert_eq!(value(&pairs, "REQUEST"), Some("GetLegendGraphic"));
        assert_eq!(value(&pairs, "VERSION"), Some("1.0.0"));
        assert_eq!(value(&pairs, "FORMAT"), Some("image/png"));
        assert_eq!(value(&pairs, "WIDTH"), Some("20"));
        assert_eq!(value(&pairs, "HEIGHT"), Some("20"));
        assert_eq!(value(&pairs, "LAYER"), Some("ws:roads"));
    }

    #[test]
    fn test_capabilities_request() {
        let request = CapabilitiesRequest::new("myworkspace", "Parcels");
        assert_eq!(
            request.endpoint(),
            Endpoint::Workspace("myworkspace".to_string(), Service::Wms)
        );
        assert_eq!(request.qualified_layer(), "myworkspace:Parcels");
        let pairs = request.query_pairs();
        assert_eq!(value(&pairs, "version"), Some("1.1.0"));
        assert_eq!(value(&pairs, "request"), Some("GetCapabilities"));
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("WIDTH", " 512 ").unwrap(), 512);
        assert!(parse_dimension("WIDTH", "0").is_err());
        assert!(parse_dimension("WIDTH", "-5").is_err());
        assert!(parse_dimension("HEIGHT", "big").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRANSPARENT", "TRUE").unwrap());
        assert!(!parse_flag("TRANSPARENT", "false").unwrap());
        assert!(parse_flag("TRANSPARENT", "yes").is_err());
    }
}
