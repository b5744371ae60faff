//! Inbound request shapes and their adapters onto the `geogate` models.
//!
//! Every operation is reachable in two call shapes: path segments (or a
//! small JSON body) naming a workspace and layer, and a flat set of OGC
//! query parameters. Both shapes convert into the same request model, so
//! the handlers only ever dispatch one type per operation.

use std::fmt::Display;

use geogate::wms::{
    parse_dimension, parse_flag, DEFAULT_LEGEND_SIZE, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH,
};
use geogate::{
    BoundingBox, CapabilitiesRequest, CqlFilter, FeatureQuery, GatewayError, LegendRequest,
    MapRequest, SpatialRef,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// JSON body of `POST /wmservice`.
///
/// An absent body is the default value, so every field is reported missing.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MapImageBody {
    /// GeoServer workspace.
    pub workspace: Option<String>,
    /// Layer name within the workspace.
    #[serde(rename = "layerName")]
    pub layer_name: Option<String>,
    /// `[minx, miny, maxx, maxy]` as numbers or numeric strings, or a
    /// `"minx,miny,maxx,maxy"` string.
    #[schema(value_type = Vec<f64>)]
    pub bbox: Option<Value>,
    /// Spatial reference, e.g. `EPSG:4326`.
    #[serde(rename = "SRS")]
    pub srs: Option<String>,
}

/// Flat WMS parameters of `GET /wmservice`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WmsParams {
    #[serde(rename = "SERVICE")]
    pub service: Option<String>,
    #[serde(rename = "VERSION")]
    pub version: Option<String>,
    #[serde(rename = "REQUEST")]
    pub request: Option<String>,
    #[serde(rename = "FORMAT")]
    pub format: Option<String>,
    #[serde(rename = "TRANSPARENT")]
    pub transparent: Option<String>,
    #[serde(rename = "QUERY_LAYERS")]
    pub query_layers: Option<String>,
    /// Workspace-qualified layer list.
    #[serde(rename = "LAYERS")]
    pub layers: Option<String>,
    #[serde(rename = "TILED")]
    pub tiled: Option<String>,
    #[serde(rename = "INFO_FORMAT")]
    pub info_format: Option<String>,
    #[serde(rename = "I")]
    pub i: Option<String>,
    #[serde(rename = "J")]
    pub j: Option<String>,
    #[serde(rename = "WIDTH")]
    pub width: Option<String>,
    #[serde(rename = "HEIGHT")]
    pub height: Option<String>,
    /// WMS 1.3.0 spatial reference.
    #[serde(rename = "CRS")]
    pub crs: Option<String>,
    /// WMS 1.1.x spatial reference.
    #[serde(rename = "SRS")]
    pub srs: Option<String>,
    #[serde(rename = "STYLES")]
    pub styles: Option<String>,
    /// `minx,miny,maxx,maxy`.
    #[serde(rename = "BBOX")]
    pub bbox: Option<String>,
}

/// Path segments of `GET /features/{workspace}/{layername}/{featureName}/{featureValue}`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct FeaturePath {
    pub workspace: String,
    pub layername: String,
    /// Attribute to filter on.
    #[serde(rename = "featureName")]
    pub feature_name: String,
    /// Value the attribute must equal.
    #[serde(rename = "featureValue")]
    pub feature_value: String,
}

/// Optional query parameters of the path-style feature route.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeatureOptions {
    /// Maximum number of features to return.
    #[serde(rename = "maxFeatures")]
    pub max_features: Option<String>,
}

impl FeatureOptions {
    /// Apply the options to a feature query.
    pub fn apply(self, query: FeatureQuery) -> Result<FeatureQuery, GatewayError> {
        Ok(match max_features(self.max_features)? {
            Some(max) => query.max_features(max),
            None => query,
        })
    }
}

/// Flat WFS parameters of `GET /features`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WfsParams {
    pub service: Option<String>,
    pub version: Option<String>,
    pub request: Option<String>,
    /// Workspace-qualified feature type.
    #[serde(rename = "typeName")]
    pub type_name: Option<String>,
    #[serde(rename = "outputFormat")]
    pub output_format: Option<String>,
    #[serde(rename = "maxFeatures")]
    pub max_features: Option<String>,
    /// CQL expression, forwarded as given.
    #[serde(rename = "CQL_FILTER")]
    pub cql_filter: Option<String>,
}

/// Path segments of `GET /graphic/{workspace}/{layername}`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct LegendPath {
    pub workspace: String,
    pub layername: String,
}

/// Flat legend parameters of `GET /graphic`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LegendParams {
    #[serde(rename = "REQUEST")]
    pub request: Option<String>,
    #[serde(rename = "VERSION")]
    pub version: Option<String>,
    #[serde(rename = "FORMAT")]
    pub format: Option<String>,
    #[serde(rename = "WIDTH")]
    pub width: Option<String>,
    #[serde(rename = "HEIGHT")]
    pub height: Option<String>,
    /// Workspace-qualified layer.
    #[serde(rename = "LAYER")]
    pub layer: Option<String>,
}

/// Path segments of `GET /capabilities/{workspace}/{layerName}`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct CapabilitiesPath {
    pub workspace: String,
    #[serde(rename = "layerName")]
    pub layer_name: String,
}

impl TryFrom<MapImageBody> for MapRequest {
    type Error = GatewayError;

    fn try_from(body: MapImageBody) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let workspace = required(body.workspace, "workspace", &mut missing);
        let layer = required(body.layer_name, "layerName", &mut missing);
        let bbox = body.bbox.filter(|v| !v.is_null());
        if bbox.is_none() {
            missing.push("bbox");
        }
        let srs = required(body.srs, "SRS", &mut missing);

        let (Some(workspace), Some(layer), Some(bbox), Some(srs)) = (workspace, layer, bbox, srs)
        else {
            return Err(GatewayError::MissingParameters(missing));
        };

        Ok(MapRequest::for_workspace_layer(
            &workspace,
            &layer,
            bbox_from_json(bbox)?,
            SpatialRef::srs(srs),
        ))
    }
}

impl TryFrom<WmsParams> for MapRequest {
    type Error = GatewayError;

    fn try_from(params: WmsParams) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let layers = required(params.layers, "LAYERS", &mut missing);
        let bbox = required(params.bbox, "BBOX", &mut missing);
        let spatial_ref = match (non_empty(params.crs), non_empty(params.srs)) {
            (Some(crs), _) => Some(SpatialRef::crs(crs)),
            (None, Some(srs)) => Some(SpatialRef::srs(srs)),
            (None, None) => {
                missing.push("CRS");
                None
            }
        };

        let (Some(layers), Some(bbox), Some(spatial_ref)) = (layers, bbox, spatial_ref) else {
            return Err(GatewayError::MissingParameters(missing));
        };

        let default_version = if spatial_ref.param_name() == "CRS" {
            "1.3.0"
        } else {
            "1.1.0"
        };
        let width = dimension_or(params.width, "WIDTH", DEFAULT_MAP_WIDTH)?;
        let height = dimension_or(params.height, "HEIGHT", DEFAULT_MAP_HEIGHT)?;

        let mut request = MapRequest::new(layers, bbox.parse::<BoundingBox>()?, spatial_ref)
            .size(width, height)?
            .version(non_empty(params.version).unwrap_or_else(|| default_version.to_string()))
            .styles(params.styles.unwrap_or_default());

        if let Some(service) = non_empty(params.service) {
            request = request.service(service);
        }
        if let Some(operation) = non_empty(params.request) {
            request = request.request(operation);
        }
        if let Some(format) = non_empty(params.format) {
            request = request.format(format);
        }
        if let Some(transparent) = non_empty(params.transparent) {
            request = request.transparent(parse_flag("TRANSPARENT", &transparent)?);
        }

        for (key, value) in [
            ("QUERY_LAYERS", params.query_layers),
            ("TILED", params.tiled),
            ("INFO_FORMAT", params.info_format),
            ("I", params.i),
            ("J", params.j),
        ] {
            if let Some(value) = non_empty(value) {
                request = request.param(key, value);
            }
        }

        Ok(request)
    }
}

impl TryFrom<FeaturePath> for FeatureQuery {
    type Error = GatewayError;

    fn try_from(path: FeaturePath) -> Result<Self, Self::Error> {
        let filter = CqlFilter::equals(&path.feature_name, &path.feature_value)?;
        Ok(FeatureQuery::for_workspace_layer(&path.workspace, &path.layername).filter(filter))
    }
}

impl TryFrom<WfsParams> for FeatureQuery {
    type Error = GatewayError;

    fn try_from(params: WfsParams) -> Result<Self, Self::Error> {
        let type_name = non_empty(params.type_name)
            .ok_or_else(|| GatewayError::MissingParameters(vec!["typeName"]))?;

        let mut query = FeatureQuery::new(type_name);
        if let Some(service) = non_empty(params.service) {
            query = query.service(service);
        }
        if let Some(version) = non_empty(params.version) {
            query = query.version(version);
        }
        if let Some(operation) = non_empty(params.request) {
            query = query.request(operation);
        }
        if let Some(format) = non_empty(params.output_format) {
            query = query.output_format(format);
        }
        if let Some(max) = max_features(params.max_features)? {
            query = query.max_features(max);
        }
        if let Some(expression) = non_empty(params.cql_filter) {
            query = query.filter(CqlFilter::raw(expression));
        }
        Ok(query)
    }
}

impl From<LegendPath> for LegendRequest {
    fn from(path: LegendPath) -> Self {
        LegendRequest::for_workspace_layer(&path.workspace, &path.layername)
    }
}

impl TryFrom<LegendParams> for LegendRequest {
    type Error = GatewayError;

    fn try_from(params: LegendParams) -> Result<Self, Self::Error> {
        let layer = non_empty(params.layer)
            .ok_or_else(|| GatewayError::MissingParameters(vec!["LAYER"]))?;

        if let Some(operation) = non_empty(params.request) {
            if !operation.eq_ignore_ascii_case("GetLegendGraphic") {
                return Err(GatewayError::InvalidParameter {
                    name: "REQUEST",
                    reason: format!("'{operation}' is not GetLegendGraphic"),
                });
            }
        }

        let width = dimension_or(params.width, "WIDTH", DEFAULT_LEGEND_SIZE)?;
        let height = dimension_or(params.height, "HEIGHT", DEFAULT_LEGEND_SIZE)?;
        let mut request = LegendRequest::new(layer).size(width, height)?;

        if let Some(version) = non_empty(params.version) {
            request = request.version(version);
        }
        if let Some(format) = non_empty(params.format) {
            request = request.format(format);
        }
        Ok(request)
    }
}

impl From<CapabilitiesPath> for CapabilitiesRequest {
    fn from(path: CapabilitiesPath) -> Self {
        CapabilitiesRequest::new(path.workspace, path.layer_name)
    }
}

/// Convert the JSON `bbox` member into a bounding box.
fn bbox_from_json(value: Value) -> Result<BoundingBox, GatewayError> {
    match value {
        Value::String(text) => text.parse(),
        Value::Array(items) => {
            let components = items
                .iter()
                .map(|item| match item {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                })
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| GatewayError::InvalidBoundingBox {
                    reason: "components must be numbers".to_string(),
                })?;
            BoundingBox::from_components(&components)
        }
        other => Err(GatewayError::InvalidBoundingBox {
            reason: format!("expected an array or string, got {other}"),
        }),
    }
}

/// Turn an extractor rejection into a 400 for the named input.
pub fn rejected(name: &'static str, rejection: impl Display) -> GatewayError {
    GatewayError::InvalidParameter {
        name,
        reason: rejection.to_string(),
    }
}

fn max_features(value: Option<String>) -> Result<Option<u32>, GatewayError> {
    non_empty(value)
        .map(|raw| parse_dimension("maxFeatures", &raw))
        .transpose()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let value = non_empty(value);
    if value.is_none() {
        missing.push(name);
    }
    value
}

fn dimension_or(
    value: Option<String>,
    name: &'static str,
    default: u32,
) -> Result<u32, GatewayError> {
    match non_empty(value) {
        Some(raw) => parse_dimension(name, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogate::OwsRequest;
    use serde_json::json;

    fn value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn body(value: serde_json::Value) -> MapImageBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_body_adapter() {
        let request = MapRequest::try_from(body(json!({
            "workspace": "ws",
            "layerName": "Parcels",
            "bbox": [-84.81, "39.21", -83.15, 40.81],
            "SRS": "EPSG:4326"
        })))
        .unwrap();

        let pairs = request.query_pairs();
        assert_eq!(value(&pairs, "LAYERS"), Some("ws:Parcels"));
        assert_eq!(value(&pairs, "BBOX"), Some("-84.81,39.21,-83.15,40.81"));
        assert_eq!(value(&pairs, "SRS"), Some("EPSG:4326"));
    }

    #[test]
    fn test_body_lists_every_missing_field() {
        let err = MapRequest::try_from(body(json!({ "layerName": "Parcels", "SRS": "" })))
            .unwrap_err();
        match err {
            GatewayError::MissingParameters(names) => {
                assert_eq!(names, vec!["workspace", "bbox", "SRS"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_body_bbox_shapes() {
        let with_bbox = |bbox: serde_json::Value| {
            MapRequest::try_from(body(json!({
                "workspace": "ws",
                "layerName": "Parcels",
                "bbox": bbox,
                "SRS": "EPSG:4326"
            })))
        };

        assert!(with_bbox(json!("1,2,3,4")).is_ok());
        assert!(matches!(
            with_bbox(json!([1, 2, 3])),
            Err(GatewayError::InvalidBoundingBox { .. })
        ));
        assert!(matches!(
            with_bbox(json!([1, 2, 3, true])),
            Err(GatewayError::InvalidBoundingBox { .. })
        ));
        assert!(matches!(
            with_bbox(json!({ "minx": 1 })),
            Err(GatewayError::InvalidBoundingBox { .. })
        ));
        assert!(matches!(
            with_bbox(json!(null)),
            Err(GatewayError::MissingParameters(_))
        ));
    }

    #[test]
    fn test_query_adapter_passthrough() {
        let params = WmsParams {
            request: Some("GetFeatureInfo".to_string()),
            layers: Some("ws:roads".to_string()),
            query_layers: Some("ws:roads".to_string()),
            info_format: Some("application/json".to_string()),
            i: Some("5".to_string()),
            j: Some("7".to_string()),
            crs: Some("EPSG:3857".to_string()),
            bbox: Some("0,0,100,100".to_string()),
            width: Some("256".to_string()),
            height: Some("256".to_string()),
            transparent: Some("TRUE".to_string()),
            ..Default::default()
        };
        let request = MapRequest::try_from(params).unwrap();
        let pairs = request.query_pairs();

        assert_eq!(value(&pairs, "VERSION"), Some("1.3.0"));
        assert_eq!(value(&pairs, "REQUEST"), Some("GetFeatureInfo"));
        assert_eq!(value(&pairs, "CRS"), Some("EPSG:3857"));
        assert_eq!(value(&pairs, "TRANSPARENT"), Some("true"));
        assert_eq!(value(&pairs, "WIDTH"), Some("256"));
        assert_eq!(value(&pairs, "QUERY_LAYERS"), Some("ws:roads"));
        assert_eq!(value(&pairs, "I"), Some("5"));
        assert_eq!(value(&pairs, "TILED"), None);
    }

    #[test]
    fn test_query_adapter_validation() {
        let err = MapRequest::try_from(WmsParams::default()).unwrap_err();
        match err {
            GatewayError::MissingParameters(names) => {
                assert_eq!(names, vec!["LAYERS", "BBOX", "CRS"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let params = WmsParams {
            layers: Some("ws:roads".to_string()),
            srs: Some("EPSG:4326".to_string()),
            bbox: Some("0,0,1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            MapRequest::try_from(params),
            Err(GatewayError::InvalidBoundingBox { .. })
        ));

        let params = WmsParams {
            layers: Some("ws:roads".to_string()),
            srs: Some("EPSG:4326".to_string()),
            bbox: Some("0,0,1,1".to_string()),
            width: Some("wide".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            MapRequest::try_from(params),
            Err(GatewayError::InvalidParameter { name: "WIDTH", .. })
        ));
    }

    #[test]
    fn test_feature_path_adapter() {
        let query = FeatureQuery::try_from(FeaturePath {
            workspace: "ws".to_string(),
            layername: "layer".to_string(),
            feature_name: "owner".to_string(),
            feature_value: "SMITH".to_string(),
        })
        .unwrap();
        assert_eq!(query.type_name(), "ws:layer");
        assert_eq!(
            query.cql_filter().map(CqlFilter::as_str),
            Some("owner='SMITH'")
        );
    }

    #[test]
    fn test_wfs_params_adapter() {
        let query = FeatureQuery::try_from(WfsParams {
            type_name: Some("topp:states".to_string()),
            cql_filter: Some("STATE_NAME='Ohio'".to_string()),
            max_features: Some("10".to_string()),
            ..Default::default()
        })
        .unwrap();
        let pairs = query.query_pairs();
        assert_eq!(value(&pairs, "typeName"), Some("topp:states"));
        assert_eq!(value(&pairs, "CQL_FILTER"), Some("STATE_NAME='Ohio'"));
        assert_eq!(value(&pairs, "maxFeatures"), Some("10"));

        assert!(matches!(
            FeatureQuery::try_from(WfsParams::default()),
            Err(GatewayError::MissingParameters(_))
        ));
        assert!(matches!(
            FeatureQuery::try_from(WfsParams {
                type_name: Some("topp:states".to_string()),
                max_features: Some("ten".to_string()),
                ..Default::default()
            }),
            Err(GatewayError::InvalidParameter {
                name: "maxFeatures",
                ..
            })
        ));
    }

    #[test]
    fn test_feature_options() {
        let query = FeatureQuery::for_workspace_layer("ws", "layer");
        let options = FeatureOptions {
            max_features: Some("25".to_string()),
        };
        let pairs = options.apply(query.clone()).unwrap().query_pairs();
        assert_eq!(value(&pairs, "maxFeatures"), Some("25"));

        let pairs = FeatureOptions::default().apply(query.clone()).unwrap().query_pairs();
        assert_eq!(value(&pairs, "maxFeatures"), None);

        let err = FeatureOptions {
            max_features: Some("ten".to_string()),
        }
        .apply(query)
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameter maxFeatures: 'ten' is not a positive integer"
        );
    }

    #[test]
    fn test_empty_body_lists_all_fields() {
        match MapRequest::try_from(MapImageBody::default()).unwrap_err() {
            GatewayError::MissingParameters(names) => {
                assert_eq!(names, vec!["workspace", "layerName", "bbox", "SRS"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejected_is_client_error() {
        let err = rejected("body", "invalid type: integer `5`, expected a string");
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Invalid parameter body: invalid type: integer `5`, expected a string"
        );
    }

    #[test]
    fn test_legend_params_adapter() {
        let request = LegendRequest::try_from(LegendParams {
            layer: Some("ws:roads".to_string()),
            width: Some("40".to_string()),
            format: Some("image/jpeg".to_string()),
            ..Default::default()
        })
        .unwrap();
        let pairs = request.query_pairs();
        assert_eq!(value(&pairs, "WIDTH"), Some("40"));
        assert_eq!(value(&pairs, "HEIGHT"), Some("20"));
        assert_eq!(value(&pairs, "FORMAT"), Some("image/jpeg"));

        assert!(LegendRequest::try_from(LegendParams::default()).is_err());
        assert!(LegendRequest::try_from(LegendParams {
            layer: Some("ws:roads".to_string()),
            request: Some("GetMap".to_string()),
            ..Default::default()
        })
        .is_err());
    }
}
