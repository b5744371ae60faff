//! Layer lookup in a WMS capabilities document.
//!
//! The document is modelled down to the level the lookup needs:
//!
//! ```text
//! WMT_MS_Capabilities
//! └── Capability
//!     └── Layer            (container)
//!         ├── Layer        (Name, Title, Abstract?, BoundingBox*)
//!         └── Layer ...
//! ```
//!
//! Only the flat list directly below the container is searched.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{GatewayError, Result};

#[derive(Debug, Deserialize)]
struct CapabilitiesDocument {
    #[serde(rename = "Capability")]
    capability: Option<CapabilitySection>,
}

#[derive(Debug, Deserialize)]
struct CapabilitySection {
    #[serde(rename = "Layer")]
    layer: Option<LayerContainer>,
}

#[derive(Debug, Deserialize)]
struct LayerContainer {
    #[serde(rename = "Layer", default)]
    layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
struct LayerEntry {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "BoundingBox", default)]
    bounding_boxes: Vec<BoundingBoxElement>,
}

#[derive(Debug, Deserialize)]
struct BoundingBoxElement {
    #[serde(rename = "@SRS")]
    srs: Option<String>,
    #[serde(rename = "@CRS")]
    crs: Option<String>,
    #[serde(rename = "@minx")]
    minx: Option<String>,
    #[serde(rename = "@miny")]
    miny: Option<String>,
    #[serde(rename = "@maxx")]
    maxx: Option<String>,
    #[serde(rename = "@maxy")]
    maxy: Option<String>,
    #[serde(rename = "@resx")]
    resx: Option<String>,
    #[serde(rename = "@resy")]
    resy: Option<String>,
}

impl BoundingBoxElement {
    fn into_attributes(self) -> BTreeMap<String, String> {
        [
            ("SRS", self.srs),
            ("CRS", self.crs),
            ("minx", self.minx),
            ("miny", self.miny),
            ("maxx", self.maxx),
            ("maxy", self.maxy),
            ("resx", self.resx),
            ("resy", self.resy),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }
}

/// Metadata for one layer, as listed in the capabilities document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    /// Layer name as listed (unqualified inside a workspace service).
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Abstract text, if present and non-empty.
    pub abstract_text: Option<String>,
    /// Attributes of the first `BoundingBox` element, if any.
    pub bounding_box: Option<BTreeMap<String, String>>,
}

/// Find the sublayer whose `Name` equals `layer_name` exactly.
///
/// # Errors
///
/// - [`GatewayError::MalformedXml`] if the document is not well-formed XML.
/// - [`GatewayError::UnexpectedDocument`] if `Capability` or its container
///   `Layer` is missing.
/// - [`GatewayError::LayerNotFound`] if no sublayer has that name.
pub fn find_layer(xml: &str, layer_name: &str) -> Result<LayerInfo> {
    let document: CapabilitiesDocument =
        quick_xml::de::from_str(xml).map_err(|e| GatewayError::MalformedXml(e.to_string()))?;

    let container = document
        .capability
        .ok_or_else(|| GatewayError::UnexpectedDocument("missing <Capability> element".into()))?
        .layer
        .ok_or_else(|| {
            GatewayError::UnexpectedDocument("missing <Layer> element under <Capability>".into())
        })?;

    let entry = container
        .layers
        .into_iter()
        .find(|entry| entry.name.as_deref() == Some(layer_name))
        .ok_or_else(|| GatewayError::LayerNotFound {
            layer: layer_name.to_string(),
        })?;

    Ok(LayerInfo {
        name: layer_name.to_string(),
        title: entry.title,
        abstract_text: entry
            .abstract_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        bounding_box: entry
            .bounding_boxes
            .into_iter()
            .next()
            .map(BoundingBoxElement::into_attributes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE WMT_MS_Capabilities SYSTEM "http://localhost:8080/geoserver/schemas/wms/1.1.1/WMS_MS_Capabilities.dtd">
<WMT_MS_Capabilities version="1.1.0" updateSequence="42">
  <Service>
    <Name>OGC:WMS</Name>
    <Title>GeoServer Web Map Service</Title>
  </Service>
  <Capability>
    <Request>
      <GetCapabilities>
        <Format>application/vnd.ogc.wms_xml</Format>
      </GetCapabilities>
    </Request>
    <Exception>
      <Format>application/vnd.ogc.se_xml</Format>
    </Exception>
    <Layer>
      <Title>GeoServer Web Map Service</Title>
      <Abstract>A compliant implementation of WMS</Abstract>
      <SRS>EPSG:4326</SRS>
      <SRS>EPSG:3857</SRS>
      <LatLonBoundingBox minx="-180.0" miny="-90.0" maxx="180.0" maxy="90.0"/>
      <Layer queryable="1">
        <Name>Parcels</Name>
        <Title>County Parcels</Title>
        <Abstract>Tax parcels maintained by the county</Abstract>
        <KeywordList>
          <Keyword>parcels</Keyword>
          <Keyword>features</Keyword>
        </KeywordList>
        <SRS>EPSG:4326</SRS>
        <LatLonBoundingBox minx="-84.8" miny="39.2" maxx="-83.1" maxy="40.8"/>
        <BoundingBox SRS="EPSG:4326" minx="-84.8" miny="39.2" maxx="-83.1" maxy="40.8"/>
        <Style>
          <Name>polygon</Name>
          <Title>Default Polygon</Title>
        </Style>
      </Layer>
      <Layer queryable="0">
        <Name>Roads</Name>
        <Title>Roads</Title>
        <SRS>EPSG:4326</SRS>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    #[test]
    fn test_find_layer_with_all_fields() {
        let layer = find_layer(CAPABILITIES, "Parcels").unwrap();
        assert_eq!(layer.name, "Parcels");
        assert_eq!(layer.title, "County Parcels");
        assert_eq!(
            layer.abstract_text.as_deref(),
            Some("Tax parcels maintained by the county")
        );

        let bbox = layer.bounding_box.unwrap();
        assert_eq!(bbox.get("SRS").map(String::as_str), Some("EPSG:4326"));
        assert_eq!(bbox.get("minx").map(String::as_str), Some("-84.8"));
        assert_eq!(bbox.get("maxy").map(String::as_str), Some("40.8"));
        assert!(!bbox.contains_key("CRS"));
    }

    #[test]
    fn test_find_layer_without_optional_fields() {
        let layer = find_layer(CAPABILITIES, "Roads").unwrap();
        assert_eq!(layer.title, "Roads");
        assert_eq!(layer.abstract_text, None);
        assert_eq!(layer.bounding_box, None);
    }

    #[test]
    fn test_match_is_exact() {
        assert!(matches!(
            find_layer(CAPABILITIES, "parcels"),
            Err(GatewayError::LayerNotFound { .. })
        ));
        // The container's title is not a sublayer.
        assert!(matches!(
            find_layer(CAPABILITIES, "GeoServer Web Map Service"),
            Err(GatewayError::LayerNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_capability_section() {
        let xml = r#"<WMT_MS_Capabilities version="1.1.0"><Service><Name>OGC:WMS</Name></Service></WMT_MS_Capabilities>"#;
        let err = find_layer(xml, "Parcels").unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedDocument(_)));
        assert!(err.to_string().contains("<Capability>"));
    }

    #[test]
    fn test_missing_layer_container() {
        let xml = r#"<WMT_MS_Capabilities><Capability><Request></Request></Capability></WMT_MS_Capabilities>"#;
        let err = find_layer(xml, "Parcels").unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedDocument(_)));
        assert!(err.to_string().contains("<Layer>"));
    }

    #[test]
    fn test_empty_container() {
        let xml = r#"<WMT_MS_Capabilities><Capability><Layer><Title>Empty</Title></Layer></Capability></WMT_MS_Capabilities>"#;
        assert!(matches!(
            find_layer(xml, "Parcels"),
            Err(GatewayError::LayerNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_document() {
        let xml = r#"<WMT_MS_Capabilities><Capability><Layer></Capability>"#;
        assert!(matches!(
            find_layer(xml, "Parcels"),
            Err(GatewayError::MalformedXml(_))
        ));
    }
}
