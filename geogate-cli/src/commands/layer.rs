use anyhow::{Context, Result};
use geogate::{find_layer, CapabilitiesRequest, GeoServerClient, LayerInfo};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct LayerSummary<'a> {
    #[serde(rename = "layerName")]
    layer_name: String,
    title: &'a str,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    abstract_text: Option<&'a str>,
    #[serde(rename = "boundingBox", skip_serializing_if = "Option::is_none")]
    bounding_box: Option<&'a BTreeMap<String, String>>,
}

pub async fn run(
    client: &GeoServerClient,
    workspace: String,
    layer: String,
    json: bool,
) -> Result<()> {
    let request = CapabilitiesRequest::new(workspace, layer);
    let info = fetch(client, &request)
        .await
        .with_context(|| format!("Failed to look up {}", request.qualified_layer()))?;

    if json {
        let summary = LayerSummary {
            layer_name: request.qualified_layer(),
            title: &info.title,
            abstract_text: info.abstract_text.as_deref(),
            bounding_box: info.bounding_box.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Layer: {}", request.qualified_layer());
        println!("Title: {}", info.title);
        if let Some(abstract_text) = &info.abstract_text {
            println!("Abstract: {}", abstract_text);
        }
        match &info.bounding_box {
            Some(attributes) => println!("Bounding box: {}", format_bounding_box(attributes)),
            None => println!("Bounding box: none"),
        }
    }

    Ok(())
}

async fn fetch(client: &GeoServerClient, request: &CapabilitiesRequest) -> geogate::Result<LayerInfo> {
    let response = client.dispatch(request).await?.ensure_success()?;
    find_layer(response.text()?, request.layer())
}

/// Render bounding box attributes as `minx,miny,maxx,maxy (SRS)`.
fn format_bounding_box(attributes: &BTreeMap<String, String>) -> String {
    let corner = |key: &str| attributes.get(key).map(String::as_str).unwrap_or("?");
    let extent = format!(
        "{},{},{},{}",
        corner("minx"),
        corner("miny"),
        corner("maxx"),
        corner("maxy")
    );

    match attributes.get("SRS").or_else(|| attributes.get("CRS")) {
        Some(srs) => format!("{} ({})", extent, srs),
        None => extent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bounding_box() {
        let attributes = BTreeMap::from([
            ("SRS".to_string(), "EPSG:4326".to_string()),
            ("minx".to_string(), "-84.81".to_string()),
            ("miny".to_string(), "39.21".to_string()),
            ("maxx".to_string(), "-83.15".to_string()),
            ("maxy".to_string(), "40.81".to_string()),
        ]);
        assert_eq!(
            format_bounding_box(&attributes),
            "-84.81,39.21,-83.15,40.81 (EPSG:4326)"
        );
    }

    #[test]
    fn test_format_partial_bounding_box() {
        let attributes = BTreeMap::from([("minx".to_string(), "0".to_string())]);
        assert_eq!(format_bounding_box(&attributes), "0,?,?,?");
    }
}
