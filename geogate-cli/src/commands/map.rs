use anyhow::{Context, Result};
use geogate::{BoundingBox, GeoServerClient, MapRequest, SpatialRef};
use std::path::PathBuf;

use super::write_output;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    client: &GeoServerClient,
    workspace: String,
    layer: String,
    bbox: BoundingBox,
    srs: String,
    output: PathBuf,
    width: u32,
    height: u32,
) -> Result<()> {
    let request =
        MapRequest::for_workspace_layer(&workspace, &layer, bbox, SpatialRef::srs(srs))
            .size(width, height)?;

    let (content_type, bytes) = async {
        client
            .dispatch(&request)
            .await?
            .ensure_success()?
            .normalize()?
            .into_image()
    }
    .await
    .with_context(|| format!("Failed to render {} for {}", request.layers(), bbox))?;

    write_output(&output, &bytes, &content_type)
}
