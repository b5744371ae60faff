use anyhow::{Context, Result};
use geogate::{GeoServerClient, LegendRequest};
use std::path::PathBuf;

use super::write_output;

pub async fn run(
    client: &GeoServerClient,
    workspace: String,
    layer: String,
    output: PathBuf,
    width: u32,
    height: u32,
) -> Result<()> {
    let request = LegendRequest::for_workspace_layer(&workspace, &layer).size(width, height)?;

    // GeoServer answers some legend requests with 4xx plus a usable image
    let (content_type, bytes) = async {
        client
            .dispatch(&request)
            .await?
            .ensure_status(|status| !status.is_server_error())?
            .normalize()?
            .into_image()
    }
    .await
    .with_context(|| format!("Failed to fetch legend for {}", request.layer()))?;

    write_output(&output, &bytes, &content_type)
}
