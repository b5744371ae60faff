use anyhow::{Context, Result};
use geogate::{CqlFilter, FeatureQuery, GeoServerClient};

pub async fn run(
    client: &GeoServerClient,
    workspace: String,
    layer: String,
    attribute: String,
    value: String,
    max_features: Option<u32>,
) -> Result<()> {
    let mut query = FeatureQuery::for_workspace_layer(&workspace, &layer)
        .filter(CqlFilter::equals(&attribute, &value)?);
    if let Some(max) = max_features {
        query = query.max_features(max);
    }

    let body = async { client.dispatch(&query).await?.ensure_success()?.into_json() }
        .await
        .with_context(|| format!("Failed to query features of {}", query.type_name()))?;

    let collection: serde_json::Value = serde_json::from_slice(&body)?;
    println!("{}", serde_json::to_string_pretty(&collection)?);

    Ok(())
}
