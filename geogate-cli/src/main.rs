use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geogate::wms::{DEFAULT_LEGEND_SIZE, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};
use geogate::{BoundingBox, GeoServerClient};
use std::path::PathBuf;
use std::time::Duration;

mod commands;

/// GeoServer WMS/WFS command-line client
#[derive(Parser)]
#[command(name = "geogate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GeoServer base URL (e.g. http://localhost:8080/geoserver)
    #[arg(
        short,
        long,
        env = "GEOGATE_GEOSERVER_URL",
        default_value = "http://localhost:8080/geoserver",
        global = true
    )]
    geoserver_url: String,

    /// Upstream timeout in seconds (at least 1)
    #[arg(
        short,
        long,
        env = "GEOGATE_TIMEOUT_SECS",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a layer in its workspace capabilities document
    Layer {
        /// Workspace name
        workspace: String,

        /// Layer name within the workspace
        layer: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Save the legend graphic of a layer
    Legend {
        /// Workspace name
        workspace: String,

        /// Layer name within the workspace
        layer: String,

        /// Output image file
        #[arg(short, long)]
        output: PathBuf,

        /// Legend width in pixels
        #[arg(long, default_value_t = DEFAULT_LEGEND_SIZE)]
        width: u32,

        /// Legend height in pixels
        #[arg(long, default_value_t = DEFAULT_LEGEND_SIZE)]
        height: u32,
    },

    /// Print features whose attribute equals a value, as GeoJSON
    Features {
        /// Workspace name
        workspace: String,

        /// Layer name within the workspace
        layer: String,

        /// Attribute to filter on
        attribute: String,

        /// Value the attribute must equal
        value: String,

        /// Maximum number of features to return
        #[arg(short, long)]
        max_features: Option<u32>,
    },

    /// Save a rendered map of a layer
    Map {
        /// Workspace name
        workspace: String,

        /// Layer name within the workspace
        layer: String,

        /// Bounding box as minx,miny,maxx,maxy
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Spatial reference of the bounding box (e.g. EPSG:4326)
        #[arg(long)]
        srs: String,

        /// Output image file
        #[arg(short, long)]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value_t = DEFAULT_MAP_WIDTH)]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value_t = DEFAULT_MAP_HEIGHT)]
        height: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = GeoServerClient::builder(&cli.geoserver_url)
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("Failed to create GeoServer client")?;

    match cli.command {
        Commands::Layer {
            workspace,
            layer,
            json,
        } => commands::layer::run(&client, workspace, layer, json).await,
        Commands::Legend {
            workspace,
            layer,
            output,
            width,
            height,
        } => commands::legend::run(&client, workspace, layer, output, width, height).await,
        Commands::Features {
            workspace,
            layer,
            attribute,
            value,
            max_features,
        } => {
            commands::features::run(&client, workspace, layer, attribute, value, max_features)
                .await
        }
        Commands::Map {
            workspace,
            layer,
            bbox,
            srs,
            output,
            width,
            height,
        } => {
            commands::map::run(
                &client, workspace, layer, bbox, srs, output, width, height,
            )
            .await
        }
    }
}
