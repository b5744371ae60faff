//! # geogate - GeoServer WMS/WFS gateway core
//!
//! Request translation and response normalization for a thin gateway in
//! front of GeoServer.
//!
//! ## Features
//!
//! - **One model per operation**: [`MapRequest`], [`LegendRequest`],
//!   [`FeatureQuery`], and [`CapabilitiesRequest`] each describe their
//!   endpoint and parameters through [`OwsRequest`]
//! - **Escaped by construction**: URLs are built segment by segment and
//!   CQL predicates quote their identifiers and literals
//! - **Bounded**: every upstream call carries an explicit timeout
//! - **Normalized**: OGC service exceptions and capabilities documents are
//!   parsed into plain Rust values
//!
//! ## Quick Start
//!
//! ```ignore
//! use geogate::{BoundingBox, GeoServerClient, MapRequest, SpatialRef};
//!
//! let client = GeoServerClient::new("http://localhost:8080/geoserver")?;
//! let bbox: BoundingBox = "-84.81,39.21,-83.15,40.81".parse()?;
//! let request = MapRequest::for_workspace_layer("topp", "states", bbox, SpatialRef::srs("EPSG:4326"));
//!
//! let (content_type, png) = client
//!     .dispatch(&request)
//!     .await?
//!     .ensure_success()?
//!     .normalize()?
//!     .into_image()?;
//! ```

pub mod bbox;
pub mod capabilities;
pub mod client;
pub mod cql;
pub mod error;
pub mod exception;
pub mod request;
pub mod response;
pub mod wfs;
pub mod wms;

// Re-export main types at crate root for convenience
pub use bbox::BoundingBox;
pub use capabilities::{find_layer, LayerInfo};
pub use client::{GeoServerClient, GeoServerClientBuilder};
pub use cql::CqlFilter;
pub use error::{GatewayError, Result};
pub use exception::{parse_service_exception, ServiceException};
pub use request::{Endpoint, OwsRequest, Service};
pub use response::{Payload, UpstreamResponse};
pub use wfs::FeatureQuery;
pub use wms::{CapabilitiesRequest, LegendRequest, MapRequest, SpatialRef};
