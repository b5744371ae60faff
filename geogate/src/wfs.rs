//! WFS `GetFeature` requests.

use crate::cql::CqlFilter;
use crate::request::{pair, qualified_name, Endpoint, OwsRequest, Service};

/// WFS version used when the caller does not choose one.
pub const DEFAULT_WFS_VERSION: &str = "1.0.0";
/// Output format used when the caller does not choose one.
pub const DEFAULT_OUTPUT_FORMAT: &str = "application/json";

/// A feature query.
#[derive(Debug, Clone)]
pub struct FeatureQuery {
    workspace: Option<String>,
    type_name: String,
    filter: Option<CqlFilter>,
    output_format: String,
    max_features: Option<u32>,
    service: String,
    version: String,
    request: String,
}

impl FeatureQuery {
    /// Query `type_name` through the shared `{base}/wfs` endpoint.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            workspace: None,
            type_name: type_name.into(),
            filter: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            max_features: None,
            service: "WFS".to_string(),
            version: DEFAULT_WFS_VERSION.to_string(),
            request: "GetFeature".to_string(),
        }
    }

    /// Query one layer through its workspace's `{base}/{workspace}/ows`.
    pub fn for_workspace_layer(workspace: &str, layer: &str) -> Self {
        let mut query = Self::new(qualified_name(workspace, layer));
        query.workspace = Some(workspace.to_string());
        query
    }

    /// Restrict results with a CQL filter.
    pub fn filter(mut self, filter: CqlFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Cap the number of returned features.
    pub fn max_features(mut self, max: u32) -> Self {
        self.max_features = Some(max);
        self
    }

    /// Set the output format.
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    /// Override the `service` parameter.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Override the WFS version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Override the WFS operation.
    pub fn request(mut self, request: impl Into<String>) -> Self {
        self.request = request.into();
        self
    }

    /// Feature type name as sent upstream.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The filter, if any.
    pub fn cql_filter(&self) -> Option<&CqlFilter> {
        self.filter.as_ref()
    }
}

impl OwsRequest for FeatureQuery {
    fn endpoint(&self) -> Endpoint {
        match &self.workspace {
            Some(workspace) => Endpoint::Workspace(workspace.clone(), Service::Ows),
            None => Endpoint::Global(Service::Wfs),
        }
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            pair("service", self.service.as_str()),
            pair("version", self.version.as_str()),
            pair("request", self.request.as_str()),
            pair("typeName", self.type_name.as_str()),
            pair("outputFormat", self.output_format.as_str()),
        ];
        if let Some(max) = self.max_features {
            pairs.push(pair("maxFeatures", max.to_string()));
        }
        if let Some(filter) = &self.filter {
            pairs.push(pair("CQL_FILTER", filter.as_str()));
        }
        pairs
    }
}
