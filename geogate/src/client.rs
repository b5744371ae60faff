//! GeoServer HTTP client.
//!
//! [`GeoServerClient`] turns an [`OwsRequest`] into an escaped URL, sends
//! exactly one request, and reads the whole response. It never retries and
//! never treats a non-2xx status as a transport failure; callers decide
//! what each status means for their route.
//!
//! ```ignore
//! use geogate::{GeoServerClientBuilder, CapabilitiesRequest};
//!
//! let client = GeoServerClientBuilder::new("http://localhost:8080/geoserver")
//!     .timeout(std::time::Duration::from_secs(10))
//!     .build()?;
//!
//! let response = client.dispatch(&CapabilitiesRequest::new("topp", "states")).await?;
//! ```

use std::time::Duration;

use hyper::ext::ReasonPhrase;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use crate::error::{GatewayError, Result};
use crate::request::OwsRequest;
use crate::response::UpstreamResponse;

/// Default upstream timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Asynchronous client for one GeoServer instance.
#[derive(Debug, Clone)]
pub struct GeoServerClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl GeoServerClient {
    /// Create a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if `base_url` is not an absolute
    /// HTTP(S) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        GeoServerClientBuilder::new(base_url).build()
    }

    /// Start building a client.
    pub fn builder(base_url: impl Into<String>) -> GeoServerClientBuilder {
        GeoServerClientBuilder::new(base_url)
    }

    /// The configured base URL, e.g. `http://host/geoserver`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Upper bound on a single upstream call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the full, escaped URL for a request.
    ///
    /// Path segments (workspace names included) are percent-encoded and
    /// every query value is form-encoded, so caller input cannot change
    /// the structure of the URL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RequestSetup`] if the base URL cannot carry
    /// path segments.
    pub fn url_for<R: OwsRequest + ?Sized>(&self, request: &R) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GatewayError::RequestSetup(format!("base URL {} cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty();
            segments.extend(request.endpoint().segments());
        }

        let pairs = request.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// Send one request and read the full response.
    ///
    /// The call is bounded by [`timeout`](Self::timeout). Dropping the
    /// returned future aborts the outbound request.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Timeout`] if the bound is exceeded.
    /// - [`GatewayError::RequestSetup`] if the request cannot be built.
    /// - [`GatewayError::NoResponse`] for any other transport failure.
    pub async fn dispatch<R: OwsRequest + ?Sized>(&self, request: &R) -> Result<UpstreamResponse> {
        let url = self.url_for(request)?;

        let response = self
            .http
            .request(request.method(), url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
            .map(str::to_string);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        Ok(UpstreamResponse {
            status,
            reason,
            content_type,
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                timeout: self.timeout,
            }
        } else if err.is_builder() {
            GatewayError::RequestSetup(err.to_string())
        } else {
            GatewayError::NoResponse(err.to_string())
        }
    }
}

/// Builder for [`GeoServerClient`].
#[derive(Debug, Clone)]
pub struct GeoServerClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl GeoServerClientBuilder {
    /// Create a builder for the GeoServer at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOGATE_GEOSERVER_URL` | GeoServer base URL | Required |
    /// | `GEOGATE_TIMEOUT_SECS` | Upstream timeout in seconds | 30 |
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if `GEOGATE_GEOSERVER_URL` is not set.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("GEOGATE_GEOSERVER_URL").map_err(|_| {
            GatewayError::Config("GEOGATE_GEOSERVER_URL environment variable not set".to_string())
        })?;

        let timeout_secs: u64 = std::env::var("GEOGATE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self::new(base_url).timeout(Duration::from_secs(timeout_secs)))
    }

    /// Set the upstream timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the [`GeoServerClient`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the base URL is invalid or the
    /// HTTP client cannot be created (e.g. TLS initialization failure).
    pub fn build(self) -> Result<GeoServerClient> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| GatewayError::Config(format!("invalid base URL {}: {e}", self.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(GatewayError::Config(format!(
                "base URL must be an absolute http(s) URL: {}",
                self.base_url
            )));
        }

        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("geogate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(GeoServerClient {
            http,
            base_url,
            timeout: self.timeout,
        })
    }
}
