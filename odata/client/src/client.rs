//! The service root client.
//!
//! [`ODataClient`] holds the HTTP client and the service root URL. Generated
//! facades take one in their constructor and derive typed calls from it:
//! [`ODataClient::for_set`] for entity sets and [`ODataClient::unbound`] for
//! service-level functions.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::bound::BoundClient;
use crate::error::ODataError;
use crate::function::UnboundClient;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for configuring an [`ODataClient`].
#[derive(Debug)]
pub struct ODataClientBuilder {
    base_url: Url,
    timeout: Duration,
    default_headers: HeaderMap,
}

impl ODataClientBuilder {
    fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
        }
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request (e.g., `Authorization`).
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ODataError> {
        let invalid = |message: String| ODataError::Parameter {
            name: name.as_ref().to_string(),
            message,
        };
        let header = HeaderName::try_from(name.as_ref())
            .map_err(|e| invalid(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| invalid(format!("invalid header value: {e}")))?;
        self.default_headers.insert(header, value);
        Ok(self)
    }

    /// Builds the [`ODataClient`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed or the base
    /// URL cannot be a service root.
    pub fn build(self) -> Result<ODataClient, ODataError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers)
            .build()?;
        ODataClient::with_http_client(http, self.base_url)
    }
}

/// Async client bound to one service root.
///
/// Cloning is cheap; clones share the connection pool.
///
/// ## Examples
///
/// ```rust,ignore
/// use odata_client::ODataClient;
///
/// let client = ODataClient::new("https://services.odata.org/TripPinRESTierService/")?;
/// let service = TripPinService::new(client);
/// let people = service.People().top(5).find_entries().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ODataClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ODataClient {
    /// Creates a builder for a client rooted at `base_url`.
    pub fn builder(base_url: Url) -> ODataClientBuilder {
        ODataClientBuilder::new(base_url)
    }

    /// Creates a client with default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if `base_url` does not parse or the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: &str) -> Result<Self, ODataError> {
        Self::builder(Url::parse(base_url)?).build()
    }

    /// Creates a client around an existing `reqwest::Client`.
    ///
    /// ## Errors
    ///
    /// Returns [`ODataError::BaseUrl`] if `base_url` cannot carry path
    /// segments.
    pub fn with_http_client(http: reqwest::Client, base_url: Url) -> Result<Self, ODataError> {
        if base_url.cannot_be_a_base() {
            return Err(ODataError::BaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Typed access to the entity set `name`.
    pub fn for_set<T>(&self, name: &str) -> BoundClient<T> {
        BoundClient::new(self.clone(), name)
    }

    /// Service-level operations.
    pub fn unbound(&self) -> UnboundClient {
        UnboundClient::new(self.clone())
    }

    /// The service root with `segment` appended as one path segment.
    pub(crate) fn resource_url(&self, segment: &str) -> Result<Url, ODataError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ODataError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Sends a GET and parses the JSON body.
    #[instrument(name = "odata_request", skip(self), fields(http.url = %url))]
    pub(crate) async fn get_json(&self, url: Url) -> Result<Value, ODataError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "response received");
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ODataError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
