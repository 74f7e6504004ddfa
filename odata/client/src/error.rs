//! Error types for OData requests.

use thiserror::Error;

/// Errors returned by [`crate::ODataClient`] and the calls built from it.
///
/// ## Examples
///
/// ```rust,ignore
/// use odata_client::ODataError;
///
/// match service.People().find_entries().await {
///     Ok(people) => println!("{} people", people.len()),
///     Err(ODataError::Api { status, body }) => eprintln!("HTTP {status}: {body}"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum ODataError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body is not the JSON the caller expected.
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("Service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry resource path segments (e.g., `mailto:`).
    #[error("URL '{0}' cannot be used as a service root")]
    BaseUrl(String),

    /// A key or function parameter has no OData literal form.
    #[error("Invalid parameter '{name}': {message}")]
    Parameter { name: String, message: String },

    /// The payload is valid JSON but not shaped as expected.
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),
}
