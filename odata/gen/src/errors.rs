//! Error types for the OData generator.

use thiserror::Error;

/// Errors that can occur during code generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Failed to retrieve the metadata document
    #[error("Failed to fetch metadata: {0}")]
    FetchError(#[from] FetchError),

    /// Failed to parse the metadata document
    #[error("Failed to parse metadata: {0}")]
    ParseError(#[from] odata_define::ParseError),

    /// Failed to generate code
    #[error("Code generation failed: {0}")]
    CodeGenError(String),

    /// Failed to write output file
    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Errors raised while retrieving a metadata document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed in transport (DNS, connect, timeout, body read).
    #[error("Request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("'{url}' returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// A local metadata file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No document is registered under the given source identifier.
    #[error("No metadata document available for '{0}'")]
    NotFound(String),
}

/// Errors in the manifest or command-line configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file exists but could not be read.
    #[error("Failed to read manifest '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or has unexpected keys.
    #[error("Invalid manifest '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// The module root is not a plain Rust path.
    #[error("Invalid module root '{0}': expected a path such as `crate::odata`")]
    ModuleRoot(String),

    /// A single-request invocation is missing one of its parts.
    #[error("Incomplete generation request: missing {0}")]
    IncompleteRequest(&'static str),
}
