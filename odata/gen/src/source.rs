//! Metadata retrieval.
//!
//! A [`MetadataSource`] turns a source identifier from a generation request
//! into the raw `$metadata` document. The generator ships with:
//!
//! - [`HttpMetadataSource`] - blocking HTTP GET with a timeout
//! - [`FileMetadataSource`] - local paths and `file://` URLs
//! - [`DefaultMetadataSource`] - picks one of the above by scheme
//! - [`InMemoryMetadataSource`] - documents registered up front

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use reqwest::header::ACCEPT;
use tracing::debug;

use crate::errors::FetchError;

/// Retrieves raw metadata documents.
pub trait MetadataSource {
    /// Returns the document behind `source`.
    fn fetch(&self, source: &str) -> Result<String, FetchError>;
}

/// Fetches metadata over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpMetadataSource {
    client: reqwest::blocking::Client,
}

impl HttpMetadataSource {
    /// Creates a source whose requests give up after `timeout`.
    ///
    /// ## Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("odata-gen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl MetadataSource for HttpMetadataSource {
    fn fetch(&self, source: &str) -> Result<String, FetchError> {
        debug!("GET {}", source);
        let http_error = |source_err| FetchError::Http {
            url: source.to_string(),
            source: source_err,
        };

        let response = self
            .client
            .get(source)
            .header(ACCEPT, "application/xml")
            .send()
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: source.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(http_error)
    }
}

/// Reads metadata from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetadataSource;

impl MetadataSource for FileMetadataSource {
    fn fetch(&self, source: &str) -> Result<String, FetchError> {
        let path = source.strip_prefix("file://").unwrap_or(source);
        debug!("Reading {}", path);
        fs::read_to_string(path).map_err(|e| FetchError::Io {
            path: path.to_string(),
            source: e,
        })
    }
}

/// Dispatches `http://` and `https://` sources to HTTP and everything else to
/// the file system.
#[derive(Debug, Clone)]
pub struct DefaultMetadataSource {
    http: HttpMetadataSource,
    file: FileMetadataSource,
}

impl DefaultMetadataSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpMetadataSource::new(timeout)?,
            file: FileMetadataSource,
        })
    }
}

impl MetadataSource for DefaultMetadataSource {
    fn fetch(&self, source: &str) -> Result<String, FetchError> {
        if is_http(source) {
            self.http.fetch(source)
        } else {
            self.file.fetch(source)
        }
    }
}

fn is_http(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Serves documents registered with [`InMemoryMetadataSource::with_document`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataSource {
    documents: HashMap<String, String>,
}

impl InMemoryMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_document(mut self, source: impl Into<String>, xml: impl Into<String>) -> Self {
        self.documents.insert(source.into(), xml.into());
        self
    }
}

impl MetadataSource for InMemoryMetadataSource {
    fn fetch(&self, source: &str) -> Result<String, FetchError> {
        self.documents
            .get(source)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(source.to_string()))
    }
}
