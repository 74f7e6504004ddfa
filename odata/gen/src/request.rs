//! Generation requests.

use std::fmt;

/// One client to generate: where its metadata lives, what to call the
/// facade and which namespace module to put it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Metadata source identifier (URL, `file://` URL or path).
    pub source: String,
    /// Name of the generated facade type.
    pub service: String,
    /// Namespace the facade is emitted into.
    pub namespace: String,
}

impl GenerationRequest {
    pub fn new(
        source: impl Into<String>,
        service: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            service: service.into(),
            namespace: namespace.into(),
        }
    }

    /// Dedup key of the facade declaration (`Namespace.Service`).
    pub fn container_key(&self) -> String {
        format!("{}.{}", self.namespace, self.service)
    }
}

impl fmt::Display for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.container_key(), self.source)
    }
}
