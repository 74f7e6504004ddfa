//! Generator configuration and the `odata-gen.toml` manifest.
//!
//! ## Manifest format
//!
//! ```toml
//! module_root = "crate::odata"
//! enum_dedup = "strict"
//! fetch_timeout_secs = 30
//!
//! [[client]]
//! source = "https://services.odata.org/TripPinRESTierService/$metadata"
//! service = "TripPinService"
//! namespace = "TripPin"
//! ```
//!
//! Every key is optional. A missing manifest file means "nothing to
//! generate", not an error.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use strum::Display;

use crate::errors::ConfigError;
use crate::request::GenerationRequest;

/// Default timeout for metadata retrieval.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How repeated enum declarations are handled within one pass.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnumDedupPolicy {
    /// First writer wins, same as complex and entity types.
    #[default]
    Strict,
    /// Skip only when the key is already registered and longer than
    /// [`EnumDedupPolicy::LEGACY_KEY_THRESHOLD`] characters; shorter keys are
    /// emitted every time they are seen.
    Legacy,
}

impl EnumDedupPolicy {
    pub const LEGACY_KEY_THRESHOLD: usize = 50;
}

/// Settings shared by every request in a generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Rust path under which namespace modules are mounted.
    pub module_root: String,
    pub enum_dedup: EnumDedupPolicy,
    pub fetch_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_root: "crate".to_string(),
            enum_dedup: EnumDedupPolicy::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl GeneratorConfig {
    /// Parses `module_root` into its path segments.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::ModuleRoot`] unless the root is a plain path
    /// without generic arguments (e.g., `crate`, `crate::odata`, `my_api`).
    pub fn module_root_segments(&self) -> Result<Vec<String>, ConfigError> {
        let invalid = || ConfigError::ModuleRoot(self.module_root.clone());
        let path = syn::parse_str::<syn::Path>(&self.module_root).map_err(|_| invalid())?;

        path.segments
            .iter()
            .map(|segment| match segment.arguments {
                syn::PathArguments::None if !segment.ident.to_string().starts_with("r#") => {
                    Ok(segment.ident.to_string())
                }
                _ => Err(invalid()),
            })
            .collect()
    }
}

/// One `[[client]]` table of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientEntry {
    pub source: String,
    pub service: String,
    pub namespace: String,
}

/// The parsed `odata-gen.toml` manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub module_root: Option<String>,
    pub enum_dedup: Option<EnumDedupPolicy>,
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default, rename = "client")]
    pub clients: Vec<ClientEntry>,
}

impl Manifest {
    /// Parses manifest text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads the manifest at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        Self::parse(&text)
            .map(Some)
            .map_err(|source| ConfigError::Toml {
                path: path.display().to_string(),
                source,
            })
    }

    /// Overlays the manifest's settings on `config`.
    pub fn apply_to(&self, config: &mut GeneratorConfig) {
        if let Some(root) = &self.module_root {
            config.module_root = root.clone();
        }
        if let Some(policy) = self.enum_dedup {
            config.enum_dedup = policy;
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config.fetch_timeout = Duration::from_secs(secs);
        }
    }

    /// The manifest's clients as generation requests, in file order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.clients
            .iter()
            .map(|c| GenerationRequest::new(&c.source, &c.service, &c.namespace))
            .collect()
    }
}
