//! OData code generator library.
//!
//! This crate turns the `$metadata` document of an OData service into
//! strongly-typed Rust client code built on `odata-client`. The generated
//! code includes:
//!
//! - A serde struct per complex and entity type (with key markers, base-type
//!   flattening and dynamic properties for open types)
//! - A `#[repr]` enum per enum type, or a bit-set newtype for flags enums
//! - A service facade with one accessor per entity set and one async method
//!   per unbound function
//!
//! ## Modules
//!
//! - [`pass`] - The generation pass: fetch, parse, dispatch, report
//! - [`codegen`] - Code generation for individual schema elements
//! - [`mapping`] - EDM type references to Rust types
//! - [`registry`] - Deduplication of declarations across documents
//! - [`output`] - Validation, formatting and output sinks
//! - [`source`] - Metadata retrieval (HTTP, files, in-memory)
//! - [`config`] - Generator settings and the `odata-gen.toml` manifest
//! - [`naming`] - Identifier sanitizing
//! - [`errors`] - Error types for the generator
//!
//! ## Example Usage
//!
//! ```no_run
//! use odata_gen::config::GeneratorConfig;
//! use odata_gen::output::DirectorySink;
//! use odata_gen::pass::GenerationPass;
//! use odata_gen::request::GenerationRequest;
//! use odata_gen::source::DefaultMetadataSource;
//! use odata_gen::output::OutputSink;
//!
//! let config = GeneratorConfig::default();
//! let source = DefaultMetadataSource::new(config.fetch_timeout).unwrap();
//! let mut sink = DirectorySink::new("src/odata");
//!
//! let requests = [GenerationRequest::new(
//!     "https://services.odata.org/TripPinRESTierService/$metadata",
//!     "TripPinService",
//!     "TripPin",
//! )];
//!
//! let mut pass = GenerationPass::new(config).unwrap();
//! let report = pass.run(&requests, &source, &mut sink);
//! sink.finish().unwrap();
//! report.print();
//! ```
//!
//! ## Generated Code Structure
//!
//! For a `Person` entity in namespace `Trippin` and a container with a
//! `People` set:
//!
//! ```text
//! #[derive(Debug, Clone, PartialEq, ::odata_client::serde::Serialize, ...)]
//! pub struct Person {
//!     #[serde(rename = "UserName")]
//!     pub UserName: ::std::string::String,
//!     ...
//! }
//!
//! pub struct TripPinService {
//!     client: ::odata_client::ODataClient,
//! }
//!
//! impl TripPinService {
//!     pub fn People(&self) -> ::odata_client::BoundClient<crate::trippin::Person>;
//!     pub async fn GetNearestAirport(&self, lat: f64, lon: f64)
//!         -> ::core::result::Result<crate::trippin::Airport, ::odata_client::ODataError>;
//! }
//! ```

pub mod codegen;
pub mod config;
pub mod errors;
pub mod mapping;
pub mod naming;
pub mod output;
pub mod pass;
pub mod registry;
pub mod request;
pub mod source;

#[cfg(test)]
mod test_utils;
