//! Runtime client for code generated by `odata-gen`.
//!
//! Generated service facades wrap an [`ODataClient`] and hand out typed
//! handles built from it. Generated structs implement the traits in this
//! crate and derive serde through [`serde`], so consumers only need
//! `odata-client` as a dependency.
//!
//! ## Features
//!
//! - **Entity sets**: [`BoundClient`] with `$filter`, `$orderby`, `$select`,
//!   `$skip` and `$top`; entries by key
//! - **Open types**: undeclared properties collected into a dynamic map
//! - **Unbound functions**: [`FunctionCall`] with URL-literal parameters, and
//!   parameter aliases for complex or collection values
//! - **GUIDs**: [`Guid`], written unquoted in keys and parameters
//! - **EDM serde helpers**: binary, duration, flags enums
//!
//! ## Example
//!
//! ```rust,ignore
//! use odata_client::ODataClient;
//!
//! let client = ODataClient::new("https://services.odata.org/TripPinRESTierService/")?;
//! let service = TripPinService::new(client);
//!
//! let people = service.People().top(5).find_entries().await?;
//! let airport = service.GetNearestAirport(33.0, -118.0).await?;
//! ```

mod bound;
mod client;
mod error;
mod function;
mod guid;
mod literal;
mod traits;

pub mod flags;
pub mod serde;

pub use chrono;
pub use uuid;
pub use serde_json;

pub use bound::{BoundClient, QueryOptions};
pub use client::{ODataClient, ODataClientBuilder};
pub use error::ODataError;
pub use function::{FunctionCall, UnboundClient};
pub use guid::Guid;
pub use literal::literal;
pub use traits::{EntityKey, Flags, OpenType, Structured};
