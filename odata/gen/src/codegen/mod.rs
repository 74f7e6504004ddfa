//! Code generation modules for OData schemas.
//!
//! Each submodule turns one kind of schema element into Rust declarations.
//!
//! ## Submodules
//!
//! - [`enums`] - `EnumType` to a `#[repr]` enum, or a bit-set newtype for flags
//! - [`structs`] - `ComplexType` and `EntityType` to serde structs
//! - [`container`] - `EntityContainer` plus unbound functions to a client facade
//! - [`recursion`] - finds complex properties that must be boxed
//!
//! ## Output Format
//!
//! All emitters return a [`Declaration`] wrapping a `proc_macro2::TokenStream`,
//! which is then:
//! - Validated with `syn::parse2` to ensure correctness
//! - Formatted with `prettyplease` for consistent style
//!
//! See [`crate::output`] for validation, formatting and sinks.
//!
//! Generated code names library items by global path (`::odata_client::...`,
//! `::std::vec::Vec`, `::core::option::Option`) so that several declarations
//! can share one module without imports, and a schema type called `Option` or
//! `String` cannot shadow the prelude. Schema types are named by
//! `crate::`-rooted paths.

use proc_macro2::TokenStream;

pub mod container;
pub mod enums;
pub mod recursion;
pub mod structs;

pub use container::emit_container;
pub use enums::emit_enum;
pub use recursion::RecursiveProperties;
pub use structs::{emit_complex, emit_entity};

/// One emitted declaration before validation and formatting.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Dedup key, `Namespace.Name`.
    pub key: String,
    /// Namespace the declaration is mounted under.
    pub namespace: String,
    pub name: String,
    pub tokens: TokenStream,
}

impl Declaration {
    pub fn new(namespace: &str, name: &str, tokens: TokenStream) -> Self {
        Self {
            key: format!("{namespace}.{name}"),
            namespace: namespace.to_string(),
            name: name.to_string(),
            tokens,
        }
    }
}
