//! Serde, re-exported for generated code, plus EDM field helpers.
//!
//! Generated structs derive through `#[serde(crate = "::odata_client::serde")]`
//! so that consumers only depend on `odata-client`. The helpers cover EDM
//! representations serde does not provide:
//!
//! - [`null_as_default`] - `null` reads as the type's default (strings)
//! - [`binary`] - `Edm.Binary` as base64url, `null` reads as empty
//! - [`duration`], [`option_duration`] - `Edm.Duration` as ISO 8601

pub use ::serde::*;

pub mod binary;
pub mod duration;
pub mod option_duration;

/// Deserializes `null` as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: ::serde::Deserializer<'de>,
    T: Default + ::serde::Deserialize<'de>,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
