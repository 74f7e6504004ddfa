//! Nullable `Edm.Duration`; see [`super::duration`].

use std::time::Duration;

use ::serde::{Deserialize, Deserializer, Serializer};

use super::duration;

pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(d) => serializer.serialize_some(&duration::format(*d)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| duration::parse(&text).map_err(::serde::de::Error::custom))
        .transpose()
}
