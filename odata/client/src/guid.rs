//! `Edm.Guid` values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Newtype name that marks a GUID for the URL literal writer.
///
/// JSON serializers ignore newtype names, so payloads carry a plain string.
pub(crate) const GUID_MARKER: &str = "$odata_client::Guid";

/// An `Edm.Guid` value.
///
/// Serializes as the hyphenated string in JSON payloads. As a key or function
/// parameter it is written unquoted (`Events(5c0e1a0a-...)`).
///
/// ## Examples
///
/// ```
/// use odata_client::Guid;
///
/// let id: Guid = "21ec2020-3aea-4069-a2dd-08002b30309d".parse().unwrap();
/// assert_eq!(id.to_string(), "21ec2020-3aea-4069-a2dd-08002b30309d");
/// assert_eq!(odata_client::literal("id", &id).unwrap(), id.to_string());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(pub Uuid);

impl Guid {
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Guid> for Uuid {
    fn from(guid: Guid) -> Self {
        guid.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Serialize for Guid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(GUID_MARKER, &self.to_string())
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "21ec2020-3aea-4069-a2dd-08002b30309d";

    #[test]
    fn json_form_is_a_plain_string() {
        let id: Guid = ID.parse().unwrap();
        assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!(ID));

        let back: Guid = serde_json::from_value(serde_json::json!(ID)).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!("not-a-guid".parse::<Guid>().is_err());
        assert!(serde_json::from_value::<Guid>(serde_json::json!("xyz")).is_err());
    }

    #[test]
    fn upper_case_input_displays_lower_case() {
        let id: Guid = ID.to_uppercase().parse().unwrap();
        assert_eq!(id.to_string(), ID);
    }
}
