//! Serde support for flags enums.
//!
//! OData JSON writes a flags value as its member names joined by commas
//! (`"Red,Blue"`). Bits no member covers are written as a plain number
//! instead. Reading accepts either form, plus numeric strings.

use std::fmt;

use ::serde::de::{self, Visitor};
use ::serde::{Deserializer, Serializer};

use crate::traits::Flags;

/// Renders `value` as comma-separated member names.
///
/// Returns `None` when some set bit belongs to no member.
pub fn to_names<F: Flags>(value: F) -> Option<String> {
    let bits = value.bits();
    if bits == 0 {
        return F::MEMBERS
            .iter()
            .find(|(_, v)| *v == 0)
            .map(|(name, _)| name.to_string());
    }

    let mut covered = 0;
    let mut names = Vec::new();
    for (name, member) in F::MEMBERS {
        if *member != 0 && bits & member == *member && covered & member != *member {
            covered |= member;
            names.push(*name);
        }
    }

    (covered == bits).then(|| names.join(","))
}

/// Parses comma-separated member names or a number.
pub fn from_names<F: Flags>(text: &str) -> Result<F, String> {
    let text = text.trim();
    if let Ok(bits) = text.parse::<i64>() {
        return Ok(F::from_bits(bits));
    }

    let mut bits = 0;
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (_, value) = F::MEMBERS
            .iter()
            .find(|(name, _)| *name == part)
            .ok_or_else(|| format!("unknown flag member '{part}'"))?;
        bits |= value;
    }
    Ok(F::from_bits(bits))
}

pub fn serialize<F, S>(value: &F, serializer: S) -> Result<S::Ok, S::Error>
where
    F: Flags,
    S: Serializer,
{
    match to_names(*value) {
        Some(names) => serializer.serialize_str(&names),
        None => serializer.serialize_i64(value.bits()),
    }
}

pub fn deserialize<'de, F, D>(deserializer: D) -> Result<F, D::Error>
where
    F: Flags,
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(FlagsVisitor(std::marker::PhantomData))
}

struct FlagsVisitor<F>(std::marker::PhantomData<F>);

impl<F: Flags> Visitor<'_> for FlagsVisitor<F> {
    type Value = F;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("comma-separated flag names or an integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<F, E> {
        from_names(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<F, E> {
        Ok(F::from_bits(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<F, E> {
        i64::try_from(v)
            .map(F::from_bits)
            .map_err(|_| E::custom(format!("flags value {v} out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Access(i32);

    impl Flags for Access {
        const MEMBERS: &'static [(&'static str, i64)] =
            &[("None", 0), ("Read", 1), ("Write", 2), ("ReadWrite", 3), ("Delete", 4)];

        fn bits(self) -> i64 {
            i64::from(self.0)
        }

        fn from_bits(bits: i64) -> Self {
            Self(bits as i32)
        }
    }

    impl ::serde::Serialize for Access {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            super::serialize(self, serializer)
        }
    }

    impl<'de> ::serde::Deserialize<'de> for Access {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            super::deserialize(deserializer)
        }
    }

    #[test]
    fn names_follow_member_order() {
        assert_eq!(to_names(Access(5)).as_deref(), Some("Read,Delete"));
        assert_eq!(to_names(Access(7)).as_deref(), Some("Read,Write,Delete"));
    }

    #[test]
    fn zero_uses_zero_member() {
        assert_eq!(to_names(Access(0)).as_deref(), Some("None"));
    }

    #[test]
    fn uncovered_bits_have_no_names() {
        assert_eq!(to_names(Access(9)), None);
    }

    #[test]
    fn serializes_names_or_number() {
        assert_eq!(serde_json::to_string(&Access(3)).unwrap(), "\"Read,Write\"");
        assert_eq!(serde_json::to_string(&Access(16)).unwrap(), "16");
    }

    #[test]
    fn deserializes_names_numbers_and_numeric_strings() {
        let names: Access = serde_json::from_str("\"Read, Delete\"").unwrap();
        assert_eq!(names, Access(5));

        let number: Access = serde_json::from_str("6").unwrap();
        assert_eq!(number, Access(6));

        let numeric: Access = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(numeric, Access(2));
    }

    #[test]
    fn unknown_member_is_an_error() {
        let err = serde_json::from_str::<Access>("\"Read,Execute\"").unwrap_err();
        assert!(err.to_string().contains("Execute"));
    }
}
