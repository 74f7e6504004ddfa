//! Traits implemented by generated types.

use std::collections::BTreeMap;

use serde_json::Value;

/// A generated struct for a complex or entity type.
pub trait Structured {
    /// Wire names of the declared properties, including inherited ones.
    fn declared_properties() -> Vec<&'static str>;
}

/// A structured type that accepts undeclared properties.
///
/// Dynamic properties are not part of the serde representation; a
/// [`crate::BoundClient`] created with `with_properties()` fills them from the
/// payload after deserializing the declared ones.
pub trait OpenType: Structured {
    fn dynamic_properties(&self) -> &BTreeMap<String, Value>;

    fn dynamic_properties_mut(&mut self) -> &mut BTreeMap<String, Value>;
}

/// An entity type and its key properties, in declaration order.
///
/// Derived entity types report their base type's keys.
pub trait EntityKey {
    const KEY_PROPERTIES: &'static [&'static str];
}

/// A flags enum: a bit set over named members.
pub trait Flags: Copy + 'static {
    /// Wire names and values of the members, in declaration order.
    const MEMBERS: &'static [(&'static str, i64)];

    fn bits(self) -> i64;

    fn from_bits(bits: i64) -> Self;
}
