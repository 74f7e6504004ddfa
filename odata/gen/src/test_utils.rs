//! Shared test utilities for odata-gen tests.
//!
//! Small builders for schema elements so individual tests only spell out the
//! parts they care about.

use odata_define::{
    ComplexType, EntityType, EnumMember, EnumType, FunctionImport, NamedKind, Parameter,
    PrimitiveKind, Property, QualifiedName, TypeRef,
};
use proc_macro2::TokenStream;

/// Creates a non-flags `Int32` enum.
pub fn make_enum(namespace: &str, name: &str, members: &[(&str, i64)]) -> EnumType {
    EnumType {
        namespace: namespace.to_string(),
        name: name.to_string(),
        is_flags: false,
        underlying: PrimitiveKind::Int32,
        members: members
            .iter()
            .map(|(name, value)| EnumMember {
                name: name.to_string(),
                value: *value,
            })
            .collect(),
    }
}

pub fn make_complex(namespace: &str, name: &str, properties: Vec<Property>) -> ComplexType {
    ComplexType {
        namespace: namespace.to_string(),
        name: name.to_string(),
        properties,
    }
}

/// Creates a closed, concrete entity type without a base.
pub fn make_entity(namespace: &str, name: &str, properties: Vec<Property>) -> EntityType {
    EntityType {
        namespace: namespace.to_string(),
        name: name.to_string(),
        base_type: None,
        is_open: false,
        is_abstract: false,
        properties,
    }
}

/// Creates an unbound function in namespace `Demo`.
pub fn make_function(name: &str, parameters: Vec<Parameter>, return_type: TypeRef) -> FunctionImport {
    FunctionImport {
        namespace: "Demo".to_string(),
        name: name.to_string(),
        parameters,
        return_type,
        is_bound: false,
    }
}

pub fn prop(name: &str, ty: TypeRef) -> Property {
    Property::new(name, ty)
}

pub fn nav(name: &str, ty: TypeRef) -> Property {
    Property::new(name, ty).navigation()
}

pub fn named(namespace: &str, name: &str, kind: NamedKind) -> TypeRef {
    TypeRef::named(QualifiedName::new(namespace, name), kind)
}

/// Validates that generated code is syntactically correct.
///
/// ## Errors
///
/// Returns an error string if the generated code fails to parse.
pub fn validate_generated_code(tokens: &TokenStream) -> Result<(), String> {
    syn::parse2::<syn::File>(tokens.clone()).map_err(|e| e.to_string())?;
    Ok(())
}

/// Formats generated code using prettyplease.
///
/// ## Errors
///
/// Returns an error string if the code fails to parse.
pub fn format_generated_code(tokens: &TokenStream) -> Result<String, String> {
    let file = syn::parse2::<syn::File>(tokens.clone()).map_err(|e| e.to_string())?;
    Ok(prettyplease::unparse(&file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_enum_keeps_member_order() {
        let color = make_enum("Demo", "Color", &[("Red", 0), ("Blue", 4)]);
        let names: Vec<_> = color.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Red", "Blue"]);
    }

    #[test]
    fn nav_marks_navigation() {
        let friends = nav("Friends", TypeRef::collection(named("Demo", "Person", NamedKind::Entity)));
        assert!(friends.is_navigation);
        assert!(!friends.is_key);
    }
}
