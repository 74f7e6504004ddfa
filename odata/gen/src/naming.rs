//! Identifier rules for generated code.
//!
//! Schema names are arbitrary strings; generated code needs valid Rust
//! identifiers. Names are sanitized (invalid characters become `_`), and
//! names that collide with a Rust keyword get a trailing `_`. Type and
//! module names additionally avoid the primitive type names, which an item
//! of the same name would shadow.

use proc_macro2::{Ident, Span};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

const PRIMITIVE_TYPES: &[&str] = &[
    "bool", "char", "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "str", "u8", "u16",
    "u32", "u64", "u128", "usize",
];

/// Upper-cases the first character of a name.
///
/// ## Examples
///
/// ```
/// use odata_gen::naming::title_case;
///
/// assert_eq!(title_case("firstName"), "FirstName");
/// assert_eq!(title_case("ID"), "ID");
/// assert_eq!(title_case(""), "");
/// ```
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Makes `name` usable as a Rust identifier.
///
/// ## Examples
///
/// ```
/// use odata_gen::naming::sanitize;
///
/// assert_eq!(sanitize("Order-Line"), "Order_Line");
/// assert_eq!(sanitize("1stPlace"), "_1stPlace");
/// assert_eq!(sanitize("type"), "type_");
/// ```
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || (!c.is_ascii() && c.is_alphabetic()) {
                c
            } else {
                '_'
            }
        })
        .collect();

    match out.chars().next() {
        None => out.push('_'),
        Some(first) if first.is_ascii_digit() => out.insert(0, '_'),
        Some(_) => {}
    }

    if out == "_" || KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// Identifier for a type, method or parameter name.
pub fn ident(name: &str) -> Ident {
    Ident::new(&sanitize(name), Span::call_site())
}

/// Sanitized name of a generated type or module.
///
/// ## Examples
///
/// ```
/// use odata_gen::naming::type_name;
///
/// assert_eq!(type_name("Person"), "Person");
/// assert_eq!(type_name("u8"), "u8_");
/// ```
pub fn type_name(name: &str) -> String {
    let mut out = sanitize(name);
    if PRIMITIVE_TYPES.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// Identifier for a generated type.
pub fn type_ident(name: &str) -> Ident {
    Ident::new(&type_name(name), Span::call_site())
}

/// Identifier for a struct field generated from a property name.
pub fn field_ident(property: &str) -> Ident {
    ident(&title_case(property))
}

/// Module path segments for a dotted schema namespace.
///
/// ## Examples
///
/// ```
/// use odata_gen::naming::namespace_segments;
///
/// assert_eq!(namespace_segments("Trippin.Models"), vec!["trippin", "models"]);
/// assert_eq!(namespace_segments("My.Crate"), vec!["my", "crate_"]);
/// ```
pub fn namespace_segments(namespace: &str) -> Vec<String> {
    namespace
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| type_name(&segment.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_handles_unicode() {
        assert_eq!(title_case("ärger"), "Ärger");
        assert_eq!(title_case("x"), "X");
    }

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize("Name.With Spaces"), "Name_With_Spaces");
        assert_eq!(sanitize(""), "__");
    }

    #[test]
    fn sanitize_escapes_keywords() {
        assert_eq!(sanitize("Self"), "Self_");
        assert_eq!(sanitize("match"), "match_");
        assert_eq!(sanitize("Match"), "Match");
    }

    #[test]
    fn field_ident_title_cases_before_sanitizing() {
        assert_eq!(field_ident("self").to_string(), "Self_");
        assert_eq!(field_ident("userName").to_string(), "UserName");
    }

    #[test]
    fn namespace_segments_skip_empty_parts() {
        assert_eq!(namespace_segments("A..B"), vec!["a", "b"]);
    }

    #[test]
    fn type_names_avoid_primitive_types() {
        assert_eq!(type_ident("bool").to_string(), "bool_");
        assert_eq!(type_ident("Option").to_string(), "Option");
        assert_eq!(namespace_segments("Shop.I32"), vec!["shop", "i32_"]);
        assert_eq!(ident("bool").to_string(), "bool");
    }
}
