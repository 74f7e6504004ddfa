//! EDM type reference to Rust type mapping.
//!
//! [`map_type`] turns a schema [`TypeRef`] into a [`MappedType`]: a small
//! Rust type IR plus a cardinality flag telling callers whether the value is
//! a sequence. Mapping never fails; unknown primitive names are passed
//! through as paths.
//!
//! | EDM                         | Rust                                     |
//! |-----------------------------|------------------------------------------|
//! | `Edm.Binary`                | `Vec<u8>`                                |
//! | `Edm.Duration`              | `::std::time::Duration`                  |
//! | `Edm.Int32`, `Edm.Double`.. | `i32`, `f64`, ...                        |
//! | `Edm.String`                | `::std::string::String`                  |
//! | `Edm.Guid`                  | `::odata_client::Guid`                   |
//! | `Edm.Date`                  | `::odata_client::chrono::NaiveDate`      |
//! | `Edm.DateTimeOffset`        | `::odata_client::chrono::DateTime<FixedOffset>` |
//! | spatial, stream, untyped    | `::odata_client::serde_json::Value`      |
//! | `NS.Type`                   | `<module root>::ns::Type`                |
//! | `Collection(T)`             | `Vec<T>`                                 |
//!
//! Nullable references become `Option<T>`, except strings and byte
//! sequences (which use their empty value) and collections (which use the
//! empty vector).

use std::fmt;

use odata_define::{PrimitiveKind, QualifiedName, TypeDefinition, TypeRef};
use proc_macro2::{Ident, Span, TokenStream};
use quote::{ToTokens, quote};

use crate::config::GeneratorConfig;
use crate::errors::ConfigError;
use crate::naming;

/// Whether a mapped type holds one value or a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Many,
}

/// A Rust type as emitted by the generator.
///
/// Standard library and runtime types are written as global paths
/// (`::std::string::String`, `::odata_client::Guid`) because every
/// declaration of a namespace shares one module, where a schema type named
/// `Option` or `String` would shadow the prelude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RustType {
    /// A path with optional generic arguments, e.g. `i32` or `a::b::C<D>`.
    Path {
        /// Rendered with a leading `::`.
        global: bool,
        segments: Vec<String>,
        generics: Vec<RustType>,
    },
    /// `Option<T>`
    Option(Box<RustType>),
    /// `Vec<T>`
    Vec(Box<RustType>),
    /// `Box<T>`
    Boxed(Box<RustType>),
}

impl RustType {
    /// A relative path type from `::`-free segments.
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Path {
            global: false,
            segments: segments.into_iter().map(Into::into).collect(),
            generics: Vec::new(),
        }
    }

    /// A global path type, rendered as `::a::b::C`.
    pub fn global<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Path {
            global: true,
            segments: segments.into_iter().map(Into::into).collect(),
            generics: Vec::new(),
        }
    }

    /// The same path with generic arguments. Other types are returned as is.
    pub fn with_generics(self, arguments: Vec<RustType>) -> Self {
        match self {
            Self::Path {
                global, segments, ..
            } => Self::Path {
                global,
                segments,
                generics: arguments,
            },
            other => other,
        }
    }

    /// `::std::string::String`
    pub fn string() -> Self {
        Self::global(["std", "string", "String"])
    }

    /// `Vec<u8>`, the byte sequence type.
    pub fn bytes() -> Self {
        Self::Vec(Box::new(Self::path(["u8"])))
    }

    pub fn is_string(&self) -> bool {
        *self == Self::string()
    }

    pub fn is_bytes(&self) -> bool {
        *self == Self::bytes()
    }

    pub fn is_option(&self) -> bool {
        matches!(self, Self::Option(_))
    }

    /// The type without an outer `Option`.
    pub fn unwrap_option(&self) -> &RustType {
        match self {
            Self::Option(inner) => inner,
            other => other,
        }
    }

    /// Element type of a `Vec`, or the type itself.
    pub fn element(&self) -> &RustType {
        match self {
            Self::Vec(inner) => inner,
            other => other,
        }
    }

    /// Boxes the value inside an outer `Option`, or the type itself.
    pub fn boxed(self) -> Self {
        match self {
            Self::Option(inner) => Self::Option(Box::new(Self::Boxed(inner))),
            other => Self::Boxed(Box::new(other)),
        }
    }
}

impl ToTokens for RustType {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            Self::Path {
                global,
                segments,
                generics,
            } => {
                let leading = global.then(|| quote!(::));
                let idents = segments.iter().map(|s| Ident::new(s, Span::call_site()));
                let path = quote! { #leading #(#idents)::* };
                if generics.is_empty() {
                    path.to_tokens(tokens);
                } else {
                    quote! { #path<#(#generics),*> }.to_tokens(tokens);
                }
            }
            Self::Option(inner) => quote! { ::core::option::Option<#inner> }.to_tokens(tokens),
            Self::Vec(inner) => quote! { ::std::vec::Vec<#inner> }.to_tokens(tokens),
            Self::Boxed(inner) => quote! { ::std::boxed::Box<#inner> }.to_tokens(tokens),
        }
    }
}

impl fmt::Display for RustType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path {
                global,
                segments,
                generics,
            } => {
                if *global {
                    f.write_str("::")?;
                }
                f.write_str(&segments.join("::"))?;
                if !generics.is_empty() {
                    f.write_str("<")?;
                    for (i, generic) in generics.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{generic}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Option(inner) => write!(f, "::core::option::Option<{inner}>"),
            Self::Vec(inner) => write!(f, "::std::vec::Vec<{inner}>"),
            Self::Boxed(inner) => write!(f, "::std::boxed::Box<{inner}>"),
        }
    }
}

/// Result of mapping a type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub ty: RustType,
    pub cardinality: Cardinality,
}

impl MappedType {
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

/// Where named schema types live in the generated module tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingContext {
    module_root: Vec<String>,
}

impl Default for MappingContext {
    fn default() -> Self {
        Self {
            module_root: vec!["crate".to_string()],
        }
    }
}

impl MappingContext {
    pub fn new(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            module_root: config.module_root_segments()?,
        })
    }

    /// Path of the generated declaration for a named schema type.
    pub fn type_path(&self, name: &QualifiedName) -> RustType {
        let segments = self
            .module_root
            .iter()
            .cloned()
            .chain(naming::namespace_segments(&name.namespace))
            .chain(std::iter::once(naming::type_name(&name.name)));
        RustType::path(segments)
    }
}

fn chrono(name: &str) -> RustType {
    RustType::global(["odata_client", "chrono", name])
}

fn json_value() -> RustType {
    RustType::global(["odata_client", "serde_json", "Value"])
}

fn map_primitive(kind: &PrimitiveKind) -> RustType {
    match kind {
        PrimitiveKind::Binary => RustType::bytes(),
        PrimitiveKind::Duration => RustType::global(["std", "time", "Duration"]),
        PrimitiveKind::Boolean => RustType::path(["bool"]),
        PrimitiveKind::Byte => RustType::path(["u8"]),
        PrimitiveKind::SByte => RustType::path(["i8"]),
        PrimitiveKind::Int16 => RustType::path(["i16"]),
        PrimitiveKind::Int32 => RustType::path(["i32"]),
        PrimitiveKind::Int64 => RustType::path(["i64"]),
        PrimitiveKind::Single => RustType::path(["f32"]),
        PrimitiveKind::Double | PrimitiveKind::Decimal => RustType::path(["f64"]),
        PrimitiveKind::String => RustType::string(),
        PrimitiveKind::Guid => RustType::global(["odata_client", "Guid"]),
        PrimitiveKind::Date => chrono("NaiveDate"),
        PrimitiveKind::TimeOfDay => chrono("NaiveTime"),
        PrimitiveKind::DateTimeOffset => {
            chrono("DateTime").with_generics(vec![chrono("FixedOffset")])
        }
        PrimitiveKind::Spatial(_)
        | PrimitiveKind::Stream
        | PrimitiveKind::Untyped
        | PrimitiveKind::PrimitiveType => json_value(),
        PrimitiveKind::Other(name) => {
            RustType::path(name.split('.').filter(|s| !s.is_empty()).map(naming::sanitize))
        }
    }
}

/// Maps a schema type reference to its Rust type.
///
/// ## Examples
///
/// ```
/// use odata_define::{PrimitiveKind, TypeRef};
/// use odata_gen::mapping::{Cardinality, MappingContext, map_type};
///
/// let ctx = MappingContext::default();
///
/// let age = map_type(&TypeRef::primitive(PrimitiveKind::Int32).nullable(), &ctx);
/// assert_eq!(age.ty.to_string(), "::core::option::Option<i32>");
///
/// let name = map_type(&TypeRef::primitive(PrimitiveKind::String).nullable(), &ctx);
/// assert_eq!(name.ty.to_string(), "::std::string::String");
///
/// let tags = map_type(&TypeRef::collection(TypeRef::primitive(PrimitiveKind::Int64)), &ctx);
/// assert_eq!(tags.ty.to_string(), "::std::vec::Vec<i64>");
/// assert_eq!(tags.cardinality, Cardinality::Many);
/// ```
pub fn map_type(type_ref: &TypeRef, ctx: &MappingContext) -> MappedType {
    let (ty, cardinality) = match &type_ref.definition {
        TypeDefinition::Collection(element) => {
            let element = map_type(element, ctx);
            return MappedType {
                ty: RustType::Vec(Box::new(element.ty)),
                cardinality: Cardinality::Many,
            };
        }
        TypeDefinition::Primitive(kind) => (map_primitive(kind), Cardinality::Single),
        TypeDefinition::Named(named) => (ctx.type_path(&named.name), Cardinality::Single),
    };

    let ty = if type_ref.nullable && !ty.is_string() && !ty.is_bytes() {
        RustType::Option(Box::new(ty))
    } else {
        ty
    };

    MappedType { ty, cardinality }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_define::NamedKind;

    fn map(type_ref: TypeRef) -> MappedType {
        map_type(&type_ref, &MappingContext::default())
    }

    fn parses_as_type(ty: &RustType) -> bool {
        syn::parse2::<syn::Type>(quote!(#ty)).is_ok()
    }

    #[test]
    fn nullable_string_has_no_option() {
        let mapped = map(TypeRef::primitive(PrimitiveKind::String).nullable());
        assert_eq!(mapped.ty.to_string(), "::std::string::String");
        assert_eq!(mapped.cardinality, Cardinality::Single);
    }

    #[test]
    fn nullable_int_is_option() {
        let mapped = map(TypeRef::primitive(PrimitiveKind::Int32).nullable());
        assert_eq!(mapped.ty.to_string(), "::core::option::Option<i32>");
        assert!(mapped.ty.is_option());
    }

    #[test]
    fn binary_is_bytes_regardless_of_nullability() {
        assert_eq!(map(TypeRef::primitive(PrimitiveKind::Binary)).ty.to_string(), "::std::vec::Vec<u8>");
        assert_eq!(
            map(TypeRef::primitive(PrimitiveKind::Binary).nullable()).ty.to_string(),
            "::std::vec::Vec<u8>"
        );
    }

    #[test]
    fn duration_is_time_span() {
        assert_eq!(
            map(TypeRef::primitive(PrimitiveKind::Duration)).ty.to_string(),
            "::std::time::Duration"
        );
        assert_eq!(
            map(TypeRef::primitive(PrimitiveKind::Duration).nullable()).ty.to_string(),
            "::core::option::Option<::std::time::Duration>"
        );
    }

    #[test]
    fn guid_maps_to_runtime_guid() {
        assert_eq!(map(TypeRef::primitive(PrimitiveKind::Guid)).ty.to_string(), "::odata_client::Guid");
        assert!(map(TypeRef::primitive(PrimitiveKind::Guid).nullable()).ty.is_option());
    }

    #[test]
    fn date_time_offset_uses_chrono() {
        let mapped = map(TypeRef::primitive(PrimitiveKind::DateTimeOffset));
        assert_eq!(
            mapped.ty.to_string(),
            "::odata_client::chrono::DateTime<::odata_client::chrono::FixedOffset>"
        );
        assert!(parses_as_type(&mapped.ty));
    }

    #[test]
    fn spatial_maps_to_json_value() {
        let mapped = map(TypeRef::primitive(PrimitiveKind::Spatial("GeographyPoint".into())));
        assert_eq!(mapped.ty.to_string(), "::odata_client::serde_json::Value");
    }

    #[test]
    fn unknown_primitive_is_passed_through() {
        let mapped = map(TypeRef::primitive(PrimitiveKind::Other("Frobnicator".into())));
        assert_eq!(mapped.ty.to_string(), "Frobnicator");
    }

    #[test]
    fn named_types_use_module_root_and_namespace() {
        let config = GeneratorConfig {
            module_root: "crate::odata".to_string(),
            ..Default::default()
        };
        let ctx = MappingContext::new(&config).unwrap();
        let person = TypeRef::named(QualifiedName::new("Trippin.Models", "Person"), NamedKind::Entity);

        assert_eq!(
            map_type(&person, &ctx).ty.to_string(),
            "crate::odata::trippin::models::Person"
        );
        assert_eq!(
            map_type(&person.nullable(), &ctx).ty.to_string(),
            "::core::option::Option<crate::odata::trippin::models::Person>"
        );
    }

    #[test]
    fn collection_of_named_type_is_many() {
        let foo = TypeRef::named(QualifiedName::new("NS", "Foo"), NamedKind::Complex);
        let mapped = map(TypeRef::collection(foo));

        assert_eq!(mapped.ty.to_string(), "::std::vec::Vec<crate::ns::Foo>");
        assert_eq!(mapped.cardinality, Cardinality::Many);
        assert_eq!(mapped.ty.element().to_string(), "crate::ns::Foo");
    }

    #[test]
    fn nullable_collection_is_never_option() {
        let mapped = map(TypeRef::collection(TypeRef::primitive(PrimitiveKind::Int32).nullable()).nullable());
        assert_eq!(mapped.ty.to_string(), "::std::vec::Vec<::core::option::Option<i32>>");
        assert!(mapped.is_many());
    }

    #[test]
    fn prelude_types_render_as_global_paths() {
        let nested = map(TypeRef::collection(TypeRef::primitive(PrimitiveKind::String)));
        let ty = nested.ty;
        let rendered = quote!(#ty).to_string().replace(' ', "");
        assert_eq!(rendered, "::std::vec::Vec<::std::string::String>");
        assert!(parses_as_type(&ty));
    }

    #[test]
    fn boxed_keeps_outer_option() {
        let node = map(TypeRef::named(QualifiedName::new("NS", "Node"), NamedKind::Complex).nullable());
        assert_eq!(
            node.ty.boxed().to_string(),
            "::core::option::Option<::std::boxed::Box<crate::ns::Node>>"
        );
    }

    #[test]
    fn shadowing_type_names_are_escaped() {
        let named = TypeRef::named(QualifiedName::new("Shop", "u8"), NamedKind::Complex);
        assert_eq!(map(named).ty.to_string(), "crate::shop::u8_");
    }

    #[test]
    fn unwrap_option_strips_one_layer() {
        let ty = RustType::Option(Box::new(RustType::path(["i32"])));
        assert_eq!(ty.unwrap_option().to_string(), "i32");
        assert_eq!(RustType::path(["i32"]).unwrap_option().to_string(), "i32");
    }
}
