//! Type references used by properties, parameters and return types.
//!
//! A [`TypeRef`] pairs a [`TypeDefinition`] with its nullability, mirroring
//! the CSDL `Type="…"` / `Nullable="…"` attribute pair.

use std::fmt;
use std::str::FromStr;

use strum::{AsRefStr, EnumString};

/// A `Namespace.Name` pair identifying a schema element.
///
/// ## Examples
///
/// ```
/// use odata_define::QualifiedName;
///
/// let name = QualifiedName::parse("Trippin.Models.Person").unwrap();
/// assert_eq!(name.namespace, "Trippin.Models");
/// assert_eq!(name.name, "Person");
/// assert_eq!(name.to_string(), "Trippin.Models.Person");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Dotted namespace (e.g., "Microsoft.OData.Service").
    pub namespace: String,
    /// Simple name within the namespace.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name from its parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Splits a dotted name at its last `.`.
    ///
    /// Returns `None` for names without a namespace part.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (namespace, name) = qualified.rsplit_once('.')?;
        if namespace.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(namespace, name))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// The `Edm.*` primitive types.
///
/// Spatial types (`Edm.GeographyPoint`, `Edm.GeometryPolygon`, ...) are kept in
/// [`PrimitiveKind::Spatial`]; anything unknown lands in [`PrimitiveKind::Other`]
/// with its name preserved.
///
/// ## Examples
///
/// ```
/// use odata_define::PrimitiveKind;
///
/// assert_eq!(PrimitiveKind::from_edm_name("Edm.Int32"), PrimitiveKind::Int32);
/// assert_eq!(PrimitiveKind::from_edm_name("Duration"), PrimitiveKind::Duration);
/// assert_eq!(
///     PrimitiveKind::from_edm_name("Edm.GeographyPoint"),
///     PrimitiveKind::Spatial("GeographyPoint".to_string())
/// );
/// assert_eq!(PrimitiveKind::Int64.to_string(), "Int64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, AsRefStr, EnumString)]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    Stream,
    String,
    TimeOfDay,
    Untyped,
    PrimitiveType,
    #[strum(disabled)]
    Spatial(String),
    #[strum(disabled)]
    Other(String),
}

impl PrimitiveKind {
    /// Resolves a primitive from its name, with or without the `Edm.` prefix.
    pub fn from_edm_name(name: &str) -> Self {
        let bare = name.strip_prefix("Edm.").unwrap_or(name);
        Self::from_str(bare).unwrap_or_else(|_| {
            if bare.starts_with("Geography") || bare.starts_with("Geometry") {
                Self::Spatial(bare.to_string())
            } else {
                Self::Other(bare.to_string())
            }
        })
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spatial(name) | Self::Other(name) => f.write_str(name),
            other => f.write_str(other.as_ref()),
        }
    }
}

/// What a named type reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKind {
    Enum,
    Complex,
    Entity,
    /// The name did not resolve to a declaration in the document.
    Unresolved,
}

/// A reference to a declared enum, complex or entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    pub name: QualifiedName,
    pub kind: NamedKind,
}

/// The shape a [`TypeRef`] points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDefinition {
    Primitive(PrimitiveKind),
    Named(NamedType),
    Collection(Box<TypeRef>),
}

/// A type reference together with its nullability.
///
/// ## Examples
///
/// ```
/// use odata_define::{PrimitiveKind, TypeRef};
///
/// let id = TypeRef::primitive(PrimitiveKind::Int32);
/// assert!(!id.nullable);
///
/// let tags = TypeRef::collection(TypeRef::primitive(PrimitiveKind::String));
/// assert!(tags.is_collection());
/// assert_eq!(tags.full_type_name(), "Collection(Edm.String)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub definition: TypeDefinition,
    pub nullable: bool,
}

impl TypeRef {
    /// A non-nullable primitive reference.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self {
            definition: TypeDefinition::Primitive(kind),
            nullable: false,
        }
    }

    /// A non-nullable reference to a declared type.
    pub fn named(name: QualifiedName, kind: NamedKind) -> Self {
        Self {
            definition: TypeDefinition::Named(NamedType { name, kind }),
            nullable: false,
        }
    }

    /// A collection of `element`.
    pub fn collection(element: TypeRef) -> Self {
        Self {
            definition: TypeDefinition::Collection(Box::new(element)),
            nullable: false,
        }
    }

    /// Returns the same reference marked nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns `true` for `Collection(...)` references.
    pub fn is_collection(&self) -> bool {
        matches!(self.definition, TypeDefinition::Collection(_))
    }

    /// Returns the primitive kind, if this is a primitive reference.
    pub fn as_primitive(&self) -> Option<&PrimitiveKind> {
        match &self.definition {
            TypeDefinition::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// The CSDL spelling of the type (e.g., `Collection(Edm.String)`).
    pub fn full_type_name(&self) -> String {
        match &self.definition {
            TypeDefinition::Primitive(kind) => format!("Edm.{kind}"),
            TypeDefinition::Named(named) => named.name.to_string(),
            TypeDefinition::Collection(element) => {
                format!("Collection({})", element.full_type_name())
            }
        }
    }
}
