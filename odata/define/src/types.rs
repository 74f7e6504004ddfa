//! Schema elements of an Entity Data Model.
//!
//! This module provides the read-only model the generator walks:
//!
//! - [`SchemaModel`] - The parsed document
//! - [`SchemaElement`] - One top-level schema item
//! - [`EnumType`], [`ComplexType`], [`EntityType`], [`EntityContainer`], [`FunctionImport`]

use strum::{Display, EnumString, IntoStaticStr};

use crate::type_ref::{QualifiedName, TypeRef};

/// Kinds of top-level schema items.
///
/// ## Examples
///
/// ```
/// use odata_define::ElementKind;
///
/// assert_eq!(ElementKind::EntityContainer.to_string(), "EntityContainer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ElementKind {
    EnumType,
    ComplexType,
    EntityType,
    EntityContainer,
    Function,
    Action,
    TypeDefinition,
    Term,
}

/// A parsed metadata document.
///
/// Elements from every `<Schema>` block are flattened into one sequence,
/// keeping document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaModel {
    pub elements: Vec<SchemaElement>,
}

impl SchemaModel {
    /// Creates a model from its elements.
    pub fn new(elements: Vec<SchemaElement>) -> Self {
        Self { elements }
    }

    /// All functions declared in the document, bound or not.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionImport> {
        self.elements.iter().filter_map(|element| match element {
            SchemaElement::Function(function) => Some(function),
            _ => None,
        })
    }
}

/// One top-level schema item.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaElement {
    EnumType(EnumType),
    ComplexType(ComplexType),
    EntityType(EntityType),
    EntityContainer(EntityContainer),
    Function(FunctionImport),
    /// A recognised CSDL item the generator does not turn into code.
    Other(OtherElement),
}

impl SchemaElement {
    /// The namespace the element is declared in.
    pub fn namespace(&self) -> &str {
        match self {
            Self::EnumType(e) => &e.namespace,
            Self::ComplexType(c) => &c.namespace,
            Self::EntityType(e) => &e.namespace,
            Self::EntityContainer(c) => &c.namespace,
            Self::Function(f) => &f.namespace,
            Self::Other(o) => &o.namespace,
        }
    }

    /// The element's simple name.
    pub fn name(&self) -> &str {
        match self {
            Self::EnumType(e) => &e.name,
            Self::ComplexType(c) => &c.name,
            Self::EntityType(e) => &e.name,
            Self::EntityContainer(c) => &c.name,
            Self::Function(f) => &f.name,
            Self::Other(o) => &o.name,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::EnumType(_) => ElementKind::EnumType,
            Self::ComplexType(_) => ElementKind::ComplexType,
            Self::EntityType(_) => ElementKind::EntityType,
            Self::EntityContainer(_) => ElementKind::EntityContainer,
            Self::Function(_) => ElementKind::Function,
            Self::Other(o) => o.kind,
        }
    }

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.namespace(), self.name())
    }
}

/// An enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub namespace: String,
    pub name: String,
    /// `IsFlags="true"`: members combine bitwise.
    pub is_flags: bool,
    /// Underlying integer type (`Edm.Int32` unless declared otherwise).
    pub underlying: crate::type_ref::PrimitiveKind,
    /// Members in declaration order.
    pub members: Vec<EnumMember>,
}

/// An enumeration member with its explicit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// A declared structural or navigation property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Wire name as declared in the schema.
    pub name: String,
    pub ty: TypeRef,
    /// Part of the entity key.
    pub is_key: bool,
    /// Declared as `<NavigationProperty>`.
    pub is_navigation: bool,
}

impl Property {
    /// A plain structural property.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_key: false,
            is_navigation: false,
        }
    }

    /// Marks the property as a key property.
    #[must_use]
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    /// Marks the property as a navigation property.
    #[must_use]
    pub fn navigation(mut self) -> Self {
        self.is_navigation = true;
        self
    }
}

/// A complex (keyless structural) type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    pub namespace: String,
    pub name: String,
    pub properties: Vec<Property>,
}

/// A reference to an entity type, resolved against the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralRef {
    pub name: QualifiedName,
    /// Whether the referenced type is open. `false` when unresolved.
    pub is_open: bool,
}

/// An entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    pub namespace: String,
    pub name: String,
    pub base_type: Option<StructuralRef>,
    /// Accepts undeclared (dynamic) properties.
    pub is_open: bool,
    pub is_abstract: bool,
    /// Declared properties (structural first, then navigation), excluding inherited ones.
    pub properties: Vec<Property>,
}

impl EntityType {
    /// Declared key properties in declaration order.
    pub fn key_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_key)
    }
}

/// A named entity set inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySet {
    pub name: String,
    pub entity_type: StructuralRef,
}

/// An entity container: the service's root surface.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityContainer {
    pub namespace: String,
    pub name: String,
    pub entity_sets: Vec<EntitySet>,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

/// A schema function.
///
/// Only unbound functions take part in facade generation.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionImport {
    pub namespace: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    pub is_bound: bool,
}

/// A schema item the generator recognises but does not emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherElement {
    pub namespace: String,
    pub name: String,
    pub kind: ElementKind,
}
