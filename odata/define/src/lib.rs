//! OData Entity Data Model definitions.
//!
//! This crate provides the in-memory schema model that the `odata-gen`
//! code generator walks, plus a CSDL (XML) parser that produces it from a
//! service's `$metadata` document.
//!
//! ## Core Types
//!
//! - [`SchemaModel`] - All schema elements of one metadata document, in document order
//! - [`SchemaElement`] - Closed sum type over enums, complex types, entity types,
//!   entity containers, functions and other (unsupported) items
//! - [`TypeRef`] - A type reference: primitive, named structural type or collection
//! - [`PrimitiveKind`] - The `Edm.*` primitive types
//! - [`QualifiedName`] - A `Namespace.Name` pair
//!
//! ## Examples
//!
//! Parse a metadata document and inspect its elements:
//!
//! ```
//! use odata_define::{csdl, SchemaElement};
//!
//! let xml = r#"<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
//!   <edmx:DataServices>
//!     <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="Demo">
//!       <EnumType Name="Color">
//!         <Member Name="Red" Value="0"/>
//!         <Member Name="Blue" Value="4"/>
//!       </EnumType>
//!     </Schema>
//!   </edmx:DataServices>
//! </edmx:Edmx>"#;
//!
//! let model = csdl::parse(xml).unwrap();
//! assert_eq!(model.elements.len(), 1);
//! assert!(matches!(&model.elements[0], SchemaElement::EnumType(e) if e.name == "Color"));
//! ```

pub mod csdl;
pub mod type_ref;
pub mod types;

// Re-export main types at crate root
pub use csdl::ParseError;
pub use type_ref::{NamedKind, NamedType, PrimitiveKind, QualifiedName, TypeDefinition, TypeRef};
pub use types::{
    ComplexType, ElementKind, EntityContainer, EntitySet, EntityType, EnumMember, EnumType,
    FunctionImport, OtherElement, Parameter, Property, SchemaElement, SchemaModel, StructuralRef,
};
