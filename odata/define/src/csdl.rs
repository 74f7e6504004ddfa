//! CSDL (XML) parsing.
//!
//! Reads an OData v4 `$metadata` document (`edmx:Edmx/edmx:DataServices/Schema`)
//! into a [`SchemaModel`]. The document is first read into a small element
//! tree with `quick-xml` (namespace prefixes dropped, local names only), then
//! walked schema by schema.
//!
//! ## Supported items
//!
//! | CSDL element        | Model                              |
//! |---------------------|------------------------------------|
//! | `EnumType`          | [`SchemaElement::EnumType`]        |
//! | `ComplexType`       | [`SchemaElement::ComplexType`]     |
//! | `EntityType`        | [`SchemaElement::EntityType`]      |
//! | `EntityContainer`   | [`SchemaElement::EntityContainer`] |
//! | `Function`          | [`SchemaElement::Function`]        |
//! | `Action`, `TypeDefinition`, `Term` | [`SchemaElement::Other`] |
//!
//! Alias-qualified names (`Self.Person`, `NS.Person` through `Alias="NS"`) are
//! resolved to the declaring namespace. `TypeDefinition` references resolve
//! to their underlying primitive type.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use tracing::debug;

use crate::type_ref::{NamedKind, PrimitiveKind, QualifiedName, TypeDefinition, TypeRef};
use crate::types::{
    ComplexType, ElementKind, EntityContainer, EntitySet, EntityType, EnumMember, EnumType,
    FunctionImport, OtherElement, Parameter, Property, SchemaElement, SchemaModel, StructuralRef,
};

/// Upper bound on base-type chains followed when resolving openness.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Errors that can occur while parsing a metadata document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// The document has no `<Schema>` element anywhere.
    #[error("Document contains no <Schema> elements")]
    NoSchema,

    /// A required attribute is absent.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// A required child element is absent.
    #[error("<{element}> '{name}' is missing required <{child}>")]
    MissingElement {
        element: String,
        name: String,
        child: String,
    },

    /// An attribute value could not be interpreted.
    #[error("Invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidValue {
        element: String,
        attribute: String,
        value: String,
    },
}

/// Parses a CSDL document into a schema model.
///
/// ## Errors
///
/// Returns a [`ParseError`] if the XML is malformed, contains no schema, or
/// an element lacks a required attribute.
pub fn parse(xml: &str) -> Result<SchemaModel, ParseError> {
    let root = read_tree(xml)?;

    let mut schemas = Vec::new();
    collect_schemas(&root, &mut schemas);
    if schemas.is_empty() {
        return Err(ParseError::NoSchema);
    }

    let index = TypeIndex::build(&schemas)?;

    let mut elements = Vec::new();
    for schema in &schemas {
        let namespace = schema.required("Namespace")?;
        for child in &schema.children {
            match child.name.as_str() {
                "EnumType" => elements.push(SchemaElement::EnumType(parse_enum(child, namespace)?)),
                "ComplexType" => elements.push(SchemaElement::ComplexType(parse_complex(
                    child, namespace, &index,
                )?)),
                "EntityType" => elements.push(SchemaElement::EntityType(parse_entity(
                    child, namespace, &index,
                )?)),
                "EntityContainer" => elements.push(SchemaElement::EntityContainer(
                    parse_container(child, namespace, &index)?,
                )),
                "Function" => elements.push(SchemaElement::Function(parse_function(
                    child, namespace, &index,
                )?)),
                "Action" => elements.push(other(child, namespace, ElementKind::Action)?),
                "TypeDefinition" => {
                    elements.push(other(child, namespace, ElementKind::TypeDefinition)?)
                }
                "Term" => elements.push(other(child, namespace, ElementKind::Term)?),
                ignored => debug!("Ignoring <{}> in schema {}", ignored, namespace),
            }
        }
    }

    debug!(
        "Parsed {} schema elements from {} schema(s)",
        elements.len(),
        schemas.len()
    );
    Ok(SchemaModel::new(elements))
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = quick_xml::escape::unescape(&raw)
                .map_err(|e| ParseError::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required(&self, name: &str) -> Result<&str, ParseError> {
        self.attr(name).ok_or_else(|| ParseError::MissingAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    fn bool_attr(&self, name: &str, default: bool) -> Result<bool, ParseError> {
        match self.attr(name) {
            None => Ok(default),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(ParseError::InvalidValue {
                element: self.name.clone(),
                attribute: name.to_string(),
                value: other.to_string(),
            }),
        }
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}

fn read_tree(xml: &str) -> Result<XmlNode, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| ParseError::Xml(e.to_string()))?
        {
            Event::Start(start) => stack.push(XmlNode::from_start(&start)?),
            Event::Empty(start) => {
                let node = XmlNode::from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| ParseError::Xml("document has no root element".to_string()))
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => {
            return Err(ParseError::Xml("multiple root elements".to_string()));
        }
        None => *root = Some(node),
    }
    Ok(())
}

fn collect_schemas<'a>(node: &'a XmlNode, out: &mut Vec<&'a XmlNode>) {
    if node.name == "Schema" {
        out.push(node);
        return;
    }
    for child in &node.children {
        collect_schemas(child, out);
    }
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

struct EntityInfo {
    base: Option<String>,
    open: bool,
}

/// Document-wide index of declared type names.
#[derive(Default)]
struct TypeIndex {
    aliases: HashMap<String, String>,
    kinds: HashMap<String, NamedKind>,
    definitions: HashMap<String, PrimitiveKind>,
    entities: HashMap<String, EntityInfo>,
}

impl TypeIndex {
    fn build(schemas: &[&XmlNode]) -> Result<Self, ParseError> {
        let mut index = Self::default();

        for schema in schemas {
            let namespace = schema.required("Namespace")?;
            if let Some(alias) = schema.attr("Alias") {
                index.aliases.insert(alias.to_string(), namespace.to_string());
            }
        }

        for schema in schemas {
            let namespace = schema.required("Namespace")?;
            index.aliases.insert("Self".to_string(), namespace.to_string());

            for child in &schema.children {
                let Some(name) = child.attr("Name") else {
                    continue;
                };
                let qualified = format!("{namespace}.{name}");
                match child.name.as_str() {
                    "EnumType" => {
                        index.kinds.insert(qualified, NamedKind::Enum);
                    }
                    "ComplexType" => {
                        index.kinds.insert(qualified, NamedKind::Complex);
                    }
                    "EntityType" => {
                        let info = EntityInfo {
                            base: child.attr("BaseType").map(|raw| index.resolve(raw)),
                            open: child.bool_attr("OpenType", false)?,
                        };
                        index.entities.insert(qualified.clone(), info);
                        index.kinds.insert(qualified, NamedKind::Entity);
                    }
                    "TypeDefinition" => {
                        let underlying = child.required("UnderlyingType")?;
                        index
                            .definitions
                            .insert(qualified, PrimitiveKind::from_edm_name(underlying));
                    }
                    _ => {}
                }
            }
        }

        index.aliases.remove("Self");
        Ok(index)
    }

    /// Replaces an alias prefix with the namespace it stands for.
    fn resolve(&self, raw: &str) -> String {
        match raw.rsplit_once('.') {
            Some((prefix, name)) => match self.aliases.get(prefix) {
                Some(namespace) => format!("{namespace}.{name}"),
                None => raw.to_string(),
            },
            None => raw.to_string(),
        }
    }

    /// An entity type is open when declared so or when any ancestor is.
    fn is_open(&self, qualified: &str) -> bool {
        let mut current = qualified.to_string();
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let Some(info) = self.entities.get(&current) else {
                return false;
            };
            if info.open {
                return true;
            }
            match &info.base {
                Some(base) => current = base.clone(),
                None => return false,
            }
        }
        false
    }

    fn structural_ref(&self, raw: &str, namespace: &str) -> StructuralRef {
        let resolved = self.resolve(raw);
        StructuralRef {
            is_open: self.is_open(&resolved),
            name: QualifiedName::parse(&resolved)
                .unwrap_or_else(|| QualifiedName::new(namespace, resolved.clone())),
        }
    }

    /// Parses a CSDL type expression.
    ///
    /// Collections are never nullable themselves and their elements are
    /// taken as non-nullable.
    fn type_ref(&self, raw: &str, nullable: bool) -> TypeRef {
        let raw = raw.trim();
        if let Some(inner) = raw
            .strip_prefix("Collection(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return TypeRef::collection(self.type_ref(inner, false));
        }

        let definition = if raw.starts_with("Edm.") {
            TypeDefinition::Primitive(PrimitiveKind::from_edm_name(raw))
        } else {
            let resolved = self.resolve(raw);
            if let Some(kind) = self.kinds.get(&resolved) {
                TypeRef::named(
                    QualifiedName::parse(&resolved).unwrap_or_else(|| QualifiedName::new("", raw)),
                    *kind,
                )
                .definition
            } else if let Some(underlying) = self.definitions.get(&resolved) {
                TypeDefinition::Primitive(underlying.clone())
            } else {
                match QualifiedName::parse(&resolved) {
                    Some(name) => TypeRef::named(name, NamedKind::Unresolved).definition,
                    None => TypeDefinition::Primitive(PrimitiveKind::Other(raw.to_string())),
                }
            }
        };

        TypeRef {
            definition,
            nullable,
        }
    }
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

fn other(node: &XmlNode, namespace: &str, kind: ElementKind) -> Result<SchemaElement, ParseError> {
    Ok(SchemaElement::Other(OtherElement {
        namespace: namespace.to_string(),
        name: node.required("Name")?.to_string(),
        kind,
    }))
}

fn parse_enum(node: &XmlNode, namespace: &str) -> Result<EnumType, ParseError> {
    let underlying = node
        .attr("UnderlyingType")
        .map(PrimitiveKind::from_edm_name)
        .unwrap_or(PrimitiveKind::Int32);

    let mut members = Vec::new();
    let mut next_value = 0_i64;
    for member in node.children_named("Member") {
        let name = member.required("Name")?;
        let value = match member.attr("Value") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| ParseError::InvalidValue {
                element: "Member".to_string(),
                attribute: "Value".to_string(),
                value: raw.to_string(),
            })?,
            None => next_value,
        };
        next_value = value.saturating_add(1);
        members.push(EnumMember {
            name: name.to_string(),
            value,
        });
    }

    Ok(EnumType {
        namespace: namespace.to_string(),
        name: node.required("Name")?.to_string(),
        is_flags: node.bool_attr("IsFlags", false)?,
        underlying,
        members,
    })
}

fn parse_property(node: &XmlNode, index: &TypeIndex) -> Result<Property, ParseError> {
    let nullable = node.bool_attr("Nullable", true)?;
    Ok(Property::new(
        node.required("Name")?,
        index.type_ref(node.required("Type")?, nullable),
    ))
}

/// Structural properties first, then navigation properties.
fn parse_properties(node: &XmlNode, index: &TypeIndex) -> Result<Vec<Property>, ParseError> {
    let mut properties = Vec::new();
    for property in node.children_named("Property") {
        properties.push(parse_property(property, index)?);
    }
    for navigation in node.children_named("NavigationProperty") {
        properties.push(parse_property(navigation, index)?.navigation());
    }
    Ok(properties)
}

fn parse_complex(
    node: &XmlNode,
    namespace: &str,
    index: &TypeIndex,
) -> Result<ComplexType, ParseError> {
    Ok(ComplexType {
        namespace: namespace.to_string(),
        name: node.required("Name")?.to_string(),
        properties: parse_properties(node, index)?,
    })
}

fn parse_entity(
    node: &XmlNode,
    namespace: &str,
    index: &TypeIndex,
) -> Result<EntityType, ParseError> {
    let name = node.required("Name")?;
    let keys: Vec<&str> = node
        .children_named("Key")
        .flat_map(|key| key.children_named("PropertyRef"))
        .filter_map(|property_ref| property_ref.attr("Name"))
        .collect();

    let mut properties = parse_properties(node, index)?;
    for property in &mut properties {
        if !property.is_navigation && keys.contains(&property.name.as_str()) {
            property.is_key = true;
            property.ty.nullable = false;
        }
    }

    Ok(EntityType {
        namespace: namespace.to_string(),
        name: name.to_string(),
        base_type: node
            .attr("BaseType")
            .map(|raw| index.structural_ref(raw, namespace)),
        is_open: index.is_open(&format!("{namespace}.{name}")),
        is_abstract: node.bool_attr("Abstract", false)?,
        properties,
    })
}

fn parse_container(
    node: &XmlNode,
    namespace: &str,
    index: &TypeIndex,
) -> Result<EntityContainer, ParseError> {
    let mut entity_sets = Vec::new();
    for set in node.children_named("EntitySet") {
        entity_sets.push(EntitySet {
            name: set.required("Name")?.to_string(),
            entity_type: index.structural_ref(set.required("EntityType")?, namespace),
        });
    }

    Ok(EntityContainer {
        namespace: namespace.to_string(),
        name: node.required("Name")?.to_string(),
        entity_sets,
    })
}

fn parse_function(
    node: &XmlNode,
    namespace: &str,
    index: &TypeIndex,
) -> Result<FunctionImport, ParseError> {
    let name = node.required("Name")?;

    let mut parameters = Vec::new();
    for parameter in node.children_named("Parameter") {
        let nullable = parameter.bool_attr("Nullable", true)?;
        parameters.push(Parameter {
            name: parameter.required("Name")?.to_string(),
            ty: index.type_ref(parameter.required("Type")?, nullable),
        });
    }

    let return_node =
        node.children_named("ReturnType")
            .next()
            .ok_or_else(|| ParseError::MissingElement {
                element: "Function".to_string(),
                name: name.to_string(),
                child: "ReturnType".to_string(),
            })?;
    let return_type = index.type_ref(
        return_node.required("Type")?,
        return_node.bool_attr("Nullable", true)?,
    );

    Ok(FunctionImport {
        namespace: namespace.to_string(),
        name: name.to_string(),
        parameters,
        return_type,
        is_bound: node.bool_attr("IsBound", false)?,
    })
}
