//! Recursive complex types.
//!
//! A complex type may hold itself, directly or through other complex types,
//! in a single-valued structural property. Inlined as a struct field that
//! would make the struct infinitely sized, so such properties are boxed.
//! Collections and navigation properties already live on the heap.

use std::collections::{HashMap, HashSet};

use odata_define::{NamedKind, SchemaElement, TypeDefinition, TypeRef};

/// Structural properties that close a cycle of complex types.
#[derive(Debug, Default)]
pub struct RecursiveProperties {
    /// `(owner key, property name)` pairs.
    properties: HashSet<(String, String)>,
}

impl RecursiveProperties {
    /// Finds every single-valued complex property whose target type can reach
    /// the owning type again.
    pub fn analyze(elements: &[SchemaElement]) -> Self {
        let mut edges: HashMap<String, Vec<(String, String)>> = HashMap::new();
        for element in elements {
            let SchemaElement::ComplexType(complex) = element else {
                continue;
            };
            let owner = format!("{}.{}", complex.namespace, complex.name);
            let targets = edges.entry(owner).or_default();
            for property in complex.properties.iter().filter(|p| !p.is_navigation) {
                if let Some(target) = inline_complex(&property.ty) {
                    targets.push((property.name.clone(), target));
                }
            }
        }

        let mut properties = HashSet::new();
        for (owner, targets) in &edges {
            for (property, target) in targets {
                if reaches(&edges, target, owner) {
                    properties.insert((owner.clone(), property.clone()));
                }
            }
        }
        Self { properties }
    }

    pub fn contains(&self, owner: &str, property: &str) -> bool {
        self.properties
            .contains(&(owner.to_string(), property.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Key of the complex type stored inline by a property of type `ty`.
fn inline_complex(ty: &TypeRef) -> Option<String> {
    match &ty.definition {
        TypeDefinition::Named(named) if named.kind == NamedKind::Complex => {
            Some(named.name.to_string())
        }
        _ => None,
    }
}

fn reaches(edges: &HashMap<String, Vec<(String, String)>>, from: &str, to: &str) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(targets) = edges.get(current) {
            stack.extend(targets.iter().map(|(_, target)| target.as_str()));
        }
    }
    false
}
