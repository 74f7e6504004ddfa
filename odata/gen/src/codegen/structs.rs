//! Complex-type and entity-type struct generation.
//!
//! Both kinds become a serde struct with one `pub` field per declared
//! property. Field names are the title-cased property names, with the wire
//! name kept in `#[serde(rename)]`.
//!
//! Entity types additionally get:
//! - a `#[serde(flatten)] pub base` field plus `Deref`/`DerefMut` when they
//!   derive from another entity type
//! - an `odata_client::EntityKey` impl listing the key properties
//! - a dynamic-properties map and an `odata_client::OpenType` impl when the
//!   type is open (delegating to the base when the base is already open)

use std::collections::HashSet;

use odata_define::{ComplexType, EntityType, PrimitiveKind, Property};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tracing::{info, warn};

use crate::codegen::Declaration;
use crate::codegen::recursion::RecursiveProperties;
use crate::mapping::{MappingContext, RustType, map_type};
use crate::naming;
use crate::registry::DedupRegistry;

/// Field holding undeclared properties of open types.
const DYNAMIC_FIELD: &str = "Properties";
/// Fallback when a declared property already uses [`DYNAMIC_FIELD`].
const DYNAMIC_FIELD_FALLBACK: &str = "DynamicProperties";

/// Where an open type keeps its dynamic properties.
enum Dynamic {
    None,
    Own,
    Inherited,
}

/// Where an entity's key comes from.
enum Keys<'a> {
    /// Complex types have no key.
    NotAnEntity,
    Own(Vec<&'a str>),
    Inherited,
}

struct StructShape<'a> {
    namespace: &'a str,
    name: &'a str,
    description: String,
    base: Option<RustType>,
    properties: &'a [Property],
    /// Properties to box because they close a cycle of complex types.
    recursive: Option<&'a RecursiveProperties>,
    dynamic: Dynamic,
    keys: Keys<'a>,
}

/// Generates the declaration for a complex type.
///
/// Properties listed in `recursive` are boxed. Returns `None` if the type
/// was already emitted in this pass.
pub fn emit_complex(
    complex: &ComplexType,
    ctx: &MappingContext,
    recursive: &RecursiveProperties,
    registry: &mut DedupRegistry,
) -> Option<Declaration> {
    let key = format!("{}.{}", complex.namespace, complex.name);
    if !registry.claim(&key) {
        info!("Skipping complex type {}: already generated", key);
        return None;
    }

    let shape = StructShape {
        namespace: &complex.namespace,
        name: &complex.name,
        description: format!(" `{key}` complex type."),
        base: None,
        properties: &complex.properties,
        recursive: Some(recursive),
        dynamic: Dynamic::None,
        keys: Keys::NotAnEntity,
    };

    info!("Generated complex type {}", key);
    Some(Declaration::new(
        &complex.namespace,
        &complex.name,
        struct_tokens(&shape, ctx),
    ))
}

/// Generates the declaration for an entity type.
///
/// Returns `None` if the type was already emitted in this pass.
pub fn emit_entity(
    entity: &EntityType,
    ctx: &MappingContext,
    registry: &mut DedupRegistry,
) -> Option<Declaration> {
    let key = format!("{}.{}", entity.namespace, entity.name);
    if !registry.claim(&key) {
        info!("Skipping entity type {}: already generated", key);
        return None;
    }

    let dynamic = match (&entity.base_type, entity.is_open) {
        (_, false) => Dynamic::None,
        (Some(base), true) if base.is_open => Dynamic::Inherited,
        (_, true) => Dynamic::Own,
    };

    let own_keys: Vec<&str> = entity.key_properties().map(|p| p.name.as_str()).collect();
    let keys = if own_keys.is_empty() && entity.base_type.is_some() {
        Keys::Inherited
    } else {
        Keys::Own(own_keys)
    };

    let description = if entity.is_abstract {
        format!(" `{key}` entity type (abstract).")
    } else {
        format!(" `{key}` entity type.")
    };

    let shape = StructShape {
        namespace: &entity.namespace,
        name: &entity.name,
        description,
        base: entity.base_type.as_ref().map(|base| ctx.type_path(&base.name)),
        properties: &entity.properties,
        recursive: None,
        dynamic,
        keys,
    };

    info!("Generated entity type {}", key);
    Some(Declaration::new(
        &entity.namespace,
        &entity.name,
        struct_tokens(&shape, ctx),
    ))
}

/// `#[serde(...)]` arguments and Rust type for one property.
fn field_parts(property: &Property, boxed: bool, ctx: &MappingContext) -> (Vec<TokenStream>, TokenStream) {
    let wire = property.name.as_str();
    let mapped = map_type(&property.ty, ctx);
    let mut args = vec![quote!(rename = #wire)];

    if property.is_navigation {
        if mapped.is_many() {
            args.push(quote!(default, skip_serializing_if = "::std::vec::Vec::is_empty"));
            let ty = &mapped.ty;
            return (args, quote!(#ty));
        }
        let target = RustType::Option(Box::new(mapped.ty.unwrap_option().clone())).boxed();
        args.push(quote!(
            default,
            skip_serializing_if = "::core::option::Option::is_none"
        ));
        return (args, quote!(#target));
    }

    let ty = if boxed { mapped.ty.clone().boxed() } else { mapped.ty.clone() };
    if mapped.is_many() {
        args.push(quote!(default));
        return (args, quote!(#ty));
    }

    match property.ty.as_primitive() {
        Some(PrimitiveKind::Binary) => {
            if property.ty.nullable {
                args.push(quote!(default));
            }
            args.push(quote!(with = "::odata_client::serde::binary"));
        }
        Some(PrimitiveKind::Duration) if property.ty.nullable => {
            args.push(quote!(default, with = "::odata_client::serde::option_duration"));
        }
        Some(PrimitiveKind::Duration) => {
            args.push(quote!(with = "::odata_client::serde::duration"));
        }
        _ if mapped.ty.is_string() && property.ty.nullable => {
            args.push(quote!(
                default,
                deserialize_with = "::odata_client::serde::null_as_default"
            ));
        }
        _ if mapped.ty.is_option() => args.push(quote!(default)),
        _ => {}
    }

    (args, quote!(#ty))
}

fn struct_tokens(shape: &StructShape<'_>, ctx: &MappingContext) -> TokenStream {
    let ident = naming::type_ident(shape.name);
    let description = &shape.description;
    let owner = format!("{}.{}", shape.namespace, shape.name);

    let mut seen: HashSet<String> = HashSet::new();
    let mut fields = Vec::new();
    let mut wires = Vec::new();
    for property in shape.properties {
        let field = naming::field_ident(&property.name);
        if !seen.insert(field.to_string()) {
            warn!(
                "{}.{}: property '{}' maps to duplicate field '{}', skipping",
                shape.namespace, shape.name, property.name, field
            );
            continue;
        }

        let boxed = shape
            .recursive
            .is_some_and(|recursive| recursive.contains(&owner, &property.name));
        let (args, ty) = field_parts(property, boxed, ctx);
        let key_doc = property.is_key.then(|| quote!(#[doc = " Key property."]));
        fields.push(quote! {
            #key_doc
            #[serde(#(#args),*)]
            pub #field: #ty
        });
        wires.push(property.name.as_str());
    }

    let dynamic_ident: Ident = if seen.contains(DYNAMIC_FIELD) {
        format_ident!("{}", DYNAMIC_FIELD_FALLBACK)
    } else {
        format_ident!("{}", DYNAMIC_FIELD)
    };

    let base_field = shape.base.as_ref().map(|base| {
        quote! {
            #[serde(flatten)]
            pub base: #base,
        }
    });

    let dynamic_field = matches!(shape.dynamic, Dynamic::Own).then(|| {
        quote! {
            /// Properties not declared in the schema.
            #[serde(skip)]
            pub #dynamic_ident: ::std::collections::BTreeMap<::std::string::String, ::odata_client::serde_json::Value>,
        }
    });

    let deref_impls = shape.base.as_ref().map(|base| {
        quote! {
            impl ::std::ops::Deref for #ident {
                type Target = #base;

                fn deref(&self) -> &Self::Target {
                    &self.base
                }
            }

            impl ::std::ops::DerefMut for #ident {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    &mut self.base
                }
            }
        }
    });

    let declared = match (&shape.base, wires.is_empty()) {
        (Some(base), false) => quote! {
            let mut names = <#base as ::odata_client::Structured>::declared_properties();
            names.extend([#(#wires),*]);
            names
        },
        (Some(base), true) => quote! {
            <#base as ::odata_client::Structured>::declared_properties()
        },
        (None, _) => quote! { vec![#(#wires),*] },
    };

    let key_impl = match (&shape.keys, &shape.base) {
        (Keys::NotAnEntity, _) => None,
        (Keys::Inherited, Some(base)) => Some(quote! {
            impl ::odata_client::EntityKey for #ident {
                const KEY_PROPERTIES: &'static [&'static str] =
                    <#base as ::odata_client::EntityKey>::KEY_PROPERTIES;
            }
        }),
        (Keys::Own(keys), _) => Some(quote! {
            impl ::odata_client::EntityKey for #ident {
                const KEY_PROPERTIES: &'static [&'static str] = &[#(#keys),*];
            }
        }),
        (Keys::Inherited, None) => Some(quote! {
            impl ::odata_client::EntityKey for #ident {
                const KEY_PROPERTIES: &'static [&'static str] = &[];
            }
        }),
    };

    let open_impl = match shape.dynamic {
        Dynamic::None => None,
        Dynamic::Own => Some(quote! {
            impl ::odata_client::OpenType for #ident {
                fn dynamic_properties(
                    &self,
                ) -> &::std::collections::BTreeMap<::std::string::String, ::odata_client::serde_json::Value> {
                    &self.#dynamic_ident
                }

                fn dynamic_properties_mut(
                    &mut self,
                ) -> &mut ::std::collections::BTreeMap<::std::string::String, ::odata_client::serde_json::Value> {
                    &mut self.#dynamic_ident
                }
            }
        }),
        Dynamic::Inherited => Some(quote! {
            impl ::odata_client::OpenType for #ident {
                fn dynamic_properties(
                    &self,
                ) -> &::std::collections::BTreeMap<::std::string::String, ::odata_client::serde_json::Value> {
                    ::odata_client::OpenType::dynamic_properties(&self.base)
                }

                fn dynamic_properties_mut(
                    &mut self,
                ) -> &mut ::std::collections::BTreeMap<::std::string::String, ::odata_client::serde_json::Value> {
                    ::odata_client::OpenType::dynamic_properties_mut(&mut self.base)
                }
            }
        }),
    };

    quote! {
        #[doc = #description]
        #[derive(
            Debug,
            Clone,
            PartialEq,
            ::odata_client::serde::Serialize,
            ::odata_client::serde::Deserialize
        )]
        #[serde(crate = "::odata_client::serde")]
        #[allow(non_snake_case)]
        pub struct #ident {
            #base_field
            #(#fields,)*
            #dynamic_field
        }

        #deref_impls

        impl ::odata_client::Structured for #ident {
            fn declared_properties() -> ::std::vec::Vec<&'static str> {
                #declared
            }
        }

        #key_impl

        #open_impl
    }
}
