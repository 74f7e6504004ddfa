//! Service facade generation.
//!
//! An entity container becomes a facade struct named after the requesting
//! service. The facade wraps an `::odata_client::ODataClient` handed to its
//! constructor and exposes:
//! - one accessor per entity set, returning a `BoundClient` for the set's
//!   entity type (projecting dynamic properties for open types)
//! - one async method per unbound function in the document, returning either
//!   a collection or a single value depending on the mapped return type
//!
//! Containers are never deduplicated: every request gets its own facade.

use std::collections::HashSet;

use odata_define::{EntityContainer, FunctionImport, SchemaElement};
use proc_macro2::TokenStream;
use quote::quote;
use tracing::{info, warn};

use crate::codegen::Declaration;
use crate::mapping::{Cardinality, MappingContext, map_type};
use crate::naming;
use crate::request::GenerationRequest;

/// Method names the facade defines itself.
const RESERVED_METHODS: &[&str] = &["new", "client"];

/// Generates the service facade for `container`.
///
/// `elements` is the whole schema model; every unbound function in it gets a
/// method, whichever namespace declares it.
pub fn emit_container(
    container: &EntityContainer,
    request: &GenerationRequest,
    elements: &[SchemaElement],
    ctx: &MappingContext,
) -> Declaration {
    let facade = naming::type_ident(&request.service);
    let doc = format!(
        " Client facade for the `{}.{}` entity container.",
        container.namespace, container.name
    );

    let mut methods: HashSet<String> = RESERVED_METHODS.iter().map(|m| m.to_string()).collect();

    let mut accessors = Vec::new();
    for set in &container.entity_sets {
        let method = naming::ident(&set.name);
        if !methods.insert(method.to_string()) {
            warn!(
                "{}: entity set '{}' collides with another facade method, skipping",
                request.service, set.name
            );
            continue;
        }

        let entity = ctx.type_path(&set.entity_type.name);
        let set_name = set.name.as_str();
        let set_doc = format!(" The `{set_name}` entity set.");
        let projection = set.entity_type.is_open.then(|| quote!(.with_properties()));

        accessors.push(quote! {
            #[doc = #set_doc]
            pub fn #method(&self) -> ::odata_client::BoundClient<#entity> {
                self.client.for_set::<#entity>(#set_name)#projection
            }
        });
    }

    let mut functions = Vec::new();
    for function in unbound_functions(elements) {
        let method = naming::ident(&function.name);
        if !methods.insert(method.to_string()) {
            warn!(
                "{}: function '{}' collides with another facade method, skipping",
                request.service, function.name
            );
            continue;
        }
        functions.push(function_tokens(function, ctx));
    }

    info!(
        "Generated facade {} ({} entity sets, {} functions)",
        request.container_key(),
        accessors.len(),
        functions.len()
    );

    let tokens = quote! {
        #[doc = #doc]
        #[derive(Debug, Clone)]
        pub struct #facade {
            client: ::odata_client::ODataClient,
        }

        #[allow(non_snake_case)]
        impl #facade {
            /// Wraps an existing client.
            pub fn new(client: ::odata_client::ODataClient) -> Self {
                Self { client }
            }

            /// The underlying client.
            pub fn client(&self) -> &::odata_client::ODataClient {
                &self.client
            }

            #(#accessors)*

            #(#functions)*
        }
    };

    Declaration::new(&request.namespace, &request.service, tokens)
}

fn unbound_functions(elements: &[SchemaElement]) -> impl Iterator<Item = &FunctionImport> {
    elements.iter().filter_map(|element| match element {
        SchemaElement::Function(function) if !function.is_bound => Some(function),
        _ => None,
    })
}

fn function_tokens(function: &FunctionImport, ctx: &MappingContext) -> TokenStream {
    let method = naming::ident(&function.name);
    let name = function.name.as_str();
    let doc = format!(" Calls the `{}.{}` function.", function.namespace, name);

    let mut seen = HashSet::new();
    let mut params = Vec::new();
    for parameter in &function.parameters {
        let ident = naming::ident(&parameter.name);
        if !seen.insert(ident.to_string()) {
            warn!(
                "{}.{}: parameter '{}' maps to duplicate identifier '{}', skipping",
                function.namespace, name, parameter.name, ident
            );
            continue;
        }
        let ty = map_type(&parameter.ty, ctx).ty;
        params.push((ident, ty, parameter.name.as_str()));
    }

    let signature = params.iter().map(|(ident, ty, _)| quote!(#ident: #ty));
    let arguments = params
        .iter()
        .map(|(ident, _, wire)| quote!(.parameter(#wire, #ident)));

    let returned = map_type(&function.return_type, ctx);
    let (output, execute) = match returned.cardinality {
        Cardinality::Many => {
            let element = returned.ty.element();
            (
                quote!(::std::vec::Vec<#element>),
                quote!(.execute_as_array::<#element>()),
            )
        }
        Cardinality::Single => {
            let ty = &returned.ty;
            (quote!(#ty), quote!(.execute_as_single::<#ty>()))
        }
    };

    quote! {
        #[doc = #doc]
        pub async fn #method(&self, #(#signature),*) -> ::core::result::Result<#output, ::odata_client::ODataError> {
            self.client
                .unbound()
                .function(#name)
                #(#arguments)*
                #execute
                .await
        }
    }
}
