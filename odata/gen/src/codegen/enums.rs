//! Enum generation.
//!
//! Plain enumerations become `#[repr(..)]` Rust enums whose discriminants are
//! the schema's member values. `IsFlags` enumerations become a newtype over
//! the underlying integer with one associated constant per member and the
//! bitwise operators, so members can be combined.
//!
//! Both serialize the way OData JSON does: plain enums as the member name,
//! flags as a comma-separated member list.

use std::collections::{HashMap, HashSet};

use odata_define::{EnumMember, EnumType, PrimitiveKind};
use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};
use tracing::{info, warn};

use crate::codegen::Declaration;
use crate::config::EnumDedupPolicy;
use crate::naming;
use crate::registry::DedupRegistry;

/// Namespaces with this prefix describe platform types and are never emitted.
pub const SYSTEM_NAMESPACE_PREFIX: &str = "System";

/// Generates the declaration for an enum type.
///
/// Returns `None` when the enum lives in a system namespace or the registry
/// says it was already emitted under `policy`.
///
/// ## Examples
///
/// ```
/// use odata_define::{EnumMember, EnumType, PrimitiveKind};
/// use odata_gen::codegen::emit_enum;
/// use odata_gen::config::EnumDedupPolicy;
/// use odata_gen::registry::DedupRegistry;
///
/// let color = EnumType {
///     namespace: "Demo".to_string(),
///     name: "Color".to_string(),
///     is_flags: false,
///     underlying: PrimitiveKind::Int32,
///     members: vec![EnumMember { name: "Red".to_string(), value: 0 }],
/// };
///
/// let mut registry = DedupRegistry::new();
/// let decl = emit_enum(&color, &mut registry, EnumDedupPolicy::Strict).unwrap();
/// assert_eq!(decl.key, "Demo.Color");
/// assert!(emit_enum(&color, &mut registry, EnumDedupPolicy::Strict).is_none());
/// ```
pub fn emit_enum(
    enum_type: &EnumType,
    registry: &mut DedupRegistry,
    policy: EnumDedupPolicy,
) -> Option<Declaration> {
    let key = format!("{}.{}", enum_type.namespace, enum_type.name);

    if enum_type.namespace.starts_with(SYSTEM_NAMESPACE_PREFIX) {
        info!("Skipping system enum {}", key);
        return None;
    }

    if !registry.claim_enum(&key, policy) {
        info!("Skipping enum {}: already generated", key);
        return None;
    }

    let tokens = if enum_type.is_flags {
        flags_tokens(enum_type)
    } else {
        enum_tokens(enum_type)
    };

    info!("Generated enum {}", key);
    Some(Declaration::new(&enum_type.namespace, &enum_type.name, tokens))
}

fn repr_ident(underlying: &PrimitiveKind) -> Ident {
    let repr = match underlying {
        PrimitiveKind::Byte => "u8",
        PrimitiveKind::SByte => "i8",
        PrimitiveKind::Int16 => "i16",
        PrimitiveKind::Int64 => "i64",
        _ => "i32",
    };
    format_ident!("{}", repr)
}

fn discriminant(value: i64) -> TokenStream {
    let magnitude = Literal::u64_unsuffixed(value.unsigned_abs());
    if value < 0 {
        quote!(-#magnitude)
    } else {
        quote!(#magnitude)
    }
}

/// Members whose sanitized identifiers are unique, first occurrence wins.
fn distinct_members(enum_type: &EnumType) -> Vec<(&EnumMember, Ident)> {
    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for member in &enum_type.members {
        let variant = naming::ident(&member.name);
        if !seen.insert(variant.to_string()) {
            warn!(
                "{}.{}: member '{}' maps to duplicate identifier '{}', skipping",
                enum_type.namespace, enum_type.name, member.name, variant
            );
            continue;
        }
        members.push((member, variant));
    }
    members
}

fn enum_tokens(enum_type: &EnumType) -> TokenStream {
    let ident = naming::type_ident(&enum_type.name);
    let doc = format!(" `{}.{}` enumeration.", enum_type.namespace, enum_type.name);

    // Members sharing a value become aliases of the first one.
    let mut canonical: HashMap<i64, Ident> = HashMap::new();
    let mut variants = Vec::new();
    let mut aliases = Vec::new();

    for (member, variant) in distinct_members(enum_type) {
        match canonical.get(&member.value) {
            Some(first) => aliases.push(quote! {
                pub const #variant: Self = Self::#first;
            }),
            None => {
                let wire = member.name.as_str();
                let rename = (variant != wire).then(|| quote!(#[serde(rename = #wire)]));
                let value = discriminant(member.value);
                variants.push(quote! { #rename #variant = #value });
                canonical.insert(member.value, variant);
            }
        }
    }

    let repr = (!variants.is_empty()).then(|| {
        let repr = repr_ident(&enum_type.underlying);
        quote!(#[repr(#repr)])
    });

    let alias_impl = (!aliases.is_empty()).then(|| {
        quote! {
            #[allow(non_upper_case_globals)]
            impl #ident {
                #(#aliases)*
            }
        }
    });

    quote! {
        #[doc = #doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::odata_client::serde::Serialize,
            ::odata_client::serde::Deserialize
        )]
        #[serde(crate = "::odata_client::serde")]
        #repr
        pub enum #ident {
            #(#variants,)*
        }

        #alias_impl
    }
}

fn flags_tokens(enum_type: &EnumType) -> TokenStream {
    let ident = naming::type_ident(&enum_type.name);
    let repr = repr_ident(&enum_type.underlying);
    let doc = format!(
        " `{}.{}` flags. Members combine with `|`.",
        enum_type.namespace, enum_type.name
    );

    let members = distinct_members(enum_type);
    let consts = members.iter().map(|(member, name)| {
        let value = discriminant(member.value);
        quote! { pub const #name: Self = Self(#value); }
    });

    let wires = members.iter().map(|(member, _)| member.name.as_str());
    let values = members.iter().map(|(member, _)| discriminant(member.value));

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct #ident(pub #repr);

        #[allow(non_upper_case_globals)]
        impl #ident {
            #(#consts)*

            /// Returns `true` when every bit of `other` is set in `self`.
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl ::std::ops::BitOr for #ident {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl ::std::ops::BitAnd for #ident {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl ::std::ops::BitOrAssign for #ident {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl ::odata_client::Flags for #ident {
            const MEMBERS: &'static [(&'static str, i64)] = &[#((#wires, #values)),*];

            fn bits(self) -> i64 {
                i64::from(self.0)
            }

            fn from_bits(bits: i64) -> Self {
                Self(bits as #repr)
            }
        }

        impl ::odata_client::serde::Serialize for #ident {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::odata_client::serde::Serializer,
            {
                ::odata_client::flags::serialize(self, serializer)
            }
        }

        impl<'de> ::odata_client::serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::odata_client::serde::Deserializer<'de>,
            {
                ::odata_client::flags::deserialize(deserializer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{format_generated_code, make_enum};

    fn generate(enum_type: &EnumType) -> String {
        let mut registry = DedupRegistry::new();
        let decl = emit_enum(enum_type, &mut registry, EnumDedupPolicy::Strict)
            .expect("enum should be emitted");
        format_generated_code(&decl.tokens).expect("Failed to format code")
    }

    #[test]
    fn enum_keeps_explicit_values_in_order() {
        let color = make_enum("Demo", "Color", &[("Red", 0), ("Green", 1), ("Blue", 4)]);
        let code = generate(&color);

        assert!(code.contains("#[repr(i32)]"));
        assert!(code.contains("pub enum Color"));
        let red = code.find("Red = 0").expect("Red");
        let green = code.find("Green = 1").expect("Green");
        let blue = code.find("Blue = 4").expect("Blue");
        assert!(red < green && green < blue);
    }

    #[test]
    fn enum_uses_underlying_repr() {
        let mut level = make_enum("Demo", "Level", &[("Low", 1), ("High", 2)]);
        level.underlying = PrimitiveKind::Byte;
        assert!(generate(&level).contains("#[repr(u8)]"));
    }

    #[test]
    fn enum_supports_negative_values() {
        let sign = make_enum("Demo", "Sign", &[("Negative", -1), ("Zero", 0)]);
        let code = generate(&sign);
        assert!(code.contains("Negative = -1"));
    }

    #[test]
    fn enum_derives_serde_through_client_crate() {
        let code = generate(&make_enum("Demo", "Color", &[("Red", 0)]));
        assert!(code.contains("::odata_client::serde::Serialize"));
        assert!(code.contains("#[serde(crate = \"::odata_client::serde\")]"));
    }

    #[test]
    fn enum_renames_sanitized_members() {
        let kinds = make_enum("Demo", "Kind", &[("type", 0), ("Normal", 1)]);
        let code = generate(&kinds);
        assert!(code.contains("#[serde(rename = \"type\")]"));
        assert!(code.contains("type_ = 0"));
        assert!(!code.contains("rename = \"Normal\""));
    }

    #[test]
    fn duplicate_values_become_aliases() {
        let status = make_enum("Demo", "Status", &[("Active", 1), ("Enabled", 1)]);
        let code = generate(&status);
        assert!(code.contains("Active = 1"));
        assert!(code.contains("pub const Enabled: Self = Self::Active;"));
    }

    #[test]
    fn empty_enum_has_no_repr() {
        let code = generate(&make_enum("Demo", "Nothing", &[]));
        assert!(code.contains("pub enum Nothing {}"));
        assert!(!code.contains("repr"));
    }

    #[test]
    fn flags_enum_is_bitset_newtype() {
        let mut permissions = make_enum("Demo", "Permissions", &[("Read", 1), ("Write", 2), ("Admin", 4)]);
        permissions.is_flags = true;
        let code = generate(&permissions);

        assert!(code.contains("pub struct Permissions(pub i32);"));
        assert!(code.contains("pub const Read: Self = Self(1);"));
        assert!(code.contains("pub const Admin: Self = Self(4);"));
        assert!(code.contains("impl ::std::ops::BitOr for Permissions"));
        assert!(code.contains("impl ::std::ops::BitOrAssign for Permissions"));
        assert!(code.contains("pub const fn contains(self, other: Self) -> bool"));
        assert!(code.contains("impl ::odata_client::Flags for Permissions"));
        assert!(code.contains("(\"Write\", 2)"));
        assert!(code.contains("::odata_client::flags::deserialize(deserializer)"));
        assert!(code.contains("::core::result::Result<S::Ok, S::Error>"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn colliding_member_identifiers_keep_first() {
        let shades = make_enum("Demo", "Shade", &[("Dark Red", 1), ("Dark-Red", 2), ("Blue", 3)]);
        let code = generate(&shades);

        assert!(code.contains("Dark_Red = 1"));
        assert!(!code.contains("Dark_Red = 2"));
        assert!(!code.contains("rename = \"Dark-Red\""));
        assert!(code.contains("Blue = 3"));
        assert!(logs_contain("member 'Dark-Red' maps to duplicate identifier 'Dark_Red'"));
    }

    #[test]
    fn colliding_flag_identifiers_keep_first() {
        let mut access = make_enum("Demo", "Access", &[("read", 1), ("read_", 2), ("read", 4)]);
        access.is_flags = true;
        let code = generate(&access);

        assert_eq!(code.matches("pub const read: Self").count(), 1);
        assert!(code.contains("pub const read: Self = Self(1);"));
        assert!(code.contains("pub const read_: Self = Self(2);"));
        assert!(!code.contains("(\"read\", 4)"));
    }

    #[test]
    fn primitive_named_enum_is_escaped() {
        let code = generate(&make_enum("Demo", "u8", &[("A", 0)]));
        assert!(code.contains("pub enum u8_"));
    }

    #[test]
    fn system_namespace_is_skipped() {
        let mut registry = DedupRegistry::new();
        let internal = make_enum("System.Internal", "Kind", &[("A", 0)]);

        assert!(emit_enum(&internal, &mut registry, EnumDedupPolicy::Strict).is_none());
        assert!(registry.is_empty(), "skipped enums are not registered");
    }

    #[test]
    fn strict_policy_emits_once() {
        let color = make_enum("Demo", "Color", &[("Red", 0)]);
        let mut registry = DedupRegistry::new();
        assert!(emit_enum(&color, &mut registry, EnumDedupPolicy::Strict).is_some());
        assert!(emit_enum(&color, &mut registry, EnumDedupPolicy::Strict).is_none());
    }

    #[test]
    fn legacy_policy_reemits_identical_short_keys() {
        let color = make_enum("Demo", "Color", &[("Red", 0), ("Blue", 4)]);
        let mut registry = DedupRegistry::new();

        let first = emit_enum(&color, &mut registry, EnumDedupPolicy::Legacy).unwrap();
        let second = emit_enum(&color, &mut registry, EnumDedupPolicy::Legacy).unwrap();
        assert_eq!(first.tokens.to_string(), second.tokens.to_string());
    }

    #[test]
    fn legacy_policy_blocks_long_keys() {
        let namespace = "Com.Example.Very.Long.Namespace.For.Testing";
        let color = make_enum(namespace, "ColorPalette", &[("Red", 0)]);
        assert!(format!("{namespace}.ColorPalette").len() > 50);

        let mut registry = DedupRegistry::new();
        assert!(emit_enum(&color, &mut registry, EnumDedupPolicy::Legacy).is_some());
        assert!(emit_enum(&color, &mut registry, EnumDedupPolicy::Legacy).is_none());
    }

    #[tracing_test::traced_test]
    #[test]
    fn logs_skipped_system_enum() {
        let mut registry = DedupRegistry::new();
        let internal = make_enum("SystemTypes", "Kind", &[("A", 0)]);
        emit_enum(&internal, &mut registry, EnumDedupPolicy::Strict);
        assert!(logs_contain("Skipping system enum SystemTypes.Kind"));
    }
}
