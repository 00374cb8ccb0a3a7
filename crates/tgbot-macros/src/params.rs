//! `#[derive(Params)]` implementation.
//!
//! # Overview
//!
//! The derive generates `impl IntoParams for T`, consuming the record and
//! writing each field into a `Payload`. The setter for a field is decided
//! here, from the field's type syntax and its `#[tg(...)]` options:
//!
//! | Route | Generated call |
//! |-------|----------------|
//! | `Value` | `ParamValue::write_param(field, key, force, payload)` |
//! | `Json` | `payload.set_json_field(key, &field, force)` |
//! | `Input` | `payload.set_input(key, field)` |
//! | `Flatten` | `IntoParams::write_params(field, payload)` |
//!
//! `Option<T>` fields use the route of `T`; for the non-`Value` routes the
//! generated code unwraps the option first.
//!
//! With `#[tg(namespace = "serde")]` on the record, names and skips are also
//! read from that attribute namespace (`rename = "…"`, `skip`,
//! `skip_serializing`); `tg` options still win. Other keys in the borrowed
//! namespace are ignored.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, Ident, LitStr, Path,
    PathArguments, Token, Type, meta::ParseNestedMeta, spanned::Spanned,
};

/// Type names written through the `ParamValue` trait.
const VALUE_TYPES: &[&str] = &[
    "String", "str", "bool", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64", "InputFile", "ChatId", "ParseMode",
];

// ============================================================================
// Attribute structures
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Route {
    Value,
    Json,
    Input,
    Flatten,
}

/// Record-level `#[tg(…)]` options.
struct ContainerAttrs {
    krate: Path,
    namespace: Option<String>,
}

/// Per-field `#[tg(…)]` options.
#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
    force: bool,
    route: Option<Route>,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_params(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ContainerAttrs { krate, namespace } = parse_container_attrs(&input.attrs)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Params cannot be derived for enums; wrap the variant data in a struct",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Params cannot be derived for unions",
            ));
        }
    };

    let statements = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|field| {
                let ident = field
                    .ident
                    .as_ref()
                    .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
                generate_field(&krate, namespace.as_deref(), ident, &field.ty, &field.attrs)
            })
            .collect::<syn::Result<Vec<_>>>()?,
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new(
                fields.span(),
                "Params requires named fields; tuple structs have no parameter names",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics #krate::IntoParams for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn write_params(self, payload: &mut #krate::Payload) {
                #(#statements)*
            }
        }
    })
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut krate = None;
    let mut namespace = None;
    for attr in attrs {
        if !attr.path().is_ident("tg") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                krate = Some(lit.parse::<Path>()?);
                Ok(())
            } else if meta.path.is_ident("namespace") {
                let lit: LitStr = meta.value()?.parse()?;
                let name = lit.value();
                if syn::parse_str::<Ident>(&name).is_err() {
                    return Err(syn::Error::new(lit.span(), "namespace must be an identifier"));
                }
                namespace = Some(name);
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported container attribute, expected `crate = \"…\"` or `namespace = \"…\"`",
                ))
            }
        })?;
    }
    Ok(ContainerAttrs {
        krate: krate.unwrap_or_else(|| syn::parse_quote!(::tgbot_core)),
        namespace: namespace.filter(|name| name != "tg"),
    })
}

fn parse_field_attrs(attrs: &[Attribute], namespace: Option<&str>) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    if let Some(namespace) = namespace {
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(namespace)) {
            parse_borrowed_attr(attr, &mut result)?;
        }
    }

    for attr in attrs {
        if !attr.path().is_ident("tg") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let route = if meta.path.is_ident("rename") {
                result.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                None
            } else if meta.path.is_ident("skip") {
                result.skip = true;
                None
            } else if meta.path.is_ident("force") {
                result.force = true;
                None
            } else if meta.path.is_ident("value") {
                Some(Route::Value)
            } else if meta.path.is_ident("json") {
                Some(Route::Json)
            } else if meta.path.is_ident("input") {
                Some(Route::Input)
            } else if meta.path.is_ident("flatten") {
                Some(Route::Flatten)
            } else {
                return Err(meta.error("unsupported tg attribute"));
            };
            if let Some(route) = route {
                if result.route.is_some_and(|r| r != route) {
                    return Err(meta.error("conflicting tg routing options"));
                }
                result.route = Some(route);
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Reads names and skips from a foreign attribute such as `#[serde(...)]`.
fn parse_borrowed_attr(attr: &Attribute, result: &mut FieldAttrs) -> syn::Result<()> {
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
            result.rename = Some(meta.value()?.parse::<LitStr>()?.value());
        } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
            result.skip = true;
        } else {
            ignore_meta(&meta)?;
        }
        Ok(())
    })
}

fn ignore_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| ignore_meta(&nested))?;
    }
    Ok(())
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_field(
    krate: &Path,
    namespace: Option<&str>,
    ident: &Ident,
    ty: &Type,
    attrs: &[Attribute],
) -> syn::Result<TokenStream> {
    let attrs = parse_field_attrs(attrs, namespace)?;
    if attrs.skip {
        return Ok(TokenStream::new());
    }

    let key = match attrs.rename {
        Some(name) if name.is_empty() => to_snake_case(&ident.to_string()),
        Some(name) => name,
        None => to_snake_case(&ident.to_string()),
    };
    if key == "-" || key == "_" {
        return Ok(TokenStream::new());
    }

    let inner = option_inner(ty);
    let route = attrs
        .route
        .unwrap_or_else(|| default_route(inner.unwrap_or(ty)));
    let force = attrs.force;

    let tokens = match (route, inner.is_some()) {
        (Route::Value, _) => quote! {
            #krate::ParamValue::write_param(self.#ident, #key, #force, payload);
        },
        (Route::Json, true) => quote! {
            if let ::core::option::Option::Some(value) = &self.#ident {
                payload.set_json_field(#key, value, #force);
            }
        },
        (Route::Json, false) => quote! {
            payload.set_json_field(#key, &self.#ident, #force);
        },
        (Route::Input, true) => quote! {
            if let ::core::option::Option::Some(value) = self.#ident {
                payload.set_input(#key, value);
            }
        },
        (Route::Input, false) => quote! {
            payload.set_input(#key, self.#ident);
        },
        (Route::Flatten, true) => quote! {
            if let ::core::option::Option::Some(value) = self.#ident {
                #krate::IntoParams::write_params(value, payload);
            }
        },
        (Route::Flatten, false) => quote! {
            #krate::IntoParams::write_params(self.#ident, payload);
        },
    };

    Ok(tokens)
}

/// Returns `T` for `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn default_route(ty: &Type) -> Route {
    let name = match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => match reference.elem.as_ref() {
            Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
            _ => None,
        },
        _ => None,
    };

    match name {
        Some(name) if VALUE_TYPES.contains(&name.as_str()) => Route::Value,
        _ => Route::Json,
    }
}

/// Converts `camelCase` / `PascalCase` (and raw identifiers) to `snake_case`.
fn to_snake_case(name: &str) -> String {
    let name = name.strip_prefix("r#").unwrap_or(name);
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("chat_id"), "chat_id");
        assert_eq!(to_snake_case("chatId"), "chat_id");
        assert_eq!(to_snake_case("ReplyMarkup"), "reply_markup");
        assert_eq!(to_snake_case("r#type"), "type");
        assert_eq!(to_snake_case("photo2x"), "photo2x");
    }

    #[test]
    fn test_default_route() {
        let ty: Type = syn::parse_quote!(String);
        assert!(default_route(&ty) == Route::Value);
        let ty: Type = syn::parse_quote!(&'a str);
        assert!(default_route(&ty) == Route::Value);
        let ty: Type = syn::parse_quote!(crate::InputFile);
        assert!(default_route(&ty) == Route::Value);
        let ty: Type = syn::parse_quote!(Vec<MessageEntity>);
        assert!(default_route(&ty) == Route::Json);
    }

    #[test]
    fn test_option_inner() {
        let ty: Type = syn::parse_quote!(Option<i64>);
        assert!(option_inner(&ty).is_some());
        let ty: Type = syn::parse_quote!(Vec<i64>);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_generated_impl_for_skip_and_rename() {
        let input: DeriveInput = syn::parse_quote! {
            struct Sample {
                #[tg(rename = "-")]
                hidden: String,
                #[tg(skip)]
                other: String,
                #[tg(rename = "chat")]
                chat_id: i64,
            }
        };
        let tokens = derive_params(&input).unwrap().to_string();
        assert!(tokens.contains("\"chat\""));
        assert!(!tokens.contains("hidden"));
        assert!(!tokens.contains("other"));
    }

    #[test]
    fn test_borrowed_namespace_names_and_skips() {
        let input: DeriveInput = syn::parse_quote! {
            #[tg(namespace = "serde")]
            struct Sample {
                #[serde(rename = "userName", default)]
                user_name: String,
                #[serde(skip_serializing_if = "Option::is_none", rename(deserialize = "x"))]
                nickname: Option<String>,
                #[serde(skip)]
                secret: String,
                #[serde(rename = "ignored")]
                #[tg(rename = "chat")]
                chat_id: i64,
            }
        };
        let tokens = derive_params(&input).unwrap().to_string();
        assert!(tokens.contains("\"userName\""));
        assert!(tokens.contains("\"nickname\""));
        assert!(!tokens.contains("secret"));
        assert!(tokens.contains("\"chat\""));
        assert!(!tokens.contains("ignored"));
    }

    #[test]
    fn test_foreign_attrs_ignored_without_namespace() {
        let input: DeriveInput = syn::parse_quote! {
            struct Sample {
                #[serde(rename = "userName")]
                user_name: String,
            }
        };
        let tokens = derive_params(&input).unwrap().to_string();
        assert!(tokens.contains("\"user_name\""));
        assert!(!tokens.contains("userName"));
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Sample(i64);
        };
        assert!(derive_params(&input).is_err());
    }
}
