use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Expr, ItemStruct, Lit, LitStr, Meta, MetaNameValue};

struct FeatureArgs {
    id: LitStr,
    depends_on: Vec<LitStr>,
    description: Option<LitStr>,
}

/// Expands the `#[shell_feature]` attribute macro.
pub fn expand_feature(args: TokenStream, input: ItemStruct) -> TokenStream {
    let FeatureArgs { id, depends_on, description } = match parse_args(args, &input) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error(),
    };

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &input.generics,
            "shell_feature cannot be applied to generic structs",
        )
        .to_compile_error();
    }

    let ident = &input.ident;
    let metadata = description.map_or_else(
        || quote! { &[] },
        |description| quote! { &[("description", #description)] },
    );

    quote! {
        #input

        #[automatically_derived]
        impl ::mhost_kernel::feature::FeatureMetadata for #ident {
            const ID: &'static str = #id;
            const DEPENDENCIES: &'static [&'static str] = &[#(#depends_on),*];
            const METADATA: &'static [(&'static str, &'static str)] = #metadata;
        }

        #[allow(unsafe_code)]
        const _: () = {
            ::mhost_kernel::inventory::submit! {
                ::mhost_kernel::feature::FeatureRegistration::of::<#ident>()
            }
        };
    }
}

fn parse_args(args: TokenStream, input: &ItemStruct) -> syn::Result<FeatureArgs> {
    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let metas = parser.parse2(args)?;

    let mut id = None;
    let mut depends_on = None;
    let mut description = None;

    for meta in metas {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "Expected name-value arguments like `id = \"Billing\"`",
            ));
        };

        if name_value.path.is_ident("id") {
            let value = string_literal(&name_value, "id")?;
            if value.value().trim().is_empty() {
                return Err(syn::Error::new_spanned(value, "Feature id cannot be empty"));
            }
            id = Some(set_once(id, &name_value, value)?);
        } else if name_value.path.is_ident("depends_on") {
            let value = string_array(&name_value)?;
            depends_on = Some(set_once(depends_on, &name_value, value)?);
        } else if name_value.path.is_ident("description") {
            let value = string_literal(&name_value, "description")?;
            description = Some(set_once(description, &name_value, value)?);
        } else {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "Unsupported argument; expected id, depends_on or description",
            ));
        }
    }

    let id = id.ok_or_else(|| {
        syn::Error::new_spanned(&input.ident, "shell_feature requires `id = \"...\"`")
    })?;

    Ok(FeatureArgs { id, depends_on: depends_on.unwrap_or_default(), description })
}

fn string_literal(name_value: &MetaNameValue, label: &str) -> syn::Result<LitStr> {
    if let Expr::Lit(expr_lit) = &name_value.value
        && let Lit::Str(lit) = &expr_lit.lit
    {
        return Ok(lit.clone());
    }
    Err(syn::Error::new_spanned(&name_value.value, format!("{label} must be a string literal")))
}

fn string_array(name_value: &MetaNameValue) -> syn::Result<Vec<LitStr>> {
    let Expr::Array(array) = &name_value.value else {
        return Err(syn::Error::new_spanned(
            &name_value.value,
            "depends_on must be an array of string literals, e.g. [\"Core\"]",
        ));
    };

    array
        .elems
        .iter()
        .map(|elem| match elem {
            Expr::Lit(expr_lit) => match &expr_lit.lit {
                Lit::Str(lit) => Ok(lit.clone()),
                other => Err(syn::Error::new_spanned(other, "Expected a string literal")),
            },
            other => Err(syn::Error::new_spanned(other, "Expected a string literal")),
        })
        .collect()
}

fn set_once<T>(current: Option<T>, token: &MetaNameValue, value: T) -> syn::Result<T> {
    if current.is_some() {
        return Err(syn::Error::new_spanned(token, "Duplicate argument"));
    }
    Ok(value)
}
