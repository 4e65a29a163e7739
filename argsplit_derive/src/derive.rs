use darling::FromField;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, PathArguments, Type};

use crate::error;

/// The `#[argsplit(...)]` field attributes, parsed with darling the same way
/// `optionable_derive`'s `TypeHelperAttributes` parses `#[optionable(...)]`.
#[derive(FromField, Default)]
#[darling(attributes(argsplit), default)]
struct FieldAttrs {
    names: Option<String>,
    help: Option<String>,
    default: Option<String>,
    varargs: bool,
    nested: bool,
    branch: bool,
}

pub(crate) fn derive_from_args(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let struct_ident = &input.ident;

    if !input.generics.params.is_empty() {
        return error("#[derive(FromArgs)] does not support generic structs");
    }
    let Data::Struct(data) = &input.data else {
        return error("#[derive(FromArgs)] only supports structs");
    };
    let Fields::Named(fields) = &data.fields else {
        return error("#[derive(FromArgs)] only supports structs with named fields");
    };

    let mut option_exprs = Vec::with_capacity(fields.named.len());
    let mut field_idents = Vec::with_capacity(fields.named.len());
    let mut field_types = Vec::with_capacity(fields.named.len());

    for field in &fields.named {
        let attrs = FieldAttrs::from_field(field).map_err(|e| syn::Error::new_spanned(field, e))?;
        let ident = field
            .ident
            .as_ref()
            .expect("Fields::Named fields always carry an ident");
        let (option_expr, finalize_ty) = option_for_field(ident, &field.ty, &attrs)?;
        option_exprs.push(option_expr);
        field_idents.push(ident.clone());
        field_types.push(finalize_ty);
    }

    let downcasts = field_idents.iter().zip(field_types.iter()).map(|(ident, ty)| {
        quote! {
            let #ident = *values
                .next()
                .expect("argsplit derive: option count matches field count")
                .downcast::<#ty>()
                .expect("argsplit derive: option order matches field declaration order");
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl argsplit::FromArgs for #struct_ident {
            fn schema() -> argsplit::Schema<Self> {
                argsplit::Schema::builder()
                    #(.option(#option_exprs))*
                    .finalize(move |values| {
                        let mut values = values.into_iter();
                        #(#downcasts)*
                        Ok(#struct_ident { #(#field_idents),* })
                    })
                    .expect("#[derive(FromArgs)] produced an invalid schema")
            }
        }
    })
}

/// Returns the `.option(...)` expression for one field and the type its
/// finalized value must be downcast from.
fn option_for_field(ident: &Ident, ty: &Type, attrs: &FieldAttrs) -> syn::Result<(TokenStream, TokenStream)> {
    let help = help_tokens(attrs);

    if is_bool(ty) {
        let names = option_names(attrs, ident, false);
        let default = default_tokens(attrs)?;
        let expr = quote! {
            argsplit::FlagOpt::new([#(#names),*]).unwrap() #help #default
        };
        return Ok((expr, quote!(bool)));
    }

    if attrs.branch {
        let Some(inner) = ty_inner("Option", ty) else {
            return error("#[argsplit(branch)] fields must be declared as Option<T> where T: FromArgs");
        };
        let names = option_names(attrs, ident, false);
        let default = default_tokens(attrs)?;
        let expr = quote! {
            argsplit::BranchOpt::new([#(#names),*], <#inner as argsplit::FromArgs>::schema()).unwrap() #help #default
        };
        return Ok((expr, quote!(Option<#inner>)));
    }

    if let Some(inner) = ty_inner("Option", ty) {
        let names = option_names(attrs, ident, false);
        let default = default_tokens(attrs)?;
        let expr = if attrs.nested {
            quote! {
                argsplit::SingleOpt::new([#(#names),*]).unwrap()
                    .nested_schema(<#inner as argsplit::FromArgs>::schema()).unwrap()
                    #help #default
            }
        } else {
            quote! {
                argsplit::SingleOpt::new([#(#names),*]).unwrap()
                    .convert_with(argsplit::default_parser::<#inner>())
                    #help #default
            }
        };
        return Ok((expr, quote!(Option<#inner>)));
    }

    if let Some(inner) = ty_inner("Vec", ty) {
        let names = option_names(attrs, ident, attrs.varargs);
        let default = default_tokens(attrs)?;
        let expr = if attrs.varargs {
            quote! {
                argsplit::VarargsOpt::new([#(#names),*]).unwrap()
                    .convert_with(argsplit::default_parser::<#inner>())
                    #help #default
            }
        } else if attrs.nested {
            quote! {
                argsplit::RepeatableOpt::new([#(#names),*]).unwrap()
                    .nested_schema(<#inner as argsplit::FromArgs>::schema()).unwrap()
                    #help #default
            }
        } else {
            quote! {
                argsplit::RepeatableOpt::new([#(#names),*]).unwrap()
                    .convert_with(argsplit::default_parser::<#inner>())
                    #help #default
            }
        };
        return Ok((expr, quote!(Vec<#inner>)));
    }

    // Anything else is a plain positional value; no default is honored here
    // since a missing Required always produces a `MissingRequired` error.
    let names = option_names(attrs, ident, true);
    let expr = quote! {
        argsplit::RequiredOpt::new([#(#names),*]).unwrap()
            .convert_with(argsplit::default_parser::<#ty>())
            #help
    };
    Ok((expr, quote!(#ty)))
}

fn help_tokens(attrs: &FieldAttrs) -> TokenStream {
    match &attrs.help {
        Some(text) => quote! { .help(#text).unwrap() },
        None => quote! {},
    }
}

fn default_tokens(attrs: &FieldAttrs) -> syn::Result<TokenStream> {
    let Some(src) = &attrs.default else {
        return Ok(quote! {});
    };
    let expr: syn::Expr = syn::parse_str(src)?;
    Ok(quote! { .default_value(#expr) })
}

/// Lookup names for a field: explicit `#[argsplit(names = "...")]`, or a
/// default derived from the field identifier — `--kebab-case` for named
/// options, the bare identifier for positional ones, which are labels
/// rather than lookup keys.
fn option_names(attrs: &FieldAttrs, ident: &Ident, positional: bool) -> Vec<String> {
    if let Some(raw) = &attrs.names {
        return raw.split(',').map(str::trim).map(str::to_owned).collect();
    }
    if positional {
        vec![ident.to_string()]
    } else {
        vec![format!("--{}", kebab_case(ident))]
    }
}

fn kebab_case(ident: &Ident) -> String {
    ident.to_string().replace('_', "-")
}

fn is_bool(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.qself.is_none() && p.path.is_ident("bool"))
}

/// Syntactically unwrap `wrapper<Inner>` (e.g. `Option<String>`). Full type
/// resolution isn't available at macro-expansion time, so this matches on
/// the last path segment's name the same way `argh_derive` does.
fn ty_inner<'a>(wrapper: &str, ty: &'a Type) -> Option<&'a Type> {
    let Type::Path(path) = ty else { return None };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
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
