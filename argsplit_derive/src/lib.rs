use proc_macro::TokenStream;
use std::fmt;
mod derive;

/// Builds an `argsplit::Schema` from a struct declaration: the ergonomic,
/// statically typed front-end for schema construction, in place of
/// reflective schema-from-type derivation.
///
/// Field type drives the option kind: `bool` -> Flag, `Option<T>` -> Single, `Vec<T>` -> Repeatable,
/// any other `T` -> Required. Two field attributes change that default:
/// `#[argsplit(varargs)]` turns a `Vec<T>` field into Varargs instead of
/// Repeatable (Rust has no separate fixed-array type worth distinguishing
/// here), and `#[argsplit(branch)]` turns an `Option<T>` field (`T` must
/// implement `FromArgs`) into a Branch instead of a nested Single.
///
/// ### Field-level attributes
/// - **`names`**: comma-separated lookup names, e.g. `#[argsplit(names = "-f, --file")]`.
///   Defaults to `--<field-name-in-kebab-case>` for named options, or the
///   bare field name for positional (`Required`/`Varargs`) options.
/// - **`help`**: help text attached via `Option::help`.
/// - **`default`**: a Rust expression (as a string literal) passed to
///   `default_value`; must already have the shape the option kind expects
///   (`T` for Flag, `E` for Single/Branch, `Vec<E>` for Repeatable/Varargs).
/// - **`nested`**: on an `Option<T>`/`Vec<T>` field, recurse into `T`'s own
///   `FromArgs::schema()` instead of converting a raw string (`T` must
///   implement `FromArgs`).
/// - **`varargs`**: on a `Vec<T>` field, use Varargs instead of Repeatable.
/// - **`branch`**: on an `Option<T>` field, use Branch instead of a nested Single.
#[proc_macro_derive(FromArgs, attributes(argsplit))]
pub fn derive_from_args(input: TokenStream) -> TokenStream {
    derive::derive_from_args(input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// error just prepares an error message that references the source span
pub(crate) fn error<S: AsRef<str> + fmt::Display, T>(msg: S) -> syn::Result<T> {
    Err(syn::Error::new(proc_macro2::Span::call_site(), msg))
}
