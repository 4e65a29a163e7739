//! The trait a built schema is attached to for the derivation facade.
//!
//! Schema-from-type derivation lives outside the engine proper as an
//! external collaborator producing a built `Schema`. This trait is that
//! contract; the `argsplit_derive` crate (re-exported under the `derive`
//! feature) is one way to implement it, but any hand-written
//! `impl FromArgs for MyStruct` is just as valid.

use crate::error::SplittingError;
use crate::schema::Schema;
use crate::splitter::Splitter;

/// A type whose fields already describe an argsplit [`Schema`].
///
/// Named `FromArgs` (type namespace) deliberately alongside the
/// `#[derive(FromArgs)]` macro (macro namespace, re-exported from
/// `argsplit_derive` under the `derive` feature) — Rust keeps the two
/// namespaces separate, the same trick `serde`/`serde_derive` use for
/// `Serialize`.
pub trait FromArgs: Sized + 'static + Send + Sync {
    /// Build the engine-level schema this type's fields describe.
    fn schema() -> Schema<Self>;

    /// Split `tokens` straight into `Self`, building the schema fresh.
    ///
    /// Schemas are cheap to build and meant to be freely shareable; call
    /// [`FromArgs::schema`] once yourself and reuse a [`Splitter`] if you
    /// are splitting many argument vectors against the same type.
    fn from_args(tokens: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, SplittingError> {
        Splitter::from_schema(Self::schema()).split(tokens)
    }
}
