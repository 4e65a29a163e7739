//! Schema-driven splitting of argument vectors into typed values.
//!
//! A schema is an ordered list of [`FlagOpt`], [`SingleOpt`],
//! [`RepeatableOpt`], [`RequiredOpt`], [`VarargsOpt`] and [`BranchOpt`]
//! builders assembled through [`Schema::builder`]. A [`Splitter`] drives
//! that schema against a token stream and produces the user's aggregate
//! type, or a single [`SplittingError`].
//!
//! ```
//! use argsplit::{FlagOpt, Schema, SingleOpt, Splitter, VarargsOpt};
//!
//! let schema = Schema::builder()
//!     .option(FlagOpt::new(["-c", "--create"]).unwrap())
//!     .option(SingleOpt::new(["-f", "--file"]).unwrap())
//!     .option(VarargsOpt::new(["files"]).unwrap())
//!     .finalize(|mut values| {
//!         let mut values = values.drain(..);
//!         Ok((
//!             *values.next().unwrap().downcast::<bool>().unwrap(),
//!             *values.next().unwrap().downcast::<Option<String>>().unwrap(),
//!             *values.next().unwrap().downcast::<Vec<String>>().unwrap(),
//!         ))
//!     })
//!     .unwrap();
//!
//! let (create, file, files) = Splitter::from_schema(schema)
//!     .split(["--create", "--file=classes.jar", "Foo.class"])
//!     .unwrap();
//! assert!(create);
//! assert_eq!(file.as_deref(), Some("classes.jar"));
//! assert_eq!(files, vec!["Foo.class".to_owned()]);
//! ```
//!
//! Out of scope for this crate (see the crate-level design document):
//! reflective schema-from-struct derivation beyond the opt-in
//! [`FromArgs`] trait and its `derive` feature, help-text rendering, and
//! `@file`-style argument pre-processing beyond the two helpers in
//! [`preprocess`].

mod convert;
mod derive_support;
mod diag;
mod error;
mod kind;
mod option;
pub mod preprocess;
mod schema;
mod slot;
mod splitter;

pub use convert::{
    bool_parser, default_parser, identity_parser, ConverterManifest, ParseFromStr, ValueParser,
};
pub use derive_support::FromArgs;
pub use error::{ConvertError, InvalidSchemaError, SplittingError};
pub use kind::OptionKind;
pub use option::{BranchOpt, FlagOpt, RepeatableOpt, RequiredOpt, SingleOpt, VarargsOpt};
pub use schema::{OptionDescriptor, Schema, SchemaBuilder};
pub use splitter::Splitter;

/// The `#[derive(FromArgs)]` macro. Builds a [`Schema`]/[`FromArgs`] impl
/// from a struct declaration, the preferred ergonomic front-end for
/// statically typed languages. Lives in the separate `argsplit_derive`
/// proc-macro crate (proc-macro crates can't ship anything else),
/// re-exported here so most users depend on a single crate — the same
/// shape as `serde`/`serde_derive`.
#[cfg(feature = "derive")]
pub use argsplit_derive::FromArgs;
