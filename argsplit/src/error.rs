//! Error types returned by schema construction and by the splitter.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Failure to build a [`crate::schema::Schema`] from its options.
///
/// These are programming errors: they are raised once, at construction time,
/// and never as a result of splitting an argument vector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidSchemaError {
    /// A schema must declare at least one option.
    #[error("schema has no options")]
    EmptySchema,
    /// Two options in the same schema share a lookup name.
    #[error("duplicate option name {name:?} (used by both {first} and {second})")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },
    /// More than one `Varargs` option was added to the same schema.
    #[error("schema has more than one varargs option: {first} and {second}")]
    MultipleVarargs { first: String, second: String },
    /// A `Required` positional was declared after a `Varargs` option.
    #[error("required option {required} declared after varargs option {varargs}")]
    RequiredAfterVarargs { varargs: String, required: String },
    /// An option declared an empty or duplicate name at construction.
    #[error("option {option} has an invalid name set: {reason}")]
    InvalidNames { option: String, reason: String },
    /// `Option::help` was called twice on the same builder.
    #[error("help text already set for option {option}")]
    HelpAlreadySet { option: String },
    /// `Option::nested_schema` was called twice on the same builder.
    #[error("nested schema already set for option {option}")]
    NestedAlreadySet { option: String },
}

/// The cause wrapped by [`SplittingError::ConverterFailed`].
///
/// Mirrors a thrown exception in the source design: any error a converter
/// produces is captured here unchanged and surfaced to the caller.
#[derive(Debug, Clone)]
pub struct ConvertError(pub Arc<dyn std::error::Error + Send + Sync>);

impl ConvertError {
    pub fn new(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(cause))
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        #[derive(Debug)]
        struct Message(String);
        impl fmt::Display for Message {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
        impl std::error::Error for Message {}
        Self(Arc::new(Message(message.into())))
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

impl PartialEq for ConvertError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
impl Eq for ConvertError {}

/// Every failure a [`crate::splitter::Splitter`] can report at split time.
///
/// Splitting either succeeds with a fully populated aggregate or fails with
/// exactly one of these variants; no partial workspace is ever exposed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplittingError {
    /// The input ended while one or more `Required` options were still unfilled.
    #[error("missing required argument(s): {}", .names.join(", "))]
    MissingRequired { names: Vec<String> },
    /// A `Single`/`Repeatable` name was matched but no value token followed it.
    #[error("option {name} expects a value but none was given")]
    MissingArgument { name: String },
    /// Tokens remained after every option was satisfied and no `Varargs` absorbed them.
    #[error("unhandled arguments: {}", .remaining.join(", "))]
    UnhandledArguments { remaining: Vec<String> },
    /// Tokens remained in the deque after a `Branch` option's nested schema returned.
    #[error("extra arguments after branch {branch}: {}", .remaining.join(", "))]
    ExtraArguments {
        branch: String,
        remaining: Vec<String>,
    },
    /// An option's converter raised an error while decoding its slot.
    #[error("converter for option {option} failed: {cause}")]
    ConverterFailed { option: String, cause: ConvertError },
}
