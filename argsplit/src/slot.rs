//! The per-option workspace slot: raw, decoded-but-not-yet-converted state.

use std::any::Any;

use crate::kind::OptionKind;

/// The raw container a token-stream match deposits into before conversion.
///
/// A [`crate::splitter::Splitter`] initializes one `Slot` per option at the
/// start of a split (see `Slot::default_for`), mutates it while tokens
/// match, and only at the very end hands it to the option's converter. No
/// partial slot ever escapes the splitter.
pub(crate) enum Slot {
    Flag(bool),
    Single(Option<String>),
    List(Vec<String>),
    /// `None` until a token fills it; finalizing with `None` is `MissingRequired`.
    Required(Option<String>),
    /// Holds the already-finalized nested aggregate, type-erased. Used by
    /// `Single` and `Branch` options with a nested schema.
    Nested(Option<Box<dyn Any + Send + Sync>>),
    /// Like `Nested`, but accumulates one entry per occurrence. Used by a
    /// `Repeatable` option with a nested schema.
    NestedList(Vec<Box<dyn Any + Send + Sync>>),
}

impl Slot {
    pub(crate) fn default_for(kind: OptionKind, nested: bool) -> Self {
        match (kind, nested) {
            (OptionKind::Flag, _) => Slot::Flag(false),
            (OptionKind::Single, false) => Slot::Single(None),
            (OptionKind::Single, true) => Slot::Nested(None),
            (OptionKind::Repeatable, false) => Slot::List(Vec::new()),
            (OptionKind::Repeatable, true) => Slot::NestedList(Vec::new()),
            (OptionKind::Varargs, _) => Slot::List(Vec::new()),
            (OptionKind::Required, _) => Slot::Required(None),
            (OptionKind::Branch, _) => Slot::Nested(None),
        }
    }

    /// Whether this slot still holds the kind's built-in empty value, i.e.
    /// no token has touched it. Used to decide whether a user-supplied
    /// default should be substituted during finalization.
    pub(crate) fn is_empty_default(&self) -> bool {
        match self {
            Slot::Flag(present) => !present,
            Slot::Single(v) => v.is_none(),
            Slot::List(v) => v.is_empty(),
            Slot::Required(v) => v.is_none(),
            Slot::Nested(v) => v.is_none(),
            Slot::NestedList(v) => v.is_empty(),
        }
    }
}
