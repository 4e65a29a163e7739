//! The closed set of option variants and the syntax each one accepts.

/// Tag identifying which of the six option shapes a schema slot holds.
///
/// Carried alongside every [`crate::option::ErasedOption`] purely for
/// bookkeeping (name lookup, the flag-clustering regex, positional-queue
/// construction); the actual decoded/converted type of each option is
/// tracked statically by the generic front-end builders in `option.rs`, not
/// by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// Presence toggles a boolean; defaults to `false`.
    Flag,
    /// Zero-or-one key/value; defaults to an empty slot.
    Single,
    /// Zero-or-more key/values, merged across occurrences; defaults to empty.
    Repeatable,
    /// Exactly-one positional; absence at end of input is a splitting error.
    Required,
    /// All remaining positionals, in order; defaults to empty.
    Varargs,
    /// Switches to a nested schema that consumes the rest of the tokens.
    Branch,
}

impl OptionKind {
    /// Whether this kind is matched positionally (by queue order) rather than by name.
    #[must_use]
    pub fn is_positional(self) -> bool {
        matches!(self, OptionKind::Required | OptionKind::Varargs)
    }
}
