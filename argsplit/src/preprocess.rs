//! Ready-made `stream -> stream` transforms to pass to
//! [`crate::Splitter::with_preprocess_each`] / [`crate::Splitter::with_preprocess_flat`].
//!
//! These are the only pre-processors this crate ships. Anything more
//! involved — `@file` include expansion in particular — is left to an
//! external collaborator satisfying a simple contract (one token in, zero
//! or more tokens out); it is deliberately not provided here.

/// Trim ASCII/Unicode whitespace from both ends of a token. Pass to
/// [`crate::Splitter::with_preprocess_each`].
#[must_use]
pub fn trim(token: String) -> String {
    token.trim().to_owned()
}

/// Drop a token entirely once it has been trimmed to nothing. Pass to
/// [`crate::Splitter::with_preprocess_flat`]; compose with [`trim`] via
/// `with_preprocess_each(trim).with_preprocess_flat(skip_blank)` to also
/// prune tokens that were only whitespace.
#[must_use]
pub fn skip_blank(token: String) -> Vec<String> {
    if token.trim().is_empty() {
        Vec::new()
    } else {
        vec![token]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_strips_whitespace() {
        assert_eq!(trim("  -v  ".to_owned()), "-v");
    }

    #[test]
    fn skip_blank_drops_empty_tokens_only() {
        assert_eq!(skip_blank(String::new()), Vec::<String>::new());
        assert_eq!(skip_blank("   ".to_owned()), Vec::<String>::new());
        assert_eq!(skip_blank("a".to_owned()), vec!["a".to_owned()]);
    }
}
