//! An immutable, validated, ordered list of options plus a finalizer.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{InvalidSchemaError, SplittingError};
use crate::kind::OptionKind;
use crate::option::ErasedOption;

/// Type-erased half of a [`Schema<T>`]: everything the splitter needs to
/// drive option lookup and slot bookkeeping, without knowing `T`.
///
/// This is what lets a `Branch`/`Single`/`Repeatable` option hold a
/// reference to a nested schema whose aggregate type differs from its own.
pub(crate) trait ErasedSchema: Send + Sync {
    fn inner(&self) -> &SchemaInner;
    fn finalize_erased(
        &self,
        values: Vec<Box<dyn Any + Send + Sync>>,
    ) -> Result<Box<dyn Any + Send + Sync>, SplittingError>;
}

/// The structural bookkeeping built once, at [`Schema::build`] time, and
/// reused read-only for every split.
pub(crate) struct SchemaInner {
    pub(crate) options: Vec<Arc<dyn ErasedOption>>,
    /// Non-positional options only: `Required`/`Varargs` names are
    /// identifiers, never lookup keys. Used by the splitter's own
    /// name-matching step.
    pub(crate) name_index: HashMap<String, usize>,
    /// Every option's every name, positional identifiers included. Backs
    /// [`Schema::option_named`], the read-access index a schema exposes for
    /// external collaborators (e.g. a help-text renderer) — distinct from
    /// `name_index` because introspection, unlike splitting, has no reason
    /// to treat positional names specially.
    pub(crate) all_names: HashMap<String, usize>,
    /// Indices of `Required` options, in declaration order.
    pub(crate) required_order: Vec<usize>,
    pub(crate) varargs_index: Option<usize>,
    /// Single-letter flag names (`-a`), keyed by the letter, for the
    /// clustered-flag fallback (`-abc`).
    pub(crate) flag_letters: HashMap<char, usize>,
}

impl SchemaInner {
    fn build(options: Vec<Arc<dyn ErasedOption>>) -> Result<Self, InvalidSchemaError> {
        if options.is_empty() {
            return Err(InvalidSchemaError::EmptySchema);
        }

        let mut name_index = HashMap::new();
        let mut all_names = HashMap::new();
        let mut required_order = Vec::new();
        let mut varargs_index: Option<usize> = None;
        let mut flag_letters = HashMap::new();
        let mut owner_of: HashMap<String, String> = HashMap::new();

        for (idx, opt) in options.iter().enumerate() {
            let descriptor = opt.descriptor();
            for name in opt.names() {
                if let Some(first) = owner_of.get(name) {
                    return Err(InvalidSchemaError::DuplicateName {
                        name: name.clone(),
                        first: first.clone(),
                        second: descriptor.clone(),
                    });
                }
                owner_of.insert(name.clone(), descriptor.clone());
                all_names.insert(name.clone(), idx);
            }

            match opt.kind_tag() {
                OptionKind::Required => {
                    if let Some(varargs_idx) = varargs_index {
                        return Err(InvalidSchemaError::RequiredAfterVarargs {
                            varargs: options[varargs_idx].descriptor(),
                            required: descriptor,
                        });
                    }
                    required_order.push(idx);
                }
                OptionKind::Varargs => {
                    if let Some(first_idx) = varargs_index {
                        return Err(InvalidSchemaError::MultipleVarargs {
                            first: options[first_idx].descriptor(),
                            second: descriptor,
                        });
                    }
                    varargs_index = Some(idx);
                }
                OptionKind::Flag => {
                    for name in opt.names() {
                        if let Some(letter) = single_letter_flag(name) {
                            flag_letters.insert(letter, idx);
                        }
                        name_index.insert(name.clone(), idx);
                    }
                }
                OptionKind::Single | OptionKind::Repeatable | OptionKind::Branch => {
                    for name in opt.names() {
                        name_index.insert(name.clone(), idx);
                    }
                }
            }
        }

        Ok(Self {
            options,
            name_index,
            all_names,
            required_order,
            varargs_index,
            flag_letters,
        })
    }
}

/// A read-only view of one option's schema-level metadata: its names, help
/// text, and kind. A schema exposes read access to its ordered option list
/// and to an index mapping each unique name to its option, for external
/// collaborators (a help-text renderer, a diagnostics dump) that need to
/// describe a schema without touching its internal option builders or
/// nested-schema graph.
#[derive(Debug, Clone, Copy)]
pub struct OptionDescriptor<'a> {
    names: &'a [String],
    help: Option<&'a str>,
    kind: OptionKind,
}

impl<'a> OptionDescriptor<'a> {
    /// This option's lookup names, in declaration order. For a positional
    /// option (`Required`/`Varargs`) these are identifiers only, never
    /// matched against input tokens.
    #[must_use]
    pub fn names(&self) -> &'a [String] {
        self.names
    }

    /// Help text attached via `.help(...)`, if any.
    #[must_use]
    pub fn help(&self) -> Option<&'a str> {
        self.help
    }

    /// Which of the six option variants this is.
    #[must_use]
    pub fn kind(&self) -> OptionKind {
        self.kind
    }
}

/// `-x` where `x` is a single ASCII letter, the shape the clustered-flag
/// fallback recognizes.
fn single_letter_flag(name: &str) -> Option<char> {
    let rest = name.strip_prefix('-')?;
    let mut chars = rest.chars();
    let letter = chars.next()?;
    if chars.next().is_none() && letter.is_ascii_alphabetic() {
        Some(letter)
    } else {
        None
    }
}

/// An immutable, validated schema: an ordered list of options plus a pure
/// finalizer from the decoded positional list to the aggregate `T`.
///
/// Schemas are cheap to clone (an `Arc` clone) and freely shareable across
/// splits; a single `Schema` can back any number of concurrent
/// [`crate::splitter::Splitter`] uses.
pub struct Schema<T> {
    pub(crate) inner: Arc<SchemaInner>,
    pub(crate) finalize: Arc<dyn Fn(Vec<Box<dyn Any + Send + Sync>>) -> Result<T, SplittingError> + Send + Sync>,
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            finalize: Arc::clone(&self.finalize),
        }
    }
}

impl<T: 'static + Send + Sync> Schema<T> {
    #[must_use]
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder::new()
    }

    /// Every option's descriptor, in declaration order — the ordered-list
    /// half of a schema's read access.
    pub fn options(&self) -> impl Iterator<Item = OptionDescriptor<'_>> + '_ {
        self.inner.options.iter().map(|opt| OptionDescriptor {
            names: opt.names(),
            help: opt.help(),
            kind: opt.kind_tag(),
        })
    }

    /// Look up an option by any one of its names — the name-index half of a
    /// schema's read access. Positional (`Required`/`Varargs`) names are
    /// included here even though the splitter itself never matches them by
    /// name; this index is for introspection, not for driving a split.
    #[must_use]
    pub fn option_named(&self, name: &str) -> Option<OptionDescriptor<'_>> {
        let &idx = self.inner.all_names.get(name)?;
        let opt = &self.inner.options[idx];
        Some(OptionDescriptor {
            names: opt.names(),
            help: opt.help(),
            kind: opt.kind_tag(),
        })
    }
}

impl<T: 'static + Send + Sync> ErasedSchema for Schema<T> {
    fn inner(&self) -> &SchemaInner {
        &self.inner
    }

    fn finalize_erased(
        &self,
        values: Vec<Box<dyn Any + Send + Sync>>,
    ) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
        let value = (self.finalize)(values)?;
        Ok(Box::new(value))
    }
}

/// Accumulates options and, on [`SchemaBuilder::finalize`], validates a
/// schema's structural invariants before producing a [`Schema<T>`].
pub struct SchemaBuilder<T> {
    options: Vec<Arc<dyn ErasedOption>>,
    _aggregate: PhantomData<fn() -> T>,
}

impl<T: 'static + Send + Sync> Default for SchemaBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static + Send + Sync> SchemaBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            _aggregate: PhantomData,
        }
    }

    /// Append an option built by one of the `FooOpt` constructors.
    #[must_use]
    #[allow(private_bounds)]
    pub fn option(mut self, option: impl ErasedOption + 'static) -> Self {
        self.options.push(Arc::new(option));
        self
    }

    /// Validate the schema and pair it with its finalizer.
    ///
    /// `finalize` receives the decoded value of every option, boxed in
    /// declaration order; downcast each entry to the type the corresponding
    /// `FooOpt<E>` builder was declared with.
    pub fn finalize(
        self,
        finalize: impl Fn(Vec<Box<dyn Any + Send + Sync>>) -> Result<T, SplittingError> + Send + Sync + 'static,
    ) -> Result<Schema<T>, InvalidSchemaError> {
        let inner = SchemaInner::build(self.options)?;
        Ok(Schema {
            inner: Arc::new(inner),
            finalize: Arc::new(finalize),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::{FlagOpt, RequiredOpt, VarargsOpt};

    #[test]
    fn empty_schema_is_rejected() {
        let err = SchemaBuilder::<()>::new()
            .finalize(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, InvalidSchemaError::EmptySchema));
    }

    #[test]
    fn duplicate_names_across_options_are_rejected() {
        let err = SchemaBuilder::<()>::new()
            .option(FlagOpt::new(["-v"]).unwrap())
            .option(FlagOpt::new(["-v"]).unwrap())
            .finalize(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, InvalidSchemaError::DuplicateName { .. }));
    }

    #[test]
    fn multiple_varargs_are_rejected() {
        let err = SchemaBuilder::<()>::new()
            .option(VarargsOpt::new(["a"]).unwrap())
            .option(VarargsOpt::new(["b"]).unwrap())
            .finalize(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, InvalidSchemaError::MultipleVarargs { .. }));
    }

    #[test]
    fn required_after_varargs_is_rejected() {
        let err = SchemaBuilder::<()>::new()
            .option(VarargsOpt::new(["files"]).unwrap())
            .option(RequiredOpt::new(["name"]).unwrap())
            .finalize(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, InvalidSchemaError::RequiredAfterVarargs { .. }));
    }

    #[test]
    fn options_lists_descriptors_in_declaration_order() {
        let schema = SchemaBuilder::<()>::new()
            .option(FlagOpt::new(["-v", "--verbose"]).unwrap().help("be noisy").unwrap())
            .option(RequiredOpt::new(["name"]).unwrap())
            .finalize(|_| Ok(()))
            .unwrap();
        let descriptors: Vec<_> = schema.options().collect();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].names(), ["-v", "--verbose"]);
        assert_eq!(descriptors[0].help(), Some("be noisy"));
        assert_eq!(descriptors[0].kind(), OptionKind::Flag);
        assert_eq!(descriptors[1].names(), ["name"]);
        assert_eq!(descriptors[1].kind(), OptionKind::Required);
    }

    #[test]
    fn option_named_finds_positional_names_too() {
        let schema = SchemaBuilder::<()>::new()
            .option(RequiredOpt::new(["name"]).unwrap())
            .finalize(|_| Ok(()))
            .unwrap();
        assert!(schema.option_named("name").is_some());
        assert!(schema.option_named("missing").is_none());
    }
}
