//! The six option builders (`Flag`, `Single`, `Repeatable`, `Required`,
//! `Varargs`, `Branch`) and the type-erased view the schema stores them as.
//!
//! Each builder is generic over its *element* type only; the container
//! shape (scalar, `Option<E>`, `Vec<E>`) is fixed by which builder you used,
//! so `.convert()` can only ever transmute the element — the shape-
//! preservation rule is therefore enforced by the type checker rather than
//! at runtime.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConvertError, InvalidSchemaError, SplittingError};
use crate::kind::OptionKind;
use crate::schema::{ErasedSchema, Schema};
use crate::slot::Slot;

/// Type-erased view of an option, as stored inside a built [`crate::schema::Schema`].
///
/// Internal to the crate: users only ever see the concrete `FooOpt<E>`
/// builders below. The splitter drives a schema purely through this trait.
pub(crate) trait ErasedOption: Send + Sync {
    fn names(&self) -> &[String];
    fn help(&self) -> Option<&str>;
    fn kind_tag(&self) -> OptionKind;
    fn nested(&self) -> Option<&Arc<dyn ErasedSchema>>;
    fn default_slot(&self) -> Slot {
        Slot::default_for(self.kind_tag(), self.nested().is_some())
    }
    fn finalize(&self, slot: Slot) -> Result<Box<dyn Any + Send + Sync>, SplittingError>;

    fn descriptor(&self) -> String {
        self.names().join("/")
    }
}

fn converter_failed(option: &str, cause: ConvertError) -> SplittingError {
    SplittingError::ConverterFailed {
        option: option.to_owned(),
        cause,
    }
}

fn downcast_nested<U: 'static>(boxed: Box<dyn Any + Send + Sync>) -> U {
    *boxed
        .downcast::<U>()
        .unwrap_or_else(|_| panic!("nested schema produced a value of an unexpected type"))
}

fn collect_names(
    names: impl IntoIterator<Item = impl Into<String>>,
    kind_label: &str,
) -> Result<Vec<String>, InvalidSchemaError> {
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    if names.is_empty() {
        return Err(InvalidSchemaError::InvalidNames {
            option: format!("<unnamed {kind_label}>"),
            reason: "at least one name is required".to_owned(),
        });
    }
    let mut seen = HashSet::new();
    for name in &names {
        if name.is_empty() {
            return Err(InvalidSchemaError::InvalidNames {
                option: names.join("/"),
                reason: "names must not be empty".to_owned(),
            });
        }
        if !seen.insert(name.clone()) {
            return Err(InvalidSchemaError::InvalidNames {
                option: names.join("/"),
                reason: format!("name {name:?} repeated within the same option"),
            });
        }
    }
    Ok(names)
}

macro_rules! common_builder_methods {
    ($opt:ident) => {
        /// Attach help text; fails if this builder already carries one.
        pub fn help(mut self, text: impl Into<String>) -> Result<Self, InvalidSchemaError> {
            if self.help.is_some() {
                return Err(InvalidSchemaError::HelpAlreadySet {
                    option: self.names.join("/"),
                });
            }
            self.help = Some(text.into());
            Ok(self)
        }
    };
}

/// Presence toggles a boolean; defaults to `false`.
pub struct FlagOpt<T = bool> {
    names: Vec<String>,
    help: Option<String>,
    default: Option<T>,
    decode: Arc<dyn Fn(bool) -> Result<T, ConvertError> + Send + Sync>,
}

impl FlagOpt<bool> {
    /// Construct with the built-in identity converter (`bool -> bool`).
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, InvalidSchemaError> {
        Ok(Self {
            names: collect_names(names, "flag")?,
            help: None,
            default: None,
            decode: Arc::new(Ok),
        })
    }
}

impl<T: 'static + Send + Sync> FlagOpt<T> {
    common_builder_methods!(FlagOpt);

    /// Substitute `value` whenever the flag was not present (raw slot `false`).
    pub fn default_value(mut self, value: T) -> Self
    where
        T: Clone,
    {
        self.default = Some(value);
        self
    }

    /// Transmute the decoded boolean into `R`. Flag has no container to
    /// preserve, so the target type is unconstrained.
    pub fn convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(T) -> R + Send + Sync + 'static,
    ) -> FlagOpt<R> {
        let prev = self.decode;
        FlagOpt {
            names: self.names,
            help: self.help,
            default: None,
            decode: Arc::new(move |b| prev(b).map(&f)),
        }
    }

    /// Like [`FlagOpt::convert`], but `f` may itself fail; a returned
    /// [`ConvertError`] propagates as [`SplittingError::ConverterFailed`].
    pub fn try_convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(T) -> Result<R, ConvertError> + Send + Sync + 'static,
    ) -> FlagOpt<R> {
        let prev = self.decode;
        FlagOpt {
            names: self.names,
            help: self.help,
            default: None,
            decode: Arc::new(move |b| prev(b).and_then(&f)),
        }
    }
}

impl<T: 'static + Clone + Send + Sync> ErasedOption for FlagOpt<T> {
    fn names(&self) -> &[String] {
        &self.names
    }
    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
    fn kind_tag(&self) -> OptionKind {
        OptionKind::Flag
    }
    fn nested(&self) -> Option<&Arc<dyn ErasedSchema>> {
        None
    }
    fn finalize(&self, slot: Slot) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
        let Slot::Flag(present) = slot else {
            unreachable!("FlagOpt only ever receives Slot::Flag")
        };
        if !present {
            if let Some(default) = &self.default {
                return Ok(Box::new(default.clone()));
            }
        }
        let value = (self.decode)(present).map_err(|e| converter_failed(&self.descriptor(), e))?;
        Ok(Box::new(value))
    }
}

/// Zero-or-one key/value; stored as `Option<E>`, defaults to `None`.
pub struct SingleOpt<E = String> {
    names: Vec<String>,
    help: Option<String>,
    default: Option<E>,
    nested: Option<Arc<dyn ErasedSchema>>,
    decode: Arc<dyn Fn(Slot) -> Result<Option<E>, ConvertError> + Send + Sync>,
}

impl SingleOpt<String> {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, InvalidSchemaError> {
        Ok(Self {
            names: collect_names(names, "single")?,
            help: None,
            default: None,
            nested: None,
            decode: Arc::new(|slot| match slot {
                Slot::Single(v) => Ok(v),
                _ => unreachable!("SingleOpt without a nested schema only receives Slot::Single"),
            }),
        })
    }

    /// Resolve the raw string through `parser` — the composable converter
    /// pipeline built on [`crate::convert::ValueParser`], the mechanism the
    /// derive facade uses to pick a converter for a field's declared type.
    pub fn convert_with<R: 'static + Send + Sync>(
        self,
        parser: crate::convert::ValueParser<R>,
    ) -> SingleOpt<R> {
        self.try_convert(move |raw: String| parser.parse(&raw))
    }
}

impl<E: 'static + Send + Sync> SingleOpt<E> {
    common_builder_methods!(SingleOpt);

    /// Consume the rest of the input via `schema` instead of a plain string value.
    pub fn nested_schema<U: 'static + Send + Sync>(
        self,
        schema: Schema<U>,
    ) -> Result<SingleOpt<U>, InvalidSchemaError> {
        if self.nested.is_some() {
            return Err(InvalidSchemaError::NestedAlreadySet {
                option: self.names.join("/"),
            });
        }
        Ok(SingleOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: Some(Arc::new(schema)),
            decode: Arc::new(|slot| match slot {
                Slot::Nested(v) => Ok(v.map(downcast_nested::<U>)),
                _ => unreachable!("SingleOpt with a nested schema only receives Slot::Nested"),
            }),
        })
    }

    /// Substitute `Some(value)` whenever no value was given.
    pub fn default_value(mut self, value: E) -> Self
    where
        E: Clone,
    {
        self.default = Some(value);
        self
    }

    /// Map the element; `Option`-shape is preserved automatically.
    pub fn convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> R + Send + Sync + 'static,
    ) -> SingleOpt<R> {
        let prev = self.decode;
        SingleOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: self.nested,
            decode: Arc::new(move |slot| prev(slot).map(|opt| opt.map(&f))),
        }
    }

    /// Like [`SingleOpt::convert`], but `f` may itself fail.
    pub fn try_convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> Result<R, ConvertError> + Send + Sync + 'static,
    ) -> SingleOpt<R> {
        let prev = self.decode;
        SingleOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: self.nested,
            decode: Arc::new(move |slot| prev(slot).and_then(|opt| opt.map(&f).transpose())),
        }
    }
}

impl<E: 'static + Clone + Send + Sync> ErasedOption for SingleOpt<E> {
    fn names(&self) -> &[String] {
        &self.names
    }
    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
    fn kind_tag(&self) -> OptionKind {
        OptionKind::Single
    }
    fn nested(&self) -> Option<&Arc<dyn ErasedSchema>> {
        self.nested.as_ref()
    }
    fn finalize(&self, slot: Slot) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
        if slot.is_empty_default() {
            if let Some(default) = &self.default {
                return Ok(Box::new(Some(default.clone())));
            }
        }
        let value = (self.decode)(slot).map_err(|e| converter_failed(&self.descriptor(), e))?;
        Ok(Box::new(value))
    }
}

/// Zero-or-more key/values merged across occurrences; stored as `Vec<E>`, defaults to empty.
pub struct RepeatableOpt<E = String> {
    names: Vec<String>,
    help: Option<String>,
    default: Option<Vec<E>>,
    nested: Option<Arc<dyn ErasedSchema>>,
    decode: Arc<dyn Fn(Slot) -> Result<Vec<E>, ConvertError> + Send + Sync>,
}

impl RepeatableOpt<String> {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, InvalidSchemaError> {
        Ok(Self {
            names: collect_names(names, "repeatable")?,
            help: None,
            default: None,
            nested: None,
            decode: Arc::new(|slot| match slot {
                Slot::List(v) => Ok(v),
                _ => unreachable!("RepeatableOpt without a nested schema only receives Slot::List"),
            }),
        })
    }

    /// Resolve every raw element through `parser` (see [`SingleOpt::convert_with`]).
    pub fn convert_with<R: 'static + Send + Sync>(
        self,
        parser: crate::convert::ValueParser<R>,
    ) -> RepeatableOpt<R> {
        self.try_convert(move |raw: String| parser.parse(&raw))
    }
}

impl<E: 'static + Send + Sync> RepeatableOpt<E> {
    common_builder_methods!(RepeatableOpt);

    /// Each occurrence of this option recurses into `schema` and appends its result.
    pub fn nested_schema<U: 'static + Send + Sync>(
        self,
        schema: Schema<U>,
    ) -> Result<RepeatableOpt<U>, InvalidSchemaError> {
        if self.nested.is_some() {
            return Err(InvalidSchemaError::NestedAlreadySet {
                option: self.names.join("/"),
            });
        }
        Ok(RepeatableOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: Some(Arc::new(schema)),
            decode: Arc::new(|slot| match slot {
                Slot::NestedList(v) => Ok(v.into_iter().map(downcast_nested::<U>).collect()),
                _ => unreachable!("RepeatableOpt with a nested schema only receives Slot::NestedList"),
            }),
        })
    }

    pub fn default_value(mut self, value: Vec<E>) -> Self
    where
        E: Clone,
    {
        self.default = Some(value);
        self
    }

    /// Map every element; `Vec`-shape is preserved automatically.
    pub fn convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> R + Send + Sync + 'static,
    ) -> RepeatableOpt<R> {
        let prev = self.decode;
        RepeatableOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: self.nested,
            decode: Arc::new(move |slot| prev(slot).map(|v| v.into_iter().map(&f).collect())),
        }
    }

    /// Like [`RepeatableOpt::convert`], but `f` may itself fail; the first
    /// element to fail aborts the rest.
    pub fn try_convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> Result<R, ConvertError> + Send + Sync + 'static,
    ) -> RepeatableOpt<R> {
        let prev = self.decode;
        RepeatableOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: self.nested,
            decode: Arc::new(move |slot| prev(slot).and_then(|v| v.into_iter().map(&f).collect())),
        }
    }
}

impl<E: 'static + Clone + Send + Sync> ErasedOption for RepeatableOpt<E> {
    fn names(&self) -> &[String] {
        &self.names
    }
    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
    fn kind_tag(&self) -> OptionKind {
        OptionKind::Repeatable
    }
    fn nested(&self) -> Option<&Arc<dyn ErasedSchema>> {
        self.nested.as_ref()
    }
    fn finalize(&self, slot: Slot) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
        if slot.is_empty_default() {
            if let Some(default) = &self.default {
                return Ok(Box::new(default.clone()));
            }
        }
        let value = (self.decode)(slot).map_err(|e| converter_failed(&self.descriptor(), e))?;
        Ok(Box::new(value))
    }
}

/// Exactly-one positional value; absence at end of input is `MissingRequired`.
pub struct RequiredOpt<E = String> {
    names: Vec<String>,
    help: Option<String>,
    decode: Arc<dyn Fn(String) -> Result<E, ConvertError> + Send + Sync>,
}

impl RequiredOpt<String> {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, InvalidSchemaError> {
        Ok(Self {
            names: collect_names(names, "required")?,
            help: None,
            decode: Arc::new(Ok),
        })
    }

    /// Resolve the raw positional through `parser` (see [`SingleOpt::convert_with`]).
    pub fn convert_with<R: 'static + Send + Sync>(
        self,
        parser: crate::convert::ValueParser<R>,
    ) -> RequiredOpt<R> {
        self.try_convert(move |raw: String| parser.parse(&raw))
    }
}

impl<E: 'static + Send + Sync> RequiredOpt<E> {
    common_builder_methods!(RequiredOpt);

    /// Map the single positional value. There is no default to preserve: a
    /// `Required` option absent at end of input is always `MissingRequired`.
    pub fn convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> R + Send + Sync + 'static,
    ) -> RequiredOpt<R> {
        let prev = self.decode;
        RequiredOpt {
            names: self.names,
            help: self.help,
            decode: Arc::new(move |s| prev(s).map(&f)),
        }
    }

    /// Like [`RequiredOpt::convert`], but `f` may itself fail.
    pub fn try_convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> Result<R, ConvertError> + Send + Sync + 'static,
    ) -> RequiredOpt<R> {
        let prev = self.decode;
        RequiredOpt {
            names: self.names,
            help: self.help,
            decode: Arc::new(move |s| prev(s).and_then(&f)),
        }
    }
}

impl<E: 'static + Send + Sync> ErasedOption for RequiredOpt<E> {
    fn names(&self) -> &[String] {
        &self.names
    }
    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
    fn kind_tag(&self) -> OptionKind {
        OptionKind::Required
    }
    fn nested(&self) -> Option<&Arc<dyn ErasedSchema>> {
        None
    }
    fn finalize(&self, slot: Slot) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
        let Slot::Required(raw) = slot else {
            unreachable!("RequiredOpt only ever receives Slot::Required")
        };
        let raw = raw.expect(
            "the splitter raises MissingRequired before finalizing a schema with an unfilled required slot",
        );
        let value = (self.decode)(raw).map_err(|e| converter_failed(&self.descriptor(), e))?;
        Ok(Box::new(value))
    }
}

/// All remaining positionals, in order; stored as `Vec<E>`, defaults to empty.
pub struct VarargsOpt<E = String> {
    names: Vec<String>,
    help: Option<String>,
    default: Option<Vec<E>>,
    decode: Arc<dyn Fn(String) -> Result<E, ConvertError> + Send + Sync>,
}

impl VarargsOpt<String> {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, InvalidSchemaError> {
        Ok(Self {
            names: collect_names(names, "varargs")?,
            help: None,
            default: None,
            decode: Arc::new(Ok),
        })
    }

    /// Resolve every raw positional through `parser` (see [`SingleOpt::convert_with`]).
    pub fn convert_with<R: 'static + Send + Sync>(
        self,
        parser: crate::convert::ValueParser<R>,
    ) -> VarargsOpt<R> {
        self.try_convert(move |raw: String| parser.parse(&raw))
    }
}

impl<E: 'static + Send + Sync> VarargsOpt<E> {
    common_builder_methods!(VarargsOpt);

    pub fn default_value(mut self, value: Vec<E>) -> Self
    where
        E: Clone,
    {
        self.default = Some(value);
        self
    }

    /// Map every element; `Vec`-shape is preserved automatically.
    pub fn convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> R + Send + Sync + 'static,
    ) -> VarargsOpt<R> {
        let prev = self.decode;
        VarargsOpt {
            names: self.names,
            help: self.help,
            default: None,
            decode: Arc::new(move |s| prev(s).map(&f)),
        }
    }

    /// Like [`VarargsOpt::convert`], but `f` may itself fail.
    pub fn try_convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> Result<R, ConvertError> + Send + Sync + 'static,
    ) -> VarargsOpt<R> {
        let prev = self.decode;
        VarargsOpt {
            names: self.names,
            help: self.help,
            default: None,
            decode: Arc::new(move |s| prev(s).and_then(&f)),
        }
    }
}

impl<E: 'static + Clone + Send + Sync> ErasedOption for VarargsOpt<E> {
    fn names(&self) -> &[String] {
        &self.names
    }
    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
    fn kind_tag(&self) -> OptionKind {
        OptionKind::Varargs
    }
    fn nested(&self) -> Option<&Arc<dyn ErasedSchema>> {
        None
    }
    fn finalize(&self, slot: Slot) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
        let Slot::List(raws) = slot else {
            unreachable!("VarargsOpt only ever receives Slot::List")
        };
        if raws.is_empty() {
            if let Some(default) = &self.default {
                return Ok(Box::new(default.clone()));
            }
        }
        let mut values = Vec::with_capacity(raws.len());
        for raw in raws {
            values.push((self.decode)(raw).map_err(|e| converter_failed(&self.descriptor(), e))?);
        }
        Ok(Box::new(values))
    }
}

/// Switches to a nested schema that consumes the rest of the token stream;
/// stored as `Option<E>`, defaults to `None` (branch not taken).
pub struct BranchOpt<E> {
    names: Vec<String>,
    help: Option<String>,
    default: Option<E>,
    nested: Arc<dyn ErasedSchema>,
    decode: Arc<dyn Fn(Slot) -> Result<Option<E>, ConvertError> + Send + Sync>,
}

impl<U: 'static + Send + Sync> BranchOpt<U> {
    /// Construct a branch to `schema`. `nested_schema` is mandatory for a
    /// branch (there is no string-based base case to fall back to).
    pub fn new(
        names: impl IntoIterator<Item = impl Into<String>>,
        schema: Schema<U>,
    ) -> Result<Self, InvalidSchemaError> {
        Ok(Self {
            names: collect_names(names, "branch")?,
            help: None,
            default: None,
            nested: Arc::new(schema),
            decode: Arc::new(|slot| match slot {
                Slot::Nested(v) => Ok(v.map(downcast_nested::<U>)),
                _ => unreachable!("BranchOpt only ever receives Slot::Nested"),
            }),
        })
    }
}

impl<E: 'static + Send + Sync> BranchOpt<E> {
    common_builder_methods!(BranchOpt);

    pub fn default_value(mut self, value: E) -> Self
    where
        E: Clone,
    {
        self.default = Some(value);
        self
    }

    /// Map the chosen branch's aggregate; `Option`-shape is preserved automatically.
    pub fn convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> R + Send + Sync + 'static,
    ) -> BranchOpt<R> {
        let prev = self.decode;
        BranchOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: self.nested,
            decode: Arc::new(move |slot| prev(slot).map(|opt| opt.map(&f))),
        }
    }

    /// Like [`BranchOpt::convert`], but `f` may itself fail.
    pub fn try_convert<R: 'static + Send + Sync>(
        self,
        f: impl Fn(E) -> Result<R, ConvertError> + Send + Sync + 'static,
    ) -> BranchOpt<R> {
        let prev = self.decode;
        BranchOpt {
            names: self.names,
            help: self.help,
            default: None,
            nested: self.nested,
            decode: Arc::new(move |slot| prev(slot).and_then(|opt| opt.map(&f).transpose())),
        }
    }
}

impl<E: 'static + Clone + Send + Sync> ErasedOption for BranchOpt<E> {
    fn names(&self) -> &[String] {
        &self.names
    }
    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
    fn kind_tag(&self) -> OptionKind {
        OptionKind::Branch
    }
    fn nested(&self) -> Option<&Arc<dyn ErasedSchema>> {
        Some(&self.nested)
    }
    fn finalize(&self, slot: Slot) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
        if slot.is_empty_default() {
            if let Some(default) = &self.default {
                return Ok(Box::new(Some(default.clone())));
            }
        }
        let value = (self.decode)(slot).map_err(|e| converter_failed(&self.descriptor(), e))?;
        Ok(Box::new(value))
    }
}

impl fmt::Debug for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OptionKind::Flag => "Flag",
            OptionKind::Single => "Single",
            OptionKind::Repeatable => "Repeatable",
            OptionKind::Required => "Required",
            OptionKind::Varargs => "Varargs",
            OptionKind::Branch => "Branch",
        };
        f.write_str(label)
    }
}
