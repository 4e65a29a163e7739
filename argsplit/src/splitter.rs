//! The argument-stream splitter state machine.
//!
//! A [`Splitter<T>`] pairs a built [`Schema<T>`] with an optional chain of
//! pre-processors and drives a single state machine: long-name lookup,
//! `name=value` attachment, `-abc` flag clustering, `--` escape,
//! nested-schema recursion, and positional (`Required`/`Varargs`) filling.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::diag::{debug, trace};
use crate::error::SplittingError;
use crate::kind::OptionKind;
use crate::schema::{ErasedSchema, Schema, SchemaInner};
use crate::slot::Slot;

/// Builds a `T` from an argument vector according to a [`Schema<T>`].
///
/// Cheap to clone: the schema is `Arc`-backed and the pre-processor chain is
/// a single boxed closure. A `Splitter` has no mutable state of its own —
/// every split starts from a fresh [`Slot`] workspace.
pub struct Splitter<T> {
    schema: Schema<T>,
    preprocess: Arc<dyn Fn(Vec<String>) -> Vec<String> + Send + Sync>,
}

impl<T> Clone for Splitter<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            preprocess: Arc::clone(&self.preprocess),
        }
    }
}

impl<T: 'static + Send + Sync> Splitter<T> {
    /// The only mandatory factory: a splitter with no pre-processing.
    #[must_use]
    pub fn from_schema(schema: Schema<T>) -> Self {
        Self {
            schema,
            preprocess: Arc::new(|tokens| tokens),
        }
    }

    /// Returns a new `Splitter` that maps `f` over every token before
    /// splitting. Chains left-to-right with any pre-processor already
    /// attached.
    #[must_use]
    pub fn with_preprocess_each(self, f: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        let prev = self.preprocess;
        Self {
            schema: self.schema,
            preprocess: Arc::new(move |tokens| prev(tokens).into_iter().map(&f).collect()),
        }
    }

    /// Returns a new `Splitter` that expands each token into zero or more
    /// output tokens before splitting (the shape an `@file`-style include
    /// expansion needs, without committing to any particular expansion).
    #[must_use]
    pub fn with_preprocess_flat(
        self,
        f: impl Fn(String) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        let prev = self.preprocess;
        Self {
            schema: self.schema,
            preprocess: Arc::new(move |tokens| prev(tokens).into_iter().flat_map(&f).collect()),
        }
    }

    /// Run the state machine over `tokens`, producing the schema's
    /// aggregate or a single [`SplittingError`].
    pub fn split(
        &self,
        tokens: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<T, SplittingError> {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let tokens = (self.preprocess)(tokens);
        let mut pending: VecDeque<String> = tokens.into_iter().collect();
        let boxed = split_schema(&self.schema, &mut pending, false)?;
        Ok(*boxed
            .downcast::<T>()
            .expect("a schema's finalizer always produces its own aggregate type"))
    }
}

/// Split `pending` against `schema`, recursing into nested schemas for
/// `Branch`/`Single`/`Repeatable` matches. `nested` distinguishes the two
/// step-7 exit shapes: a nested call hands unconsumed input back to its
/// caller, a top-level call either drains a `Varargs` or fails.
fn split_schema(
    schema: &(impl ErasedSchema + ?Sized),
    pending: &mut VecDeque<String>,
    nested: bool,
) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
    let inner = schema.inner();
    let mut slots: Vec<Slot> = inner
        .options
        .iter()
        .map(|opt| opt.default_slot())
        .collect();
    let mut required_queue: VecDeque<usize> = inner.required_order.iter().copied().collect();
    let mut double_dash = false;

    while let Some(token) = pending.pop_front() {
        if !double_dash && token == "--" {
            trace!("entering double-dash mode");
            double_dash = true;
            continue;
        }

        let (head, tail) = split_head_tail(&token);

        if !double_dash {
            if let Some(&idx) = inner.name_index.get(head) {
                let opt = &inner.options[idx];
                debug!("token {token:?} matched option {}", opt.descriptor());
                match opt.kind_tag() {
                    OptionKind::Branch => {
                        let nested_schema = opt
                            .nested()
                            .expect("a Branch option always carries a nested schema");
                        let value = split_schema(nested_schema.as_ref(), pending, true)?;
                        if !pending.is_empty() {
                            return Err(SplittingError::ExtraArguments {
                                branch: opt.descriptor(),
                                remaining: pending.drain(..).collect(),
                            });
                        }
                        slots[idx] = Slot::Nested(Some(value));
                        return build_aggregate(schema, slots, &required_queue);
                    }
                    OptionKind::Flag => {
                        slots[idx] = Slot::Flag(match tail {
                            None => true,
                            Some(raw) => raw.eq_ignore_ascii_case("true"),
                        });
                    }
                    OptionKind::Single => {
                        if let Some(nested_schema) = opt.nested() {
                            let value = split_schema(nested_schema.as_ref(), pending, true)?;
                            slots[idx] = Slot::Nested(Some(value));
                        } else {
                            let raw = match tail {
                                Some(raw) => unquote(raw),
                                None => pending.pop_front().ok_or_else(|| {
                                    SplittingError::MissingArgument {
                                        name: opt.descriptor(),
                                    }
                                })?,
                            };
                            slots[idx] = Slot::Single(Some(raw));
                        }
                    }
                    OptionKind::Repeatable => {
                        if let Some(nested_schema) = opt.nested() {
                            let value = split_schema(nested_schema.as_ref(), pending, true)?;
                            let Slot::NestedList(list) = &mut slots[idx] else {
                                unreachable!("Repeatable with a nested schema only holds Slot::NestedList")
                            };
                            list.push(value);
                        } else {
                            let raws: Vec<String> = match tail {
                                Some(raw) => unquote(raw).split(',').map(str::to_owned).collect(),
                                None => vec![pending.pop_front().ok_or_else(|| {
                                    SplittingError::MissingArgument {
                                        name: opt.descriptor(),
                                    }
                                })?],
                            };
                            let Slot::List(list) = &mut slots[idx] else {
                                unreachable!("Repeatable without a nested schema only holds Slot::List")
                            };
                            list.extend(raws);
                        }
                    }
                    OptionKind::Required | OptionKind::Varargs => {
                        unreachable!("positional options are never entered into name_index")
                    }
                }
                continue;
            }

            if let Some(flag_idxs) = try_cluster(inner, &token) {
                trace!("token {token:?} decomposed into clustered flags");
                for idx in flag_idxs {
                    slots[idx] = Slot::Flag(true);
                }
                continue;
            }
        }

        if let Some(idx) = required_queue.pop_front() {
            slots[idx] = Slot::Required(Some(token));
            continue;
        }

        if nested {
            pending.push_front(token);
            return build_aggregate(schema, slots, &required_queue);
        }
        if let Some(varargs_idx) = inner.varargs_index {
            let mut drained = vec![token];
            drained.extend(pending.drain(..));
            let Slot::List(list) = &mut slots[varargs_idx] else {
                unreachable!("Varargs only ever holds Slot::List")
            };
            list.extend(drained);
            return build_aggregate(schema, slots, &required_queue);
        }
        let mut remaining = vec![token];
        remaining.extend(pending.drain(..));
        return Err(SplittingError::UnhandledArguments { remaining });
    }

    build_aggregate(schema, slots, &required_queue)
}

/// Validate that every `Required` slot was filled, then finalize each
/// option's slot through its converter and hand the values to the
/// schema's finalizer.
///
/// Checked here rather than only at the bottom of the main loop: a `Branch`
/// match returns immediately and may do so before every `Required`
/// positional preceding it in declaration order has been filled, so the
/// check has to run on every aggregate-building path, not just normal loop
/// exit, to guarantee a split only ever fails with a `SplittingError`.
fn build_aggregate(
    schema: &(impl ErasedSchema + ?Sized),
    slots: Vec<Slot>,
    required_queue: &VecDeque<usize>,
) -> Result<Box<dyn Any + Send + Sync>, SplittingError> {
    let inner = schema.inner();
    if !required_queue.is_empty() {
        let names = required_queue
            .iter()
            .map(|&idx| inner.options[idx].descriptor())
            .collect();
        return Err(SplittingError::MissingRequired { names });
    }
    let mut values = Vec::with_capacity(slots.len());
    for (opt, slot) in inner.options.iter().zip(slots) {
        values.push(opt.finalize(slot)?);
    }
    trace!("invoking finalizer for schema with {} option(s)", inner.options.len());
    schema.finalize_erased(values)
}

fn split_head_tail(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((head, tail)) => (head, Some(tail)),
        None => (token, None),
    }
}

/// Strip one layer of ASCII double quotes from an `=`-attached value.
/// Applied only to `tail`, never to a stand-alone token.
fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        raw[1..raw.len() - 1].to_owned()
    } else {
        raw.to_owned()
    }
}

/// Attempt to decompose `token` as `-abc` clustered flags. Returns `None`
/// (falling through to the positional rule) unless every letter names a
/// registered single-letter flag; a literal long-name match always wins
/// over this decomposition because it is tried first in the caller.
fn try_cluster(inner: &SchemaInner, token: &str) -> Option<Vec<usize>> {
    if inner.flag_letters.is_empty() {
        return None;
    }
    let rest = token.strip_prefix('-')?;
    if rest.is_empty() || rest.starts_with('-') || rest.chars().count() > inner.flag_letters.len() {
        return None;
    }
    rest.chars()
        .map(|ch| inner.flag_letters.get(&ch).copied())
        .collect()
}
