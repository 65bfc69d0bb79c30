#![forbid(unsafe_code)]

//! Per-collection CRUD over an ordered array in the form store.
//!
//! A [`CollectionController`] is a small handle (path plus optional lock
//! field) created when a panel mounts. Each mutating call is a single
//! read-modify-write against the store: read the whole array, compute the new
//! array, write the whole array back, then notify the session's
//! [`ExpansionCoordinator`](crate::expansion::ExpansionCoordinator).
//!
//! # Failure Modes
//!
//! Nothing here panics or returns an error. Out-of-range indices, `from ==
//! to` moves and paths that no longer resolve (the owning panel was removed
//! a moment ago) all come back as [`MutationOutcome::NoOp`]; the unresolved
//! case is additionally logged at `warn`.

use fitform_core::item::value_id;
use fitform_core::logging::targets;
use fitform_core::{CollectionItem, CollectionPath, FormDataStore};
use serde_json::Value;

use crate::context::EditorContext;
use crate::expansion::Mutation;

/// Why a mutation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    OutOfRange,
    SameIndex,
    Unresolved,
}

/// Result of a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The store was updated; `index` is where the affected item now sits
    /// (or sat, for a removal).
    Applied { index: usize },
    NoOp(NoOpReason),
}

impl MutationOutcome {
    #[inline]
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Affected index, when applied.
    #[inline]
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Applied { index } => Some(index),
            Self::NoOp(_) => None,
        }
    }
}

/// Handle onto one ordered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionController {
    path: CollectionPath,
    lock_field: Option<String>,
}

impl CollectionController {
    #[must_use]
    pub fn new(path: CollectionPath) -> Self {
        Self {
            path,
            lock_field: None,
        }
    }

    /// Name the field that must survive a replace.
    #[must_use]
    pub fn with_lock_field(mut self, field: impl Into<String>) -> Self {
        self.lock_field = Some(field.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn lock_field(&self) -> Option<&str> {
        self.lock_field.as_deref()
    }

    // --- Reads ---

    /// Current items, or `None` if the path does not resolve to an array.
    #[must_use]
    pub fn items<S: FormDataStore>(&self, ctx: &EditorContext<S>) -> Option<Vec<Value>> {
        ctx.store.get_array(&self.path)
    }

    /// Current length; an unresolved collection counts as empty.
    #[must_use]
    pub fn len<S: FormDataStore>(&self, ctx: &EditorContext<S>) -> usize {
        self.items(ctx).map_or(0, |items| items.len())
    }

    #[must_use]
    pub fn is_empty<S: FormDataStore>(&self, ctx: &EditorContext<S>) -> bool {
        self.len(ctx) == 0
    }

    /// Item at `index`, if it exists and is a record.
    #[must_use]
    pub fn item_at<S: FormDataStore>(
        &self,
        ctx: &EditorContext<S>,
        index: usize,
    ) -> Option<CollectionItem> {
        let mut items = self.items(ctx)?;
        if index >= items.len() {
            return None;
        }
        CollectionItem::from_value(items.swap_remove(index))
    }

    /// Whether any item carries identity `id`.
    #[must_use]
    pub fn contains_id<S: FormDataStore>(&self, ctx: &EditorContext<S>, id: &Value) -> bool {
        self.items(ctx)
            .is_some_and(|items| items.iter().any(|v| value_id(v) == Some(id)))
    }

    // --- Mutations ---

    /// Append at the end.
    pub fn append<S: FormDataStore>(
        &self,
        ctx: &mut EditorContext<S>,
        item: CollectionItem,
    ) -> MutationOutcome {
        self.insert_at(ctx, usize::MAX, item)
    }

    /// Insert at `index`, clamped to `[0, len]`.
    pub fn insert_at<S: FormDataStore>(
        &self,
        ctx: &mut EditorContext<S>,
        index: usize,
        item: CollectionItem,
    ) -> MutationOutcome {
        self.commit(ctx, "insert", |items| {
            let at = index.min(items.len());
            items.insert(at, item.into_value());
            Ok((at, Mutation::Inserted { index: at }))
        })
    }

    /// Remove the item at `index`.
    pub fn remove_at<S: FormDataStore>(
        &self,
        ctx: &mut EditorContext<S>,
        index: usize,
    ) -> MutationOutcome {
        self.commit(ctx, "remove", |items| {
            if index >= items.len() {
                return Err(NoOpReason::OutOfRange);
            }
            items.remove(index);
            Ok((index, Mutation::Removed { index }))
        })
    }

    /// Move the item at `from` to `to`, keeping the relative order of the rest.
    pub fn move_item<S: FormDataStore>(
        &self,
        ctx: &mut EditorContext<S>,
        from: usize,
        to: usize,
    ) -> MutationOutcome {
        self.commit(ctx, "move", |items| {
            if from >= items.len() || to >= items.len() {
                return Err(NoOpReason::OutOfRange);
            }
            if from == to {
                return Err(NoOpReason::SameIndex);
            }
            let moved = items.remove(from);
            items.insert(to, moved);
            Ok((to, Mutation::Moved { from, to }))
        })
    }

    /// Insert a shallow copy of the item at `index` right after it.
    ///
    /// The copy keeps the same `id`.
    pub fn duplicate_at<S: FormDataStore>(
        &self,
        ctx: &mut EditorContext<S>,
        index: usize,
    ) -> MutationOutcome {
        self.commit(ctx, "duplicate", |items| {
            let copy = items.get(index).cloned().ok_or(NoOpReason::OutOfRange)?;
            items.insert(index + 1, copy);
            Ok((index + 1, Mutation::Inserted { index: index + 1 }))
        })
    }

    /// Swap in `new_item` at `index`, carrying `preserve_fields` over from the
    /// item being replaced.
    pub fn replace_at<S: FormDataStore>(
        &self,
        ctx: &mut EditorContext<S>,
        index: usize,
        new_item: CollectionItem,
        preserve_fields: &[String],
    ) -> MutationOutcome {
        self.commit(ctx, "replace", |items| {
            let slot = items.get_mut(index).ok_or(NoOpReason::OutOfRange)?;
            let mut next = new_item;
            if let Some(old) = CollectionItem::from_value(slot.take()) {
                next.carry_over(&old, preserve_fields);
            }
            *slot = next.into_value();
            Ok((index, Mutation::Replaced { index }))
        })
    }

    /// [`replace_at`](Self::replace_at) preserving this collection's lock field.
    pub fn replace_keeping_lock<S: FormDataStore>(
        &self,
        ctx: &mut EditorContext<S>,
        index: usize,
        new_item: CollectionItem,
    ) -> MutationOutcome {
        let preserve: Vec<String> = self.lock_field.iter().cloned().collect();
        self.replace_at(ctx, index, new_item, &preserve)
    }

    fn commit<S, F>(&self, ctx: &mut EditorContext<S>, op: &'static str, f: F) -> MutationOutcome
    where
        S: FormDataStore,
        F: FnOnce(&mut Vec<Value>) -> Result<(usize, Mutation), NoOpReason>,
    {
        let Some(mut items) = ctx.store.get_array(&self.path) else {
            tracing::warn!(
                target: targets::COLLECTION,
                op,
                path = %self.path,
                "collection path no longer resolves; ignoring"
            );
            return MutationOutcome::NoOp(NoOpReason::Unresolved);
        };

        let (index, mutation) = match f(&mut items) {
            Ok(applied) => applied,
            Err(reason) => {
                tracing::debug!(
                    target: targets::COLLECTION,
                    op,
                    path = %self.path,
                    ?reason,
                    len = items.len(),
                    "collection mutation skipped"
                );
                return MutationOutcome::NoOp(reason);
            }
        };

        let len = items.len();
        if let Err(error) = ctx.store.set(&self.path, Value::Array(items)) {
            tracing::warn!(
                target: targets::COLLECTION,
                op,
                path = %self.path,
                %error,
                "collection write rejected; ignoring"
            );
            return MutationOutcome::NoOp(NoOpReason::Unresolved);
        }

        ctx.expansion.apply(&self.path, mutation);
        tracing::debug!(
            target: targets::COLLECTION,
            op,
            path = %self.path,
            index,
            len,
            "collection mutated"
        );
        MutationOutcome::Applied { index }
    }
}
