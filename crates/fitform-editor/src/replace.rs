#![forbid(unsafe_code)]

//! Modal-driven swap of one collection item for a catalog pick.
//!
//! # State Machine
//!
//! ```text
//!  Idle ──open_for──► ModalOpen { target, candidate: None }
//!                        │  select_candidate(c)  (no mutation)
//!                        ▼
//!                     ModalOpen { target, candidate: Some(c) }
//!                        │ confirm (c.id != current id) ──► replace_at ──► Idle
//!                        │ cancel ─────────────────────────────────────► Idle
//! ```
//!
//! # Invariants
//!
//! 1. Nothing is written to the store before `confirm`.
//! 2. `confirm` with no candidate, or with the item already in place, does
//!    nothing and keeps the modal open.
//! 3. The lock field of the replaced item survives the swap.
//! 4. Expansion is never moved by a replace: if the replaced item was
//!    expanded it stays expanded, showing the new content.
//! 5. `confirm` writes over the record the modal was opened for, found again
//!    by id if the collection shifted meanwhile. If that record is gone the
//!    modal closes with `Stale` and nothing is written.

use fitform_core::item::value_id;
use fitform_core::logging::targets;
use fitform_core::{CollectionItem, CollectionPath, FormDataStore};
use serde_json::Value;

use crate::collection::{CollectionController, MutationOutcome, NoOpReason};
use crate::context::EditorContext;

/// The item a modal was opened for.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceTarget {
    pub controller: CollectionController,
    pub index: usize,
    pub current_id: Option<Value>,
}

impl ReplaceTarget {
    /// Current index of the target record.
    fn locate<S: FormDataStore>(&self, ctx: &EditorContext<S>) -> Result<usize, NoOpReason> {
        let items = self.controller.items(ctx).ok_or(NoOpReason::Unresolved)?;
        let wanted = self.current_id.as_ref();
        if items
            .get(self.index)
            .is_some_and(|v| value_id(v) == wanted)
        {
            return Ok(self.index);
        }
        wanted
            .and_then(|id| items.iter().position(|v| value_id(v) == Some(id)))
            .ok_or(NoOpReason::OutOfRange)
    }
}

/// Workflow state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReplaceState {
    #[default]
    Idle,
    ModalOpen {
        target: ReplaceTarget,
        candidate: Option<CollectionItem>,
    },
}

/// Result of [`ReplaceWorkflow::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { path: CollectionPath, index: usize },
    NotOpen,
    NoCandidate,
    SameItem,
    /// The target vanished between open and confirm.
    Stale(NoOpReason),
}

/// Replace modal controller.
#[derive(Debug, Clone, Default)]
pub struct ReplaceWorkflow {
    state: ReplaceState,
}

impl ReplaceWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &ReplaceState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, ReplaceState::ModalOpen { .. })
    }

    /// Target of the open modal.
    #[must_use]
    pub fn target(&self) -> Option<&ReplaceTarget> {
        match &self.state {
            ReplaceState::ModalOpen { target, .. } => Some(target),
            ReplaceState::Idle => None,
        }
    }

    /// Pending candidate.
    #[must_use]
    pub fn candidate(&self) -> Option<&CollectionItem> {
        match &self.state {
            ReplaceState::ModalOpen { candidate, .. } => candidate.as_ref(),
            ReplaceState::Idle => None,
        }
    }

    /// Open the modal for `index` in `controller`'s collection.
    ///
    /// Reopening while open retargets and clears the previous candidate.
    pub fn open_for(
        &mut self,
        controller: &CollectionController,
        index: usize,
        current_id: Option<Value>,
    ) {
        tracing::debug!(target: targets::REPLACE, path = %controller.path(), index, "replace modal opened");
        self.state = ReplaceState::ModalOpen {
            target: ReplaceTarget {
                controller: controller.clone(),
                index,
                current_id,
            },
            candidate: None,
        };
    }

    /// Remember `candidate` as the pending pick. Ignored while idle.
    pub fn select_candidate(&mut self, candidate: CollectionItem) {
        if let ReplaceState::ModalOpen { candidate: slot, .. } = &mut self.state {
            *slot = Some(candidate);
        }
    }

    /// Whether confirm would replace anything.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        match &self.state {
            ReplaceState::ModalOpen {
                target,
                candidate: Some(candidate),
            } => candidate.id() != target.current_id.as_ref(),
            _ => false,
        }
    }

    /// Apply the pending candidate.
    pub fn confirm<S: FormDataStore>(&mut self, ctx: &mut EditorContext<S>) -> ReplaceOutcome {
        match &self.state {
            ReplaceState::Idle => return ReplaceOutcome::NotOpen,
            ReplaceState::ModalOpen {
                candidate: None, ..
            } => return ReplaceOutcome::NoCandidate,
            ReplaceState::ModalOpen {
                target,
                candidate: Some(candidate),
            } if candidate.id() == target.current_id.as_ref() => {
                return ReplaceOutcome::SameItem;
            }
            ReplaceState::ModalOpen { .. } => {}
        }

        let ReplaceState::ModalOpen {
            target,
            candidate: Some(candidate),
        } = std::mem::take(&mut self.state)
        else {
            return ReplaceOutcome::NotOpen;
        };

        let path = target.controller.path().clone();
        let index = match target.locate(ctx) {
            Ok(index) => index,
            Err(reason) => {
                tracing::warn!(target: targets::REPLACE, path = %path, index = target.index, ?reason, "replace target vanished");
                return ReplaceOutcome::Stale(reason);
            }
        };
        if index != target.index {
            tracing::debug!(target: targets::REPLACE, path = %path, from = target.index, to = index, "replace target shifted");
        }
        match target.controller.replace_keeping_lock(ctx, index, candidate) {
            MutationOutcome::Applied { index } => {
                tracing::debug!(target: targets::REPLACE, path = %path, index, "item replaced");
                ReplaceOutcome::Replaced { path, index }
            }
            MutationOutcome::NoOp(reason) => {
                tracing::warn!(target: targets::REPLACE, path = %path, index = target.index, ?reason, "replace target vanished");
                ReplaceOutcome::Stale(reason)
            }
        }
    }

    /// Close without changing anything.
    pub fn cancel(&mut self) {
        if self.is_open() {
            tracing::debug!(target: targets::REPLACE, "replace modal cancelled");
        }
        self.state = ReplaceState::Idle;
    }
}
