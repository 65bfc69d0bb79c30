#![forbid(unsafe_code)]

//! Top-level editing session.
//!
//! [`EditorSession`] wires every component to one [`EditorContext`]:
//!
//! ```text
//!                 ┌────────────────────── EditorSession ──────────────────────┐
//!  picker ──────► │ SelectionIngestor ─┐                                      │
//!  pointer ─────► │ DragReorderEngine ─┼─► CollectionController ─► store      │
//!  modal ───────► │ ReplaceWorkflow  ──┘            │                         │
//!  panel chrome ► │ Panel[] (Simple | Group | ExternalList)                   │
//!                 │                    ExpansionCoordinator ◄─┘  RenderRequest│──► render
//!                 └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call runs to completion against `&mut self`, so no two operations
//! ever observe each other half-done. `add_panel` is the only `async` entry
//! point; it holds `&mut self` across the validator await.
//!
//! # Invariants
//!
//! 1. Item-level calls only reach collections a mounted panel edits. A
//!    group's own panel array is not one of them; panels come and go through
//!    `add_panel` and `remove_panel` only.
//! 2. The expanded index is always inside its collection: toggles and
//!    clicks on an index past the end are ignored.

use std::time::Instant;

use fitform_core::logging::targets;
use fitform_core::{CollectionItem, CollectionPath, FormDataStore, Validator};
use serde_json::Value;

use crate::collection::{CollectionController, MutationOutcome, NoOpReason};
use crate::config::EditorConfig;
use crate::context::{EditorContext, RenderRequest};
use crate::drag::{DragOutcome, DragReorderEngine, Point};
use crate::error::{EditorResult, PanelError};
use crate::expansion::ExpansionCoordinator;
use crate::ingest::{DefaultTarget, IngestReport, SelectionIngestor};
use crate::panel::{AddedPanel, PanelDescriptor, PanelGroupManager, PanelKey, PanelKind};
use crate::replace::{ReplaceOutcome, ReplaceWorkflow};

/// A mounted panel.
#[derive(Debug, Clone)]
pub enum Panel {
    Simple {
        descriptor: PanelDescriptor,
        controller: CollectionController,
    },
    Group(PanelGroupManager),
    ExternalList { descriptor: PanelDescriptor },
}

impl Panel {
    #[must_use]
    pub fn descriptor(&self) -> &PanelDescriptor {
        match self {
            Self::Simple { descriptor, .. } | Self::ExternalList { descriptor } => descriptor,
            Self::Group(group) => group.descriptor(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Collections this panel edits. External lists edit none.
    #[must_use]
    pub fn collection_paths(&self) -> Vec<CollectionPath> {
        match self {
            Self::Simple { controller, .. } => vec![controller.path().clone()],
            Self::Group(group) => group.collection_paths(),
            Self::ExternalList { .. } => Vec::new(),
        }
    }

    /// Collection that receives picks when this panel is the fallback target.
    fn fallback_collection(&self) -> Option<CollectionPath> {
        match self {
            Self::Simple { controller, .. } => Some(controller.path().clone()),
            Self::Group(group) => group.collection_path(group.len().checked_sub(1)?),
            Self::ExternalList { .. } => None,
        }
    }

    fn controller_for(&self, path: &CollectionPath) -> Option<CollectionController> {
        match self {
            Self::Simple { controller, .. } if controller.path() == path => {
                Some(controller.clone())
            }
            Self::Group(group) if group.owns_collection(path) => {
                let index = path.index_at(group.group_path().len())?;
                group.controller(index)
            }
            _ => None,
        }
    }
}

/// One editing session over a form store.
#[derive(Debug)]
pub struct EditorSession<S> {
    ctx: EditorContext<S>,
    config: EditorConfig,
    panels: Vec<Panel>,
    ingestor: SelectionIngestor,
    drag: DragReorderEngine,
    replace: ReplaceWorkflow,
}

impl<S: FormDataStore> EditorSession<S> {
    /// Validate `config` and mount `descriptors` in order over `store`.
    ///
    /// Missing collections and panel arrays are created empty.
    pub fn new(
        store: S,
        config: EditorConfig,
        descriptors: impl IntoIterator<Item = PanelDescriptor>,
    ) -> EditorResult<Self> {
        let config = config.validated()?;
        let mut ctx = EditorContext::new(store);
        let mut panels = Vec::new();
        for descriptor in descriptors {
            panels.push(mount_panel(&mut ctx, descriptor, &config)?);
        }
        tracing::debug!(target: targets::SESSION, panels = panels.len(), "editor session started");
        Ok(Self {
            ingestor: SelectionIngestor::new(config.ingest.clone()),
            drag: DragReorderEngine::new(config.drag),
            replace: ReplaceWorkflow::new(),
            ctx,
            config,
            panels,
        })
    }

    // --- Accessors ---

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &EditorContext<S> {
        &self.ctx
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.ctx.store
    }

    #[inline]
    #[must_use]
    pub fn expansion(&self) -> &ExpansionCoordinator {
        &self.ctx.expansion
    }

    #[inline]
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    #[must_use]
    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&PanelGroupManager> {
        match self.panel(name)? {
            Panel::Group(group) => Some(group),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn replace_workflow(&self) -> &ReplaceWorkflow {
        &self.replace
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Controller for the editable collection at `path`, with its panel's
    /// lock field. `None` for paths no panel edits, group panel arrays included.
    #[must_use]
    pub fn controller(&self, path: &CollectionPath) -> Option<CollectionController> {
        self.panels.iter().find_map(|p| p.controller_for(path))
    }

    fn editable(&self, path: &CollectionPath, op: &'static str) -> Option<CollectionController> {
        let controller = self.controller(path);
        if controller.is_none() {
            tracing::warn!(target: targets::SESSION, op, path = %path, "not an editable collection; ignoring");
        }
        controller
    }

    /// Every editable collection, in panel order.
    #[must_use]
    pub fn collection_paths(&self) -> Vec<CollectionPath> {
        self.panels.iter().flat_map(Panel::collection_paths).collect()
    }

    /// Where picks go when nothing is expanded.
    #[must_use]
    pub fn default_target(&self) -> Option<CollectionPath> {
        match &self.config.ingest.default_target {
            DefaultTarget::LastPanel => self.panels.iter().rev().find_map(Panel::fallback_collection),
            DefaultTarget::Path(path) => self.editable(path, "default target").map(|_| path.clone()),
            DefaultTarget::Reject => None,
        }
    }

    // --- Item operations ---

    /// Click on an item header. Returns whether the item is open afterwards.
    pub fn toggle_item(&mut self, path: &CollectionPath, index: usize) -> bool {
        let Some(controller) = self.editable(path, "toggle") else {
            return false;
        };
        let len = controller.len(&self.ctx);
        if index >= len {
            tracing::debug!(target: targets::SESSION, path = %path, index, len, "toggle past the end; ignoring");
            return false;
        }
        self.ctx.expansion.toggle(path, index);
        self.ctx.expansion.is_expanded(path, index)
    }

    pub fn remove_item(&mut self, path: &CollectionPath, index: usize) -> MutationOutcome {
        match self.editable(path, "remove") {
            Some(controller) => controller.remove_at(&mut self.ctx, index),
            None => MutationOutcome::NoOp(NoOpReason::Unresolved),
        }
    }

    pub fn move_item(&mut self, path: &CollectionPath, from: usize, to: usize) -> MutationOutcome {
        match self.editable(path, "move") {
            Some(controller) => controller.move_item(&mut self.ctx, from, to),
            None => MutationOutcome::NoOp(NoOpReason::Unresolved),
        }
    }

    /// Duplicate an item and focus the copy.
    pub fn duplicate_item(&mut self, path: &CollectionPath, index: usize) -> MutationOutcome {
        let Some(controller) = self.editable(path, "duplicate") else {
            return MutationOutcome::NoOp(NoOpReason::Unresolved);
        };
        let outcome = controller.duplicate_at(&mut self.ctx, index);
        if let MutationOutcome::Applied { index: copy } = outcome {
            self.ctx.expansion.focus(path, copy);
            self.ctx.scroll_to(path, copy);
        }
        outcome
    }

    // --- Selection ingest ---

    /// Insert a picker selection right away.
    pub fn ingest(&mut self, items: Vec<CollectionItem>) -> IngestReport {
        let target = self.default_target();
        self.ingestor.ingest(&mut self.ctx, target.as_ref(), items)
    }

    /// Queue a picker selection for the next flush.
    pub fn enqueue_selection(&mut self, items: Vec<CollectionItem>, now: Instant) -> u64 {
        self.ingestor.enqueue(items, now)
    }

    /// Flush queued selections if the batch window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<IngestReport> {
        if !self.ingestor.is_due(now) {
            return None;
        }
        let target = self.default_target();
        self.ingestor.tick(&mut self.ctx, target.as_ref(), now)
    }

    /// Flush queued selections now.
    pub fn flush_selection(&mut self) -> IngestReport {
        let target = self.default_target();
        self.ingestor.flush(&mut self.ctx, target.as_ref())
    }

    #[inline]
    #[must_use]
    pub fn pending_selections(&self) -> usize {
        self.ingestor.pending()
    }

    // --- Pointer and drag ---

    /// Press on an item header. A press outside any editable collection
    /// abandons the current gesture instead.
    pub fn pointer_down(&mut self, path: &CollectionPath, index: usize, origin: Point) {
        if self.editable(path, "pointer down").is_none() {
            self.drag.reset();
            return;
        }
        self.drag.pointer_down(path, index, origin);
    }

    pub fn pointer_move(&mut self, pos: Point) -> bool {
        self.drag.pointer_move(pos)
    }

    pub fn pointer_up(&mut self, pos: Point) -> DragOutcome {
        self.drag.pointer_up(&mut self.ctx, pos)
    }

    pub fn drag_started(&mut self, path: &CollectionPath, index: usize) {
        if self.editable(path, "drag start").is_none() {
            self.drag.reset();
            return;
        }
        self.drag.drag_started(path, index);
    }

    pub fn drag_ended(&mut self, path: &CollectionPath, new_index: usize) -> DragOutcome {
        let Some(controller) = self.editable(path, "drag end") else {
            self.drag.reset();
            return DragOutcome::Ignored;
        };
        self.drag.drag_ended(&mut self.ctx, &controller, new_index)
    }

    /// Abandon the current gesture.
    pub fn cancel_gesture(&mut self) {
        self.drag.reset();
    }

    // --- Replace ---

    /// Open the replace modal for an item. Returns `false` if there is no such item.
    pub fn open_replace(&mut self, path: &CollectionPath, index: usize) -> bool {
        let Some(controller) = self.editable(path, "replace") else {
            return false;
        };
        let Some(item) = controller.item_at(&self.ctx, index) else {
            tracing::debug!(target: targets::REPLACE, path = %path, index, "no item to replace");
            return false;
        };
        let current_id: Option<Value> = item.id().cloned();
        self.replace.open_for(&controller, index, current_id);
        true
    }

    pub fn select_replacement(&mut self, candidate: CollectionItem) {
        self.replace.select_candidate(candidate);
    }

    #[must_use]
    pub fn can_confirm_replace(&self) -> bool {
        self.replace.can_confirm()
    }

    pub fn confirm_replace(&mut self) -> ReplaceOutcome {
        self.replace.confirm(&mut self.ctx)
    }

    pub fn cancel_replace(&mut self) {
        self.replace.cancel();
    }

    // --- Panels ---

    /// Validate the last panel of `group`, then append a panel built from `template`.
    pub async fn add_panel<V: Validator>(
        &mut self,
        group: &str,
        template: Value,
        validator: &V,
    ) -> Result<AddedPanel, PanelError> {
        let manager = group_mut(&mut self.panels, group)?;
        manager.add_panel(&mut self.ctx, template, validator).await
    }

    pub fn remove_panel(&mut self, group: &str, index: usize) -> Result<PanelKey, PanelError> {
        let manager = group_mut(&mut self.panels, group)?;
        manager.remove_panel(&mut self.ctx, index)
    }

    /// Flip a panel header. Returns whether it is open afterwards.
    pub fn toggle_header(&mut self, group: &str, key: PanelKey) -> Result<bool, PanelError> {
        Ok(group_mut(&mut self.panels, group)?.toggle_header(key))
    }

    // --- Render ---

    pub fn take_render_requests(&mut self) -> Vec<RenderRequest> {
        self.ctx.take_render_requests()
    }

    /// End the session and hand the store back.
    #[must_use]
    pub fn finish(self) -> S {
        tracing::debug!(target: targets::SESSION, "editor session finished");
        self.ctx.into_store()
    }
}

fn group_mut<'a>(panels: &'a mut [Panel], name: &str) -> Result<&'a mut PanelGroupManager, PanelError> {
    match panels.iter_mut().find(|p| p.name() == name) {
        Some(Panel::Group(group)) => Ok(group),
        Some(_) => Err(PanelError::NotAGroup { name: name.into() }),
        None => Err(PanelError::UnknownPanel { name: name.into() }),
    }
}

fn mount_panel<S: FormDataStore>(
    ctx: &mut EditorContext<S>,
    descriptor: PanelDescriptor,
    config: &EditorConfig,
) -> EditorResult<Panel> {
    match descriptor.kind {
        PanelKind::Simple => {
            if ctx.store.get(&descriptor.collection_path).is_none() {
                ctx.store
                    .set(&descriptor.collection_path, Value::Array(Vec::new()))?;
            }
            let controller = descriptor.controller();
            Ok(Panel::Simple {
                descriptor,
                controller,
            })
        }
        PanelKind::Group { .. } => Ok(Panel::Group(PanelGroupManager::mount(
            descriptor,
            ctx,
            config.panels.open_mode,
        )?)),
        PanelKind::ExternalList => Ok(Panel::ExternalList { descriptor }),
    }
}
