#![forbid(unsafe_code)]

//! Panels and panel groups.
//!
//! A panel wraps one collection. A *group* panel is a repeatable panel: the
//! form holds an array of panel instances at the group path, and each
//! instance owns its own collection under `item_field`:
//!
//! ```text
//! exerciseGroupList            ← group path
//! ├── 0 { title, exercises: [..] }   ← system panel (not removable)
//! ├── 1 { title, exercises: [..] }
//! └── 2 { title, exercises: [..] }   ← last panel; validated before adding 3
//! ```
//!
//! # Invariants
//!
//! 1. Panels with index `< system_count` are never removed.
//! 2. At most one add is in flight per group; a second `begin_add` is rejected
//!    until the first completes or is aborted.
//! 3. A failed validation leaves the panel list unchanged.
//! 4. The open-header set is independent from item expansion. In accordion
//!    mode it holds at most one key.

use fitform_core::logging::targets;
use fitform_core::{CollectionPath, FieldError, FormDataStore, Validator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::{CollectionController, MutationOutcome, NoOpReason};
use crate::context::{EditorContext, RenderRequest};
use crate::error::PanelError;

/// How panel headers open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Opening one header closes the others.
    Accordion,
    /// Headers open and close independently.
    #[default]
    Multi,
}

/// What a panel holds and how it behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PanelKind {
    /// One collection at the descriptor's path.
    Simple,
    /// Repeatable panel instances, each with a collection under `item_field`.
    Group {
        item_field: String,
        #[serde(default)]
        required_fields: Vec<String>,
    },
    /// Read-only list fed from outside (the catalog); never a pick target.
    ExternalList,
}

/// Static description of a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDescriptor {
    pub name: String,
    pub label: String,
    /// Collection path for `Simple`, instance array path for `Group`.
    pub collection_path: CollectionPath,
    #[serde(default)]
    pub system_count: usize,
    #[serde(default)]
    pub lock_field: Option<String>,
    pub kind: PanelKind,
}

impl PanelDescriptor {
    #[must_use]
    pub fn simple(name: impl Into<String>, collection_path: CollectionPath) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            collection_path,
            system_count: 0,
            lock_field: None,
            kind: PanelKind::Simple,
        }
    }

    #[must_use]
    pub fn group(
        name: impl Into<String>,
        group_path: CollectionPath,
        item_field: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            collection_path: group_path,
            system_count: 0,
            lock_field: None,
            kind: PanelKind::Group {
                item_field: item_field.into(),
                required_fields: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn external(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            collection_path: CollectionPath::root(),
            system_count: 0,
            lock_field: None,
            kind: PanelKind::ExternalList,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_lock_field(mut self, field: impl Into<String>) -> Self {
        self.lock_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_system_count(mut self, count: usize) -> Self {
        self.system_count = count;
        self
    }

    /// Required fields, for group panels.
    #[must_use]
    pub fn with_required_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        if let PanelKind::Group {
            required_fields, ..
        } = &mut self.kind
        {
            *required_fields = fields.into_iter().map(Into::into).collect();
        }
        self
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, PanelKind::Group { .. })
    }

    /// Collection controller for a `Simple` panel.
    #[must_use]
    pub fn controller(&self) -> CollectionController {
        let controller = CollectionController::new(self.collection_path.clone());
        match &self.lock_field {
            Some(field) => controller.with_lock_field(field.clone()),
            None => controller,
        }
    }
}

/// Stable identity of a panel instance, independent of its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelKey(pub u64);

/// Set of visually open panel headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    mode: OpenMode,
    open: Vec<PanelKey>,
}

impl HeaderSet {
    #[must_use]
    pub fn new(mode: OpenMode) -> Self {
        Self {
            mode,
            open: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    #[must_use]
    pub fn is_open(&self, key: PanelKey) -> bool {
        self.open.contains(&key)
    }

    /// Open keys in the order they were opened.
    #[must_use]
    pub fn open_keys(&self) -> &[PanelKey] {
        &self.open
    }

    pub fn open(&mut self, key: PanelKey) {
        if self.is_open(key) {
            return;
        }
        if self.mode == OpenMode::Accordion {
            self.open.clear();
        }
        self.open.push(key);
    }

    pub fn close(&mut self, key: PanelKey) {
        self.open.retain(|k| *k != key);
    }

    /// Flip `key`. Returns whether it is open afterwards.
    pub fn toggle(&mut self, key: PanelKey) -> bool {
        if self.is_open(key) {
            self.close(key);
            false
        } else {
            self.open(key);
            true
        }
    }
}

/// Reservation for an in-flight add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTicket {
    generation: u64,
    /// Fields of the current last panel that must validate first.
    pub paths: Vec<CollectionPath>,
}

/// A panel appended by [`PanelGroupManager::complete_add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedPanel {
    pub index: usize,
    pub key: PanelKey,
}

/// Lifecycle of the instances of one group panel.
#[derive(Debug, Clone)]
pub struct PanelGroupManager {
    descriptor: PanelDescriptor,
    item_field: String,
    required_fields: Vec<String>,
    panels: Vec<PanelKey>,
    next_key: u64,
    headers: HeaderSet,
    in_flight: Option<u64>,
    generation: u64,
}

impl PanelGroupManager {
    /// Mount a group over the instances already present in the store.
    ///
    /// A missing instance array is created empty.
    pub fn mount<S: FormDataStore>(
        descriptor: PanelDescriptor,
        ctx: &mut EditorContext<S>,
        mode: OpenMode,
    ) -> Result<Self, PanelError> {
        let PanelKind::Group {
            item_field,
            required_fields,
        } = &descriptor.kind
        else {
            return Err(PanelError::NotAGroup {
                name: descriptor.name.clone(),
            });
        };
        let (item_field, required_fields) = (item_field.clone(), required_fields.clone());

        let existing = match ctx.store.get(&descriptor.collection_path) {
            Some(Value::Array(items)) => items.len(),
            Some(_) => {
                return Err(PanelError::Unresolved {
                    path: descriptor.collection_path.clone(),
                });
            }
            None => {
                ctx.store
                    .set(&descriptor.collection_path, Value::Array(Vec::new()))?;
                0
            }
        };

        let mut manager = Self {
            descriptor,
            item_field,
            required_fields,
            panels: Vec::with_capacity(existing),
            next_key: 0,
            headers: HeaderSet::new(mode),
            in_flight: None,
            generation: 0,
        };
        for _ in 0..existing {
            let key = manager.allocate_key();
            manager.panels.push(key);
        }
        match mode {
            OpenMode::Multi => {
                for key in manager.panels.clone() {
                    manager.headers.open(key);
                }
            }
            OpenMode::Accordion => {
                if let Some(first) = manager.panels.first().copied() {
                    manager.headers.open(first);
                }
            }
        }
        tracing::debug!(
            target: targets::PANEL,
            group = %manager.descriptor.name,
            panels = existing,
            "panel group mounted"
        );
        Ok(manager)
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &PanelDescriptor {
        &self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn group_path(&self) -> &CollectionPath {
        &self.descriptor.collection_path
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[PanelKey] {
        &self.panels
    }

    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<PanelKey> {
        self.panels.get(index).copied()
    }

    #[must_use]
    pub fn index_of(&self, key: PanelKey) -> Option<usize> {
        self.panels.iter().position(|k| *k == key)
    }

    /// Whether an add is waiting on validation.
    #[inline]
    #[must_use]
    pub fn is_adding(&self) -> bool {
        self.in_flight.is_some()
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn toggle_header(&mut self, key: PanelKey) -> bool {
        self.headers.toggle(key)
    }

    /// Collection path of panel `index`.
    #[must_use]
    pub fn collection_path(&self, index: usize) -> Option<CollectionPath> {
        (index < self.panels.len()).then(|| self.instance_collection(index))
    }

    /// Collection paths of every panel, in panel order.
    #[must_use]
    pub fn collection_paths(&self) -> Vec<CollectionPath> {
        (0..self.panels.len())
            .map(|i| self.instance_collection(i))
            .collect()
    }

    /// Controller for panel `index`'s collection.
    #[must_use]
    pub fn controller(&self, index: usize) -> Option<CollectionController> {
        let path = self.collection_path(index)?;
        let controller = CollectionController::new(path);
        Some(match &self.descriptor.lock_field {
            Some(field) => controller.with_lock_field(field.clone()),
            None => controller,
        })
    }

    /// Whether `path` is the collection of one of this group's panels.
    #[must_use]
    pub fn owns_collection(&self, path: &CollectionPath) -> bool {
        let group = self.group_path();
        path.len() == group.len() + 2
            && path.starts_with(group)
            && path
                .index_at(group.len())
                .is_some_and(|i| i < self.panels.len())
            && path.last().and_then(|s| s.as_key()) == Some(self.item_field.as_str())
    }

    /// Reserve the add slot and compute what must validate first.
    pub fn begin_add(&mut self) -> Result<AddTicket, PanelError> {
        if self.in_flight.is_some() {
            return Err(PanelError::AddInFlight {
                group: self.descriptor.name.clone(),
            });
        }
        self.generation += 1;
        self.in_flight = Some(self.generation);

        let paths = match self.panels.len().checked_sub(1) {
            Some(last) => {
                let base = self.group_path().child_index(last);
                self.required_fields
                    .iter()
                    .map(|f| base.child_key(f.clone()))
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(AddTicket {
            generation: self.generation,
            paths,
        })
    }

    /// Release the add slot without adding.
    pub fn abort_add(&mut self, ticket: AddTicket) {
        if self.in_flight == Some(ticket.generation) {
            self.in_flight = None;
        }
    }

    /// Finish an add with the validation result.
    pub fn complete_add<S: FormDataStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        ticket: AddTicket,
        validation: Result<(), Vec<FieldError>>,
        template: Value,
    ) -> Result<AddedPanel, PanelError> {
        if self.in_flight != Some(ticket.generation) {
            return Err(PanelError::StaleTicket);
        }
        self.in_flight = None;

        if let Err(errors) = validation {
            tracing::info!(
                target: targets::PANEL,
                group = %self.descriptor.name,
                failures = errors.len(),
                "panel add blocked by validation"
            );
            return Err(PanelError::Validation(errors));
        }

        let instance = self.instantiate(template);
        let group = CollectionController::new(self.group_path().clone());
        let index = match group.append(ctx, instance) {
            MutationOutcome::Applied { index } => index,
            MutationOutcome::NoOp(_) => {
                return Err(PanelError::Unresolved {
                    path: self.group_path().clone(),
                });
            }
        };

        let key = self.allocate_key();
        self.panels.push(key);
        self.headers.open(key);
        ctx.request(RenderRequest::ScrollIntoView {
            path: self.group_path().clone(),
            index: Some(index),
        });
        tracing::debug!(target: targets::PANEL, group = %self.descriptor.name, index, ?key, "panel added");
        Ok(AddedPanel { index, key })
    }

    /// Validate the last panel, then append an instance built from `template`.
    pub async fn add_panel<S, V>(
        &mut self,
        ctx: &mut EditorContext<S>,
        template: Value,
        validator: &V,
    ) -> Result<AddedPanel, PanelError>
    where
        S: FormDataStore,
        V: Validator,
    {
        let ticket = self.begin_add()?;
        let validation = if ticket.paths.is_empty() {
            Ok(())
        } else {
            validator.validate(&ticket.paths).await
        };
        self.complete_add(ctx, ticket, validation, template)
    }

    /// Remove panel `index`, collapsing any expansion inside it.
    ///
    /// Refused while an add is waiting on validation: the ticket's paths
    /// name the current last panel.
    pub fn remove_panel<S: FormDataStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        index: usize,
    ) -> Result<PanelKey, PanelError> {
        if self.in_flight.is_some() {
            return Err(PanelError::AddInFlight {
                group: self.descriptor.name.clone(),
            });
        }
        if index < self.descriptor.system_count {
            return Err(PanelError::Protected {
                index,
                system_count: self.descriptor.system_count,
            });
        }
        if index >= self.panels.len() {
            return Err(PanelError::OutOfRange {
                index,
                len: self.panels.len(),
            });
        }

        let group = CollectionController::new(self.group_path().clone());
        match group.remove_at(ctx, index) {
            MutationOutcome::Applied { .. } => {}
            MutationOutcome::NoOp(NoOpReason::OutOfRange) => {
                return Err(PanelError::OutOfRange {
                    index,
                    len: group.len(ctx),
                });
            }
            MutationOutcome::NoOp(_) => {
                return Err(PanelError::Unresolved {
                    path: self.group_path().clone(),
                });
            }
        }

        let key = self.panels.remove(index);
        self.headers.close(key);
        tracing::debug!(target: targets::PANEL, group = %self.descriptor.name, index, ?key, "panel removed");
        Ok(key)
    }

    fn instance_collection(&self, index: usize) -> CollectionPath {
        self.group_path()
            .child_index(index)
            .child_key(self.item_field.clone())
    }

    fn instantiate(&self, template: Value) -> fitform_core::CollectionItem {
        let mut fields = match template {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields
            .entry(self.item_field.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        fitform_core::CollectionItem::from_value(Value::Object(fields)).unwrap_or_default()
    }

    fn allocate_key(&mut self) -> PanelKey {
        let key = PanelKey(self.next_key);
        self.next_key += 1;
        key
    }
}
