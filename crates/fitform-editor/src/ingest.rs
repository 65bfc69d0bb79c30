#![forbid(unsafe_code)]

//! Routing external catalog picks into the targeted collection.
//!
//! The picker emits one or more records per selection. [`SelectionIngestor`]
//! queues each selection as a [`SelectionEvent`] and inserts queued events on
//! an explicit [`flush`](SelectionIngestor::flush), or on the first
//! [`tick`](SelectionIngestor::tick) after the batch window has elapsed.
//!
//! # Coalescing Rules
//!
//! - Events are inserted strictly in arrival order.
//! - All events of one flush go to the same target collection, one after the
//!   other, starting at the base index.
//! - Only the final insertion of a flush sets the focus.
//!
//! # Target and Base Index
//!
//! | Expansion | Target | Base index |
//! |-----------|--------|------------|
//! | Item `i` of collection `p` | `p` | `i + 1` |
//! | Nothing expanded | default target | target length (append) |
//!
//! # Failure Modes
//!
//! - No target (nothing expanded, no default): events are dropped and
//!   reported as [`IngestOutcome::NoTarget`].
//! - Target path no longer resolves: reported as
//!   [`IngestOutcome::Unresolved`], logged at `warn`.
//! - With `disable_duplicate`, an event whose records are all already present
//!   is reported once as [`IngestOutcome::AllDuplicates`] and inserts nothing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use fitform_core::item::value_id;
use fitform_core::logging::targets;
use fitform_core::{CollectionItem, CollectionPath, FormDataStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::CollectionController;
use crate::context::EditorContext;

/// Default coalescing window for picker selections.
pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(10);

/// Rule used to pick a target collection when nothing is expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "path")]
pub enum DefaultTarget {
    /// The collection of the last panel that accepts picks; for a group panel,
    /// the collection of its last instance.
    #[default]
    LastPanel,
    /// A fixed collection.
    Path(CollectionPath),
    /// Drop picks when nothing is expanded.
    Reject,
}

/// Selection ingest settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Skip records whose `id` is already in the target collection.
    pub disable_duplicate: bool,
    /// Coalescing window in milliseconds (default: 10).
    pub batch_window_ms: u64,
    /// Target rule when nothing is expanded.
    pub default_target: DefaultTarget,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            disable_duplicate: false,
            batch_window_ms: DEFAULT_BATCH_WINDOW.as_millis() as u64,
            default_target: DefaultTarget::default(),
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }
}

/// One picker selection awaiting insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent {
    /// Arrival order, unique per ingestor.
    pub seq: u64,
    pub items: Vec<CollectionItem>,
}

/// Per-event result of a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted {
        seq: u64,
        path: CollectionPath,
        first: usize,
        count: usize,
        /// Records dropped as duplicates.
        skipped: usize,
    },
    AllDuplicates {
        seq: u64,
        path: CollectionPath,
        rejected: usize,
    },
    NoTarget {
        seq: u64,
        dropped: usize,
    },
    Unresolved {
        seq: u64,
        path: CollectionPath,
    },
}

/// Result of one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub outcomes: Vec<IngestOutcome>,
    /// Item focused by this flush, if anything was inserted.
    pub focus: Option<(CollectionPath, usize)>,
}

impl IngestReport {
    /// Total records inserted.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                IngestOutcome::Inserted { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Number of events rejected as all-duplicates.
    #[must_use]
    pub fn all_duplicate_events(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, IngestOutcome::AllDuplicates { .. }))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Queue of picker selections with deterministic flushing.
#[derive(Debug, Clone, Default)]
pub struct SelectionIngestor {
    config: IngestConfig,
    pending: VecDeque<SelectionEvent>,
    batch_started: Option<Instant>,
    next_seq: u64,
}

impl SelectionIngestor {
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Number of queued events.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a selection that arrived at `now`. Returns its sequence number.
    pub fn enqueue(&mut self, items: Vec<CollectionItem>, now: Instant) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.pending.is_empty() {
            self.batch_started = Some(now);
        }
        tracing::trace!(target: targets::INGEST, seq, count = items.len(), "selection queued");
        self.pending.push_back(SelectionEvent { seq, items });
        seq
    }

    /// Whether the batch window has elapsed at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.batch_started
            .is_some_and(|start| now.saturating_duration_since(start) >= self.config.batch_window())
    }

    /// Flush if the batch window has elapsed at `now`.
    pub fn tick<S: FormDataStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        default_target: Option<&CollectionPath>,
        now: Instant,
    ) -> Option<IngestReport> {
        if !self.is_due(now) {
            return None;
        }
        Some(self.flush(ctx, default_target))
    }

    /// Queue and flush immediately.
    pub fn ingest<S: FormDataStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        default_target: Option<&CollectionPath>,
        items: Vec<CollectionItem>,
    ) -> IngestReport {
        self.enqueue(items, Instant::now());
        self.flush(ctx, default_target)
    }

    /// Insert every queued selection.
    pub fn flush<S: FormDataStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        default_target: Option<&CollectionPath>,
    ) -> IngestReport {
        self.batch_started = None;
        let events: Vec<SelectionEvent> = self.pending.drain(..).collect();
        let mut report = IngestReport::default();
        if events.is_empty() {
            return report;
        }

        let target = ctx
            .expansion
            .current()
            .map(|e| e.path.clone())
            .or_else(|| default_target.cloned());
        let Some(target) = target else {
            tracing::warn!(target: targets::INGEST, events = events.len(), "no target collection; dropping selection");
            report.outcomes = events
                .into_iter()
                .map(|e| IngestOutcome::NoTarget {
                    seq: e.seq,
                    dropped: e.items.len(),
                })
                .collect();
            return report;
        };

        let controller = CollectionController::new(target.clone());
        let Some(existing) = controller.items(ctx) else {
            tracing::warn!(target: targets::INGEST, path = %target, "target collection no longer resolves; dropping selection");
            report.outcomes = events
                .into_iter()
                .map(|e| IngestOutcome::Unresolved {
                    seq: e.seq,
                    path: target.clone(),
                })
                .collect();
            return report;
        };

        let mut seen: Vec<Value> = if self.config.disable_duplicate {
            existing.iter().filter_map(value_id).cloned().collect()
        } else {
            Vec::new()
        };
        let mut cursor = ctx
            .expansion
            .index_in(&target)
            .map_or(existing.len(), |i| i + 1);
        let mut last = None;

        for event in events {
            let total = event.items.len();
            let survivors = self.filter_duplicates(event.items, &mut seen);
            if survivors.is_empty() {
                if total > 0 {
                    tracing::info!(target: targets::INGEST, seq = event.seq, path = %target, rejected = total, "selection already present");
                    report.outcomes.push(IngestOutcome::AllDuplicates {
                        seq: event.seq,
                        path: target.clone(),
                        rejected: total,
                    });
                }
                continue;
            }

            let first = cursor;
            let mut count = 0;
            for item in survivors {
                match controller.insert_at(ctx, cursor, item).index() {
                    Some(at) => {
                        last = Some(at);
                        cursor = at + 1;
                        count += 1;
                    }
                    None => break,
                }
            }
            report.outcomes.push(IngestOutcome::Inserted {
                seq: event.seq,
                path: target.clone(),
                first,
                count,
                skipped: total - count,
            });
        }

        if let Some(index) = last {
            ctx.expansion.focus(&target, index);
            ctx.scroll_to(&target, index);
            report.focus = Some((target.clone(), index));
        }
        tracing::debug!(
            target: targets::INGEST,
            path = %target,
            inserted = report.inserted(),
            focus = ?last,
            "selection flushed"
        );
        report
    }

    fn filter_duplicates(
        &self,
        items: Vec<CollectionItem>,
        seen: &mut Vec<Value>,
    ) -> Vec<CollectionItem> {
        if !self.config.disable_duplicate {
            return items;
        }
        items
            .into_iter()
            .filter(|item| match item.id() {
                Some(id) if seen.contains(id) => false,
                Some(id) => {
                    seen.push(id.clone());
                    true
                }
                None => true,
            })
            .collect()
    }
}
