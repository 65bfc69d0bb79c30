#![forbid(unsafe_code)]

//! Single global "which item is open" tracker.
//!
//! [`ExpansionCoordinator`] owns the one [`ExpandedItem`] of an editing
//! session. Every collection controller, the selection ingestor, the drag
//! engine and the replace workflow read and write it through the session's
//! [`EditorContext`](crate::context::EditorContext); there is never a second
//! instance.
//!
//! # State Machine
//!
//! ```text
//!            toggle(p, i) / focus(p, i)
//!   Collapsed ─────────────────────────────► Expanded(p, i)
//!       ▲                                       │  │
//!       │ toggle(p, i) on same item             │  │ toggle/focus elsewhere
//!       │ on_removed(p, i) on same item         │  ▼
//!       └───────────────────────────────────── Expanded(p', i')
//! ```
//!
//! # Invariants
//!
//! 1. At most one item is expanded at any time.
//! 2. Every transition computes a complete new state and replaces the old one
//!    wholesale; fields are never patched individually.
//! 3. Structural mutations re-derive the expanded index with the standard
//!    shift rules below, both for the mutated collection itself and for any
//!    expanded item nested inside one of its elements.
//!
//! | Mutation on `p` | Expanded at `p`, index `c` |
//! |-----------------|----------------------------|
//! | `Removed(i)` | `c == i` → collapse, `c > i` → `c - 1` |
//! | `Inserted(i)` | `c >= i` → `c + 1` |
//! | `Moved(f, t)` | `c == f` → `t`, `f < c <= t` → `c - 1`, `t <= c < f` → `c + 1` |
//! | `Replaced(i)` | unchanged |

use fitform_core::CollectionPath;
use fitform_core::logging::targets;

/// The expanded item: a collection and an index inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedItem {
    pub path: CollectionPath,
    pub index: usize,
}

impl ExpandedItem {
    #[must_use]
    pub fn new(path: CollectionPath, index: usize) -> Self {
        Self { path, index }
    }
}

/// Structural change applied to one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Inserted { index: usize },
    Removed { index: usize },
    Moved { from: usize, to: usize },
    Replaced { index: usize },
}

impl Mutation {
    /// Where an element that sat at `index` ends up, or `None` if it is gone.
    #[must_use]
    pub fn remap(self, index: usize) -> Option<usize> {
        match self {
            Self::Inserted { index: at } => Some(if index >= at { index + 1 } else { index }),
            Self::Removed { index: at } => {
                if index == at {
                    None
                } else if index > at {
                    Some(index - 1)
                } else {
                    Some(index)
                }
            }
            Self::Moved { from, to } => {
                if index == from {
                    Some(to)
                } else if from < index && index <= to {
                    Some(index - 1)
                } else if to <= index && index < from {
                    Some(index + 1)
                } else {
                    Some(index)
                }
            }
            Self::Replaced { .. } => Some(index),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Inserted { .. } => "inserted",
            Self::Removed { .. } => "removed",
            Self::Moved { .. } => "moved",
            Self::Replaced { .. } => "replaced",
        }
    }
}

/// Session-scoped owner of the expansion state.
#[derive(Debug, Clone, Default)]
pub struct ExpansionCoordinator {
    state: Option<ExpandedItem>,
    revision: u64,
}

impl ExpansionCoordinator {
    /// Fresh coordinator with nothing expanded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently expanded item.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&ExpandedItem> {
        self.state.as_ref()
    }

    /// Expanded index when the expanded item lives in `path`.
    #[must_use]
    pub fn index_in(&self, path: &CollectionPath) -> Option<usize> {
        self.state
            .as_ref()
            .filter(|s| &s.path == path)
            .map(|s| s.index)
    }

    /// Whether `(path, index)` is the expanded item.
    #[must_use]
    pub fn is_expanded(&self, path: &CollectionPath, index: usize) -> bool {
        self.index_in(path) == Some(index)
    }

    /// Bumped on every actual state change.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Open `(path, index)`, or collapse it if it is already open.
    pub fn toggle(&mut self, path: &CollectionPath, index: usize) {
        let next = if self.is_expanded(path, index) {
            None
        } else {
            Some(ExpandedItem::new(path.clone(), index))
        };
        self.replace(next, "toggle");
    }

    /// Unconditionally open `(path, index)`.
    pub fn focus(&mut self, path: &CollectionPath, index: usize) {
        self.replace(Some(ExpandedItem::new(path.clone(), index)), "focus");
    }

    /// Collapse whatever is open.
    pub fn collapse(&mut self) {
        self.replace(None, "collapse");
    }

    pub fn on_removed(&mut self, path: &CollectionPath, index: usize) {
        self.apply(path, Mutation::Removed { index });
    }

    pub fn on_inserted(&mut self, path: &CollectionPath, index: usize) {
        self.apply(path, Mutation::Inserted { index });
    }

    pub fn on_moved(&mut self, path: &CollectionPath, from: usize, to: usize) {
        self.apply(path, Mutation::Moved { from, to });
    }

    /// Re-derive the state after `mutation` was applied to the collection at `path`.
    ///
    /// Items nested under an element of `path` follow that element: they
    /// collapse if it was removed and are re-pathed if it shifted.
    pub fn apply(&mut self, path: &CollectionPath, mutation: Mutation) {
        let Some(current) = self.state.as_ref() else {
            return;
        };

        let next = if &current.path == path {
            mutation
                .remap(current.index)
                .map(|index| ExpandedItem::new(path.clone(), index))
        } else if current.path.len() > path.len() && current.path.starts_with(path) {
            let depth = path.len();
            let Some(outer) = current.path.index_at(depth) else {
                return;
            };
            match mutation.remap(outer) {
                None => None,
                Some(shifted) if shifted == outer => return,
                Some(shifted) => match current.path.with_index_at(depth, shifted) {
                    Some(moved) => Some(ExpandedItem::new(moved, current.index)),
                    None => return,
                },
            }
        } else {
            return;
        };

        self.replace(next, mutation.name());
    }

    fn replace(&mut self, next: Option<ExpandedItem>, reason: &'static str) {
        if self.state == next {
            return;
        }
        tracing::debug!(
            target: targets::EXPANSION,
            reason,
            from = ?self.state,
            to = ?next,
            "expansion changed"
        );
        self.state = next;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitform_core::cpath;

    fn list() -> CollectionPath {
        cpath!["exerciseList"]
    }

    fn expanded(c: &ExpansionCoordinator) -> Option<(CollectionPath, usize)> {
        c.current().map(|s| (s.path.clone(), s.index))
    }

    #[test]
    fn toggle_opens_and_closes() {
        let mut c = ExpansionCoordinator::new();
        c.toggle(&list(), 1);
        assert_eq!(expanded(&c), Some((list(), 1)));
        c.toggle(&list(), 1);
        assert_eq!(expanded(&c), None);
    }

    #[test]
    fn toggle_elsewhere_moves_the_single_expansion() {
        let mut c = ExpansionCoordinator::new();
        let other = cpath!["groups", 0usize, "exercises"];
        c.toggle(&list(), 1);
        c.toggle(&other, 0);
        assert_eq!(expanded(&c), Some((other, 0)));
        assert!(!c.is_expanded(&list(), 1));
    }

    #[test]
    fn remove_before_expanded_decrements() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&list(), 1);
        c.on_removed(&list(), 0);
        assert_eq!(c.index_in(&list()), Some(0));
    }

    #[test]
    fn remove_expanded_collapses() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&list(), 2);
        c.on_removed(&list(), 2);
        assert_eq!(c.current(), None);
    }

    #[test]
    fn remove_after_expanded_is_ignored() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&list(), 1);
        let rev = c.revision();
        c.on_removed(&list(), 3);
        assert_eq!(c.index_in(&list()), Some(1));
        assert_eq!(c.revision(), rev);
    }

    #[test]
    fn insert_at_or_before_increments() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&list(), 1);
        c.on_inserted(&list(), 1);
        assert_eq!(c.index_in(&list()), Some(2));
        c.on_inserted(&list(), 3);
        assert_eq!(c.index_in(&list()), Some(2));
    }

    #[test]
    fn move_rules() {
        let mut c = ExpansionCoordinator::new();

        c.focus(&list(), 0);
        c.on_moved(&list(), 0, 2);
        assert_eq!(c.index_in(&list()), Some(2));

        c.focus(&list(), 2);
        c.on_moved(&list(), 0, 3);
        assert_eq!(c.index_in(&list()), Some(1));

        c.focus(&list(), 1);
        c.on_moved(&list(), 3, 0);
        assert_eq!(c.index_in(&list()), Some(2));

        c.focus(&list(), 4);
        c.on_moved(&list(), 0, 2);
        assert_eq!(c.index_in(&list()), Some(4));
    }

    #[test]
    fn other_paths_are_untouched() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&list(), 1);
        c.on_removed(&cpath!["otherList"], 0);
        c.on_inserted(&cpath!["otherList"], 0);
        assert_eq!(c.index_in(&list()), Some(1));
    }

    #[test]
    fn nested_item_follows_removed_parent() {
        let mut c = ExpansionCoordinator::new();
        let groups = cpath!["groups"];
        c.focus(&cpath!["groups", 1usize, "exercises"], 3);

        c.on_removed(&groups, 0);
        assert_eq!(
            expanded(&c),
            Some((cpath!["groups", 0usize, "exercises"], 3))
        );

        c.on_removed(&groups, 0);
        assert_eq!(c.current(), None);
    }

    #[test]
    fn nested_item_follows_moved_parent() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&cpath!["groups", 0usize, "exercises"], 1);
        c.on_moved(&cpath!["groups"], 0, 2);
        assert_eq!(
            expanded(&c),
            Some((cpath!["groups", 2usize, "exercises"], 1))
        );
    }

    #[test]
    fn replaced_keeps_focus() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&list(), 1);
        let rev = c.revision();
        c.apply(&list(), Mutation::Replaced { index: 1 });
        assert_eq!(c.index_in(&list()), Some(1));
        assert_eq!(c.revision(), rev);
    }

    #[test]
    fn revision_counts_real_changes_only() {
        let mut c = ExpansionCoordinator::new();
        c.focus(&list(), 0);
        c.focus(&list(), 0);
        assert_eq!(c.revision(), 1);
        c.collapse();
        c.collapse();
        assert_eq!(c.revision(), 2);
    }
}
