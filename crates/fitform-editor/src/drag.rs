#![forbid(unsafe_code)]

//! Click-vs-drag disambiguation and drag reorder.
//!
//! [`DragReorderEngine`] watches one pointer interaction at a time on a
//! collection item's header and decides whether it was a click (toggle the
//! item's expansion) or a drag (move the item).
//!
//! # State Machine
//!
//! ```text
//!  Idle ──pointer_down──► Pressed ──pointer_move ≥ threshold──► Dragging
//!                          │   │         or drag_started            │
//!                          │   └──pointer_up, d < threshold──► toggle (click)
//!                          └──────pointer_up, d ≥ threshold──► Idle (ignored)
//!  Dragging ──drag_ended(new)──► move_item(old, new) + focus(new)
//! ```
//!
//! # Invariants
//!
//! 1. Click and move never both fire for the same press: once a drag session
//!    has started, the pointer-up produces no click.
//! 2. Displacement is Euclidean; a press is a click only when displacement is
//!    strictly below the threshold.
//! 3. A completed drag with `old != new` always leaves the moved item
//!    focused, whatever was expanded before.
//! 4. A click only toggles an item that exists: a press whose index is past
//!    the end of its collection (or whose collection no longer resolves)
//!    releases as `Ignored`.
//!
//! # Failure Modes
//!
//! - `drag_ended` without a session is ignored.
//! - If focus is lost mid-gesture the caller calls [`DragReorderEngine::reset`];
//!   nothing is moved.

use fitform_core::logging::targets;
use fitform_core::{CollectionPath, FormDataStore};
use serde::{Deserialize, Serialize};

use crate::collection::CollectionController;
use crate::context::EditorContext;

/// Maximum pointer displacement (exclusive) for a press to count as a click.
pub const CLICK_DISPLACEMENT_THRESHOLD: f64 = 5.0;

/// Drag recognition settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Click/drag boundary in pointer units (default: 5.0).
    pub click_threshold: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            click_threshold: CLICK_DISPLACEMENT_THRESHOLD,
        }
    }
}

/// Pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What a pointer/drag event resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing to do.
    Ignored,
    /// The press was a click; `expanded` is the item's state afterwards.
    Toggled {
        path: CollectionPath,
        index: usize,
        expanded: bool,
    },
    /// The item moved and is now focused at `to`.
    Moved {
        path: CollectionPath,
        from: usize,
        to: usize,
    },
    /// A drag ended where it started, or the move could not be applied.
    Dropped { path: CollectionPath, index: usize },
}

#[derive(Debug, Clone)]
struct Press {
    path: CollectionPath,
    index: usize,
    origin: Point,
    dragged: bool,
}

#[derive(Debug, Clone)]
struct DragSession {
    path: CollectionPath,
    from: usize,
}

/// Stateful click/drag recognizer bound to collection items.
#[derive(Debug, Clone, Default)]
pub struct DragReorderEngine {
    config: DragConfig,
    press: Option<Press>,
    session: Option<DragSession>,
}

impl DragReorderEngine {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            press: None,
            session: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Whether a drag session is in progress.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Drop all gesture state without emitting anything.
    pub fn reset(&mut self) {
        self.press = None;
        self.session = None;
    }

    /// Pointer pressed on the header of `(path, index)`.
    pub fn pointer_down(&mut self, path: &CollectionPath, index: usize, origin: Point) {
        self.press = Some(Press {
            path: path.clone(),
            index,
            origin,
            dragged: false,
        });
    }

    /// Pointer moved while pressed. Returns `true` if this started a drag.
    pub fn pointer_move(&mut self, pos: Point) -> bool {
        if self.session.is_some() {
            return false;
        }
        let Some(press) = self.press.as_mut() else {
            return false;
        };
        if press.origin.distance(pos) < self.config.click_threshold {
            return false;
        }
        press.dragged = true;
        let (path, from) = (press.path.clone(), press.index);
        self.begin_session(path, from);
        true
    }

    /// External sortable reported that dragging of `(path, index)` began.
    pub fn drag_started(&mut self, path: &CollectionPath, index: usize) {
        if let Some(press) = self.press.as_mut() {
            press.dragged = true;
        }
        self.begin_session(path.clone(), index);
    }

    /// Drag session finished over `new_index`.
    pub fn drag_ended<S: FormDataStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        controller: &CollectionController,
        new_index: usize,
    ) -> DragOutcome {
        let Some(session) = self.session.take() else {
            return DragOutcome::Ignored;
        };
        if controller.path() != &session.path {
            tracing::warn!(
                target: targets::DRAG,
                session = %session.path,
                controller = %controller.path(),
                "drag ended on a different collection; ignoring"
            );
            return DragOutcome::Dropped {
                path: session.path,
                index: session.from,
            };
        }

        let from = session.from;
        if from == new_index || !controller.move_item(ctx, from, new_index).is_applied() {
            tracing::debug!(target: targets::DRAG, path = %session.path, from, new_index, "drag dropped in place");
            return DragOutcome::Dropped {
                path: session.path,
                index: from,
            };
        }

        ctx.expansion.focus(&session.path, new_index);
        ctx.scroll_to(&session.path, new_index);
        tracing::debug!(target: targets::DRAG, path = %session.path, from, to = new_index, "drag moved item");
        DragOutcome::Moved {
            path: session.path,
            from,
            to: new_index,
        }
    }

    /// Pointer released at `pos`.
    pub fn pointer_up<S: FormDataStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        pos: Point,
    ) -> DragOutcome {
        let Some(press) = self.press.take() else {
            return DragOutcome::Ignored;
        };
        if press.dragged || self.session.is_some() {
            return DragOutcome::Ignored;
        }

        let displacement = press.origin.distance(pos);
        if displacement >= self.config.click_threshold {
            tracing::debug!(target: targets::DRAG, displacement, "press moved too far for a click");
            return DragOutcome::Ignored;
        }

        let len = ctx.store.get_array(&press.path).map_or(0, |items| items.len());
        if press.index >= len {
            tracing::debug!(target: targets::DRAG, path = %press.path, index = press.index, len, "click on a missing item");
            return DragOutcome::Ignored;
        }

        ctx.expansion.toggle(&press.path, press.index);
        let expanded = ctx.expansion.is_expanded(&press.path, press.index);
        DragOutcome::Toggled {
            path: press.path,
            index: press.index,
            expanded,
        }
    }

    fn begin_session(&mut self, path: CollectionPath, from: usize) {
        tracing::debug!(target: targets::DRAG, path = %path, from, "drag started");
        self.session = Some(DragSession { path, from });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitform_core::{JsonFormStore, cpath};
    use serde_json::{Value, json};

    fn setup() -> (EditorContext<JsonFormStore>, CollectionController) {
        let ctx = EditorContext::new(JsonFormStore::new(json!({
            "exerciseList": [{"id": "A"}, {"id": "B"}, {"id": "C"}],
        })));
        (ctx, CollectionController::new(cpath!["exerciseList"]))
    }

    fn ids(ctx: &EditorContext<JsonFormStore>, c: &CollectionController) -> Vec<Value> {
        c.items(ctx).unwrap().iter().map(|v| v["id"].clone()).collect()
    }

    #[test]
    fn short_press_is_a_click() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();
        engine.pointer_down(c.path(), 1, Point::new(10.0, 10.0));
        let out = engine.pointer_up(&mut ctx, Point::new(14.0, 10.0));
        assert_eq!(
            out,
            DragOutcome::Toggled {
                path: c.path().clone(),
                index: 1,
                expanded: true,
            }
        );
        assert!(ctx.expansion.is_expanded(c.path(), 1));
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();

        engine.pointer_down(c.path(), 0, Point::new(0.0, 0.0));
        assert!(matches!(
            engine.pointer_up(&mut ctx, Point::new(4.0, 0.0)),
            DragOutcome::Toggled { .. }
        ));

        engine.pointer_down(c.path(), 0, Point::new(0.0, 0.0));
        assert_eq!(engine.pointer_up(&mut ctx, Point::new(6.0, 0.0)), DragOutcome::Ignored);

        engine.pointer_down(c.path(), 0, Point::new(0.0, 0.0));
        assert_eq!(engine.pointer_up(&mut ctx, Point::new(3.0, 4.0)), DragOutcome::Ignored);
    }

    #[test]
    fn click_past_the_end_is_ignored() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();
        engine.pointer_down(c.path(), 3, Point::default());
        assert_eq!(engine.pointer_up(&mut ctx, Point::default()), DragOutcome::Ignored);

        engine.pointer_down(&cpath!["missing"], 0, Point::default());
        assert_eq!(engine.pointer_up(&mut ctx, Point::default()), DragOutcome::Ignored);
        assert_eq!(ctx.expansion.current(), None);
        assert_eq!(ctx.expansion.revision(), 0);
    }

    #[test]
    fn second_click_collapses() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();
        for _ in 0..2 {
            engine.pointer_down(c.path(), 2, Point::default());
            engine.pointer_up(&mut ctx, Point::default());
        }
        assert_eq!(ctx.expansion.current(), None);
    }

    #[test]
    fn drag_moves_and_focuses() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();
        ctx.expansion.focus(c.path(), 1);

        engine.pointer_down(c.path(), 0, Point::new(0.0, 0.0));
        assert!(engine.pointer_move(Point::new(0.0, 30.0)));
        assert!(engine.is_dragging());
        let out = engine.drag_ended(&mut ctx, &c, 2);

        assert_eq!(
            out,
            DragOutcome::Moved {
                path: c.path().clone(),
                from: 0,
                to: 2,
            }
        );
        assert_eq!(ids(&ctx, &c), vec![json!("B"), json!("C"), json!("A")]);
        assert_eq!(ctx.expansion.index_in(c.path()), Some(2));
        // The release after a drag is not a click.
        assert_eq!(engine.pointer_up(&mut ctx, Point::new(0.0, 30.0)), DragOutcome::Ignored);
        assert_eq!(ctx.expansion.index_in(c.path()), Some(2));
    }

    #[test]
    fn external_drag_start_suppresses_click() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();
        engine.pointer_down(c.path(), 1, Point::default());
        engine.drag_started(c.path(), 1);
        assert_eq!(engine.pointer_up(&mut ctx, Point::default()), DragOutcome::Ignored);
        assert_eq!(
            engine.drag_ended(&mut ctx, &c, 1),
            DragOutcome::Dropped {
                path: c.path().clone(),
                index: 1,
            }
        );
        assert_eq!(ctx.expansion.current(), None);
    }

    #[test]
    fn drag_end_without_session_is_ignored() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();
        assert_eq!(engine.drag_ended(&mut ctx, &c, 1), DragOutcome::Ignored);
    }

    #[test]
    fn reset_clears_gesture() {
        let (mut ctx, c) = setup();
        let mut engine = DragReorderEngine::default();
        engine.pointer_down(c.path(), 0, Point::default());
        engine.pointer_move(Point::new(50.0, 0.0));
        engine.reset();
        assert!(!engine.is_dragging());
        assert_eq!(engine.drag_ended(&mut ctx, &c, 2), DragOutcome::Ignored);
        assert_eq!(ids(&ctx, &c), vec![json!("A"), json!("B"), json!("C")]);
    }
}
