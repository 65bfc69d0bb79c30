#![forbid(unsafe_code)]

//! Ordered nested collection editor.
//!
//! # Role in fitform
//! `fitform-editor` holds the editing state machines of the admin console's
//! plan and schedule forms: which item is expanded, how catalog picks land in
//! a collection, click-vs-drag on item headers, the replace modal, and the
//! lifecycle of repeatable panel groups. It has no rendering of its own; the
//! render layer reads state from an [`EditorSession`] and drains its
//! [`RenderRequest`]s.
//!
//! # Example
//! ```
//! use fitform_core::{CollectionItem, JsonFormStore, cpath};
//! use fitform_editor::{EditorConfig, EditorSession, PanelDescriptor};
//! use serde_json::json;
//!
//! let store = JsonFormStore::new(json!({ "exerciseList": [] }));
//! let mut session = EditorSession::new(
//!     store,
//!     EditorConfig::default(),
//!     [PanelDescriptor::simple("exercises", cpath!["exerciseList"])],
//! )
//! .unwrap();
//!
//! let report = session.ingest(vec![CollectionItem::with_id("squat")]);
//! assert_eq!(report.inserted(), 1);
//! assert!(session.expansion().is_expanded(&cpath!["exerciseList"], 0));
//! ```

pub mod collection;
pub mod config;
pub mod context;
pub mod drag;
pub mod error;
pub mod expansion;
pub mod ingest;
pub mod panel;
pub mod replace;
pub mod session;

pub use collection::{CollectionController, MutationOutcome, NoOpReason};
pub use config::{EditorConfig, PanelConfig};
pub use context::{EditorContext, RenderRequest};
pub use drag::{CLICK_DISPLACEMENT_THRESHOLD, DragConfig, DragOutcome, DragReorderEngine, Point};
pub use error::{ConfigError, EditorError, EditorResult, PanelError};
pub use expansion::{ExpandedItem, ExpansionCoordinator, Mutation};
pub use ingest::{
    DEFAULT_BATCH_WINDOW, DefaultTarget, IngestConfig, IngestOutcome, IngestReport,
    SelectionEvent, SelectionIngestor,
};
pub use panel::{
    AddTicket, AddedPanel, HeaderSet, OpenMode, PanelDescriptor, PanelGroupManager, PanelKey,
    PanelKind,
};
pub use replace::{ReplaceOutcome, ReplaceState, ReplaceTarget, ReplaceWorkflow};
pub use session::{EditorSession, Panel};
