#![forbid(unsafe_code)]

//! Shared editing context.
//!
//! One [`EditorContext`] exists per editing session. It bundles the form data
//! store, the session's only [`ExpansionCoordinator`], and the queue of
//! side-effect requests addressed to the render layer. Components receive it
//! as `&mut EditorContext<S>` for the duration of a single event, so there is
//! no shared mutable state between them.

use fitform_core::{CollectionPath, FormDataStore};

use crate::expansion::ExpansionCoordinator;

/// Fire-and-forget request for the render layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRequest {
    /// Bring an item (or, with `index: None`, a whole panel) into view.
    ScrollIntoView {
        path: CollectionPath,
        index: Option<usize>,
    },
}

/// Store, expansion state and pending render requests of one session.
#[derive(Debug)]
pub struct EditorContext<S> {
    pub store: S,
    pub expansion: ExpansionCoordinator,
    requests: Vec<RenderRequest>,
}

impl<S: FormDataStore> EditorContext<S> {
    /// Start a session over `store` with nothing expanded.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            expansion: ExpansionCoordinator::new(),
            requests: Vec::new(),
        }
    }

    /// Queue a render request.
    pub fn request(&mut self, request: RenderRequest) {
        self.requests.push(request);
    }

    /// Queue a scroll to an item.
    pub fn scroll_to(&mut self, path: &CollectionPath, index: usize) {
        self.request(RenderRequest::ScrollIntoView {
            path: path.clone(),
            index: Some(index),
        });
    }

    /// Drain queued render requests in the order they were issued.
    pub fn take_render_requests(&mut self) -> Vec<RenderRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Pending request count.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// End the session, dropping the expansion state and returning the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}
