//! Log events are emitted under the documented `fitform.*` targets.

use std::sync::{Arc, Mutex};

use fitform_core::logging::targets;
use fitform_core::{CollectionItem, JsonFormStore, cpath};
use fitform_editor::{CollectionController, EditorConfig, EditorContext, EditorSession, PanelDescriptor};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    level: tracing::Level,
}

struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(Capture {
        events: events.clone(),
    });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

#[test]
fn mutations_log_under_module_targets() {
    let events = capture(|| {
        let mut s = EditorSession::new(
            JsonFormStore::new(json!({ "exerciseList": [{"id": "A"}, {"id": "B"}] })),
            EditorConfig::default(),
            [PanelDescriptor::simple("exercises", cpath!["exerciseList"])],
        )
        .unwrap();
        s.ingest(vec![CollectionItem::with_id("X")]);
        s.move_item(&cpath!["exerciseList"], 0, 2);
    });

    for target in [targets::SESSION, targets::INGEST, targets::COLLECTION, targets::EXPANSION] {
        assert!(
            events.iter().any(|e| e.target == target),
            "no event under {target}: {events:?}"
        );
    }
    assert!(events.iter().all(|e| e.target.starts_with("fitform.")));
}

#[test]
fn non_editable_path_warns() {
    let events = capture(|| {
        let mut s = EditorSession::new(
            JsonFormStore::new(json!({})),
            EditorConfig::default(),
            Vec::new(),
        )
        .unwrap();
        s.remove_item(&cpath!["missing"], 0);
    });

    assert!(events.iter().any(|e| {
        e.target == targets::SESSION && e.level == tracing::Level::WARN
    }));
}

#[test]
fn unresolved_collection_warns() {
    let events = capture(|| {
        let mut ctx = EditorContext::new(JsonFormStore::new(json!({})));
        CollectionController::new(cpath!["missing"]).remove_at(&mut ctx, 0);
    });

    assert!(events.iter().any(|e| {
        e.target == targets::COLLECTION && e.level == tracing::Level::WARN
    }));
}
