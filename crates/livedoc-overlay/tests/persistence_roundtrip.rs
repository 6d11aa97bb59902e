//! Reload round trips: an overlay dropped and rebuilt against the same
//! storage reopens on the panel that was visible.

use std::sync::{Arc, Mutex};

use livedoc_overlay::{
    ColorizeOptions, HeadlessView, HideOptions, MemoryStorage, OVERLAY_ID_KEY, OVERLAY_KEY_KEY,
    Overlay, OverlayMount, OverlayOptions, OverlayStorage, PanelKey, PanelSpec, ShowOptions,
    ThemeColor,
};
use pretty_assertions::assert_eq;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

fn mount(id: &str) -> OverlayMount {
    OverlayMount::new(id)
        .with_item(PanelSpec::new("k1"))
        .with_item(PanelSpec::new("k2").with_theme(ColorizeOptions::color(ThemeColor::Danger)))
}

fn build(id: &str, storage: &MemoryStorage) -> Overlay<HeadlessView, MemoryStorage> {
    Overlay::new(
        mount(id),
        OverlayOptions::default().colorize(ColorizeOptions::color(ThemeColor::Teal)),
        HeadlessView::new(),
        storage.clone(),
    )
    .expect("valid mount")
}

#[test]
fn reload_restores_open_overlay_and_panel() {
    let storage = MemoryStorage::new();
    {
        let mut overlay = build("quarto-live-renders", &storage);
        overlay.show_overlay();
        overlay.show_content_item("k2", ShowOptions::default());
    }

    let restored = build("quarto-live-renders", &storage);
    assert!(restored.is_open());
    assert_eq!(restored.current_key(), Some(&PanelKey::new("k2")));
    assert_eq!(restored.current_index(), Some(1));
    assert!(restored.view().overlay_visible());
    assert!(restored.view().scheduled().is_empty(), "restore must not slide");
    assert_eq!(
        restored.theme().and_then(|t| t.color()),
        Some(ThemeColor::Danger)
    );
}

#[test]
fn mismatched_overlay_id_stays_closed() {
    let storage = MemoryStorage::new();
    {
        let mut overlay = build("quarto-live-renders", &storage);
        overlay.show_overlay();
        overlay.show_content_item("k1", ShowOptions::default());
    }

    let other = build("quarto-live-responses", &storage);
    assert!(!other.is_open());
    assert_eq!(other.current_key(), None);
    assert_eq!(storage.get(OVERLAY_ID_KEY).as_deref(), Some("quarto-live-renders"));
}

#[test]
fn closing_erases_the_stored_pair() {
    let storage = MemoryStorage::new();
    {
        let mut overlay = build("renders", &storage);
        overlay.show_overlay();
        overlay.show_content_item("k1", ShowOptions::default());
        overlay.hide_overlay(HideOptions::default());
    }
    assert_eq!(storage.get(OVERLAY_ID_KEY), None);
    assert_eq!(storage.get(OVERLAY_KEY_KEY), None);
    assert!(!build("renders", &storage).is_open());
}

#[test]
fn construction_hide_keeps_selection_for_restore() {
    let storage = MemoryStorage::new();
    {
        let mut overlay = build("renders", &storage);
        overlay.show_overlay();
        overlay.show_content_item("k1", ShowOptions::default());
    }
    let writes = storage.write_count();
    let _restored = build("renders", &storage);
    assert_eq!(storage.get(OVERLAY_KEY_KEY).as_deref(), Some("k1"));
    // Only the reopen rewrites the overlay id.
    assert_eq!(storage.write_count(), writes + 1);
}

// ── Log capture ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Captured {
    messages: Vec<String>,
}

struct Capture {
    state: Arc<Mutex<Captured>>,
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Msg(Option<String>);
        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.0 = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut msg = Msg(None);
        event.record(&mut msg);
        if let Some(message) = msg.0 {
            self.state.lock().expect("capture lock").messages.push(message);
        }
    }
}

#[test]
fn stale_stored_key_is_logged_not_raised() {
    let state = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(Capture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut storage = MemoryStorage::new();
    storage.set(OVERLAY_ID_KEY, "renders");
    storage.set(OVERLAY_KEY_KEY, "regenerated-away");

    let overlay = build("renders", &storage);
    assert!(!overlay.is_open());

    let captured = state.lock().expect("capture lock");
    assert!(
        captured.messages.iter().any(|m| m == "overlay.restore.failed"),
        "expected overlay.restore.failed, got {:?}",
        captured.messages
    );
}
