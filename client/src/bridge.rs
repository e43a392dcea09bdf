//! Editor event bridge.
//!
//! Host editor events arrive as explicit messages on a bounded queue
//! rather than through an implicit shared event loop. [`EditorEventBridge::pump`]
//! drains the queue without blocking, handling each event to completion
//! before dequeuing the next, so handlers for one event class never
//! overlap.
//!
//! A decoration pass covers every editor subscribed to the affected
//! document; documents with no subscribed editor are skipped outright,
//! never queued.

use tokio::sync::mpsc;

use crate::decorations::DecorationReconciler;
use crate::documents::{VirtualDocumentStore, output_uri, parse_output_uri};
use crate::host::{EditorHost, EditorId, OutputSource};

/// Channel capacity for editor events between the embedder and the bridge.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A host editor event, delivered in host order.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// A document's content changed.
    DocumentChanged { uri: String },
    /// A document was opened in an editor.
    DocumentOpened { uri: String, editor: EditorId },
    /// The focused editor changed.
    ActiveEditorChanged { editor: EditorId, uri: String },
    /// The set of visible editors changed (splits opened or closed).
    VisibleEditorsChanged { editors: Vec<(EditorId, String)> },
}

/// Subscribes to host events and drives virtual-document refresh and
/// decoration reconciliation.
pub struct EditorEventBridge {
    event_rx: mpsc::Receiver<EditorEvent>,
    event_tx: mpsc::Sender<EditorEvent>,
    reconciler: DecorationReconciler,
}

impl Default for EditorEventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorEventBridge {
    #[must_use]
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            event_rx,
            event_tx,
            reconciler: DecorationReconciler::new(),
        }
    }

    /// Sender half for the embedder's host callbacks.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<EditorEvent> {
        self.event_tx.clone()
    }

    /// Drain pending events, up to `budget`. Non-blocking; returns the
    /// number of events handled.
    pub async fn pump<S: OutputSource, H: EditorHost>(
        &mut self,
        budget: usize,
        store: &mut VirtualDocumentStore<S>,
        host: &mut H,
    ) -> usize {
        let mut count = 0;
        while count < budget {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event, store, host).await;
                    count += 1;
                }
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        count
    }

    async fn handle_event<S: OutputSource, H: EditorHost>(
        &mut self,
        event: EditorEvent,
        store: &mut VirtualDocumentStore<S>,
        host: &mut H,
    ) {
        match event {
            EditorEvent::DocumentChanged { uri } => {
                if let Some(key) = parse_output_uri(&uri) {
                    let key = key.to_string();
                    self.decorate(&key, store, host);
                }
            }
            EditorEvent::DocumentOpened { uri, editor } => {
                if let Some(key) = parse_output_uri(&uri) {
                    let key = key.to_string();
                    store.subscribe(&key, editor);
                    self.decorate(&key, store, host);
                }
            }
            EditorEvent::ActiveEditorChanged { editor, uri } => {
                // Refresh covers server-side updates missed while the
                // editor was not focused.
                if let Some(key) = parse_output_uri(&uri) {
                    let key = key.to_string();
                    store.subscribe(&key, editor);
                    store.trigger_update(&key).await;
                    self.flush_changes(store, host);
                    self.decorate(&key, store, host);
                }
            }
            EditorEvent::VisibleEditorsChanged { editors } => {
                self.sync_visible(&editors, store, host).await;
            }
        }
    }

    /// Reconcile subscriptions with the new visible set, refresh every
    /// visible managed document, and decorate.
    async fn sync_visible<S: OutputSource, H: EditorHost>(
        &mut self,
        editors: &[(EditorId, String)],
        store: &mut VirtualDocumentStore<S>,
        host: &mut H,
    ) {
        for editor in store.all_subscribers() {
            if !editors.iter().any(|(visible, _)| *visible == editor) {
                store.unsubscribe_all(editor);
                self.reconciler.forget(editor);
            }
        }

        let mut keys = Vec::new();
        for (editor, uri) in editors {
            let key = parse_output_uri(uri).map(str::to_string);
            // An editor that switched documents no longer displays its
            // old key; drop those subscriptions before recording the new
            // one.
            let mut switched = false;
            for old in store.subscriptions(*editor) {
                if key.as_deref() != Some(old.as_str()) {
                    store.unsubscribe(&old, *editor);
                    switched = true;
                }
            }
            if switched {
                self.reconciler.forget(*editor);
            }
            if let Some(key) = key {
                store.subscribe(&key, *editor);
                store.trigger_update(&key).await;
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        self.flush_changes(store, host);
        for key in keys {
            self.decorate(&key, store, host);
        }
    }

    /// Notify the host about replaced documents and decorate their
    /// subscribers.
    fn flush_changes<S: OutputSource, H: EditorHost>(
        &mut self,
        store: &mut VirtualDocumentStore<S>,
        host: &mut H,
    ) {
        for key in store.take_changed() {
            host.notify_document_changed(&output_uri(&key));
            self.decorate(&key, store, host);
        }
    }

    /// Patch every editor subscribed to `key` with the document's current
    /// spans. Skips documents nobody displays.
    fn decorate<S: OutputSource, H: EditorHost>(
        &mut self,
        key: &str,
        store: &mut VirtualDocumentStore<S>,
        host: &mut H,
    ) {
        let subscribers = store.subscribers(key);
        if subscribers.is_empty() {
            return;
        }
        let spans = store.spans(key);
        for editor in subscribers {
            let patch = self.reconciler.reconcile(editor, spans);
            if patch.is_empty() {
                continue;
            }
            if !patch.clear().is_empty() {
                host.clear_decorations(editor, patch.clear());
            }
            host.apply_decorations(editor, patch.apply());
        }
    }
}
