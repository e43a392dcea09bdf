//! Client context — one object owning every part of the integration layer.
//!
//! Construction wires the session controller, command router, document
//! store, and event bridge together; `teardown` releases the connection
//! and every subscription. There is no ambient global state: embedders
//! hold exactly one `Client` per editor window.

use tether_types::{ClientConfig, SessionError, SessionState};
use tokio::sync::mpsc;

use crate::bridge::{EditorEvent, EditorEventBridge};
use crate::commands::{CommandBinding, CommandRouter};
use crate::documents::{VirtualDocumentStore, parse_output_uri};
use crate::host::{Connector, EditorHost, OutputSource};
use crate::session::SessionController;

/// The editor-side analysis client.
///
/// Generic over its three collaborators: the connector to the analysis
/// process, the diagnostic-output source, and the editor host.
pub struct Client<C: Connector, S: OutputSource, H: EditorHost> {
    config: ClientConfig,
    session: SessionController<C>,
    router: CommandRouter,
    store: VirtualDocumentStore<S>,
    bridge: EditorEventBridge,
    host: H,
}

impl<C: Connector, S: OutputSource, H: EditorHost> Client<C, S, H> {
    #[must_use]
    pub fn new(connector: C, source: S, host: H, config: ClientConfig) -> Self {
        Self {
            session: SessionController::new(connector, &config),
            router: CommandRouter::new(),
            store: VirtualDocumentStore::new(source),
            bridge: EditorEventBridge::new(),
            host,
            config,
        }
    }

    #[must_use]
    pub fn current_state(&self) -> SessionState {
        self.session.current_state()
    }

    #[must_use]
    pub fn session(&self) -> &SessionController<C> {
        &self.session
    }

    /// Sender the embedder plugs into its host event callbacks.
    #[must_use]
    pub fn events(&self) -> mpsc::Sender<EditorEvent> {
        self.bridge.sender()
    }

    /// Install a health-gated command with the host.
    pub fn register_command(&mut self, binding: CommandBinding) {
        self.router
            .register(binding, self.session.current_state(), &mut self.host);
    }

    /// Initial activation. On failure the user gets exactly one error
    /// notification; transient errors afterwards degrade silently.
    pub async fn activate(&mut self) -> Result<(), SessionError> {
        if let Err(e) = self.start().await {
            self.host
                .show_error(&format!("Cannot activate analysis client: {e}"));
            return Err(e);
        }
        Ok(())
    }

    pub async fn start(&mut self) -> Result<(), SessionError> {
        let result = self.session.start().await;
        self.after_lifecycle();
        result
    }

    pub async fn stop(&mut self) -> Result<(), SessionError> {
        let result = self.session.stop().await;
        self.after_lifecycle();
        result
    }

    pub async fn restart(&mut self) -> Result<(), SessionError> {
        let result = self.session.restart().await;
        self.after_lifecycle();
        result
    }

    /// Drain pending editor events, bounded by the configured budget.
    pub async fn pump_events(&mut self) -> usize {
        self.bridge
            .pump(self.config.event_budget, &mut self.store, &mut self.host)
            .await
    }

    /// Serve a virtual-document read from the host's content provider:
    /// the escape-stripped plain text the decorations are offset against.
    /// Returns `None` for URIs outside our scheme.
    pub fn read_document(&mut self, uri: &str) -> Option<&str> {
        let key = parse_output_uri(uri)?;
        Some(self.store.read(key))
    }

    /// Release the connection, drop all listeners and subscriptions.
    /// The client may be re-activated afterwards.
    pub async fn teardown(&mut self) {
        self.session.shutdown().await;
        self.store.clear();
        self.host.set_session_status(self.session.current_state());
        tracing::info!("analysis client torn down");
    }

    /// Command re-selection and status reporting run before any lifecycle
    /// call returns, bounding binding staleness to the call itself.
    fn after_lifecycle(&mut self) {
        let state = self.session.current_state();
        self.router.sync(state, &mut self.host);
        self.host.set_session_status(state);
    }
}
