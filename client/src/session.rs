//! Session controller — owns the connection to the analysis server.
//!
//! The controller is the only writer of [`SessionState`]. Every state
//! change goes through [`SessionController::transition`], which notifies
//! listeners synchronously, in registration order, before the lifecycle
//! call returns to its caller. The connection handle exists exactly in
//! the states where [`SessionState::has_connection`] is true.
//!
//! A lifecycle call that arrives while another transition is in flight
//! fails fast with [`SessionError::OperationInProgress`] — queueing was
//! rejected because a queued `start` behind a `stop` silently inverts
//! user intent. Rust's `&mut` receiver already serializes external
//! callers; the guard covers re-entrant calls issued from inside a
//! state-change listener.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tether_types::{ClientConfig, SessionError, SessionState};

use crate::host::{ConnectionHandle, Connector};

type StateListener = Box<dyn FnMut(SessionState, SessionState) + Send>;

/// Token returned by [`SessionController::on_state_change`]; pass it to
/// [`SessionController::remove_listener`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Lifecycle state machine for the connection to the external process.
pub struct SessionController<C: Connector> {
    connector: C,
    handle: Option<C::Handle>,
    state: SessionState,
    last_error: Option<String>,
    listeners: Vec<(ListenerId, StateListener)>,
    next_listener_id: u64,
    in_flight: bool,
    connect_timeout: Duration,
}

impl<C: Connector> SessionController<C> {
    #[must_use]
    pub fn new(connector: C, config: &ClientConfig) -> Self {
        Self {
            connector,
            handle: None,
            state: SessionState::Stopped,
            last_error: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            in_flight: false,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        }
    }

    #[must_use]
    pub fn current_state(&self) -> SessionState {
        self.state
    }

    /// The failure retained from the most recent transition into `Error`.
    /// Cleared when a connection is successfully established.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Register a listener invoked on every transition with
    /// `(previous, next)`. Invocation order is registration order; a
    /// panicking listener is isolated and logged, never blocking delivery
    /// to later listeners.
    pub fn on_state_change(
        &mut self,
        listener: impl FnMut(SessionState, SessionState) + Send + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    /// Establish the connection.
    ///
    /// Fails with `AlreadyRunning` when the session is `Starting` or
    /// `Running`. Otherwise transitions `Stopped`/`Error` → `Starting`,
    /// then `Starting` → `Running` on success or `Starting` → `Error` on
    /// failure, retaining the failure for [`last_error`](Self::last_error).
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if matches!(self.state, SessionState::Starting | SessionState::Running) {
            return Err(SessionError::AlreadyRunning);
        }
        self.begin_op()?;
        self.transition(SessionState::Starting);
        let result = self.establish().await;
        self.in_flight = false;
        result
    }

    /// Tear down the connection.
    ///
    /// No-op success when already `Stopped` (zero notifications, zero
    /// teardown calls). Safe from every state including `Error`.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Stopped {
            return Ok(());
        }
        self.begin_op()?;
        self.transition(SessionState::Stopping);
        if let Some(handle) = self.handle.take() {
            handle.close().await;
        }
        self.transition(SessionState::Stopped);
        self.in_flight = false;
        Ok(())
    }

    /// Stop-then-start as a single observable unit.
    ///
    /// Listeners see one `Restarting` notification followed by the
    /// terminal `Running`/`Error`; no intermediate `Stopped` is ever
    /// observable. The old connection is closed before the new one is
    /// established. With no connection to recycle (`Stopped`/`Error`)
    /// this is a plain start.
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        if !self.state.has_connection() {
            return self.start().await;
        }
        self.begin_op()?;
        self.transition(SessionState::Restarting);
        if let Some(handle) = self.handle.take() {
            handle.close().await;
        }
        let result = self.establish().await;
        self.in_flight = false;
        result
    }

    /// Release the connection and drop all listeners. Used by the client
    /// context's teardown; subsequent lifecycle calls remain legal.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.stop().await {
            tracing::warn!("session shutdown: {e}");
        }
        self.listeners.clear();
    }

    /// Connect under the configured timeout and settle into the terminal
    /// state. Caller has already transitioned into `Starting`/`Restarting`.
    async fn establish(&mut self) -> Result<(), SessionError> {
        match tokio::time::timeout(self.connect_timeout, self.connector.connect()).await {
            Ok(Ok(handle)) => {
                self.handle = Some(handle);
                self.last_error = None;
                self.transition(SessionState::Running);
                Ok(())
            }
            Ok(Err(e)) => self.fail_connect(format!("{e:#}")),
            Err(_) => self.fail_connect(format!(
                "connect timed out after {}ms",
                self.connect_timeout.as_millis()
            )),
        }
    }

    fn fail_connect(&mut self, message: String) -> Result<(), SessionError> {
        tracing::warn!("analysis server connection failed: {message}");
        self.handle = None;
        self.last_error = Some(message.clone());
        self.transition(SessionState::Error);
        Err(SessionError::Connection(message))
    }

    fn begin_op(&mut self) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::OperationInProgress);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Apply a state change and fan out to listeners. Equal-state
    /// transitions are dropped so listeners never see two consecutive
    /// identical states.
    fn transition(&mut self, next: SessionState) {
        if next == self.state {
            return;
        }
        let prev = self.state;
        self.state = next;
        tracing::info!(from = prev.label(), to = next.label(), "session state");
        for (id, listener) in &mut self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(prev, next))).is_err() {
                tracing::warn!(listener = id.0, "state-change listener panicked");
            }
        }
    }

    #[cfg(test)]
    fn force_in_flight(&mut self) {
        self.in_flight = true;
    }

    #[cfg(test)]
    fn force_state(&mut self, state: SessionState) {
        self.state = state;
    }
}
