//! Capability seams for the two external collaborators.
//!
//! The analysis-server process and the editor are collaborators, not
//! parts of this crate: the embedder implements these traits and the
//! client core only ever talks through them. Tests substitute recording
//! or scripted implementations.

use std::sync::Arc;

use tether_types::{SessionState, StyledSpan};

/// An installed command implementation. Embedders capture whatever
/// context the command needs (typically a channel back into the client).
pub type CommandFn = Arc<dyn Fn() + Send + Sync>;

/// Opaque identifier for an open editor pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditorId(u64);

impl EditorId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// A live connection to the analysis-server process.
///
/// Dropping the handle without calling [`close`](Self::close) is allowed
/// but skips graceful teardown.
pub trait ConnectionHandle: Send {
    /// Tear down the connection. Consumes self.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Establishes connections to the analysis-server process.
pub trait Connector: Send {
    type Handle: ConnectionHandle;

    /// Start the external process and establish a connection to it.
    ///
    /// Failures are boundary failures (spawn error, handshake rejection)
    /// and are reported as-is; the session controller maps them into its
    /// error state.
    fn connect(&mut self) -> impl Future<Output = anyhow::Result<Self::Handle>> + Send;
}

/// Supplies the diagnostic-output text behind a virtual document key.
pub trait OutputSource: Send {
    /// Fetch the current output for `key`. `Ok(None)` means the
    /// collaborator has nothing for this key (distinct from empty text).
    fn fetch(&mut self, key: &str) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

/// Everything the client needs from the editor.
pub trait EditorHost {
    /// Install (or replace) the implementation registered under `name`.
    fn install_command(&mut self, name: &str, command: CommandFn);

    /// Apply styled decorations over ranges of an open editor.
    fn apply_decorations(&mut self, editor: EditorId, spans: &[StyledSpan]);

    /// Clear previously applied decorations over the given byte ranges.
    fn clear_decorations(&mut self, editor: EditorId, ranges: &[(usize, usize)]);

    /// Tell the editor a virtual document's content changed so it re-reads
    /// the content provider.
    fn notify_document_changed(&mut self, uri: &str);

    /// Show a user-visible error notification.
    fn show_error(&mut self, message: &str);

    /// Report session health for status display.
    fn set_session_status(&mut self, state: SessionState);
}
