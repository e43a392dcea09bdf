//! Editor integration layer for an external analysis server.
//!
//! The editor side of a long-lived analysis-server session: a lifecycle
//! state machine gating command behavior on connection health, plus a
//! virtual-document store that renders ANSI-styled diagnostic output as
//! read-only documents with matching text decorations.
//!
//! The embedder supplies the external collaborators through the traits in
//! [`host`] and drives everything through a single [`Client`].

pub mod ansi;
pub mod decorations;
pub mod host;

pub(crate) mod bridge;
pub(crate) mod commands;
pub(crate) mod documents;
pub(crate) mod session;

mod client;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::EditorEvent;
pub use client::Client;
pub use commands::CommandBinding;
pub use decorations::DecorationPatch;
pub use documents::{OUTPUT_SCHEME, VirtualDocumentStore, output_uri, parse_output_uri};
pub use session::{ListenerId, SessionController};
