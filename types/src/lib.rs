//! Shared vocabulary for the tether analysis-server client.
//!
//! These types define the interface between `tether-client` and its
//! embedder: the session lifecycle enum and errors, the styled-span
//! model produced by the ANSI parser, and the client configuration.

mod config;
mod session;
mod style;

pub use config::ClientConfig;
pub use session::{SessionError, SessionState};
pub use style::{Color, Style, StyledSpan};
