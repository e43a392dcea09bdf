//! Client configuration.

use serde::Deserialize;

fn default_connect_timeout_ms() -> u64 {
    30_000
}

fn default_event_budget() -> usize {
    64
}

/// Configuration for the analysis-server client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Upper bound on connection establishment, in milliseconds. A connect
    /// attempt that exceeds this transitions the session to `Error` rather
    /// than hanging.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum number of editor events drained per pump pass.
    #[serde(default = "default_event_budget")]
    pub event_budget: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            event_budget: default_event_budget(),
        }
    }
}
