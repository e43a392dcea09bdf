//! Session lifecycle states and errors.

use thiserror::Error;

/// Health of the connection to the external analysis server.
///
/// Exactly one value is current at any time; the session controller's
/// transitions are the only mutation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Stopped,
    Starting,
    Running,
    Restarting,
    Stopping,
    Error,
}

impl SessionState {
    /// Whether health-gated commands should run their enabled variant.
    #[must_use]
    pub fn is_healthy(self) -> bool {
        self == Self::Running
    }

    /// Whether a live connection handle exists in this state.
    #[must_use]
    pub fn has_connection(self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Running | Self::Restarting | Self::Stopping
        )
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Restarting => "restarting",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }
}

/// Caller-visible failures of session lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("session is already running")]
    AlreadyRunning,
    #[error("a lifecycle operation is already in progress")]
    OperationInProgress,
    #[error("connection failed: {0}")]
    Connection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_running_is_healthy() {
        assert!(SessionState::Running.is_healthy());
        for state in [
            SessionState::Stopped,
            SessionState::Starting,
            SessionState::Restarting,
            SessionState::Stopping,
            SessionState::Error,
        ] {
            assert!(!state.is_healthy(), "{} must not be healthy", state.label());
        }
    }

    #[test]
    fn test_connection_states() {
        assert!(SessionState::Starting.has_connection());
        assert!(SessionState::Running.has_connection());
        assert!(SessionState::Restarting.has_connection());
        assert!(SessionState::Stopping.has_connection());
        assert!(!SessionState::Stopped.has_connection());
        assert!(!SessionState::Error.has_connection());
    }

    #[test]
    fn test_labels() {
        assert_eq!(SessionState::Stopped.label(), "stopped");
        assert_eq!(SessionState::Error.label(), "error");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SessionError::Connection("spawn failed".to_string()).to_string(),
            "connection failed: spawn failed"
        );
        assert_eq!(
            SessionError::AlreadyRunning.to_string(),
            "session is already running"
        );
    }
}
