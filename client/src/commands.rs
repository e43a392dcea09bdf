//! Health-gated command routing.
//!
//! Each logical command carries two implementations; the variant
//! installed with the host is selected by current session health. This is
//! a tagged-variant lookup resolved at registration time and on every
//! transition, not dynamic dispatch over an object hierarchy. The router
//! reads health, it never owns session state.

use tether_types::SessionState;

use crate::host::{CommandFn, EditorHost};

/// A logical command with its healthy and degraded implementations.
pub struct CommandBinding {
    name: String,
    enabled: CommandFn,
    disabled: CommandFn,
}

impl CommandBinding {
    #[must_use]
    pub fn new(name: impl Into<String>, enabled: CommandFn, disabled: CommandFn) -> Self {
        Self {
            name: name.into(),
            enabled,
            disabled,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn select(&self, healthy: bool) -> CommandFn {
        if healthy {
            self.enabled.clone()
        } else {
            self.disabled.clone()
        }
    }
}

struct Installed {
    binding: CommandBinding,
    /// Health bit the currently installed implementation was chosen with.
    healthy: bool,
}

/// Installs command implementations with the host and swaps them when
/// session health flips.
#[derive(Default)]
pub struct CommandRouter {
    bindings: Vec<Installed>,
}

impl CommandRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `binding` under its name, choosing the implementation for
    /// the current state. A duplicate name is rejected with a warning and
    /// the existing binding stays installed.
    pub fn register<H: EditorHost>(
        &mut self,
        binding: CommandBinding,
        state: SessionState,
        host: &mut H,
    ) {
        if self
            .bindings
            .iter()
            .any(|installed| installed.binding.name == binding.name)
        {
            tracing::warn!(
                "Command '{}' registered twice. Keeping the existing binding.",
                binding.name
            );
            return;
        }
        let healthy = state.is_healthy();
        host.install_command(&binding.name, binding.select(healthy));
        self.bindings.push(Installed { binding, healthy });
    }

    /// Re-evaluate health for all bindings, re-installing only those whose
    /// bit flipped. No-op otherwise, to avoid redundant host registration
    /// churn.
    pub fn sync<H: EditorHost>(&mut self, state: SessionState, host: &mut H) {
        let healthy = state.is_healthy();
        for installed in &mut self.bindings {
            if installed.healthy != healthy {
                host.install_command(&installed.binding.name, installed.binding.select(healthy));
                installed.healthy = healthy;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
