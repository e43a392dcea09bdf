//! Shared mock collaborators for unit tests.

use std::collections::HashMap;

use tether_types::{SessionState, StyledSpan};

use crate::host::{CommandFn, EditorHost, EditorId, OutputSource};

/// Editor host that records every call for assertion.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub installs: Vec<(String, CommandFn)>,
    pub applied: Vec<(EditorId, Vec<StyledSpan>)>,
    pub cleared: Vec<(EditorId, Vec<(usize, usize)>)>,
    pub doc_changes: Vec<String>,
    pub errors: Vec<String>,
    pub statuses: Vec<SessionState>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the most recently installed implementation for `name`.
    pub fn run_command(&self, name: &str) {
        let command = self
            .installs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f.clone())
            .unwrap_or_else(|| panic!("no command installed under '{name}'"));
        command();
    }

    pub fn decoration_call_count(&self) -> usize {
        self.applied.len() + self.cleared.len()
    }
}

impl EditorHost for RecordingHost {
    fn install_command(&mut self, name: &str, command: CommandFn) {
        self.installs.push((name.to_string(), command));
    }

    fn apply_decorations(&mut self, editor: EditorId, spans: &[StyledSpan]) {
        self.applied.push((editor, spans.to_vec()));
    }

    fn clear_decorations(&mut self, editor: EditorId, ranges: &[(usize, usize)]) {
        self.cleared.push((editor, ranges.to_vec()));
    }

    fn notify_document_changed(&mut self, uri: &str) {
        self.doc_changes.push(uri.to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn set_session_status(&mut self, state: SessionState) {
        self.statuses.push(state);
    }
}

/// Output source backed by a fixed map; `Err` entries script failures.
#[derive(Default)]
pub(crate) struct FixtureSource {
    pub outputs: HashMap<String, Result<String, String>>,
    pub fetches: usize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, text: &str) {
        self.outputs.insert(key.to_string(), Ok(text.to_string()));
    }

    pub fn fail(&mut self, key: &str, error: &str) {
        self.outputs.insert(key.to_string(), Err(error.to_string()));
    }
}

impl OutputSource for FixtureSource {
    async fn fetch(&mut self, key: &str) -> anyhow::Result<Option<String>> {
        self.fetches += 1;
        match self.outputs.get(key) {
            Some(Ok(text)) => Ok(Some(text.clone())),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg.clone())),
            None => Ok(None),
        }
    }
}
