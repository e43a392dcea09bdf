//! Virtual-document store for diagnostic output.
//!
//! Owns the in-memory content behind the fixed URI scheme. Entries are
//! created lazily on first read, replaced wholesale (never patched), and
//! refreshed from the external output source on demand. Content is kept
//! raw for change detection but served escape-stripped: each replacement
//! computes the plain text and its styled spans once, so reads and
//! decoration passes agree on offsets. Subscriber sets record which
//! editors display each document; they scope decoration passes only and
//! never gate content fetches.

use std::collections::{BTreeSet, HashMap};

use tether_types::StyledSpan;

use crate::ansi;
use crate::host::{EditorId, OutputSource};

/// URI scheme under which diagnostic-output documents are served.
pub const OUTPUT_SCHEME: &str = "tether-diagnostics";

/// Build the virtual-document URI for an output key.
#[must_use]
pub fn output_uri(key: &str) -> String {
    format!("{OUTPUT_SCHEME}:///{key}")
}

/// Extract the output key from a virtual-document URI, if the URI uses
/// our scheme.
#[must_use]
pub fn parse_output_uri(uri: &str) -> Option<&str> {
    uri.strip_prefix(OUTPUT_SCHEME)?
        .strip_prefix(":///")
        .filter(|key| !key.is_empty())
}

#[derive(Debug, Default)]
struct VirtualDocument {
    raw: String,
    plain: String,
    spans: Vec<StyledSpan>,
    version: u64,
    subscribers: BTreeSet<EditorId>,
}

/// Owner of all virtual diagnostic-output documents.
pub struct VirtualDocumentStore<S: OutputSource> {
    source: S,
    docs: HashMap<String, VirtualDocument>,
    /// Keys replaced since the last drain, in replacement order, deduped.
    changed: Vec<String>,
}

impl<S: OutputSource> VirtualDocumentStore<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            docs: HashMap::new(),
            changed: Vec::new(),
        }
    }

    /// Escape-stripped plain content for `key` — what the editor
    /// displays. An unknown key lazily creates an empty entry — reads
    /// never fail.
    pub fn read(&mut self, key: &str) -> &str {
        &self.docs.entry(key.to_string()).or_default().plain
    }

    /// Styled spans over the plain content of `key`, in byte offsets.
    #[must_use]
    pub fn spans(&self, key: &str) -> &[StyledSpan] {
        self.docs.get(key).map_or(&[][..], |doc| doc.spans.as_slice())
    }

    /// Version counter for `key`, if an entry exists.
    #[must_use]
    pub fn version(&self, key: &str) -> Option<u64> {
        self.docs.get(key).map(|doc| doc.version)
    }

    /// Wholesale content replacement. Bumps the version on every call and
    /// queues the key for change notification.
    pub fn replace(&mut self, key: &str, text: String) {
        let doc = self.docs.entry(key.to_string()).or_default();
        let (plain, spans) = ansi::parse(&text);
        doc.raw = text;
        doc.plain = plain;
        doc.spans = spans;
        doc.version += 1;
        tracing::debug!(key, version = doc.version, "virtual document replaced");
        if !self.changed.iter().any(|k| k == key) {
            self.changed.push(key.to_string());
        }
    }

    /// Re-fetch content for `key` from the output source and replace it
    /// if it differs byte-for-byte (no spurious version bumps).
    ///
    /// A failed fetch degrades silently to last-known-good content — one
    /// failed refresh must not error the editor experience.
    pub async fn trigger_update(&mut self, key: &str) {
        match self.source.fetch(key).await {
            Ok(Some(text)) => {
                let current = self.docs.get(key).map_or("", |doc| doc.raw.as_str());
                if text != current {
                    self.replace(key, text);
                }
            }
            Ok(None) => {
                tracing::trace!(key, "output source has nothing for key");
            }
            Err(e) => {
                tracing::warn!(key, "output refresh failed, keeping last content: {e:#}");
            }
        }
    }

    /// Record that `editor` displays `key`.
    pub fn subscribe(&mut self, key: &str, editor: EditorId) {
        self.docs
            .entry(key.to_string())
            .or_default()
            .subscribers
            .insert(editor);
    }

    pub fn unsubscribe(&mut self, key: &str, editor: EditorId) {
        if let Some(doc) = self.docs.get_mut(key) {
            doc.subscribers.remove(&editor);
        }
    }

    /// Remove `editor` from every document's subscriber set.
    pub fn unsubscribe_all(&mut self, editor: EditorId) {
        for doc in self.docs.values_mut() {
            doc.subscribers.remove(&editor);
        }
    }

    /// Editors currently displaying `key`, in stable order.
    #[must_use]
    pub fn subscribers(&self, key: &str) -> Vec<EditorId> {
        self.docs
            .get(key)
            .map(|doc| doc.subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Keys `editor` is currently subscribed to, in arbitrary order.
    #[must_use]
    pub fn subscriptions(&self, editor: EditorId) -> Vec<String> {
        self.docs
            .iter()
            .filter(|(_, doc)| doc.subscribers.contains(&editor))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Every editor subscribed to any document, in stable order.
    #[must_use]
    pub fn all_subscribers(&self) -> Vec<EditorId> {
        let mut editors: Vec<EditorId> = self
            .docs
            .values()
            .flat_map(|doc| doc.subscribers.iter().copied())
            .collect();
        editors.sort_unstable();
        editors.dedup();
        editors
    }

    /// Drain the keys replaced since the last call, in replacement order.
    pub fn take_changed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.changed)
    }

    /// Drop all entries and subscriptions.
    pub fn clear(&mut self) {
        self.docs.clear();
        self.changed.clear();
    }

    /// Get the output source (for testing).
    #[cfg(test)]
    pub(crate) fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
