//! Decoration reconciliation.
//!
//! Brings the decorations applied to an editor in line with freshly
//! computed styled spans. The contract that matters for the editor
//! experience: structurally equal span lists produce an empty patch, so
//! an unchanged document never flickers on reconciliation.

use std::collections::HashMap;

use tether_types::StyledSpan;

use crate::host::EditorId;

/// Host calls needed to bring one editor's decorations up to date:
/// ranges to clear, then spans to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationPatch {
    clear: Vec<(usize, usize)>,
    apply: Vec<StyledSpan>,
}

impl DecorationPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clear.is_empty() && self.apply.is_empty()
    }

    #[must_use]
    pub fn clear(&self) -> &[(usize, usize)] {
        &self.clear
    }

    #[must_use]
    pub fn apply(&self) -> &[StyledSpan] {
        &self.apply
    }
}

/// Compute the patch taking `previous` to `current`.
///
/// Equal lists yield an empty patch (no host calls). Otherwise the policy
/// is clear-all-then-apply-all; a minimal diff would also be correct but
/// must preserve both the empty-on-equality guarantee and the absence of
/// stale ranges after the patch completes.
#[must_use]
pub fn diff(previous: &[StyledSpan], current: &[StyledSpan]) -> DecorationPatch {
    if previous == current {
        return DecorationPatch::default();
    }
    DecorationPatch {
        clear: previous.iter().map(StyledSpan::range).collect(),
        apply: current.to_vec(),
    }
}

/// Tracks the spans currently applied per editor and hands out patches.
#[derive(Default)]
pub struct DecorationReconciler {
    applied: HashMap<EditorId, Vec<StyledSpan>>,
}

impl DecorationReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch for bringing `editor` to `current`, recording `current` as
    /// applied. An empty patch means no host calls are needed.
    pub fn reconcile(&mut self, editor: EditorId, current: &[StyledSpan]) -> DecorationPatch {
        let previous = self.applied.get(&editor).map_or(&[][..], Vec::as_slice);
        let patch = diff(previous, current);
        if !patch.is_empty() {
            if current.is_empty() {
                self.applied.remove(&editor);
            } else {
                self.applied.insert(editor, current.to_vec());
            }
        }
        patch
    }

    /// Drop tracking for an editor that left the visible set. The next
    /// reconcile for it starts from a clean slate.
    pub fn forget(&mut self, editor: EditorId) {
        self.applied.remove(&editor);
    }
}
