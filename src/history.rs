// ============================================================================
// EDIT HISTORY — linear checkpoint timeline with a movable cursor
// ============================================================================

use crate::io::ImageData;

/// One committed state of the edited image.
///
/// Immutable once appended: the payload, the label that produced it (the
/// user's prompt, or a fixed constant for denoise/enhance/bake), and the
/// target dimensions that were active when it was created. Undo/redo
/// restores those dimensions along with the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub image: ImageData,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

impl Checkpoint {
    pub fn new(image: ImageData, label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            image,
            label: label.into(),
            width,
            height,
        }
    }
}

/// Ordered checkpoint sequence plus a cursor.
///
/// The cursor always satisfies `-1 <= cursor < len`, where `-1` means "no
/// checkpoint selected, showing the unedited source". Undo and redo move
/// only the cursor; the sequence itself changes only on `append` (which
/// discards any redo-able future) and `reset`.
#[derive(Debug)]
pub struct HistoryStore {
    entries: Vec<Checkpoint>,
    cursor: isize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: -1,
        }
    }

    /// Append at the cursor. Entries strictly after the cursor are dropped
    /// first (a new edit invalidates the redo-able future), then the
    /// checkpoint is pushed and the cursor moves to it. Never fails.
    pub fn append(&mut self, checkpoint: Checkpoint) {
        let keep = (self.cursor + 1) as usize;
        if keep < self.entries.len() {
            log::debug!(
                "history: discarding {} redo entries",
                self.entries.len() - keep
            );
            self.entries.truncate(keep);
        }
        self.entries.push(checkpoint);
        self.cursor = self.entries.len() as isize - 1;
    }

    /// Step the cursor back. No-op at the `-1` sentinel. Returns the new
    /// current checkpoint, or `None` when the cursor lands on the sentinel.
    pub fn undo(&mut self) -> Option<&Checkpoint> {
        if self.cursor >= 0 {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Step the cursor forward. No-op at the last entry.
    pub fn redo(&mut self) -> Option<&Checkpoint> {
        if self.cursor < self.entries.len() as isize - 1 {
            self.cursor += 1;
        }
        self.current()
    }

    pub fn current(&self) -> Option<&Checkpoint> {
        if self.cursor >= 0 {
            self.entries.get(self.cursor as usize)
        } else {
            None
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len() as isize - 1
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels of the checkpoints at or before the cursor, most recent first.
    /// Feeds a host-side history panel.
    pub fn labels(&self) -> Vec<&str> {
        if self.cursor < 0 {
            return Vec::new();
        }
        self.entries[..=self.cursor as usize]
            .iter()
            .rev()
            .map(|c| c.label.as_str())
            .collect()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = -1;
    }
}
