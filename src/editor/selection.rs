use super::EditorEvents;
use std::sync::Arc;

/// Selection offsets in Unicode scalar values (`char`s).
///
/// Browser text inputs report UTF-16 code units; hosts must convert, since
/// the two differ for characters outside the BMP such as emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBounds {
    pub start: usize,
    pub end: usize,
}

impl SelectionBounds {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_collapsed(&self) -> bool {
        self.end <= self.start
    }
}

/// The text covered by `bounds`, or empty when there is no real selection.
///
/// Offsets past the end of `content` are clamped.
pub fn selected_text(content: &str, bounds: Option<SelectionBounds>) -> String {
    let Some(bounds) = bounds else {
        return String::new();
    };
    if bounds.is_collapsed() {
        return String::new();
    }

    content
        .chars()
        .skip(bounds.start)
        .take(bounds.end - bounds.start)
        .collect()
}

/// Re-derives the selection after content changes and pointer/key input
pub struct SelectionTracker {
    events: Arc<dyn EditorEvents>,
}

impl SelectionTracker {
    pub fn new(events: Arc<dyn EditorEvents>) -> Self {
        Self { events }
    }

    pub fn emit(&self, content: &str, bounds: Option<SelectionBounds>) -> String {
        let text = selected_text(content, bounds);
        self.events.on_selection_changed(&text);
        text
    }
}
