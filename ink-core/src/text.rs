//! Text box editing with a char-indexed cursor.

use crate::ObjectId;

/// Edit focus on one text box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditSession {
    /// The text box being edited.
    pub target: ObjectId,
    cursor_chars: usize,
}

impl TextEditSession {
    /// Focus `target` with the cursor after the last character of `content`.
    #[must_use]
    pub fn new(target: ObjectId, content: &str) -> Self {
        Self {
            target,
            cursor_chars: content.chars().count(),
        }
    }

    /// Cursor position in chars, clamped to `content`.
    #[must_use]
    pub fn cursor_chars(&self, content: &str) -> usize {
        self.cursor_chars.min(content.chars().count())
    }

    /// Insert `text` at the cursor and move past it.
    pub fn insert(&mut self, content: &mut String, text: &str) {
        let cursor = self.cursor_chars(content);
        content.insert_str(byte_index_for_cursor(content, cursor), text);
        self.cursor_chars = cursor + text.chars().count();
    }

    /// Delete the char before the cursor. Returns false at the start.
    pub fn delete_backward(&mut self, content: &mut String) -> bool {
        let cursor = self.cursor_chars(content);
        if cursor == 0 {
            return false;
        }
        let end = byte_index_for_cursor(content, cursor);
        let start = byte_index_for_cursor(content, cursor - 1);
        content.drain(start..end);
        self.cursor_chars = cursor - 1;
        true
    }

    /// Move the cursor one char left.
    pub fn move_left(&mut self, content: &str) -> bool {
        let cursor = self.cursor_chars(content);
        if cursor == 0 {
            return false;
        }
        self.cursor_chars = cursor - 1;
        true
    }

    /// Move the cursor one char right.
    pub fn move_right(&mut self, content: &str) -> bool {
        let cursor = self.cursor_chars(content);
        if cursor >= content.chars().count() {
            return false;
        }
        self.cursor_chars = cursor + 1;
        true
    }
}

fn byte_index_for_cursor(content: &str, cursor_chars: usize) -> usize {
    content
        .char_indices()
        .nth(cursor_chars)
        .map_or(content.len(), |(index, _)| index)
}
