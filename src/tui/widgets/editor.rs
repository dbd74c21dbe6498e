use ratatui::layout::Rect;

/// Single-line text input used by the task form fields
///
/// The cursor is a character index, not a byte offset, so multi-byte
/// input (emoji in notes, accented names) edits correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Editor {
    text: String,
    pub cursor_col: usize,
    pub scroll_col: usize,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_string(content: &str) -> Self {
        // The store keeps single-line text; fold any newlines into spaces
        let text: String = content
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let cursor_col = text.chars().count();
        Self {
            text,
            cursor_col,
            scroll_col: 0,
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, col: usize) -> usize {
        self.text
            .char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        let col = self.cursor_col.min(self.len());
        let offset = self.byte_offset(col);
        self.text.insert(offset, ch);
        self.cursor_col = col + 1;
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        let col = self.cursor_col.min(self.len());
        if col == 0 {
            return;
        }
        let offset = self.byte_offset(col - 1);
        self.text.remove(offset);
        self.cursor_col = col - 1;
    }

    /// Delete key: remove the character under the cursor
    pub fn delete_forward(&mut self) {
        let col = self.cursor_col.min(self.len());
        if col < self.len() {
            let offset = self.byte_offset(col);
            self.text.remove(offset);
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_col = 0;
        self.scroll_col = 0;
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_col = self.cursor_col.min(self.len()).saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.len() {
            self.cursor_col += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.len();
    }

    pub fn move_cursor_word_left(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut col = self.cursor_col.min(chars.len());
        while col > 0 && !is_word_char(chars[col - 1]) {
            col -= 1;
        }
        while col > 0 && is_word_char(chars[col - 1]) {
            col -= 1;
        }
        self.cursor_col = col;
    }

    pub fn move_cursor_word_right(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut col = self.cursor_col.min(chars.len());
        while col < chars.len() && is_word_char(chars[col]) {
            col += 1;
        }
        while col < chars.len() && !is_word_char(chars[col]) {
            col += 1;
        }
        self.cursor_col = col;
    }

    /// Keep the cursor inside a field `viewport_width` columns wide (borders included)
    pub fn update_horizontal_scroll(&mut self, viewport_width: usize) {
        let effective_width = viewport_width.saturating_sub(2).max(1);
        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if self.cursor_col >= self.scroll_col + effective_width {
            self.scroll_col = self.cursor_col + 1 - effective_width;
        }
    }

    /// Text visible after horizontal scrolling
    pub fn visible_text(&self, viewport_width: usize) -> String {
        self.text
            .chars()
            .skip(self.scroll_col)
            .take(viewport_width.saturating_sub(2))
            .collect()
    }

    /// Screen position of the cursor inside a bordered field
    pub fn get_cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if area.width < 3 || area.height < 3 {
            return None;
        }
        let visible_col = self.cursor_col.checked_sub(self.scroll_col)?;
        if visible_col >= area.width.saturating_sub(2) as usize {
            return None;
        }
        Some((area.x + 1 + visible_col as u16, area.y + 1))
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
