/// Caret position measured in lines and characters (not bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Editable multi-line text with a caret, an optional selection and a
/// read-only switch. Backs every pane of the pad.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    cursor: Position,
    anchor: Option<Position>,
    read_only: bool,
    scroll_line: usize,
    scroll_column: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Position::default(),
            anchor: None,
            read_only: false,
            scroll_line: 0,
            scroll_column: 0,
        }
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.set_value(text);
        buffer
    }

    /// Full content with `\n` line separators.
    pub fn value(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the whole content. Caret returns to the start and the
    /// selection is dropped. Works regardless of the read-only flag.
    pub fn set_value(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n");
        self.lines = normalized.split('\n').map(str::to_string).collect();
        self.cursor = Position::default();
        self.anchor = None;
        self.scroll_line = 0;
        self.scroll_column = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn scroll(&self) -> (usize, usize) {
        (self.scroll_line, self.scroll_column)
    }

    /// Ordered selection bounds, or `None` when nothing is selected.
    pub fn selection_range(&self) -> Option<(Position, Position)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some(if anchor < self.cursor {
            (anchor, self.cursor)
        } else {
            (self.cursor, anchor)
        })
    }

    /// Selected text, empty when nothing is selected.
    pub fn selection(&self) -> String {
        let Some((start, end)) = self.selection_range() else {
            return String::new();
        };
        if start.line == end.line {
            let line = &self.lines[start.line];
            return slice_chars(line, start.column, end.column).to_string();
        }

        let mut out = String::new();
        let first = &self.lines[start.line];
        out.push_str(slice_chars(first, start.column, char_len(first)));
        for line in &self.lines[start.line + 1..end.line] {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out.push_str(slice_chars(&self.lines[end.line], 0, end.column));
        out
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(Position::default());
        self.move_to_end();
        if self.anchor == Some(self.cursor) {
            self.anchor = None;
        }
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.newline();
            return;
        }
        if self.read_only {
            return;
        }
        self.delete_selection();
        let line = &mut self.lines[self.cursor.line];
        let at = byte_index(line, self.cursor.column);
        line.insert(at, ch);
        self.cursor.column += 1;
    }

    /// Insert text that may span several lines (paste).
    pub fn insert_str(&mut self, text: &str) {
        if self.read_only {
            return;
        }
        self.delete_selection();
        let normalized = text.replace("\r\n", "\n");
        let mut parts = normalized.split('\n');
        if let Some(first) = parts.next() {
            let line = &mut self.lines[self.cursor.line];
            let at = byte_index(line, self.cursor.column);
            line.insert_str(at, first);
            self.cursor.column += char_len(first);
        }
        for part in parts {
            self.newline();
            let line = &mut self.lines[self.cursor.line];
            line.insert_str(0, part);
            self.cursor.column = char_len(part);
        }
    }

    pub fn newline(&mut self) {
        if self.read_only {
            return;
        }
        self.delete_selection();
        let line = &mut self.lines[self.cursor.line];
        let at = byte_index(line, self.cursor.column);
        let tail = line.split_off(at);
        self.lines.insert(self.cursor.line + 1, tail);
        self.cursor = Position::new(self.cursor.line + 1, 0);
    }

    pub fn backspace(&mut self) {
        if self.read_only || self.delete_selection() {
            return;
        }
        if self.cursor.column > 0 {
            let line = &mut self.lines[self.cursor.line];
            let at = byte_index(line, self.cursor.column - 1);
            line.remove(at);
            self.cursor.column -= 1;
        } else if self.cursor.line > 0 {
            let current = self.lines.remove(self.cursor.line);
            self.cursor.line -= 1;
            let previous = &mut self.lines[self.cursor.line];
            self.cursor.column = char_len(previous);
            previous.push_str(&current);
        }
    }

    pub fn delete(&mut self) {
        if self.read_only || self.delete_selection() {
            return;
        }
        let line_len = char_len(&self.lines[self.cursor.line]);
        if self.cursor.column < line_len {
            let line = &mut self.lines[self.cursor.line];
            let at = byte_index(line, self.cursor.column);
            line.remove(at);
        } else if self.cursor.line + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor.line + 1);
            self.lines[self.cursor.line].push_str(&next);
        }
    }

    pub fn move_left(&mut self, extend: bool) {
        self.begin_motion(extend);
        if self.cursor.column > 0 {
            self.cursor.column -= 1;
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.column = self.current_line_len();
        }
    }

    pub fn move_right(&mut self, extend: bool) {
        self.begin_motion(extend);
        if self.cursor.column < self.current_line_len() {
            self.cursor.column += 1;
        } else if self.cursor.line + 1 < self.lines.len() {
            self.cursor = Position::new(self.cursor.line + 1, 0);
        }
    }

    pub fn move_up(&mut self, lines: usize, extend: bool) {
        self.begin_motion(extend);
        self.cursor.line = self.cursor.line.saturating_sub(lines);
        self.cursor.column = self.cursor.column.min(self.current_line_len());
    }

    pub fn move_down(&mut self, lines: usize, extend: bool) {
        self.begin_motion(extend);
        self.cursor.line = (self.cursor.line + lines).min(self.lines.len() - 1);
        self.cursor.column = self.cursor.column.min(self.current_line_len());
    }

    pub fn move_line_start(&mut self, extend: bool) {
        self.begin_motion(extend);
        self.cursor.column = 0;
    }

    pub fn move_line_end(&mut self, extend: bool) {
        self.begin_motion(extend);
        self.cursor.column = self.current_line_len();
    }

    /// Park the caret after the last character, as done after streaming output.
    pub fn move_to_end(&mut self) {
        let line = self.lines.len() - 1;
        self.cursor = Position::new(line, char_len(&self.lines[line]));
    }

    /// Place the caret at a clamped position, dropping any selection.
    pub fn set_cursor(&mut self, position: Position) {
        self.anchor = None;
        let line = position.line.min(self.lines.len() - 1);
        let column = position.column.min(char_len(&self.lines[line]));
        self.cursor = Position::new(line, column);
    }

    /// Move the caret to a clamped position, keeping or starting a selection
    /// anchored where the caret was. Used for pointer drags.
    pub fn extend_to(&mut self, position: Position) {
        self.begin_motion(true);
        let line = position.line.min(self.lines.len() - 1);
        let column = position.column.min(char_len(&self.lines[line]));
        self.cursor = Position::new(line, column);
    }

    /// Adjust the scroll offsets so the caret stays inside a viewport of the
    /// given size (text cells, gutter excluded).
    pub fn scroll_to_cursor(&mut self, height: usize, width: usize) {
        if height > 0 {
            if self.cursor.line < self.scroll_line {
                self.scroll_line = self.cursor.line;
            } else if self.cursor.line >= self.scroll_line + height {
                self.scroll_line = self.cursor.line + 1 - height;
            }
        }
        if width > 0 {
            if self.cursor.column < self.scroll_column {
                self.scroll_column = self.cursor.column;
            } else if self.cursor.column >= self.scroll_column + width {
                self.scroll_column = self.cursor.column + 1 - width;
            }
        }
    }

    fn current_line_len(&self) -> usize {
        char_len(&self.lines[self.cursor.line])
    }

    fn begin_motion(&mut self, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
        }
    }

    /// Remove the selected range; returns whether anything was removed.
    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection_range() else {
            self.anchor = None;
            return false;
        };
        let tail = {
            let last = &self.lines[end.line];
            last[byte_index(last, end.column)..].to_string()
        };
        let first = &mut self.lines[start.line];
        let cut = byte_index(first, start.column);
        first.truncate(cut);
        first.push_str(&tail);
        self.lines.drain(start.line + 1..=end.line);
        self.cursor = start;
        self.anchor = None;
        true
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn byte_index(text: &str, column: usize) -> usize {
    text.char_indices()
        .nth(column)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    &text[byte_index(text, start)..byte_index(text, end)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_and_value_round_trip_lines() {
        let buffer = TextBuffer::from_text("def f():\n    return 1\n");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.value(), "def f():\n    return 1\n");
    }

    #[test]
    fn typing_and_newline_split_lines() {
        let mut buffer = TextBuffer::new();
        for ch in "ab".chars() {
            buffer.insert_char(ch);
        }
        buffer.move_left(false);
        buffer.newline();
        buffer.insert_char('c');
        assert_eq!(buffer.value(), "a\ncb");
        assert_eq!(buffer.cursor(), Position::new(1, 1));
    }

    #[test]
    fn pointer_drag_selects_across_lines() {
        let mut buffer = TextBuffer::from_text("alpha\nbeta\ngamma");
        buffer.set_cursor(Position::new(0, 2));
        buffer.extend_to(Position::new(1, 40));
        assert_eq!(buffer.selection(), "pha\nbeta");
        buffer.extend_to(Position::new(0, 4));
        assert_eq!(buffer.selection(), "ph");
    }

    #[test]
    fn backspace_joins_lines() {
        let mut buffer = TextBuffer::from_text("ab\ncd");
        buffer.set_cursor(Position::new(1, 0));
        buffer.backspace();
        assert_eq!(buffer.value(), "abcd");
        assert_eq!(buffer.cursor(), Position::new(0, 2));
    }

    #[test]
    fn selection_spans_lines() {
        let mut buffer = TextBuffer::from_text("one\ntwo\nthree");
        buffer.set_cursor(Position::new(0, 1));
        buffer.move_down(2, true);
        buffer.move_line_start(true);
        buffer.move_right(true);
        buffer.move_right(true);
        assert_eq!(buffer.selection(), "ne\ntwo\nth");

        buffer.insert_char('X');
        assert_eq!(buffer.value(), "oXree");
        assert!(buffer.selection().is_empty());
    }

    #[test]
    fn empty_selection_reads_as_empty() {
        let mut buffer = TextBuffer::from_text("abc");
        buffer.move_right(true);
        buffer.move_left(true);
        assert_eq!(buffer.selection(), "");
    }

    #[test]
    fn read_only_blocks_edits_but_not_set_value() {
        let mut buffer = TextBuffer::from_text("keep");
        buffer.set_read_only(true);
        buffer.insert_char('x');
        buffer.backspace();
        buffer.insert_str("more");
        assert_eq!(buffer.value(), "keep");

        buffer.set_value("Generating...");
        assert_eq!(buffer.value(), "Generating...");
    }

    #[test]
    fn paste_multiline_text() {
        let mut buffer = TextBuffer::from_text("[]");
        buffer.set_cursor(Position::new(0, 1));
        buffer.insert_str("a\r\nb");
        assert_eq!(buffer.value(), "[a\nb]");
        assert_eq!(buffer.cursor(), Position::new(1, 1));
    }

    #[test]
    fn move_to_end_parks_after_last_char() {
        let mut buffer = TextBuffer::from_text("x\nyz");
        buffer.move_to_end();
        assert_eq!(buffer.cursor(), Position::new(1, 2));
    }

    #[test]
    fn multibyte_characters_edit_by_char() {
        let mut buffer = TextBuffer::from_text("héllo");
        buffer.set_cursor(Position::new(0, 2));
        buffer.backspace();
        assert_eq!(buffer.value(), "hllo");
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut buffer = TextBuffer::from_text(&"line\n".repeat(20));
        buffer.set_cursor(Position::new(15, 0));
        buffer.scroll_to_cursor(5, 10);
        assert_eq!(buffer.scroll(), (11, 0));
        buffer.set_cursor(Position::new(2, 0));
        buffer.scroll_to_cursor(5, 10);
        assert_eq!(buffer.scroll(), (2, 0));
    }
}
