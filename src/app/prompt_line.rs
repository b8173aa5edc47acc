use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What the status-line prompt is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    OpenFile,
    SaveAs,
    Title,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::OpenFile => "Open file",
            PromptKind::SaveAs => "Save as",
            PromptKind::Title => "Title",
        }
    }
}

/// Result of feeding a key to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    Editing,
    Submitted(String),
    Canceled,
}

/// One-line input shown in place of the status line.
#[derive(Debug, Clone)]
pub struct PromptLine {
    kind: PromptKind,
    text: Vec<char>,
    cursor: usize,
}

impl PromptLine {
    pub fn new(kind: PromptKind, initial: &str) -> Self {
        let text: Vec<char> = initial.chars().collect();
        Self {
            kind,
            cursor: text.len(),
            text,
        }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn value(&self) -> String {
        self.text.iter().collect()
    }

    /// Column of the caret relative to the start of the rendered line.
    pub fn caret_column(&self) -> usize {
        self.prefix().chars().count() + self.cursor
    }

    fn prefix(&self) -> String {
        format!("{}: ", self.kind.label())
    }

    pub fn render(&self) -> String {
        format!("{}{}", self.prefix(), self.value())
    }

    pub fn insert_str(&mut self, text: &str) {
        for ch in text.chars().filter(|ch| !ch.is_control()) {
            self.text.insert(self.cursor, ch);
            self.cursor += 1;
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PromptInput {
        if key.kind == KeyEventKind::Release {
            return PromptInput::Editing;
        }
        match key.code {
            KeyCode::Esc => return PromptInput::Canceled,
            KeyCode::Enter => return PromptInput::Submitted(self.value()),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return PromptInput::Canceled;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.text.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.text.insert(self.cursor, ch);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.text.remove(self.cursor);
            }
            KeyCode::Delete if self.cursor < self.text.len() => {
                self.text.remove(self.cursor);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.text.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.len(),
            _ => {}
        }
        PromptInput::Editing
    }
}
