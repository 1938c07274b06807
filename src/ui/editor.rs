use super::input_metrics::{clamp_to_char_boundary_left, next_char_boundary, prev_char_boundary};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    Home,
    End,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Changed,
    /// Enter pressed on non-blank input. The buffer is kept until
    /// [`InputEditor::commit`] is called.
    Submit(String),
    Quit,
    Scroll(ScrollAction),
}

/// Single-line composer with submission history recall.
#[derive(Default, Debug)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    history_stash: Option<String>,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn insert_str(&mut self, value: &str) {
        // Newlines are not part of a single-line message.
        let value: String = value
            .chars()
            .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
            .collect();
        self.history_index = None;
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.insert_str(cursor, &value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) -> bool {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return false;
        }
        let start = prev_char_boundary(&self.buffer, end);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
        true
    }

    pub fn delete(&mut self) -> bool {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return false;
        }
        let end = next_char_boundary(&self.buffer, start);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
        true
    }

    /// Records the current buffer in history and clears it.
    pub fn commit(&mut self) {
        let value = std::mem::take(&mut self.buffer);
        if !value.trim().is_empty() && self.history.last() != Some(&value) {
            self.history.push(value);
        }
        self.cursor = 0;
        self.history_index = None;
        self.history_stash = None;
    }

    pub fn history_up(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        if self.history_index.is_none() {
            self.history_stash = Some(self.buffer.clone());
        }
        let next_index = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_index = Some(next_index);
        self.set_buffer(self.history[next_index].clone());
        true
    }

    pub fn history_down(&mut self) -> bool {
        let Some(idx) = self.history_index else {
            return false;
        };
        if idx + 1 >= self.history.len() {
            self.history_index = None;
            let stash = self.history_stash.take().unwrap_or_default();
            self.set_buffer(stash);
        } else {
            self.history_index = Some(idx + 1);
            self.set_buffer(self.history[idx + 1].clone());
        }
        true
    }

    pub fn apply_event(&mut self, event: Event) -> EditorAction {
        match event {
            Event::Paste(text) if !text.is_empty() => {
                self.insert_str(&text);
                EditorAction::Changed
            }
            Event::Key(key) if key.kind != KeyEventKind::Release => self.apply_key(key),
            _ => EditorAction::None,
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> EditorAction {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        let changed = match key.code {
            KeyCode::Char('c') if control => return EditorAction::Quit,
            KeyCode::Esc => return EditorAction::Quit,
            KeyCode::Enter => {
                let value = self.buffer.trim();
                if value.is_empty() {
                    return EditorAction::None;
                }
                return EditorAction::Submit(value.to_string());
            }
            KeyCode::PageUp => return EditorAction::Scroll(ScrollAction::PageUp),
            KeyCode::PageDown => return EditorAction::Scroll(ScrollAction::PageDown),
            KeyCode::Home if control => return EditorAction::Scroll(ScrollAction::Home),
            KeyCode::End if control => return EditorAction::Scroll(ScrollAction::End),
            KeyCode::Up if control => return EditorAction::Scroll(ScrollAction::LineUp),
            KeyCode::Down if control => return EditorAction::Scroll(ScrollAction::LineDown),
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_to(prev_char_boundary(&self.buffer, self.cursor)),
            KeyCode::Right => self.move_to(next_char_boundary(&self.buffer, self.cursor)),
            KeyCode::Home => self.move_to(0),
            KeyCode::End => self.move_to(self.buffer.len()),
            KeyCode::Char('u') if control => {
                self.set_buffer(String::new());
                true
            }
            KeyCode::Char(ch) if !control && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.insert_str(ch.encode_utf8(&mut [0; 4]));
                true
            }
            _ => false,
        };

        if changed {
            EditorAction::Changed
        } else {
            EditorAction::None
        }
    }

    fn move_to(&mut self, cursor: usize) -> bool {
        let cursor = clamp_to_char_boundary_left(&self.buffer, cursor);
        let moved = cursor != self.cursor;
        self.cursor = cursor;
        moved
    }

    fn set_buffer(&mut self, buffer: String) {
        self.buffer = buffer;
        self.cursor = self.buffer.len();
    }
}
