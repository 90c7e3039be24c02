use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// What a single key did to the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Changed,
    Moved,
    Submitted,
    Canceled,
    Ignored,
}

/// Single line text input used for cell edits, search, chat and form fields.
#[derive(Debug, Default, Clone)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize, // in chars, not bytes
}

impl Inputter {
    pub fn with_value(s: &str) -> Self {
        let mut input = Self::default();
        input.set(s);
        input
    }

    pub fn read(&mut self, key: KeyEvent) -> InputEvent {
        let event = match key.code {
            KeyCode::Enter => InputEvent::Submitted,
            KeyCode::Esc => InputEvent::Canceled,
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => {
                self.curser_pos = 0;
                InputEvent::Moved
            }
            KeyCode::End => {
                self.curser_pos = self.len();
                InputEvent::Moved
            }
            KeyCode::Char(chr) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert(chr)
            }
            _ => InputEvent::Ignored,
        };
        trace!("Input {:?} => {:?} \"{}\"", key.code, event, self.current_input);
        event
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = self.len();
    }

    pub fn value(&self) -> &str {
        &self.current_input
    }

    pub fn cursor(&self) -> usize {
        self.curser_pos
    }

    pub fn masked(&self) -> String {
        "•".repeat(self.len())
    }

    pub fn is_blank(&self) -> bool {
        self.current_input.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn backspace(&mut self) -> InputEvent {
        if self.curser_pos == 0 {
            return InputEvent::Ignored;
        }
        self.curser_pos -= 1;
        let at = self.bytepos();
        self.current_input.remove(at);
        InputEvent::Changed
    }

    fn delete(&mut self) -> InputEvent {
        if self.curser_pos >= self.len() {
            return InputEvent::Ignored;
        }
        let at = self.bytepos();
        self.current_input.remove(at);
        InputEvent::Changed
    }

    fn left(&mut self) -> InputEvent {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        InputEvent::Moved
    }

    fn right(&mut self) -> InputEvent {
        if self.curser_pos < self.len() {
            self.curser_pos += 1;
        }
        InputEvent::Moved
    }

    fn insert(&mut self, chr: char) -> InputEvent {
        let at = self.bytepos();
        self.current_input.insert(at, chr);
        self.curser_pos += 1;
        InputEvent::Changed
    }

    fn bytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
