use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, TSConfig, TSError};
use crate::model::{Model, Modus};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TSConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Waits for one terminal event. Without input the model gets a tick so
    /// pending operations are polled.
    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TSError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(Some(Message::Tick));
        }
        match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                Ok(self.handle_key(model, key))
            }
            Event::Resize(width, height) => {
                Ok(Some(Message::Resize(width as usize, height as usize)))
            }
            _ => Ok(None),
        }
    }

    fn handle_key(&self, model: &Model, key: KeyEvent) -> Option<Message> {
        let message = if key.modifiers.contains(KeyModifiers::CONTROL)
            && key.code == KeyCode::Char('c')
        {
            Some(Message::Quit)
        } else if model.raw_keyevents() {
            Some(Message::RawKey(key))
        } else if model.modus() == Modus::POPUP {
            Self::popup_key(key)
        } else {
            Self::table_key(key)
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn popup_key(key: KeyEvent) -> Option<Message> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Message::Exit),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Char('?') => Some(Message::Help),
            _ => None,
        }
    }

    fn table_key(key: KeyEvent) -> Option<Message> {
        match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::MoveBeginning),
            KeyCode::End | KeyCode::Char('G') => Some(Message::MoveEnd),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('e') => Some(Message::EditCell),
            KeyCode::Char('/') => Some(Message::Search),
            KeyCode::Char('f') => Some(Message::CycleFilter),
            KeyCode::Char('c') => Some(Message::ClearSearch),
            KeyCode::Char('v') => Some(Message::ViewRow),
            KeyCode::Char('d') => Some(Message::DeleteRow),
            KeyCode::Char('1') => Some(Message::ShowDashboard),
            KeyCode::Char('2') => Some(Message::ShowUpload),
            KeyCode::Char('3') | KeyCode::Char('V') => Some(Message::ShowValidate),
            KeyCode::Char('o') => Some(Message::SelectFile),
            KeyCode::Char('s') => Some(Message::SubmitUpload),
            KeyCode::Char('x') => Some(Message::ExportReport),
            KeyCode::Char('C') => Some(Message::ToggleChat),
            KeyCode::Char('L') => Some(Message::Logout),
            _ => None,
        }
    }
}
