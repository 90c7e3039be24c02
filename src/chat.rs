use std::time::Duration;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, trace};

use crate::deferred::{Deferred, Poll};
use crate::inputter::{InputEvent, Inputter};

pub const GREETING: &str = "Hi! How can I help you today?";
pub const CANNED_REPLY: &str = "Thanks for your message! Our team will get back to you soon.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub is_user: bool,
}

/// Help assistant panel. Replies are canned and arrive after a delay.
pub struct ChatWindow {
    pub open: bool,
    messages: Vec<ChatMessage>,
    input: Inputter,
    pending: Vec<Deferred<String>>,
    reply_delay: Duration,
    timeout: Duration,
}

impl ChatWindow {
    pub fn new(reply_delay: Duration, timeout: Duration) -> Self {
        Self {
            open: false,
            messages: vec![ChatMessage {
                text: GREETING.to_string(),
                is_user: false,
            }],
            input: Inputter::default(),
            pending: Vec::new(),
            reply_delay,
            timeout,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &Inputter {
        &self.input
    }

    pub fn is_waiting(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open = true;
        }
    }

    /// Closing drops every reply that has not arrived yet.
    pub fn close(&mut self) {
        self.open = false;
        for op in self.pending.iter_mut() {
            op.cancel();
        }
        self.pending.clear();
    }

    /// Returns false when Esc asked to leave the panel.
    pub fn read(&mut self, key: KeyEvent) -> bool {
        match self.input.read(key) {
            InputEvent::Submitted => {
                self.send();
                true
            }
            InputEvent::Canceled => false,
            _ => true,
        }
    }

    /// Whitespace-only input is ignored.
    pub fn send(&mut self) -> bool {
        if self.input.is_blank() {
            return false;
        }
        let text = self.input.value().to_string();
        self.input.clear();
        trace!("Chat message \"{}\"", text);
        self.messages.push(ChatMessage {
            text,
            is_user: true,
        });
        self.pending.push(Deferred::after(
            self.reply_delay,
            self.timeout,
            CANNED_REPLY.to_string(),
        ));
        true
    }

    /// Collects replies that arrived. Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        let mut arrived = Vec::new();
        self.pending.retain_mut(|op| match op.poll() {
            Poll::Pending => true,
            Poll::Ready(text) => {
                arrived.push(text);
                false
            }
            other => {
                debug!("Chat reply dropped: {:?}", other);
                changed = true;
                false
            }
        });
        for text in arrived {
            self.messages.push(ChatMessage {
                text,
                is_user: false,
            });
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use std::thread;
    use std::time::Instant;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn say(chat: &mut ChatWindow, s: &str) {
        for c in s.chars() {
            chat.read(key(KeyCode::Char(c)));
        }
        chat.read(key(KeyCode::Enter));
    }

    #[test]
    fn starts_with_greeting() {
        let chat = ChatWindow::new(Duration::from_millis(10), Duration::from_secs(5));
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].text, GREETING);
        assert!(!chat.messages()[0].is_user);
    }

    #[test]
    fn whitespace_is_not_sent() {
        let mut chat = ChatWindow::new(Duration::from_millis(10), Duration::from_secs(5));
        say(&mut chat, "   ");
        assert_eq!(chat.messages().len(), 1);
        assert!(!chat.is_waiting());
    }

    #[test]
    fn reply_arrives_after_delay() {
        let mut chat = ChatWindow::new(Duration::from_millis(20), Duration::from_secs(5));
        say(&mut chat, "hello");
        assert_eq!(chat.messages().last().map(|m| m.is_user), Some(true));
        assert!(chat.input().value().is_empty());

        let deadline = Instant::now() + Duration::from_secs(5);
        while chat.is_waiting() && Instant::now() < deadline {
            chat.tick();
            thread::sleep(Duration::from_millis(5));
        }
        let last = chat.messages().last().unwrap();
        assert_eq!(last.text, CANNED_REPLY);
        assert!(!last.is_user);
    }

    #[test]
    fn closing_cancels_pending_replies() {
        let mut chat = ChatWindow::new(Duration::from_secs(5), Duration::from_secs(10));
        chat.toggle();
        say(&mut chat, "hello");
        assert!(chat.is_waiting());
        chat.toggle();
        assert!(!chat.open);
        assert!(!chat.is_waiting());
        assert_eq!(chat.messages().len(), 2);
    }

    #[test]
    fn escape_leaves_the_panel() {
        let mut chat = ChatWindow::new(Duration::from_millis(10), Duration::from_secs(5));
        assert!(!chat.read(key(KeyCode::Esc)));
    }
}
