//! UI-agnostic conversation state types
//!
//! This module contains the data structures shared between front ends (the
//! terminal UI, the headless `ask` command) and the derived view state they
//! render from. Nothing here depends on a UI framework.

use serde::{Deserialize, Serialize};

/// Greeting seeded into every new conversation
pub const DEFAULT_GREETING: &str =
    "Hello! I am an AI assistant here to help you with feelings of eco-anxiety. How are you feeling today?";

/// Text appended in place of a reply when the backend request fails
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I seem to be having trouble connecting. Please try again later.";

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Ai,
        }
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// Everything the controller owns for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub pending_input: String,
    pub is_waiting: bool,
}

impl ConversationState {
    /// Fresh session state holding only the assistant greeting
    pub fn seeded(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::ai(greeting)],
            pending_input: String::new(),
            is_waiting: false,
        }
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            input_disabled: self.is_waiting,
            send_button_label: if self.is_waiting { "..." } else { "Send" },
            show_typing_indicator: self.is_waiting,
            scroll_target: ScrollTarget {
                entries: self.messages.len(),
                typing: self.is_waiting,
            },
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::seeded(DEFAULT_GREETING)
    }
}

/// View state derived from a [`ConversationState`]; never mutated on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub input_disabled: bool,
    pub send_button_label: &'static str,
    pub show_typing_indicator: bool,
    pub scroll_target: ScrollTarget,
}

/// The bottom of the message list.
///
/// Two targets compare unequal whenever the message count or the typing
/// indicator differ, so a view can snap to the bottom on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollTarget {
    pub entries: usize,
    pub typing: bool,
}

impl ScrollTarget {
    /// Rows in the list, counting the typing indicator
    pub fn rows(&self) -> usize {
        self.entries + usize::from(self.typing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_state_has_single_greeting() {
        let state = ConversationState::default();
        assert_eq!(state.messages, vec![Message::ai(DEFAULT_GREETING)]);
        assert!(state.pending_input.is_empty());
        assert!(!state.is_waiting);
    }

    #[test]
    fn render_state_follows_waiting_flag() {
        let mut state = ConversationState::seeded("hi");
        let idle = state.render_state();
        assert!(!idle.input_disabled);
        assert!(!idle.show_typing_indicator);
        assert_eq!(idle.send_button_label, "Send");

        state.is_waiting = true;
        let busy = state.render_state();
        assert!(busy.input_disabled);
        assert!(busy.show_typing_indicator);
        assert_eq!(busy.send_button_label, "...");
        assert_ne!(idle.scroll_target, busy.scroll_target);
        assert_eq!(busy.scroll_target.rows(), 2);
    }

    #[test]
    fn scroll_target_moves_when_reply_replaces_indicator() {
        let mut state = ConversationState::seeded("hi");
        state.messages.push(Message::user("hello"));
        state.is_waiting = true;
        let waiting = state.render_state().scroll_target;

        state.messages.push(Message::ai("there"));
        state.is_waiting = false;
        let settled = state.render_state().scroll_target;

        assert_eq!(waiting.rows(), settled.rows());
        assert_ne!(waiting, settled);
    }

    #[test]
    fn message_serializes_with_lowercase_sender() {
        let json = serde_json::to_value(Message::ai("hey")).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "hey", "sender": "ai" }));

        let parsed: Message =
            serde_json::from_str(r#"{"text":"yo","sender":"user"}"#).unwrap();
        assert_eq!(parsed, Message::user("yo"));
    }
}
