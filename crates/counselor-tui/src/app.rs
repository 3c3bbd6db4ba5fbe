use std::sync::Arc;

use counselor_core::{
    ChatBackend, ConversationController, ConversationState, RequestFailure, ScrollTarget,
};
use ratatui::layout::Rect;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

/// Fallback height used before the first frame reports the real one
const DEFAULT_CHAT_HEIGHT: u16 = 20;

pub type RequestTask = JoinHandle<Result<String, RequestFailure>>;

pub struct App {
    pub should_quit: bool,
    pub controller: ConversationController,
    pub backend: Arc<dyn ChatBackend>,
    pub api_url: String,

    // Input state
    pub input_cursor: usize, // cursor position in chars

    // Chat view state
    pub view: watch::Receiver<ConversationState>, // snapshots the UI renders from
    pub chat_scroll: u16,
    pub chat_height: u16,        // inner height of the chat pane
    pub chat_content_lines: u16, // wrapped height of the chat text, measured by `ui`
    pub animation_frame: u8,     // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub button_area: Option<Rect>,

    in_flight: Option<RequestTask>,
    followed_target: Option<ScrollTarget>,
}

impl App {
    pub fn new(
        controller: ConversationController,
        backend: Arc<dyn ChatBackend>,
        api_url: impl Into<String>,
    ) -> Self {
        let view = controller.subscribe();
        Self {
            should_quit: false,
            controller,
            backend,
            api_url: api_url.into(),
            input_cursor: 0,
            view,
            chat_scroll: 0,
            chat_height: 0,
            chat_content_lines: 0,
            animation_frame: 0,
            chat_area: None,
            button_area: None,
            in_flight: None,
            followed_target: None,
        }
    }

    /// Submit the input box. Spawns the backend request when accepted.
    pub fn submit(&mut self) -> bool {
        let Some(request) = self.controller.submit_pending() else {
            return false;
        };
        self.input_cursor = 0;

        let backend = Arc::clone(&self.backend);
        self.in_flight = Some(tokio::spawn(async move { backend.complete(&request).await }));
        true
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Resolves when the in-flight request finishes; pending forever when idle
    pub async fn wait_in_flight(&mut self) -> Result<Result<String, RequestFailure>, JoinError> {
        match self.in_flight.as_mut() {
            Some(task) => task.await,
            None => std::future::pending().await,
        }
    }

    /// Hand a finished request to the controller
    pub fn finish_request(&mut self, joined: Result<Result<String, RequestFailure>, JoinError>) {
        self.in_flight = None;
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(err) => Err(RequestFailure::Interrupted(err.to_string())),
        };
        self.controller.settle(outcome);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing. The controller drops edits while a request is in flight.

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.input_cursor;
        if self.controller.update_input(|input| {
            let byte_pos = char_to_byte_index(input, cursor);
            input.insert(byte_pos, c);
        }) {
            self.input_cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let cursor = self.input_cursor - 1;
        if self.controller.update_input(|input| {
            let byte_pos = char_to_byte_index(input, cursor);
            input.remove(byte_pos);
        }) {
            self.input_cursor = cursor;
        }
    }

    pub fn delete(&mut self) {
        let cursor = self.input_cursor;
        if cursor >= self.input_len() {
            return;
        }
        self.controller.update_input(|input| {
            let byte_pos = char_to_byte_index(input, cursor);
            input.remove(byte_pos);
        });
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.input_cursor = (self.input_cursor + 1).min(self.input_len());
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input_len();
    }

    fn input_len(&self) -> usize {
        self.controller.pending_input().chars().count()
    }

    // Chat scrolling

    /// Snap to the bottom when the latest snapshot's scroll target moved
    pub fn follow_scroll_target(&mut self) {
        let target = self.view.borrow_and_update().render_state().scroll_target;
        if self.followed_target != Some(target) {
            self.followed_target = Some(target);
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_height() / 2).max(1)
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            DEFAULT_CHAT_HEIGHT
        }
    }

    fn max_scroll(&self) -> u16 {
        self.chat_content_lines.saturating_sub(self.visible_height())
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
