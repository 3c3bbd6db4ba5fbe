//! Conversation controller
//!
//! Owns the [`ConversationState`] and is the only thing that mutates it. A
//! submission cycle runs `Idle -> Sending -> Idle`: [`ConversationController::submit`]
//! appends the user's message and raises `is_waiting`, and
//! [`ConversationController::settle`] appends exactly one assistant message and
//! lowers it again. Every mutation publishes a snapshot on a watch channel.

use tokio::sync::watch;

use crate::ai::{ChatBackend, ChatRequest};
use crate::error::RequestFailure;
use crate::state::{ConversationState, Message, RenderState, FALLBACK_MESSAGE};

pub struct ConversationController {
    state: ConversationState,
    snapshots: watch::Sender<ConversationState>,
}

impl ConversationController {
    pub fn new(greeting: impl Into<String>) -> Self {
        let state = ConversationState::seeded(greeting);
        let (snapshots, _) = watch::channel(state.clone());
        Self { state, snapshots }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn render_state(&self) -> RenderState {
        self.state.render_state()
    }

    pub fn is_waiting(&self) -> bool {
        self.state.is_waiting
    }

    pub fn pending_input(&self) -> &str {
        &self.state.pending_input
    }

    /// Receiver that sees a fresh snapshot after every mutation
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.snapshots.subscribe()
    }

    /// Edit the pending input. Ignored while a request is in flight.
    pub fn update_input<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut String),
    {
        if self.state.is_waiting {
            return false;
        }
        edit(&mut self.state.pending_input);
        self.publish();
        true
    }

    /// Accept `text` as the next user message.
    ///
    /// Returns the request to send, or `None` when the text is blank or a
    /// request is already in flight. The rejected case changes nothing.
    pub fn submit(&mut self, text: &str) -> Option<ChatRequest> {
        if self.state.is_waiting {
            tracing::debug!("submission ignored, request already in flight");
            return None;
        }
        if text.trim().is_empty() {
            return None;
        }

        self.state.messages.push(Message::user(text));
        self.state.pending_input.clear();
        self.state.is_waiting = true;
        self.publish();

        tracing::info!(messages = self.state.messages.len(), "submitted user message");

        Some(ChatRequest {
            query: text.to_string(),
            chat_history: self.state.messages.clone(),
        })
    }

    /// Submit whatever is in the input box
    pub fn submit_pending(&mut self) -> Option<ChatRequest> {
        let text = self.state.pending_input.clone();
        self.submit(&text)
    }

    /// Close the in-flight span with the backend's outcome.
    ///
    /// Appends the reply, or the fallback message on failure, and clears
    /// `is_waiting`. Returns `false` when nothing was in flight.
    pub fn settle(&mut self, outcome: Result<String, RequestFailure>) -> bool {
        if !self.state.is_waiting {
            tracing::warn!("settle called with no request in flight");
            return false;
        }

        let text = match outcome {
            Ok(reply) => {
                tracing::info!(chars = reply.chars().count(), "received reply");
                reply
            }
            Err(err) => {
                tracing::error!(error = %err, "chat request failed");
                FALLBACK_MESSAGE.to_string()
            }
        };

        self.state.messages.push(Message::ai(text));
        self.state.is_waiting = false;
        self.publish();
        true
    }

    /// Run one whole submission cycle against `backend`.
    ///
    /// Returns the assistant message that ended the cycle, or `None` when the
    /// submission was rejected. Dropping the future mid-request still settles
    /// the conversation with the fallback message.
    pub async fn send<B>(&mut self, backend: &B, text: &str) -> Option<&Message>
    where
        B: ChatBackend + ?Sized,
    {
        let request = self.submit(text)?;
        let span = InFlight {
            controller: &mut *self,
            settled: false,
        };
        let outcome = backend.complete(&request).await;
        span.finish(outcome);
        self.state.messages.last()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.clone());
    }
}

/// Holds `is_waiting` for the duration of one request
struct InFlight<'a> {
    controller: &'a mut ConversationController,
    settled: bool,
}

impl InFlight<'_> {
    fn finish(mut self, outcome: Result<String, RequestFailure>) {
        self.settled = true;
        self.controller.settle(outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.settle(Err(RequestFailure::Interrupted(
                "request dropped before it settled".to_string(),
            )));
        }
    }
}
