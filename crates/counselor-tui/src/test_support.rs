//! Test doubles shared by the TUI unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use counselor_core::{ChatBackend, ChatRequest, ConversationController, RequestFailure, DEFAULT_GREETING};

use crate::app::App;

/// Replies with fixed text and counts calls
pub struct ScriptedBackend {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn request_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, RequestFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub struct PanickingBackend;

#[async_trait]
impl ChatBackend for PanickingBackend {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, RequestFailure> {
        panic!("backend blew up");
    }
}

pub fn app_with<B: ChatBackend + 'static>(backend: Arc<B>) -> App {
    App::new(
        ConversationController::new(DEFAULT_GREETING),
        backend,
        "http://localhost:8000",
    )
}
