pub mod counselor;

pub use counselor::CounselorClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RequestFailure;
use crate::state::Message;

/// Body of a `POST /chat` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub query: String,
    pub chat_history: Vec<Message>,
}

/// Anything that can turn a chat request into a reply
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, RequestFailure>;
}
