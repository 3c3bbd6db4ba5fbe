use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ChatBackend, ChatRequest};
use crate::error::RequestFailure;

#[derive(Deserialize)]
struct CounselorResponse {
    response: String,
}

/// HTTP client for the counselor backend's `/chat` endpoint
#[derive(Clone)]
pub struct CounselorClient {
    client: Client,
    base_url: String,
}

impl CounselorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Client whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RequestFailure> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for CounselorClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, RequestFailure> {
        let url = self.chat_url();
        tracing::debug!(%url, history = request.chat_history.len(), "posting chat request");

        // `.json()` sets `Content-Type: application/json`
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(RequestFailure::Status(response.status()));
        }

        let body = response.bytes().await?;
        let parsed: CounselorResponse = serde_json::from_slice(&body)?;
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let client = CounselorClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.chat_url(), "http://localhost:8000/chat");
    }
}
