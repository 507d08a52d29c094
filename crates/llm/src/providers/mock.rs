//! Scripted mock LLM provider for tests and offline development.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use voyager_core::{AppError, AppResult};

/// Mock LLM client returning scripted replies in order.
///
/// When the script runs dry the client echoes the prompt back, which
/// keeps tests readable while still exercising the full request path.
/// The call counter lets tests assert that generation was (or was not)
/// invoked at a given pipeline stage.
#[derive(Debug, Default)]
pub struct MockClient {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
    fail: bool,
}

impl MockClient {
    /// Create a mock client with no scripted replies (echo mode).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scripted reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(reply.into());
        self
    }

    /// Create a mock client that fails every completion, for
    /// exercising the generation-failure path.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of completions performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(AppError::Generation(
                "Mock client configured to fail".to_string(),
            ));
        }

        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| request.prompt.clone());

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let client = MockClient::new().with_reply("first").with_reply("second");
        let request = LlmRequest::new("ignored", "mock-model");

        assert_eq!(client.complete(&request).await.unwrap().content, "first");
        assert_eq!(client.complete(&request).await.unwrap().content, "second");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_echo_when_script_empty() {
        let client = MockClient::new();
        let request = LlmRequest::new("echo me", "mock-model");
        assert_eq!(client.complete(&request).await.unwrap().content, "echo me");
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = MockClient::failing();
        let request = LlmRequest::new("boom", "mock-model");
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
        assert_eq!(client.call_count(), 1);
    }
}
