use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::VerifierError;
use super::service::ReasoningService;

/// What a [`MockReasoner`] does for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(String),
    /// Never completes; exercises the request timeout.
    Hang,
}

impl MockReply {
    pub fn text(s: impl Into<String>) -> Self {
        MockReply::Text(s.into())
    }
}

type Responder = Box<dyn Fn(&str, usize) -> MockReply + Send + Sync>;

/// Scriptable [`ReasoningService`] that records every prompt.
pub struct MockReasoner {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl std::fmt::Debug for MockReasoner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockReasoner")
            .field("calls", &self.calls())
            .finish()
    }
}

impl MockReasoner {
    /// Replies computed from the prompt and the zero-based call index.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str, usize) -> MockReply + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replies in order; calls past the end of the script fail.
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        let queue = Mutex::new(VecDeque::from(replies));
        Self::from_fn(move |_, _| {
            queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| MockReply::Fail("script exhausted".to_string()))
        })
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl ReasoningService for MockReasoner {
    async fn complete(&self, prompt: &str) -> Result<String, VerifierError> {
        let index = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        match (self.responder)(prompt, index) {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(reason) => Err(VerifierError::Request { reason }),
            MockReply::Hang => Ok(std::future::pending::<String>().await),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
