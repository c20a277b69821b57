use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use shinbun_core::{DigestClient, DigestError, PromptBundle};

/// Pre-programmed completion outcome.
#[derive(Clone, Debug)]
pub enum MockResponse {
    Text(String),
    Error(DigestError),
}

impl MockResponse {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Digest client that replays scripted responses in order and records
/// every prompt it was given.
pub struct MockDigestClient {
    responses: Mutex<VecDeque<MockResponse>>,
    prompts: Mutex<Vec<PromptBundle>>,
    call_count: AtomicUsize,
}

impl MockDigestClient {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn prompts(&self) -> Vec<PromptBundle> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl DigestClient for MockDigestClient {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &PromptBundle) -> Result<String, DigestError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.prompts.lock().push(prompt.clone());

        match self.responses.lock().pop_front() {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Error(e)) => Err(e),
            None => Err(DigestError::InvalidRequest(format!(
                "MockDigestClient: no response configured for call {idx}"
            ))),
        }
    }
}
