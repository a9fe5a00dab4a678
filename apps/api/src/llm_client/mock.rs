use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{LlmError, ReasoningService};

type Responder = dyn Fn(&str, usize) -> Result<String, LlmError> + Send + Sync;
type Delay = dyn Fn(&str) -> Duration + Send + Sync;

/// Scripted reasoning service for tests. The responder receives the prompt
/// and the zero-based call number.
pub struct MockReasoningService {
    responder: Box<Responder>,
    delay: Box<Delay>,
    calls: AtomicUsize,
}

impl MockReasoningService {
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str, usize) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: Box::new(|_| Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with the same body.
    pub fn fixed(body: &str) -> Self {
        let body = body.to_string();
        Self::from_fn(move |_, _| Ok(body.clone()))
    }

    /// Always fails with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self::from_fn(move |_, _| {
            Err(LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            })
        })
    }

    pub fn with_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.delay = Box::new(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for MockReasoningService {
    async fn infer(&self, prompt: &str) -> Result<String, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = (self.delay)(prompt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(prompt, call)
    }
}
