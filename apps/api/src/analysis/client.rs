//! Analysis Client: the trust boundary around the reasoning service.
//!
//! One bounded attempt per call. A timeout is reported exactly like any
//! other service failure; whatever comes back is validated by
//! [`parse_verdict`] before it becomes a `Verdict`.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::analysis::prompts::AnalysisRequest;
use crate::analysis::verdict::{parse_verdict, ErrorVerdict, Verdict};
use crate::llm_client::{LlmError, ReasoningService};

#[derive(Clone)]
pub struct AnalysisClient {
    service: Arc<dyn ReasoningService>,
    timeout: Duration,
    accept_threshold: u8,
}

impl AnalysisClient {
    pub fn new(service: Arc<dyn ReasoningService>, timeout: Duration, accept_threshold: u8) -> Self {
        Self {
            service,
            timeout,
            accept_threshold,
        }
    }

    pub async fn invoke(&self, request: &AnalysisRequest) -> Result<Verdict, ErrorVerdict> {
        let raw = match tokio::time::timeout(self.timeout, self.service.infer(request.prompt())).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("Reasoning service call failed: {e}");
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Reasoning service call timed out");
                return Err(LlmError::Timeout(self.timeout).into());
            }
        };

        parse_verdict(&raw, self.accept_threshold).map_err(|e| {
            warn!(response_chars = raw.len(), "Rejected reasoning service response: {}", e.detail);
            e
        })
    }
}
