//! Batch Orchestrator: many resumes against one job description.
//!
//! Items run on a bounded, order-preserving stream (`buffered`), so output
//! position always equals submission position. A failed item is recorded in
//! place as an `ErrorVerdict` and counted in `skipped`; it never aborts its
//! siblings. Only `ServiceError` outcomes are retried, with exponential
//! backoff. Cancellation stops new items from starting and abandons in-flight
//! calls; both are recorded as `Cancelled`.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::analyzer::SingleAnalyzer;
use crate::analysis::verdict::{ErrorKind, ErrorVerdict, Verdict};
use crate::errors::AppError;
use crate::extraction::RawDocument;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub concurrency: usize,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_retries: 1,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl BatchPolicy {
    /// Backoff before retry number `attempt` (zero-based): 1s, 2s, 4s...
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .checked_mul(2u32.saturating_pow(attempt))
            .map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
    }
}

/// One submitted position: a loaded document, or the fault that kept it
/// from loading.
#[derive(Debug, Clone)]
pub enum BatchInput {
    Loaded(RawDocument),
    Unloadable { filename: String, error: ErrorVerdict },
}

impl BatchInput {
    pub fn filename(&self) -> &str {
        match self {
            BatchInput::Loaded(document) => &document.filename,
            BatchInput::Unloadable { filename, .. } => filename,
        }
    }
}

impl From<RawDocument> for BatchInput {
    fn from(document: RawDocument) -> Self {
        BatchInput::Loaded(document)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Analyzed(Verdict),
    Failed(ErrorVerdict),
}

impl From<Result<Verdict, ErrorVerdict>> for ItemOutcome {
    fn from(result: Result<Verdict, ErrorVerdict>) -> Self {
        match result {
            Ok(verdict) => ItemOutcome::Analyzed(verdict),
            Err(err) => ItemOutcome::Failed(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    /// Zero-based submission position.
    pub position: usize,
    pub filename: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub items: Vec<BatchItem>,
    pub analyzed: usize,
    pub skipped: usize,
}

impl BatchResult {
    fn new(items: Vec<BatchItem>) -> Self {
        let analyzed = items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Analyzed(_)))
            .count();
        let skipped = items.len() - analyzed;
        Self {
            items,
            analyzed,
            skipped,
        }
    }
}

pub struct BatchOrchestrator {
    analyzer: Arc<SingleAnalyzer>,
    policy: BatchPolicy,
}

impl BatchOrchestrator {
    pub fn new(analyzer: Arc<SingleAnalyzer>, policy: BatchPolicy) -> Self {
        let policy = BatchPolicy {
            concurrency: policy.concurrency.max(1),
            ..policy
        };
        Self { analyzer, policy }
    }

    pub async fn analyze_batch<D: Into<BatchInput>>(
        &self,
        documents: Vec<D>,
        job_text: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, AppError> {
        if job_text.trim().is_empty() {
            return Err(AppError::Validation("job_text cannot be empty".to_string()));
        }

        let batch_id = Uuid::new_v4();
        info!(
            %batch_id,
            documents = documents.len(),
            concurrency = self.policy.concurrency,
            "Starting batch analysis"
        );

        let items: Vec<BatchItem> = stream::iter(documents.into_iter().map(Into::into).enumerate())
            .map(|(position, input)| self.run_item(batch_id, position, input, job_text, cancel))
            .buffered(self.policy.concurrency)
            .collect()
            .await;

        let result = BatchResult::new(items);
        if result.skipped > 0 {
            warn!(
                %batch_id,
                skipped = result.skipped,
                "Batch finished with failed items"
            );
        }
        info!(%batch_id, analyzed = result.analyzed, "Batch analysis finished");

        Ok(result)
    }

    async fn run_item(
        &self,
        batch_id: Uuid,
        position: usize,
        input: BatchInput,
        job_text: &str,
        cancel: &CancellationToken,
    ) -> BatchItem {
        let filename = input.filename().to_string();

        let outcome = if let BatchInput::Unloadable { error, .. } = input {
            Err(error)
        } else if cancel.is_cancelled() {
            Err(ErrorVerdict::cancelled("batch cancelled before item started"))
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    Err(ErrorVerdict::cancelled("batch cancelled while item was in flight"))
                }
                outcome = self.analyze_with_retry(input, job_text) => outcome,
            }
        };

        if let Err(e) = &outcome {
            warn!(
                %batch_id,
                position,
                filename = %filename,
                kind = %e.kind,
                "Error analyzing {filename}: {}",
                e.detail
            );
        }

        BatchItem {
            position,
            filename,
            outcome: outcome.into(),
        }
    }

    async fn analyze_with_retry(
        &self,
        input: BatchInput,
        job_text: &str,
    ) -> Result<Verdict, ErrorVerdict> {
        let document = match input {
            BatchInput::Loaded(document) => document,
            BatchInput::Unloadable { error, .. } => return Err(error),
        };
        let request = self.analyzer.prepare(document, job_text).await?;

        let mut attempt = 0;
        loop {
            match self.analyzer.client().invoke(&request).await {
                Err(e) if e.kind == ErrorKind::ServiceError && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        "Analysis attempt failed, retrying after {}ms...",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }
}
