use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::analysis::analyzer::SingleAnalyzer;
use crate::analysis::batch::{BatchOrchestrator, BatchPolicy};
use crate::analysis::client::AnalysisClient;
use crate::config::Config;
use crate::llm_client::ReasoningService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Reasoning oracle. Gemini in production, a stub in tests.
    pub reasoning: Arc<dyn ReasoningService>,
    pub analyzer: Arc<SingleAnalyzer>,
    pub batch: Arc<BatchOrchestrator>,
    /// Cancelled on server shutdown; batch runs use child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, reasoning: Arc<dyn ReasoningService>) -> Self {
        let client = AnalysisClient::new(
            reasoning.clone(),
            config.llm_timeout,
            config.accept_threshold,
        );
        let analyzer = Arc::new(SingleAnalyzer::new(client));
        let batch = Arc::new(BatchOrchestrator::new(
            analyzer.clone(),
            BatchPolicy {
                concurrency: config.batch_concurrency,
                max_retries: config.batch_max_retries,
                ..BatchPolicy::default()
            },
        ));

        Self {
            config,
            reasoning,
            analyzer,
            batch,
            shutdown: CancellationToken::new(),
        }
    }
}
