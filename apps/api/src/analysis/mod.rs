// Resume-vs-job analysis pipeline.
// Extractor -> prompt builder -> analysis client, once per resume or over a batch.
// All reasoning-service calls go through llm_client.

pub mod analyzer;
pub mod batch;
pub mod client;
pub mod handlers;
pub mod prompts;
pub mod verdict;
