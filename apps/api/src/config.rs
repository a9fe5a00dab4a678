use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_MODEL: &str = "gemini-flash-latest";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub llm_timeout: Duration,
    /// Score at or above which a candidate is Accepted.
    pub accept_threshold: u8,
    pub batch_concurrency: usize,
    pub batch_max_retries: u32,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let accept_threshold: u8 = parse_env("ACCEPT_THRESHOLD", 70)?;
        if accept_threshold > 100 {
            bail!("ACCEPT_THRESHOLD must be between 0 and 100, got {accept_threshold}");
        }

        let batch_concurrency: usize = parse_env("BATCH_CONCURRENCY", 4)?;
        if batch_concurrency == 0 {
            bail!("BATCH_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            llm_timeout: parse_timeout("LLM_TIMEOUT_SECS", 60)?,
            accept_threshold,
            batch_concurrency,
            batch_max_retries: parse_env("BATCH_MAX_RETRIES", 1)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Whole seconds, at least one.
fn parse_timeout(key: &str, default_secs: u64) -> Result<Duration> {
    let secs: u64 = parse_env(key, default_secs)?;
    if secs == 0 {
        bail!("{key} must be at least 1 second");
    }
    Ok(Duration::from_secs(secs))
}
