use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODELS: &str = "gpt-4o,gpt-4o-mini,gpt-3.5-turbo";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
///
/// `openai_api_key` is optional: a missing key only disables
/// the analysis endpoint, which answers 500 until the key is configured.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Ordered fallback list; the first model that yields parseable JSON wins.
    pub openai_models: Vec<String>,
    pub openai_timeout_secs: u64,
    /// Number of candidates evaluated at once. 1 keeps the batch sequential.
    pub shortlist_concurrency: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            supabase_url: require_env("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            openai_models: parse_model_list(
                &std::env::var("OPENAI_MODELS").unwrap_or_else(|_| DEFAULT_OPENAI_MODELS.to_string()),
            ),
            openai_timeout_secs: parse_env("OPENAI_TIMEOUT_SECS", 60)?,
            shortlist_concurrency: parse_env::<usize>("SHORTLIST_CONCURRENCY", 1)?.max(1),
            port: parse_env("PORT", 8080)?,
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

/// Splits a comma-separated model list, dropping blanks. Falls back to the
/// built-in list if nothing usable remains.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();
    if models.is_empty() {
        return parse_model_list(DEFAULT_OPENAI_MODELS);
    }
    models
}
