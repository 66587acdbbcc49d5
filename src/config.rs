use anyhow::{Context, Result};

use crate::{allocator::DEFAULT_MAX_ATTEMPTS, shortid};

/// `DATABASE_URL` value that selects the non-durable link store.
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string, e.g. "sqlite:./data/shortlist.db", or
    /// "memory" to keep short links in process memory only.
    pub database_url: String,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL prepended to short ids, e.g. "https://go.example.com".
    /// Never has a trailing slash.
    pub base_url: String,

    /// Length of generated short ids
    pub short_id_length: usize,

    /// Candidates the allocator may draw before giving up
    pub max_attempts: usize,

    /// Fixed RNG seed for reproducible short ids (tests, demos)
    pub rng_seed: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = var("PORT")
            .unwrap_or_else(|| "8000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let base_url = var("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        let short_id_length = var("SHORT_ID_LENGTH")
            .unwrap_or_else(|| shortid::DEFAULT_LENGTH.to_string())
            .parse::<usize>()
            .context("SHORT_ID_LENGTH must be a positive integer")?;
        if !(1..=shortid::MAX_LENGTH).contains(&short_id_length) {
            anyhow::bail!(
                "SHORT_ID_LENGTH must be between 1 and {}, got {}",
                shortid::MAX_LENGTH,
                short_id_length
            );
        }

        let max_attempts = var("SHORT_ID_MAX_ATTEMPTS")
            .unwrap_or_else(|| DEFAULT_MAX_ATTEMPTS.to_string())
            .parse::<usize>()
            .context("SHORT_ID_MAX_ATTEMPTS must be a positive integer")?;
        if max_attempts == 0 {
            anyhow::bail!("SHORT_ID_MAX_ATTEMPTS must be at least 1");
        }

        let rng_seed = var("SHORT_ID_SEED")
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("SHORT_ID_SEED must be an unsigned integer")?;

        Ok(Self {
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:./data/shortlist.db".into()),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            base_url,
            short_id_length,
            max_attempts,
            rng_seed,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public URL for a short id.
    pub fn short_url(&self, short_id: &str) -> String {
        format!("{}/{}", self.base_url, short_id)
    }
}
