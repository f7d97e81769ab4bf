use std::env;
use std::path::PathBuf;

use anyhow::Context;

/// Runtime settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub policy_path: Option<PathBuf>,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let policy_path = env::var("BANTUAN_POLICY")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_level = env::var("BANTUAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            policy_path,
            log_level,
        }
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}
