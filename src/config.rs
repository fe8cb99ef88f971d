use anyhow::Context;

use crate::filter::DEFAULT_WILDCARD;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://scores.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub wildcard_label: String,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let wildcard_label = lookup("SCORES_WILDCARD_LABEL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WILDCARD.to_string());
        let max_connections = match lookup("SCORES_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("SCORES_MAX_CONNECTIONS must be a number, got {raw:?}"))?,
            None => 1,
        };

        Ok(Self {
            database_url,
            wildcard_label,
            max_connections,
        })
    }
}
