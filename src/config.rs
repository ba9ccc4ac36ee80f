// Application configuration, read from the environment.

use crate::core::moderation::SpamScoringConfig;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/moderation.db";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub scoring: SpamScoringConfig,
}

impl AppConfig {
    /// Read the process environment. `main` loads `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset keys use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SpamScoringConfig::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let scoring = SpamScoringConfig {
            keyword_weight: weight(&lookup, "SPAM_KEYWORD_WEIGHT", defaults.keyword_weight)?,
            pattern_weight: weight(&lookup, "SPAM_PATTERN_WEIGHT", defaults.pattern_weight)?,
            heuristic_weight: weight(&lookup, "SPAM_HEURISTIC_WEIGHT", defaults.heuristic_weight)?,
            spam_threshold: threshold(&lookup, "SPAM_THRESHOLD", defaults.spam_threshold)?,
        };

        Ok(Self {
            database_url,
            scoring,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<(T, String)>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(|value| Some((value, raw.clone())))
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn weight<F>(lookup: &F, key: &str, default: f64) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<F, f64>(lookup, key)? {
        None => Ok(default),
        Some((value, _)) if value.is_finite() && value >= 0.0 => Ok(value),
        Some((_, raw)) => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn threshold<F>(lookup: &F, key: &str, default: u8) -> Result<u8, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<F, u8>(lookup, key)? {
        None => Ok(default),
        Some((value, _)) if value <= 100 => Ok(value),
        Some((_, raw)) => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}
