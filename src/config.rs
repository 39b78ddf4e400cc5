use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::quiz::{Difficulty, UnknownDifficulty};

pub const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "CHATGPT_API_KEY"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("{name} must be a positive whole number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("QUIZ_DIFFICULTY: {0}")]
    Difficulty(#[from] UnknownDifficulty),

    #[error("QUIZ_CHUNK_OVERLAP ({overlap}) must be smaller than QUIZ_CHUNK_SIZE ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },
}

/// Everything the session needs from the environment, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub batch_size: usize,
    pub difficulty: Difficulty,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Config {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_BATCH_SIZE: usize = 5;
    pub const DEFAULT_CHUNK_SIZE: usize = 2000;
    pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| get(*name))
            .ok_or(ConfigError::MissingApiKey)?;

        let difficulty = match get("QUIZ_DIFFICULTY") {
            Some(value) => Difficulty::from_str(&value)?,
            None => Difficulty::default(),
        };

        let chunk_size = positive(&get, "QUIZ_CHUNK_SIZE", Self::DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = match get("QUIZ_CHUNK_OVERLAP") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
                name: "QUIZ_CHUNK_OVERLAP",
                value,
            })?,
            None => Self::DEFAULT_CHUNK_OVERLAP.min(chunk_size / 2),
        };
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            });
        }

        Ok(Self {
            api_key,
            model: get("QUIZ_MODEL").unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(positive(&get, "QUIZ_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS as usize)? as u64),
            batch_size: positive(&get, "QUIZ_BATCH_SIZE", Self::DEFAULT_BATCH_SIZE)?,
            difficulty,
            chunk_size,
            chunk_overlap,
        })
    }
}

fn positive(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(value) = get(name) else {
        return Ok(default);
    };
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}
