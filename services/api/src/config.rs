//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use rand::RngCore;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    /// Key for signing session cookies. Falls back to a random per-process
    /// value when unset, in which case sessions do not survive restarts.
    pub secret_key: String,
    pub hf_api_token: Option<String>,
    pub emotion_model: String,
    pub explain_features: usize,
    pub explain_samples: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Music Provider Credentials ---
        let spotify_client_id = std::env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| ConfigError::MissingVar("SPOTIFY_CLIENT_ID".to_string()))?;
        let spotify_client_secret = std::env::var("SPOTIFY_CLIENT_SECRET")
            .map_err(|_| ConfigError::MissingVar("SPOTIFY_CLIENT_SECRET".to_string()))?;
        let spotify_redirect_uri = std::env::var("SPOTIFY_REDIRECT_URI")
            .map_err(|_| ConfigError::MissingVar("SPOTIFY_REDIRECT_URI".to_string()))?;

        let secret_key =
            std::env::var("SECRET_KEY").unwrap_or_else(|_| Self::random_secret_key());

        // --- Load Classifier and Explainer Settings ---
        let hf_api_token = std::env::var("HF_API_TOKEN").ok();
        let emotion_model = std::env::var("EMOTION_MODEL")
            .unwrap_or_else(|_| "bhadresh-savani/distilbert-base-uncased-emotion".to_string());

        let explain_features = Self::parse_usize("EXPLAIN_FEATURES", 5)?;
        let explain_samples = Self::parse_usize("EXPLAIN_SAMPLES", 200)?;

        Ok(Self {
            bind_address,
            log_level,
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            secret_key,
            hf_api_token,
            emotion_model,
            explain_features,
            explain_samples,
        })
    }

    fn parse_usize(var: &str, default: usize) -> Result<usize, ConfigError> {
        match std::env::var(var) {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string())),
            Err(_) => Ok(default),
        }
    }

    fn random_secret_key() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
