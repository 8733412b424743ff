//! Configuration for the voice PIN gateway.

use crate::flow::{CaptureSettings, FlowSettings, Prompts};
use crate::janitor::JanitorConfig;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// API key authentication
    pub auth: AuthConfig,

    /// Merchant client configuration
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// PIN capture settings
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Retry policy
    #[serde(default)]
    pub flow: FlowSettings,

    /// Session registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Session janitor configuration
    #[serde(default)]
    pub janitor: JanitorConfig,

    /// Caller-facing messages
    #[serde(default)]
    pub prompts: Prompts,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Key expected in the `x-api-key` header
    pub api_key: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// Merchant request timeout
    #[serde(default = "default_verifier_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    /// Refuse a new session while the phone has a pending one
    #[serde(default)]
    pub reject_duplicate_phone: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            timeout: default_verifier_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_verifier_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
