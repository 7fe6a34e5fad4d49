use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::providers::gemini::{GeminiConfig, GEMINI_API_BASE};

const DEFAULT_GRPC_PORT: u16 = 50051;
const DEFAULT_HEALTH_PORT: u16 = 80;
const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct InterviewConfig {
    pub common: core_config::Config,
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub models: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub grpc_port: u16,
    /// Plain HTTP liveness listener.
    pub health_port: u16,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Secret<String>,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub text_model: String,
    pub timeout_secs: u64,
    /// Retries for transient provider failures. `0` keeps calls at-most-once.
    pub max_retries: u32,
}

impl InterviewConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(InterviewConfig {
            common: common_config,
            server: ServerConfig {
                grpc_port: parse_env("PORT", DEFAULT_GRPC_PORT)?,
                health_port: parse_env("HEALTH_PORT", DEFAULT_HEALTH_PORT)?,
            },
            google: GoogleConfig {
                api_key: get_secret("GEMINI_API_KEY", is_prod)?,
                api_base_url: get_env("GENAI_API_BASE_URL", Some(GEMINI_API_BASE), is_prod)?,
            },
            models: ModelConfig {
                text_model: get_env("GENAI_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL), is_prod)?,
                timeout_secs: parse_env("GENAI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
                max_retries: parse_env("GENAI_MAX_RETRIES", 0)?,
            },
        })
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.google.api_key.clone(),
            model: self.models.text_model.clone(),
            base_url: self.google.api_base_url.clone(),
            timeout: Duration::from_secs(self.models.timeout_secs),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if let Some(def) = default {
                Ok(def.to_string())
            } else if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Required in production. Outside production a missing key starts the
/// service unconfigured; calls then fail with an explanation.
fn get_secret(key: &str, is_prod: bool) -> Result<Secret<String>, AppError> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(Secret::new(val)),
        _ if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required in production but not set",
            key
        ))),
        _ => {
            tracing::warn!(key, "Secret not set; provider calls will fail");
            Ok(Secret::new(String::new()))
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value {:?}: {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}
