//! LLM configuration persistence and model resolution.

use std::path::{Path, PathBuf};

use consulta_core::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{LLMConfigResponse, LLMConfigUpdate};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: usize = 2048;

pub const MAX_TEMPERATURE: f64 = 2.0;

/// Bring a sampling temperature into the range the API accepts.
pub fn clamp_temperature(temperature: f64) -> f64 {
    temperature.clamp(0.0, MAX_TEMPERATURE)
}

/// A completion must be allowed at least one token.
pub fn clamp_max_tokens(max_tokens: usize) -> usize {
    max_tokens.max(1)
}

pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"];

/// Stored LLM configuration (persisted to llm-config.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            config_path: PathBuf::new(),
        }
    }
}

/// Everything needed to call the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModel {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
}

impl ResolvedModel {
    /// `{base_url}/chat/completions`
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: LLMConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        config.config_path = config_path.to_path_buf();

        // Env vars as fallback
        if config.api_key.is_none() {
            config.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if config.base_url == DEFAULT_BASE_URL {
            if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
                if !url.is_empty() {
                    config.base_url = url;
                }
            }
        }

        config
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved LLM config to {}", self.config_path.display());
        Ok(())
    }

    /// Apply an update, merging with existing config. Empty strings clear the key.
    pub fn apply_update(&mut self, update: &LLMConfigUpdate) {
        if let Some(k) = &update.api_key {
            self.api_key = if k.trim().is_empty() {
                None
            } else {
                Some(k.trim().to_string())
            };
        }
        if let Some(m) = &update.model {
            self.model = m.clone();
        }
        if let Some(u) = &update.base_url {
            self.base_url = u.clone();
        }
        if let Some(t) = update.temperature {
            self.temperature = clamp_temperature(t);
        }
        if let Some(n) = update.max_tokens {
            self.max_tokens = clamp_max_tokens(n);
        }
    }

    /// Resolve the model to call, if an API key is configured.
    pub fn resolve(&self) -> Option<ResolvedModel> {
        self.api_key.as_ref().map(|key| ResolvedModel {
            model: self.model.clone(),
            api_key: key.clone(),
            base_url: self.base_url.clone(),
        })
    }

    /// Build the public config response (no API key exposed).
    pub fn to_response(&self) -> LLMConfigResponse {
        LLMConfigResponse {
            api_key_configured: self.api_key.is_some(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Models offered in the admin selector.
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<String> = OPENAI_MODELS.iter().map(|s| s.to_string()).collect();
        if !models.contains(&self.model) {
            models.insert(0, self.model.clone());
        }
        models
    }
}
