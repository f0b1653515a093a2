//! Shared application state.

use std::sync::Arc;

use consulta_chat::LLMConfig;
use consulta_core::{Clock, ConsultaConfig, SystemClock};
use parking_lot::RwLock;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ConsultaConfig,
    pub clock: Arc<dyn Clock>,
    pub llm_config: RwLock<LLMConfig>,
    pub http: reqwest::Client,
}

impl AppState {
    /// State backed by the wall clock in the configured timezone.
    pub fn new(config: ConsultaConfig) -> Self {
        let clock = Arc::new(SystemClock::new(config.timezone));
        Self::with_clock(config, clock)
    }

    /// State with an explicit clock (tests, replays).
    pub fn with_clock(config: ConsultaConfig, clock: Arc<dyn Clock>) -> Self {
        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);

        Self {
            config,
            clock,
            llm_config: RwLock::new(llm_config),
            http: reqwest::Client::new(),
        }
    }

    /// Timezone label used in prompts and validation.
    pub fn timezone(&self) -> &str {
        self.config.timezone_name()
    }
}
