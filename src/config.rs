use std::sync::Arc;

use tracing::info;

use crate::constants::{GOOGLE_API_KEY_VAR, SERPER_API_KEY_VAR};
use crate::decision::{KeywordDecision, ModelDecision, SearchDecision};
use crate::error::ConfigError;
use crate::llm_interaction::{GeminiClient, GenerationConfig, LanguageModel};
use crate::orchestrator::Orchestrator;
use crate::search::SerperClient;

/// Which [`SearchDecision`] implementation answers "should we search?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DecisionStrategy {
    /// Local phrase table, no extra API call.
    #[default]
    Keyword,
    /// Ask the language model for a YES/NO verdict first.
    Model,
}

/// Validated startup settings. Built once; nothing in here changes afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub serper_api_key: String,
    pub decision: DecisionStrategy,
    pub generation: GenerationConfig,
    pub model: String,
    pub gemini_api_base: String,
    pub serper_url: String,
}

fn require(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingSecret(name))
}

impl Config {
    pub fn new(
        google_api_key: Option<String>,
        serper_api_key: Option<String>,
        decision: DecisionStrategy,
        generation: GenerationConfig,
    ) -> Result<Self, ConfigError> {
        let google_api_key = require(google_api_key, GOOGLE_API_KEY_VAR)?;
        let serper_api_key = require(serper_api_key, SERPER_API_KEY_VAR)?;

        if !(0.0..=1.0).contains(&generation.temperature) {
            return Err(ConfigError::InvalidTemperature(generation.temperature));
        }
        if generation.max_output_tokens == 0 {
            return Err(ConfigError::InvalidMaxOutputTokens);
        }

        Ok(Self {
            google_api_key,
            serper_api_key,
            decision,
            generation,
            model: crate::constants::GAMKERS_MODEL.clone(),
            gemini_api_base: crate::constants::GEMINI_API_BASE.clone(),
            serper_url: crate::constants::SERPER_URL.clone(),
        })
    }

    /// Wires the real Gemini and Serper clients behind the orchestrator.
    pub fn build_orchestrator(&self) -> Orchestrator {
        info!(
            model = %self.model,
            decision = ?self.decision,
            temperature = self.generation.temperature,
            max_output_tokens = self.generation.max_output_tokens,
            "Building orchestrator"
        );
        let model: Arc<dyn LanguageModel> = Arc::new(GeminiClient::with_endpoint(
            &self.google_api_key,
            &self.gemini_api_base,
            &self.model,
        ));
        let search = Arc::new(SerperClient::with_url(&self.serper_api_key, &self.serper_url));
        let decision: Arc<dyn SearchDecision> = match self.decision {
            DecisionStrategy::Keyword => Arc::new(KeywordDecision::default()),
            DecisionStrategy::Model => Arc::new(ModelDecision::new(model.clone())),
        };
        Orchestrator::new(model, search, decision, self.generation)
    }
}
