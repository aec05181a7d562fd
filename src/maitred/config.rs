//! Configuration for the concierge server.
//!
//! [`ConciergeConfig`] is a plain struct users can construct however they want;
//! no config-file parsing dependencies are introduced.  [`ConciergeConfig::from_env`]
//! covers the common deployment case of API keys in the environment.

use std::env;

/// Everything the provider clients need to talk to the outside world.
#[derive(Debug, Clone)]
pub struct ConciergeConfig {
    /// API key for the chat / web-search provider.
    pub mistral_api_key: String,
    /// API key for the voice-call provider.
    pub bland_api_key: String,
    /// Base URL of the chat / web-search provider.
    pub mistral_base_url: String,
    /// Base URL of the voice-call provider.
    pub bland_base_url: String,
    /// Model used for detail extraction.
    pub extraction_model: String,
    /// Model backing the web-search agent.
    pub agent_model: String,
}

impl ConciergeConfig {
    /// Build a config with the given API keys and default endpoints/models.
    pub fn new(mistral_api_key: impl Into<String>, bland_api_key: impl Into<String>) -> Self {
        Self {
            mistral_api_key: mistral_api_key.into(),
            bland_api_key: bland_api_key.into(),
            mistral_base_url: "https://api.mistral.ai".to_string(),
            bland_base_url: "https://api.bland.ai".to_string(),
            extraction_model: "mistral-large-latest".to_string(),
            agent_model: "mistral-medium-2505".to_string(),
        }
    }

    /// Read the config from the environment.
    ///
    /// `MISTRAL_API_KEY` and `BLAND_API_KEY` are required;
    /// `MISTRAL_BASE_URL`, `BLAND_BASE_URL`, `MAITRED_EXTRACTION_MODEL`, and
    /// `MAITRED_AGENT_MODEL` override the defaults when set.
    pub fn from_env() -> Result<Self, String> {
        let mistral_api_key = env::var("MISTRAL_API_KEY")
            .map_err(|_| "MISTRAL_API_KEY is not set".to_string())?;
        let bland_api_key =
            env::var("BLAND_API_KEY").map_err(|_| "BLAND_API_KEY is not set".to_string())?;

        let mut config = Self::new(mistral_api_key, bland_api_key);
        if let Ok(url) = env::var("MISTRAL_BASE_URL") {
            config.mistral_base_url = url;
        }
        if let Ok(url) = env::var("BLAND_BASE_URL") {
            config.bland_base_url = url;
        }
        if let Ok(model) = env::var("MAITRED_EXTRACTION_MODEL") {
            config.extraction_model = model;
        }
        if let Ok(model) = env::var("MAITRED_AGENT_MODEL") {
            config.agent_model = model;
        }
        Ok(config)
    }
}
