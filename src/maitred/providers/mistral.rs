//! Client for the Mistral platform: forced-JSON chat completions for detail
//! extraction, and the beta agents API for agentic web search.
//!
//! The wrapper keeps the selected models plus an internal [`TokenUsage`] slot
//! so callers can inspect how many tokens the last extraction consumed.  It
//! reuses the pooled HTTP client from [`super::http_pool`].
//!
//! # Example
//!
//! ```rust,no_run
//! use maitred::providers::mistral::MistralClient;
//! use maitred::providers::ChatProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let key = std::env::var("MISTRAL_API_KEY")?;
//!     let client = MistralClient::new(&key);
//!     let reply = client.complete("Say hello as JSON: {\"hello\": ...}", true).await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

use crate::maitred::config::ConciergeConfig;
use crate::maitred::providers::{ChatProvider, TokenUsage, VenueSearchProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Mutex;

/// Default public endpoint.
const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";
/// Default model for structured extraction.
const DEFAULT_EXTRACTION_MODEL: &str = "mistral-large-latest";
/// Default model backing the web-search agent.
const DEFAULT_AGENT_MODEL: &str = "mistral-medium-2505";

/// Client wrapper for Mistral's chat-completions and beta agents APIs.
pub struct MistralClient {
    api_key: String,
    base_url: String,
    /// Model injected into extraction requests.
    model: String,
    /// Model the web-search agent is created with.
    agent_model: String,
    client: reqwest::Client,
    /// Storage for the token usage returned by the most recent chat request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl MistralClient {
    /// Construct a client against the public endpoint with default models.
    pub fn new(api_key: &str) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Construct a client pointing at a custom Mistral-compatible base URL.
    pub fn new_with_base_url(api_key: &str, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        MistralClient {
            api_key: api_key.to_string(),
            client: super::http_pool::get_http_client(&base_url),
            base_url,
            model: DEFAULT_EXTRACTION_MODEL.to_string(),
            agent_model: DEFAULT_AGENT_MODEL.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    /// Construct a client from a [`ConciergeConfig`].
    pub fn from_config(config: &ConciergeConfig) -> Self {
        let mut client = Self::new_with_base_url(&config.mistral_api_key, &config.mistral_base_url);
        client.model = config.extraction_model.clone();
        client.agent_model = config.agent_model.clone();
        client
    }

    /// Override the extraction model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Override the agent model.
    pub fn with_agent_model(mut self, model: &str) -> Self {
        self.agent_model = model.to_string();
        self
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, Box<dyn Error + Send + Sync>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("MistralClient: {} returned {}: {}", path, status, body);
            return Err(format!("provider returned HTTP {} for {}", status, path).into());
        }
        Ok(response.json::<R>().await?)
    }
}

// ─── Chat completions (extraction) ───────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<UsageBlock>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct UsageBlock {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

#[async_trait]
impl ChatProvider for MistralClient {
    async fn complete(
        &self,
        prompt: &str,
        force_json: bool,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: if force_json {
                Some(ResponseFormat {
                    kind: "json_object",
                })
            } else {
                None
            },
        };

        let response: ChatResponse = self.post_json("/v1/chat/completions", &request).await?;

        if let Some(usage) = response.usage {
            *self.token_usage.lock().unwrap() = Some(TokenUsage {
                input_tokens: usage.prompt_tokens as usize,
                output_tokens: usage.completion_tokens as usize,
                total_tokens: usage.total_tokens as usize,
            });
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or("model returned no choices")?;
        Ok(choice.message.content)
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}

// ─── Beta agents (web search) ────────────────────────────────────────────────

#[derive(Serialize)]
struct CreateAgentRequest<'a> {
    model: &'a str,
    name: &'a str,
    description: &'a str,
    instructions: &'a str,
    tools: Vec<AgentTool>,
}

#[derive(Serialize)]
struct AgentTool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CreateAgentResponse {
    id: String,
}

#[derive(Serialize)]
struct StartConversationRequest<'a> {
    agent_id: &'a str,
    inputs: &'a str,
}

#[derive(Deserialize)]
struct ConversationResponse {
    #[serde(default)]
    outputs: Vec<ConversationOutput>,
}

#[derive(Deserialize)]
struct ConversationOutput {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    content: Option<OutputContent>,
}

/// The final message content arrives either as a plain string or as a list of
/// typed chunks, depending on the agent's tool activity.
#[derive(Deserialize)]
#[serde(untagged)]
enum OutputContent {
    Text(String),
    Chunks(Vec<ContentChunk>),
}

#[derive(Deserialize)]
struct ContentChunk {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl OutputContent {
    fn into_text(self) -> String {
        match self {
            OutputContent::Text(text) => text,
            OutputContent::Chunks(chunks) => chunks
                .into_iter()
                .filter(|c| c.kind.as_deref() == Some("text") || c.kind.is_none())
                .filter_map(|c| c.text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[async_trait]
impl VenueSearchProvider for MistralClient {
    /// Create a fresh web-search agent, run one conversation over the given
    /// criteria, and return the text of the final `message.output` entry.
    async fn search(&self, criteria: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        let agent: CreateAgentResponse = self
            .post_json(
                "/v1/agents",
                &CreateAgentRequest {
                    model: &self.agent_model,
                    name: "Web Search Venue Finder",
                    description: "Finds one real venue (restaurant, tennis court, gym, etc.) matching booking criteria",
                    instructions: "Use your web_search tool to find one real venue matching the request. \
                                   Make sure the venue exists. \
                                   Return JSON with exactly the keys \"name\", \"address\", \"phone_number\" and nothing else.",
                    tools: vec![AgentTool { kind: "web_search" }],
                },
            )
            .await?;

        log::debug!("MistralClient: created web-search agent {}", agent.id);

        let conversation: ConversationResponse = self
            .post_json(
                "/v1/conversations",
                &StartConversationRequest {
                    agent_id: &agent.id,
                    inputs: criteria,
                },
            )
            .await?;

        let final_message = conversation
            .outputs
            .into_iter()
            .find(|o| o.kind.as_deref() == Some("message.output"))
            .and_then(|o| o.content)
            .ok_or("agent conversation produced no message output")?;

        Ok(final_message.into_text())
    }
}
