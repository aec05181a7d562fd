//! Hosted-provider boundary.
//!
//! Every interesting capability — understanding language, searching the web,
//! speaking on the phone — lives behind one of the traits here, so the
//! orchestrator and poller can be exercised with mock implementations and the
//! real clients stay thin request/response adapters.
//!
//! Each provider call is a single synchronous round trip from the core's point
//! of view; retries, if any, are the hosting framework's concern.

pub mod bland;
pub mod http_pool;
pub mod mistral;

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error;
use std::sync::Mutex;

/// How many tokens were spent on prompt vs. completion in the last chat call.
#[derive(Clone, Debug)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// A request/response chat completion provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send one prompt and return the assistant's text payload.
    ///
    /// With `force_json` the provider is asked to constrain the reply to a
    /// JSON object; callers still parse defensively via
    /// [`crate::maitred::json_payload`] because models wrap output in code
    /// fences anyway.
    async fn complete(
        &self,
        prompt: &str,
        force_json: bool,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// Usage from the last `complete()` call, when the provider reports it.
    fn get_last_usage(&self) -> Option<TokenUsage> {
        self.usage_slot()
            .and_then(|slot| slot.lock().ok().and_then(|u| u.clone()))
    }

    /// Providers that track usage override this to expose their slot.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}

/// An agentic web-search provider.
///
/// One call covers the whole create-agent / start-conversation sequence and
/// returns the text of the final message output; the caller parses it as JSON
/// with fence stripping.
#[async_trait]
pub trait VenueSearchProvider: Send + Sync {
    async fn search(&self, criteria: &str) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// Status payload returned by the voice provider for one call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallStatus {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub concatenated_transcript: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// An outbound voice-call provider.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Start a call and return the provider-issued call id.
    async fn start_call(
        &self,
        phone_number: &str,
        script: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// Fetch the current status of a call.
    async fn call_status(&self, call_id: &str)
        -> Result<CallStatus, Box<dyn Error + Send + Sync>>;

    /// Fetch the corrected transcript entries for a completed call.
    async fn corrected_transcript(
        &self,
        call_id: &str,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;
}
