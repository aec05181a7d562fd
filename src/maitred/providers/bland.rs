//! Client for the Bland voice-AI API: start an outbound call, poll its status,
//! and fetch the corrected transcript once the call is over.
//!
//! The client is a thin adapter over three endpoints:
//!
//! * `POST /v1/calls` — start a call with a phone number and a task script;
//!   returns `{status, call_id}`.
//! * `GET /v1/calls/{id}` — current status, including `completed`,
//!   `concatenated_transcript`, and `summary` once available.
//! * `GET /v1/calls/{id}/correct` — post-processed transcript entries.
//!
//! Waiting for a call to finish is not this module's job; see
//! [`crate::maitred::caller`] for the poll loop.

use crate::maitred::config::ConciergeConfig;
use crate::maitred::providers::{CallStatus, VoiceProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Default public endpoint.
const DEFAULT_BASE_URL: &str = "https://api.bland.ai";

/// Client wrapper for Bland's calls API.
pub struct BlandClient {
    api_key: String,
    base_url: String,
    /// Optional voice preset forwarded with every call.
    voice: Option<String>,
    /// Optional BCP-47 language tag forwarded with every call.
    language: Option<String>,
    client: reqwest::Client,
}

impl BlandClient {
    /// Construct a client against the public endpoint.
    pub fn new(api_key: &str) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Construct a client pointing at a custom base URL.
    pub fn new_with_base_url(api_key: &str, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        BlandClient {
            api_key: api_key.to_string(),
            client: super::http_pool::get_http_client(&base_url),
            base_url,
            voice: None,
            language: None,
        }
    }

    /// Construct a client from a [`ConciergeConfig`].
    pub fn from_config(config: &ConciergeConfig) -> Self {
        Self::new_with_base_url(&config.bland_api_key, &config.bland_base_url)
    }

    /// Select a voice preset for outbound calls.
    pub fn with_voice(mut self, voice: &str) -> Self {
        self.voice = Some(voice.to_string());
        self
    }

    /// Select the call language.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    async fn get_json<R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<R, Box<dyn Error + Send + Sync>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("BlandClient: {} returned {}: {}", path, status, body);
            return Err(format!("voice provider returned HTTP {} for {}", status, path).into());
        }
        Ok(response.json::<R>().await?)
    }
}

#[derive(Serialize)]
struct StartCallRequest<'a> {
    phone_number: &'a str,
    task: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Deserialize)]
struct StartCallResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
}

#[derive(Deserialize)]
struct CorrectedResponse {
    #[serde(default)]
    corrected: Vec<CorrectedEntry>,
}

#[derive(Deserialize)]
struct CorrectedEntry {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl VoiceProvider for BlandClient {
    async fn start_call(
        &self,
        phone_number: &str,
        script: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let url = format!("{}/v1/calls", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&StartCallRequest {
                phone_number,
                task: script,
                voice: self.voice.as_deref(),
                language: self.language.as_deref(),
            })
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("BlandClient: start call returned {}: {}", http_status, body);
            return Err(format!("voice provider returned HTTP {}", http_status).into());
        }

        let payload: StartCallResponse = response.json().await?;
        if payload.status.as_deref() != Some("success") {
            return Err(format!(
                "voice provider rejected the call (status: {})",
                payload.status.as_deref().unwrap_or("unknown")
            )
            .into());
        }
        payload
            .call_id
            .ok_or_else(|| "voice provider did not return a call_id".into())
    }

    async fn call_status(
        &self,
        call_id: &str,
    ) -> Result<CallStatus, Box<dyn Error + Send + Sync>> {
        self.get_json(&format!("/v1/calls/{}", call_id)).await
    }

    async fn corrected_transcript(
        &self,
        call_id: &str,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        let response: CorrectedResponse = self
            .get_json(&format!("/v1/calls/{}/correct", call_id))
            .await?;
        Ok(response
            .corrected
            .into_iter()
            .filter_map(|entry| entry.text)
            .collect())
    }
}
