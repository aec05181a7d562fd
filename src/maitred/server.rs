//! The concierge tool server.
//!
//! [`ConciergeServer`] implements [`ToolProtocol`] and routes the four
//! concierge tools:
//!
//! | tool | what it does |
//! |------|--------------|
//! | `find_restaurant` | one booking turn in the restaurant category |
//! | `find_sport_venue` | one booking turn in the sport category |
//! | `place_booking_call` | place the outbound call and wait for its transcript |
//! | `calendar_link` | render a Google-Calendar invite URL |
//!
//! Every error from the pipeline — and every unusable argument — is converted
//! into a failed [`ToolResult`] here; `Err` escapes `execute` only for an
//! unknown tool name.

use crate::maitred::caller::{self, BookingDetails, PollPolicy};
use crate::maitred::calendar;
use crate::maitred::orchestrator::{Concierge, TurnOutcome};
use crate::maitred::providers::VoiceProvider;
use crate::maitred::session::Category;
use crate::maitred::tool_protocol::{
    ToolError, ToolMetadata, ToolParameter, ToolParameterType, ToolProtocol, ToolResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

/// Tool server wiring the orchestrator, the voice provider, and the calendar
/// helper behind one [`ToolProtocol`] surface.
pub struct ConciergeServer {
    concierge: Arc<Concierge>,
    voice: Arc<dyn VoiceProvider>,
    poll_policy: PollPolicy,
}

impl ConciergeServer {
    pub fn new(concierge: Arc<Concierge>, voice: Arc<dyn VoiceProvider>) -> Self {
        Self {
            concierge,
            voice,
            poll_policy: PollPolicy::default(),
        }
    }

    /// Override how long booking calls are polled for.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Run one booking turn.  A missing `session_id` gets a fresh UUID, which
    /// makes a single-shot call behave exactly like the first turn of a
    /// multi-turn session.
    async fn booking_turn(&self, category: Category, parameters: &Value) -> ToolResult {
        let request_text = match required_str(parameters, "request") {
            Ok(text) => text,
            Err(result) => return result,
        };
        let session_id = parameters["session_id"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        match self
            .concierge
            .handle_turn(&session_id, category, request_text)
            .await
        {
            Ok(outcome) => turn_result(&session_id, outcome),
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }

    async fn booking_call(&self, parameters: &Value) -> ToolResult {
        let details = BookingDetails {
            phone_number: match required_str(parameters, "phone_number") {
                Ok(v) => v.to_string(),
                Err(result) => return result,
            },
            venue_name: match required_str(parameters, "venue_name") {
                Ok(v) => v.to_string(),
                Err(result) => return result,
            },
            party_size: parameters["party_size"].as_u64().unwrap_or(2) as u32,
            date: match required_str(parameters, "date") {
                Ok(v) => v.to_string(),
                Err(result) => return result,
            },
            time: match required_str(parameters, "time") {
                Ok(v) => v.to_string(),
                Err(result) => return result,
            },
            reservation_name: match required_str(parameters, "reservation_name") {
                Ok(v) => v.to_string(),
                Err(result) => return result,
            },
        };

        match caller::call_and_transcribe(self.voice.as_ref(), &details, self.poll_policy).await {
            Ok(job) => ToolResult::success(json!({
                "call_id": job.call_id,
                "status": job.status,
                "transcript": job.transcript,
                "started_at": job.started_at.to_rfc3339(),
            })),
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }

    fn calendar_tool(&self, parameters: &Value) -> ToolResult {
        let title = match required_str(parameters, "title") {
            Ok(v) => v,
            Err(result) => return result,
        };
        let start_time = match required_str(parameters, "start_time") {
            Ok(v) => v,
            Err(result) => return result,
        };
        let duration_hours = parameters["duration_hours"].as_i64().unwrap_or(2);
        let description = parameters["description"].as_str().unwrap_or_default();
        let location = parameters["location"].as_str().unwrap_or_default();

        match calendar::calendar_link(title, start_time, duration_hours, description, location) {
            Ok(url) => ToolResult::success(json!({ "url": url })),
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }
}

/// Serialize a turn outcome into the tool-result payload.
fn turn_result(session_id: &str, outcome: TurnOutcome) -> ToolResult {
    match outcome {
        TurnOutcome::MissingInfo {
            request,
            missing,
            message,
        } => ToolResult::success(json!({
            "session_id": session_id,
            "status": "missing_info",
            "message": message,
            "missing": missing,
            "request": request,
        })),
        TurnOutcome::AwaitingBookingDetails {
            request,
            venue,
            missing,
            wellness_suggestion,
            message,
        } => ToolResult::success(json!({
            "session_id": session_id,
            "status": "awaiting_booking_details",
            "message": message,
            "missing": missing,
            "venue": venue,
            "wellness_suggestion": wellness_suggestion,
            "request": request,
        })),
        TurnOutcome::Confirmed {
            request,
            venue,
            wellness_suggestion,
            message,
        } => ToolResult::success(json!({
            "session_id": session_id,
            "status": "confirmed",
            "message": message,
            "venue": venue,
            "wellness_suggestion": wellness_suggestion,
            "request": request,
        })),
    }
}

/// Pull a required string argument, or produce the failed result describing
/// exactly what is missing.
fn required_str<'a>(parameters: &'a Value, key: &str) -> Result<&'a str, ToolResult> {
    match parameters[key].as_str() {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ToolResult::failure(format!(
            "missing required string parameter '{}'",
            key
        ))),
    }
}

fn booking_tool_metadata(name: &str, description: &str) -> ToolMetadata {
    ToolMetadata::new(name, description)
        .with_parameter(
            ToolParameter::new("request", ToolParameterType::String)
                .with_description("Free-form booking request text")
                .required(),
        )
        .with_parameter(
            ToolParameter::new("session_id", ToolParameterType::String)
                .with_description("Opaque session id, stable across turns; omit for a fresh session"),
        )
}

fn all_tool_metadata() -> Vec<ToolMetadata> {
    vec![
        booking_tool_metadata(
            "find_restaurant",
            "Extract restaurant-booking details from text, ask for anything missing, and search for a matching restaurant",
        ),
        booking_tool_metadata(
            "find_sport_venue",
            "Extract sports-booking details from text, ask for anything missing, and search for a matching venue",
        ),
        ToolMetadata::new(
            "place_booking_call",
            "Call the venue to book, then wait for the call transcript",
        )
        .with_parameter(
            ToolParameter::new("phone_number", ToolParameterType::String)
                .with_description("Venue phone number in E.164 form")
                .required(),
        )
        .with_parameter(
            ToolParameter::new("venue_name", ToolParameterType::String).required(),
        )
        .with_parameter(
            ToolParameter::new("party_size", ToolParameterType::Integer)
                .with_default(json!(2)),
        )
        .with_parameter(ToolParameter::new("date", ToolParameterType::String).required())
        .with_parameter(ToolParameter::new("time", ToolParameterType::String).required())
        .with_parameter(
            ToolParameter::new("reservation_name", ToolParameterType::String).required(),
        ),
        ToolMetadata::new(
            "calendar_link",
            "Generate a Google-Calendar invite URL for the booking",
        )
        .with_parameter(ToolParameter::new("title", ToolParameterType::String).required())
        .with_parameter(
            ToolParameter::new("start_time", ToolParameterType::String)
                .with_description("ISO-8601 start, e.g. 2025-10-19T19:00:00")
                .required(),
        )
        .with_parameter(
            ToolParameter::new("duration_hours", ToolParameterType::Integer)
                .with_default(json!(2)),
        )
        .with_parameter(ToolParameter::new("description", ToolParameterType::String))
        .with_parameter(ToolParameter::new("location", ToolParameterType::String)),
    ]
}

#[async_trait]
impl ToolProtocol for ConciergeServer {
    async fn execute(
        &self,
        tool_name: &str,
        parameters: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        log::debug!("executing tool {}", tool_name);
        match tool_name {
            "find_restaurant" => Ok(self.booking_turn(Category::Restaurant, &parameters).await),
            "find_sport_venue" => Ok(self.booking_turn(Category::Sport, &parameters).await),
            "place_booking_call" => Ok(self.booking_call(&parameters).await),
            "calendar_link" => Ok(self.calendar_tool(&parameters)),
            _ => Err(Box::new(ToolError::NotFound(tool_name.to_string()))),
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        Ok(all_tool_metadata())
    }

    async fn get_tool_metadata(
        &self,
        tool_name: &str,
    ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>> {
        all_tool_metadata()
            .into_iter()
            .find(|t| t.name == tool_name)
            .ok_or_else(|| {
                Box::new(ToolError::NotFound(tool_name.to_string()))
                    as Box<dyn Error + Send + Sync>
            })
    }

    fn protocol_name(&self) -> &str {
        "concierge"
    }
}
