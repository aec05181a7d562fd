//! Outbound booking calls: placement and the status poll loop.
//!
//! [`place_call`] renders the concierge script and issues exactly one start
//! request — a phone call is not idempotent, so a rejected placement is a
//! fatal error for that attempt and is never retried here.
//!
//! [`await_transcript`] polls the provider on a fixed interval until the call
//! completes or the deadline elapses.  The loop is plain `tokio::time`, so
//! tests drive it with a paused clock instead of wall-clock sleeps.  Two
//! documented asymmetries:
//!
//! * Abandoning the poll (timeout) leaves the call running provider-side; we
//!   only stop waiting for it.
//! * The corrected-transcript fetch after completion is best-effort — when it
//!   fails or comes back empty, the transcript from the completion payload is
//!   used and the operation still succeeds.

use crate::maitred::error::ConciergeError;
use crate::maitred::providers::VoiceProvider;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Everything the call script needs about the booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub phone_number: String,
    pub venue_name: String,
    pub party_size: u32,
    pub date: String,
    pub time: String,
    pub reservation_name: String,
}

/// Terminal and non-terminal states of one outbound call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallJobStatus {
    Pending,
    Completed,
    Failed,
    TimedOut,
}

/// One outbound phone-call attempt.  Status transitions are driven solely by
/// polling the provider; `Completed`, `Failed`, and `TimedOut` are terminal.
#[derive(Debug, Clone, Serialize)]
pub struct CallJob {
    pub call_id: String,
    pub status: CallJobStatus,
    pub transcript: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// How the status endpoint is polled: one probe every `interval` until
/// completion, giving up after `deadline`.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            deadline: Duration::from_secs(300),
        }
    }
}

/// Render the task script the voice agent follows on the call.
pub fn render_call_script(details: &BookingDetails) -> String {
    format!(
        r#"You're Jean, a concierge at Maitred Concierge.
You're calling a venue named {venue} to book a table for {party_size} people on {date} at {time}.
If neither works, ask the venue what time they can do.
Confirm the reservation under the name {name} and close politely.

EXAMPLE 1:
Person (Venue): Hello?
You (Jean): I would like to book a table for 2 people tonight at 8:00 PM.
Person (Venue): Yes we have a table for you, what should I put the reservation name as?
You (Jean): Mr Dupont, please.
Person (Venue): Ok, noted! Thank you!
You (Jean): Thank you, have a great evening! Goodbye.

EXAMPLE 2:
Person (Venue): Hello?
You (Jean): I would like to book a table for 2 people tonight at 8:00 PM.
Person (Venue): No, sorry, we don't have any availability for tonight at all.
You (Jean): Ok no worries, thanks a lot!
Person (Venue): Have a great evening! Goodbye.
"#,
        venue = details.venue_name,
        party_size = details.party_size,
        date = details.date,
        time = details.time,
        name = details.reservation_name,
    )
}

/// Place one outbound booking call.
///
/// Returns the pending [`CallJob`] on success.  A provider rejection is a
/// [`ConciergeError::CallPlacement`]; no automatic retry.
pub async fn place_call(
    provider: &dyn VoiceProvider,
    details: &BookingDetails,
) -> Result<CallJob, ConciergeError> {
    let script = render_call_script(details);
    let call_id = provider
        .start_call(&details.phone_number, &script)
        .await
        .map_err(|e| ConciergeError::CallPlacement(e.to_string()))?;

    log::info!(
        "placed booking call {} to {} for {}",
        call_id,
        details.venue_name,
        details.reservation_name
    );

    Ok(CallJob {
        call_id,
        status: CallJobStatus::Pending,
        transcript: None,
        started_at: Utc::now(),
    })
}

/// Poll until the call completes, then return its transcript.
///
/// Transient status-fetch errors are logged and polling continues; the
/// deadline is the only thing that ends an unresponsive wait.  A provider-side
/// terminal failure ends the job as `Failed`.  On completion the corrected
/// transcript is preferred, falling back to the completion payload's summary
/// or concatenated transcript.
pub async fn await_transcript(
    provider: &dyn VoiceProvider,
    job: &mut CallJob,
    policy: PollPolicy,
) -> Result<String, ConciergeError> {
    let deadline = tokio::time::Instant::now() + policy.deadline;

    loop {
        match provider.call_status(&job.call_id).await {
            Ok(status) => {
                if matches!(status.status.as_deref(), Some("failed") | Some("error")) {
                    job.status = CallJobStatus::Failed;
                    return Err(ConciergeError::CallPlacement(format!(
                        "call {} ended with provider status '{}'",
                        job.call_id,
                        status.status.as_deref().unwrap_or_default()
                    )));
                }
                if status.completed {
                    job.status = CallJobStatus::Completed;
                    let transcript = match provider.corrected_transcript(&job.call_id).await {
                        Ok(parts) if !parts.is_empty() => parts.join("\n"),
                        Ok(_) => fallback_transcript(&status),
                        Err(e) => {
                            log::warn!(
                                "corrected transcript fetch failed for call {}: {}",
                                job.call_id,
                                e
                            );
                            fallback_transcript(&status)
                        }
                    };
                    job.transcript = Some(transcript.clone());
                    return Ok(transcript);
                }
            }
            Err(e) => {
                log::warn!("status poll failed for call {}: {}", job.call_id, e);
            }
        }

        if tokio::time::Instant::now() + policy.interval > deadline {
            job.status = CallJobStatus::TimedOut;
            return Err(ConciergeError::CallTimeout {
                call_id: job.call_id.clone(),
                waited: policy.deadline,
            });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Place a call and wait for its transcript in one step.
pub async fn call_and_transcribe(
    provider: &dyn VoiceProvider,
    details: &BookingDetails,
    policy: PollPolicy,
) -> Result<CallJob, ConciergeError> {
    let mut job = place_call(provider, details).await?;
    await_transcript(provider, &mut job, policy).await?;
    Ok(job)
}

fn fallback_transcript(status: &crate::maitred::providers::CallStatus) -> String {
    status
        .summary
        .clone()
        .or_else(|| status.concatenated_transcript.clone())
        .unwrap_or_default()
}
