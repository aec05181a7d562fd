//! Error taxonomy for the concierge pipeline.
//!
//! Every variant maps to a user-facing description; the tool surface in
//! [`crate::maitred::server`] converts them into failed tool results rather than
//! letting them propagate to the hosting framework.  A request that is merely
//! missing fields is not an error — that state is modelled by
//! [`crate::maitred::orchestrator::TurnOutcome::MissingInfo`].

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Failures the concierge can run into while driving a booking.
#[derive(Debug, Clone)]
pub enum ConciergeError {
    /// The extraction model was unavailable or its reply was not usable JSON.
    Extraction(String),
    /// The venue-search agent call failed or its output could not be parsed.
    Search(String),
    /// The voice provider refused to start the call.  Call placement is never
    /// retried automatically — a phone call is not free to fire twice.
    CallPlacement(String),
    /// The call never reached a terminal status before the polling deadline.
    /// The provider-side call keeps running; we only stop waiting for it.
    CallTimeout { call_id: String, waited: Duration },
    /// A calendar start time that is not ISO-8601.
    DateFormat(String),
}

impl fmt::Display for ConciergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConciergeError::Extraction(msg) => {
                write!(f, "Error: could not extract reservation details. {}", msg)
            }
            ConciergeError::Search(msg) => {
                write!(f, "Error during venue search: {}", msg)
            }
            ConciergeError::CallPlacement(msg) => {
                write!(f, "Error: the booking call could not be placed: {}", msg)
            }
            ConciergeError::CallTimeout { call_id, waited } => write!(
                f,
                "Error: call {} did not finish within {} seconds",
                call_id,
                waited.as_secs()
            ),
            ConciergeError::DateFormat(raw) => write!(
                f,
                "Error: '{}' is not an ISO-8601 date-time (expected e.g. 2025-10-19T19:00:00)",
                raw
            ),
        }
    }
}

impl Error for ConciergeError {}
