//! # Maitred
//!
//! Maitred is a Rust tool server for an AI concierge.  It exposes a small set of
//! callable tools that together take a booking request from free-form text all the
//! way to a confirmed reservation:
//!
//! * **Detail extraction**: free-form user text is turned into a structured
//!   reservation record via a hosted LLM (forced-JSON chat completion), then run
//!   through the [`maitred::normalizer`] so every field is either a validated
//!   canonical value or explicitly unknown.
//! * **Multi-turn sessions**: partial details accumulate across turns in a
//!   [`SessionStore`] with non-null-wins merge semantics — information the user
//!   already gave is never forgotten.
//! * **Venue search**: once a request is complete, an agentic web-search call
//!   finds one real venue matching the gathered criteria.
//! * **Booking calls**: an outbound phone call can be placed through a voice-AI
//!   provider, with a polling loop that waits for the call to finish and fetches
//!   the (optionally corrected) transcript.
//! * **Calendar links**: a pure helper renders Google-Calendar invite URLs for
//!   the confirmed booking.
//!
//! All of the interesting heavy lifting — language understanding, web search,
//! speaking on the phone — is delegated to hosted providers behind the traits in
//! [`maitred::providers`].  The crate's own job is field normalization, session
//! merging, orchestration, and the call-status poll loop, all of which are fully
//! testable with mock providers and a paused clock.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use maitred::providers::bland::BlandClient;
//! use maitred::providers::mistral::MistralClient;
//! use maitred::tool_protocol::ToolProtocol;
//! use maitred::{Concierge, ConciergeConfig, ConciergeServer, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     maitred::init_logger();
//!
//!     let config = ConciergeConfig::from_env()?;
//!     let mistral = Arc::new(MistralClient::from_config(&config));
//!     let bland = Arc::new(BlandClient::from_config(&config));
//!
//!     let concierge = Concierge::new(
//!         Arc::new(SessionStore::new()),
//!         mistral.clone(),
//!         mistral,
//!     );
//!     let server = ConciergeServer::new(Arc::new(concierge), bland);
//!
//!     let result = server
//!         .execute(
//!             "find_restaurant",
//!             serde_json::json!({
//!                 "session_id": "demo",
//!                 "request": "Italian place in Paris 16 for 2 people on Oct 19 2025 at 7pm, budget 20-50€",
//!             }),
//!         )
//!         .await?;
//!     println!("{}", result.output);
//!     Ok(())
//! }
//! ```
//!
//! The tool surface (`find_restaurant`, `find_sport_venue`, `place_booking_call`,
//! `calendar_link`) is described by [`maitred::tool_protocol::ToolMetadata`] so a
//! hosting framework can advertise the tools with their input schemas and route
//! already-deserialized arguments into [`ConciergeServer`].

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding maitred can opt in to simple `RUST_LOG` driven
/// diagnostics without choosing a logging backend upfront.
///
/// ```rust
/// maitred::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `maitred` module.
pub mod maitred;

// Re-exporting key items for easier external access.
pub use crate::maitred::caller;
pub use crate::maitred::caller::{BookingDetails, CallJob, CallJobStatus, PollPolicy};
pub use crate::maitred::calendar;
pub use crate::maitred::config::ConciergeConfig;
pub use crate::maitred::error::ConciergeError;
pub use crate::maitred::json_payload;
pub use crate::maitred::normalizer;
pub use crate::maitred::normalizer::PriceRange;
pub use crate::maitred::orchestrator::{Concierge, TurnOutcome};
pub use crate::maitred::providers;
pub use crate::maitred::server::ConciergeServer;
pub use crate::maitred::session::{
    Category, ReservationRequest, SessionState, SessionStore, VenueInfo,
};
pub use crate::maitred::tool_protocol;
