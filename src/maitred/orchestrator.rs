//! The booking orchestrator: one user turn in, one decision out.
//!
//! Each turn runs extraction → normalization → merge → completeness gate, and
//! only when every required field is known does it spend a search-agent call.
//! The per-session state machine is
//! `Collecting → Searching → AwaitingBookingDetails → Confirmed`, with
//! `Collecting` re-entered for as long as information is missing.
//!
//! Failure discipline: a provider error surfaces as a [`ConciergeError`] and
//! leaves the stored session exactly as the merge left it — state and venue are
//! only persisted after the step that earns them succeeds, so the next turn can
//! simply retry.

use crate::maitred::error::ConciergeError;
use crate::maitred::extraction::{extraction_prompt, RawExtraction};
use crate::maitred::json_payload;
use crate::maitred::normalizer::PriceRange;
use crate::maitred::providers::{ChatProvider, VenueSearchProvider};
use crate::maitred::session::{
    Category, ReservationRequest, SessionState, SessionStore, VenueInfo,
};
use std::sync::Arc;

/// Fields that must be known before any search is attempted, in the order
/// missing ones are reported back to the user.
const REQUIRED_FIELDS: [&str; 5] = ["subject_type", "location", "date", "time", "party_size"];

/// Fields still needed to actually place the booking once a venue is found.
const BOOKING_FIELDS: [&str; 2] = ["reservation_name", "time_flexibility"];

/// What a turn decided.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// Required fields are missing; no search was performed.
    MissingInfo {
        request: ReservationRequest,
        /// Canonical names of the missing required fields, in declaration order.
        missing: Vec<&'static str>,
        message: String,
    },
    /// A venue was found but the booking details are not complete yet.
    AwaitingBookingDetails {
        request: ReservationRequest,
        venue: VenueInfo,
        /// Canonical names of the missing booking fields.
        missing: Vec<&'static str>,
        wellness_suggestion: Option<String>,
        message: String,
    },
    /// A venue was found and everything needed for the booking is known.
    Confirmed {
        request: ReservationRequest,
        venue: VenueInfo,
        wellness_suggestion: Option<String>,
        message: String,
    },
}

impl TurnOutcome {
    /// The user-facing reply for this turn.
    pub fn message(&self) -> &str {
        match self {
            TurnOutcome::MissingInfo { message, .. }
            | TurnOutcome::AwaitingBookingDetails { message, .. }
            | TurnOutcome::Confirmed { message, .. } => message,
        }
    }

    /// The post-turn session record.
    pub fn request(&self) -> &ReservationRequest {
        match self {
            TurnOutcome::MissingInfo { request, .. }
            | TurnOutcome::AwaitingBookingDetails { request, .. }
            | TurnOutcome::Confirmed { request, .. } => request,
        }
    }
}

/// Sequences extraction, normalization, merging, the completeness gate, and
/// venue search for every session.
pub struct Concierge {
    store: Arc<SessionStore>,
    chat: Arc<dyn ChatProvider>,
    search: Arc<dyn VenueSearchProvider>,
}

impl Concierge {
    pub fn new(
        store: Arc<SessionStore>,
        chat: Arc<dyn ChatProvider>,
        search: Arc<dyn VenueSearchProvider>,
    ) -> Self {
        Self {
            store,
            chat,
            search,
        }
    }

    /// Access the underlying session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Run one user turn for the given session.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        category: Category,
        user_text: &str,
    ) -> Result<TurnOutcome, ConciergeError> {
        // Extraction (external) and normalization.
        let prompt = extraction_prompt(category, user_text);
        let reply = self
            .chat
            .complete(&prompt, true)
            .await
            .map_err(|e| ConciergeError::Extraction(e.to_string()))?;
        let value = json_payload::extract_json(&reply)
            .map_err(|e| ConciergeError::Extraction(e.to_string()))?;
        let raw: RawExtraction = serde_json::from_value(value)
            .map_err(|e| ConciergeError::Extraction(e.to_string()))?;
        let details = raw.normalize();

        // Merge into the session; nulls never clobber known fields.
        let record = self.store.merge_update(session_id, category, &details).await;

        // Completeness gate: never call the search agent on incomplete input.
        let missing = missing_required(&record);
        if !missing.is_empty() {
            log::debug!(
                "session {}: still collecting, missing {:?}",
                session_id,
                missing
            );
            let message = missing_info_message(&record, &missing);
            return Ok(TurnOutcome::MissingInfo {
                request: record,
                missing,
                message,
            });
        }

        // Reuse the venue from an earlier turn; otherwise this turn pays for a
        // search.
        let venue = match record.venue_found.clone() {
            Some(venue) => venue,
            None => {
                log::info!("session {}: searching for a venue", session_id);
                let criteria = criteria_prompt(&record);
                let output = self
                    .search
                    .search(&criteria)
                    .await
                    .map_err(|e| ConciergeError::Search(e.to_string()))?;
                json_payload::extract_typed::<VenueInfo>(&output)
                    .map_err(|e| ConciergeError::Search(e.to_string()))?
            }
        };

        let wellness = match category {
            Category::Sport => record
                .subject_type
                .as_deref()
                .map(|sport| wellness_suggestion(sport).to_string()),
            Category::Restaurant => None,
        };

        let missing_booking = missing_booking_details(&record);
        let next_state = if missing_booking.is_empty() {
            SessionState::Confirmed
        } else {
            SessionState::AwaitingBookingDetails
        };

        let record = self
            .store
            .record_venue(session_id, venue.clone(), next_state)
            .await
            .unwrap_or(record);

        let message = venue_message(&record, &venue, &missing_booking, wellness.as_deref());
        if missing_booking.is_empty() {
            Ok(TurnOutcome::Confirmed {
                request: record,
                venue,
                wellness_suggestion: wellness,
                message,
            })
        } else {
            Ok(TurnOutcome::AwaitingBookingDetails {
                request: record,
                venue,
                missing: missing_booking,
                wellness_suggestion: wellness,
                message,
            })
        }
    }
}

/// Names of required fields the record does not know yet, in declaration order.
pub fn missing_required(record: &ReservationRequest) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for field in REQUIRED_FIELDS.iter() {
        let known = match *field {
            "subject_type" => record.subject_type.is_some(),
            "location" => record.location.is_some(),
            "date" => record.date.is_some(),
            "time" => record.time.is_some(),
            "party_size" => record.party_size.is_some(),
            _ => true,
        };
        if !known {
            missing.push(*field);
        }
    }
    missing
}

/// Names of booking-detail fields still unknown.
pub fn missing_booking_details(record: &ReservationRequest) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if record.reservation_name.is_none() {
        missing.push(BOOKING_FIELDS[0]);
    }
    if record.time_flexibility.is_none() {
        missing.push(BOOKING_FIELDS[1]);
    }
    missing
}

/// One canonical rendering per price shape, used in prompts and replies.
pub fn render_price(price: Option<&PriceRange>) -> String {
    match price {
        Some(range) => match (range.min, range.max) {
            (Some(min), Some(max)) if min != max => format!("between {}€ and {}€", min, max),
            (_, Some(max)) => format!("up to {}€", max),
            (Some(min), None) => format!("starting from {}€", min),
            (None, None) => "any price".to_string(),
        },
        None => "any price".to_string(),
    }
}

/// Recovery suggestion paired with a sport, from the fixed mapping the
/// wellness flow has always used.
pub fn wellness_suggestion(sport: &str) -> &'static str {
    match sport.to_lowercase().as_str() {
        "tennis" => "Massage dos et épaules",
        "padel" => "Massage dos et bras",
        "fitness" => "Massage jambes ou full body",
        "running" => "Massage jambes",
        "escalade" => "Massage avant-bras et dos",
        _ => "Massage récupération générale",
    }
}

fn missing_info_message(record: &ReservationRequest, missing: &[&'static str]) -> String {
    let known = known_details(record);
    let intro = if known.is_empty() {
        "I don't have any details yet.".to_string()
    } else {
        format!("I have the following details: {}.", known.join(", "))
    };
    format!(
        "{} Could you please provide the missing information: {}?",
        intro,
        missing.join(", ")
    )
}

fn known_details(record: &ReservationRequest) -> Vec<String> {
    let mut known = Vec::new();
    if let Some(subject) = &record.subject_type {
        known.push(format!("{}: {}", record.category.subject_label(), subject));
    }
    if let Some(location) = &record.location {
        known.push(format!("location: {}", location));
    }
    if let Some(date) = &record.date {
        known.push(format!("date: {}", date));
    }
    if let Some(time) = &record.time {
        known.push(format!("time: {}", time));
    }
    if let Some(party_size) = record.party_size {
        known.push(format!("party size: {}", party_size));
    }
    if record.price.is_some() {
        known.push(format!("price: {}", render_price(record.price.as_ref())));
    }
    if let Some(notes) = &record.allergies_or_notes {
        known.push(format!("notes: {}", notes));
    }
    if let Some(name) = &record.reservation_name {
        known.push(format!("reservation name: {}", name));
    }
    if let Some(flexibility) = &record.time_flexibility {
        known.push(format!("time flexibility: {}", flexibility));
    }
    known
}

/// Deterministic natural-language criteria for the web-search agent, built
/// from the normalized record only.
fn criteria_prompt(record: &ReservationRequest) -> String {
    let kind = match record.category {
        Category::Restaurant => "restaurant",
        Category::Sport => "sports venue",
    };
    format!(
        "Find one {kind} for:\n\
         - {subject_label}: {subject}\n\
         - Location: {location}\n\
         - Date: {date}\n\
         - Time: {time}\n\
         - People: {party_size}\n\
         - Price: {price}\n\
         - Notes: {notes}",
        kind = kind,
        subject_label = capitalize(record.category.subject_label()),
        subject = record.subject_type.as_deref().unwrap_or("any"),
        location = record.location.as_deref().unwrap_or("any"),
        date = record.date.as_deref().unwrap_or("any"),
        time = record.time.as_deref().unwrap_or("any"),
        party_size = record
            .party_size
            .map(|n| n.to_string())
            .unwrap_or_else(|| "any".to_string()),
        price = render_price(record.price.as_ref()),
        notes = record.allergies_or_notes.as_deref().unwrap_or("None"),
    )
}

fn venue_message(
    record: &ReservationRequest,
    venue: &VenueInfo,
    missing_booking: &[&'static str],
    wellness: Option<&str>,
) -> String {
    let mut message = format!(
        "Great! I am looking at a {} {} in {} for {} people on {} at {} with a budget {}.",
        record.subject_type.as_deref().unwrap_or("matching"),
        match record.category {
            Category::Restaurant => "restaurant",
            Category::Sport => "venue",
        },
        record.location.as_deref().unwrap_or("your area"),
        record
            .party_size
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string()),
        record.date.as_deref().unwrap_or("?"),
        record.time.as_deref().unwrap_or("?"),
        render_price(record.price.as_ref()),
    );

    message.push_str(&format!(" I found {}", venue.name));
    if let Some(address) = &venue.address {
        message.push_str(&format!(" at {}", address));
    }
    message.push('.');

    if let Some(wellness) = wellness {
        message.push_str(&format!(" Recommended recovery afterwards: {}.", wellness));
    }

    if missing_booking.is_empty() {
        message.push_str(" Would you like me to book it?");
    } else {
        message.push_str(&format!(
            " To finish the booking, could you please provide: {}?",
            missing_booking.join(", ")
        ));
    }
    message
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_price(price: Option<PriceRange>) -> ReservationRequest {
        let mut record = ReservationRequest::new("s", Category::Restaurant);
        record.price = price;
        record
    }

    #[test]
    fn price_renderings_cover_every_shape() {
        assert_eq!(render_price(None), "any price");
        assert_eq!(
            render_price(Some(&PriceRange {
                min: Some(20),
                max: Some(50)
            })),
            "between 20€ and 50€"
        );
        assert_eq!(render_price(Some(&PriceRange::at_most(30))), "up to 30€");
        assert_eq!(
            render_price(Some(&PriceRange::at_least(15))),
            "starting from 15€"
        );
        // An exact target has one canonical rendering too.
        assert_eq!(render_price(Some(&PriceRange::exact(30))), "up to 30€");
    }

    #[test]
    fn missing_required_respects_declaration_order() {
        let record = ReservationRequest::new("s", Category::Restaurant);
        assert_eq!(
            missing_required(&record),
            vec!["subject_type", "location", "date", "time", "party_size"]
        );

        let mut record = record;
        record.subject_type = Some("italian".into());
        record.date = Some("2025-10-19".into());
        assert_eq!(missing_required(&record), vec!["location", "time", "party_size"]);
    }

    #[test]
    fn criteria_prompt_embeds_the_price_rendering() {
        let mut record = record_with_price(Some(PriceRange {
            min: Some(20),
            max: Some(50),
        }));
        record.subject_type = Some("italian".into());
        let prompt = criteria_prompt(&record);
        assert!(prompt.contains("between 20€ and 50€"));
        assert!(prompt.contains("Cuisine: italian"));
    }

    #[test]
    fn wellness_mapping_falls_back_to_generic() {
        assert_eq!(wellness_suggestion("Tennis"), "Massage dos et épaules");
        assert_eq!(wellness_suggestion("curling"), "Massage récupération générale");
    }
}
