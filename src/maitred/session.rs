//! Reservation sessions and the keyed session store.
//!
//! One [`ReservationRequest`] accumulates everything learned about a single
//! user intent across any number of turns, keyed by an opaque session id.  The
//! store is append/update only: records are created on first reference and
//! never deleted (eviction, if ever needed, belongs to whatever hosts the
//! store).
//!
//! The merge rule is the central invariant of the whole server: **a field, once
//! learned, is only ever replaced by an explicit non-null value**.  An
//! extraction turn that came back with `location: null` must not erase the
//! location the user gave three turns ago.

use crate::maitred::extraction::ExtractedDetails;
use crate::maitred::normalizer::PriceRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// What kind of booking a session is about.  Fixed by the invoked tool, never
/// guessed from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Restaurant,
    Sport,
}

impl Category {
    /// Human label for the category-specific subject field ("cuisine" for
    /// restaurants, "sport" for sports bookings), used in prompts and replies.
    pub fn subject_label(&self) -> &'static str {
        match self {
            Category::Restaurant => "cuisine",
            Category::Sport => "sport",
        }
    }
}

/// Orchestrator state of one session.  `Collecting` until the required fields
/// are complete, then through `Searching` into `AwaitingBookingDetails` or
/// straight to the terminal `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Collecting,
    Searching,
    AwaitingBookingDetails,
    Confirmed,
}

/// A venue returned by the web-search agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueInfo {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// The unit of state for one user intent.
///
/// Every optional field is either a validated canonical value or `None`; raw
/// unparsed strings never survive past normalization (with the documented
/// exception of pass-through time strings, which are still better than
/// forgetting what the user said).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub session_id: String,
    pub category: Category,
    /// Category-specific subject: the cuisine for restaurants, the sport kind
    /// for sports bookings.
    pub subject_type: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    /// Canonical `HH:MM` where parseable.
    pub time: Option<String>,
    pub party_size: Option<u32>,
    pub price: Option<PriceRange>,
    pub allergies_or_notes: Option<String>,
    pub reservation_name: Option<String>,
    pub time_flexibility: Option<String>,
    pub venue_found: Option<VenueInfo>,
    pub state: SessionState,
}

impl ReservationRequest {
    /// A fresh record with every optional field unknown.
    pub fn new(session_id: impl Into<String>, category: Category) -> Self {
        Self {
            session_id: session_id.into(),
            category,
            subject_type: None,
            location: None,
            date: None,
            time: None,
            party_size: None,
            price: None,
            allergies_or_notes: None,
            reservation_name: None,
            time_flexibility: None,
            venue_found: None,
            state: SessionState::Collecting,
        }
    }

    /// Apply the non-null-wins merge rule for every extractable field.
    fn merge(&mut self, update: &ExtractedDetails) {
        merge_field(&mut self.subject_type, &update.subject_type);
        merge_field(&mut self.location, &update.location);
        merge_field(&mut self.date, &update.date);
        merge_field(&mut self.time, &update.time);
        merge_field(&mut self.party_size, &update.party_size);
        merge_field(&mut self.price, &update.price);
        merge_field(&mut self.allergies_or_notes, &update.allergies_or_notes);
        merge_field(&mut self.reservation_name, &update.reservation_name);
        merge_field(&mut self.time_flexibility, &update.time_flexibility);
    }
}

/// Overwrite `stored` only when the update actually carries a value.
fn merge_field<T: Clone>(stored: &mut Option<T>, update: &Option<T>) {
    if let Some(value) = update {
        *stored = Some(value.clone());
    }
}

/// Keyed store of in-progress reservation requests.
///
/// All mutations go through the store's write lock, so concurrent turns on the
/// same session id are serialized and the merge invariant holds; there is no
/// versioning — the last writer under the lock wins per field.  The lock is
/// only ever held for map access, never across provider I/O.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, ReservationRequest>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Merge extracted details into the record for `session_id`, creating the
    /// record on first reference.  Returns the full post-merge record.
    pub async fn merge_update(
        &self,
        session_id: &str,
        category: Category,
        update: &ExtractedDetails,
    ) -> ReservationRequest {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ReservationRequest::new(session_id, category));
        record.category = category;
        record.merge(update);
        record.clone()
    }

    /// Look up a session without mutating it.
    pub async fn get(&self, session_id: &str) -> Option<ReservationRequest> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Record a found venue and advance the session state in one locked step.
    /// Returns the updated record, or `None` for an unknown session id.
    pub async fn record_venue(
        &self,
        session_id: &str,
        venue: VenueInfo,
        state: SessionState,
    ) -> Option<ReservationRequest> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id)?;
        record.venue_found = Some(venue);
        record.state = state;
        Some(record.clone())
    }

    /// Number of sessions the store has seen.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
