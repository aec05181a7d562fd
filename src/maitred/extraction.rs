//! The canonical extraction schema and its prompt.
//!
//! The chat model is asked for a strict JSON object with exactly the snake_case
//! keys below — one schema for both booking categories, so naming drift between
//! prompts can never leak into the core.  [`RawExtraction`] accepts whatever
//! loosely-typed values the model produces (numbers where strings were asked
//! for, etc.) and [`RawExtraction::normalize`] funnels everything through the
//! field normalizers into a typed [`ExtractedDetails`] ready for merging.

use crate::maitred::normalizer::{
    normalize_party_size, normalize_price, normalize_time, PriceRange,
};
use crate::maitred::session::Category;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The nine extractable fields, exactly as the model returns them.  Absent and
/// `null` keys are equivalent; values are kept loose until normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub subject_type: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub party_size: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub allergies_or_notes: Option<Value>,
    #[serde(default)]
    pub reservation_name: Option<Value>,
    #[serde(default)]
    pub time_flexibility: Option<Value>,
}

/// Normalized details, the only shape the session store will merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedDetails {
    pub subject_type: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub party_size: Option<u32>,
    pub price: Option<PriceRange>,
    pub allergies_or_notes: Option<String>,
    pub reservation_name: Option<String>,
    pub time_flexibility: Option<String>,
}

impl RawExtraction {
    /// Run every field through its normalizer.
    pub fn normalize(&self) -> ExtractedDetails {
        let time_raw = coerce_string(&self.time);
        let party_raw = coerce_string(&self.party_size);
        let price_raw = coerce_string(&self.price);
        ExtractedDetails {
            subject_type: coerce_string(&self.subject_type),
            location: coerce_string(&self.location),
            date: coerce_string(&self.date),
            time: normalize_time(time_raw.as_deref()),
            party_size: normalize_party_size(party_raw.as_deref()),
            price: normalize_price(price_raw.as_deref()),
            allergies_or_notes: coerce_string(&self.allergies_or_notes),
            reservation_name: coerce_string(&self.reservation_name),
            time_flexibility: coerce_string(&self.time_flexibility),
        }
    }
}

/// Turn a loose JSON value into a usable string, treating `null`, empty
/// strings, and the literal string "null" as absent.
fn coerce_string(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Build the extraction prompt for one user turn.
///
/// The instruction pins the model to the canonical schema: every key present,
/// unknown values exactly `null`, nothing outside the JSON object.
pub fn extraction_prompt(category: Category, user_text: &str) -> String {
    let (assistant_kind, subject_hint) = match category {
        Category::Restaurant => (
            "restaurant booking assistant",
            "the cuisine or restaurant type",
        ),
        Category::Sport => (
            "sports booking assistant",
            "the kind of sport or activity",
        ),
    };
    format!(
        r#"You are a {assistant}. Analyze the user's request and extract the following
information into a strict JSON format. The keys must be exactly:
"subject_type" ({subject}), "location", "date", "time", "party_size",
"price", "allergies_or_notes", "reservation_name", "time_flexibility".
If a piece of information is not available, the value must be null.
Do not add any text before or after the JSON object.

User request: "{request}""#,
        assistant = assistant_kind,
        subject = subject_hint,
        request = user_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_loose_model_output() {
        let raw: RawExtraction = serde_json::from_value(json!({
            "subject_type": "italian",
            "location": "Paris 16",
            "date": "2025-10-19",
            "time": "7 PM",
            "party_size": 2,
            "price": "20-50€",
            "allergies_or_notes": null,
        }))
        .unwrap();

        let details = raw.normalize();
        assert_eq!(details.subject_type.as_deref(), Some("italian"));
        assert_eq!(details.time.as_deref(), Some("19:00"));
        assert_eq!(details.party_size, Some(2));
        let price = details.price.unwrap();
        assert_eq!((price.min, price.max), (Some(20), Some(50)));
        assert!(details.allergies_or_notes.is_none());
        assert!(details.reservation_name.is_none());
    }

    #[test]
    fn literal_null_strings_and_blanks_are_absent() {
        let raw: RawExtraction = serde_json::from_value(json!({
            "location": "null",
            "date": "  ",
        }))
        .unwrap();
        let details = raw.normalize();
        assert!(details.location.is_none());
        assert!(details.date.is_none());
    }

    #[test]
    fn unknown_keys_are_ignored_and_missing_keys_default() {
        let raw: RawExtraction =
            serde_json::from_value(json!({"neighborhood": "Montparnasse"})).unwrap();
        let details = raw.normalize();
        assert_eq!(details, ExtractedDetails::default());
    }

    #[test]
    fn prompt_targets_the_canonical_schema() {
        let prompt = extraction_prompt(Category::Restaurant, "dinner for two");
        assert!(prompt.contains("\"subject_type\""));
        assert!(prompt.contains("\"party_size\""));
        assert!(prompt.contains("dinner for two"));

        let sport = extraction_prompt(Category::Sport, "tennis tomorrow");
        assert!(sport.contains("sports booking assistant"));
    }
}
