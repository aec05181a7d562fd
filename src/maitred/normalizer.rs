//! Field normalization for reservation details.
//!
//! The extraction model hands back loosely-formatted strings ("7:30 PM",
//! "2 people", "20-50€").  Each normalizer converts one semantic field into its
//! canonical type, or `None` when there is nothing usable — malformed input is
//! never an error.
//!
//! # Example
//!
//! ```rust
//! use maitred::normalizer::{normalize_party_size, normalize_price, normalize_time};
//!
//! assert_eq!(normalize_time(Some("7:30 PM")), Some("19:30".to_string()));
//! assert_eq!(normalize_party_size(Some("2 people")), Some(2));
//!
//! let price = normalize_price(Some("20-50€")).unwrap();
//! assert_eq!((price.min, price.max), (Some(20), Some(50)));
//! ```

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A price constraint with optional lower and upper bounds, in whole currency
/// units.  `min <= max` whenever both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl PriceRange {
    /// A range with both bounds pinned to the same value (an exact target price).
    pub fn exact(value: u32) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }

    /// A range bounded only from above.
    pub fn at_most(value: u32) -> Self {
        Self {
            min: None,
            max: Some(value),
        }
    }

    /// A range bounded only from below.
    pub fn at_least(value: u32) -> Self {
        Self {
            min: Some(value),
            max: None,
        }
    }
}

/// Time formats accepted, tried in order: 12-hour with meridiem, 24-hour,
/// bare hour with meridiem.
const TIME_FORMATS: [&str; 3] = ["%I:%M %p", "%H:%M", "%I %p"];

/// Tokens that classify a single price number as an upper bound.
const UPPER_BOUND_MARKERS: [&str; 5] = ["<", "less", "under", "max", "not more than"];

/// Tokens that classify a single price number as a lower bound.
const LOWER_BOUND_MARKERS: [&str; 4] = [">", "more", "over", "min"];

/// Convert a time-of-day string into canonical `HH:MM`.
///
/// The first format in [`TIME_FORMATS`] that parses wins.  Input that matches
/// none of them is returned unchanged rather than discarded — "sometime soon"
/// still carries information a human (or the orchestrator) might use.
/// `None` and empty input yield `None`.
pub fn normalize_time(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    let candidate = raw.trim();
    for format in TIME_FORMATS.iter() {
        if let Ok(time) = NaiveTime::parse_from_str(candidate, format) {
            return Some(time.format("%H:%M").to_string());
        }
    }
    Some(raw.to_string())
}

/// Extract a head count from a party-size string.
///
/// Takes the first contiguous run of digits anywhere in the input ("2 people",
/// "table for 4").  Returns `None` when the input is absent, empty, contains no
/// digits, or parses to zero — a zero-person booking is treated as unparsed so
/// that a stored party size is always at least one.
pub fn normalize_party_size(raw: Option<&str>) -> Option<u32> {
    let raw = raw?;
    digit_runs(raw)
        .into_iter()
        .next()
        .and_then(|run| run.parse::<u32>().ok())
        .filter(|n| *n >= 1)
}

/// Parse a price string into a [`PriceRange`].
///
/// Every run of digits in the input is collected.  Two or more numbers become
/// `min`/`max` of the set regardless of the order they appeared in.  A single
/// number is classified by a case-insensitive keyword scan: upper-bound markers
/// ("under 30€") win over lower-bound markers ("over 15€"), and with no marker
/// at all the number is an exact target populating both bounds.  No numbers
/// means no price information.
pub fn normalize_price(raw: Option<&str>) -> Option<PriceRange> {
    let raw = raw?;
    let numbers: Vec<u32> = digit_runs(raw)
        .into_iter()
        .filter_map(|run| run.parse::<u32>().ok())
        .collect();

    match numbers.len() {
        0 => None,
        1 => {
            let value = numbers[0];
            let haystack = raw.to_lowercase();
            if UPPER_BOUND_MARKERS.iter().any(|m| haystack.contains(m)) {
                Some(PriceRange::at_most(value))
            } else if LOWER_BOUND_MARKERS.iter().any(|m| haystack.contains(m)) {
                Some(PriceRange::at_least(value))
            } else {
                Some(PriceRange::exact(value))
            }
        }
        _ => {
            let min = *numbers.iter().min().unwrap();
            let max = *numbers.iter().max().unwrap();
            Some(PriceRange {
                min: Some(min),
                max: Some(max),
            })
        }
    }
}

/// Split the input into its contiguous ASCII-digit runs, in order of appearance.
fn digit_runs(raw: &str) -> Vec<&str> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_canonical_forms_all_map_to_19_30() {
        for input in ["7:30 PM", "19:30", "7:30 pm"].iter() {
            assert_eq!(
                normalize_time(Some(input)),
                Some("19:30".to_string()),
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn time_bare_hour_with_meridiem() {
        assert_eq!(normalize_time(Some("7 PM")), Some("19:00".to_string()));
        assert_eq!(normalize_time(Some("12 AM")), Some("00:00".to_string()));
    }

    #[test]
    fn time_none_and_empty_stay_none() {
        assert_eq!(normalize_time(None), None);
        assert_eq!(normalize_time(Some("")), None);
    }

    #[test]
    fn time_unparseable_passes_through_unchanged() {
        assert_eq!(
            normalize_time(Some("sometime soon")),
            Some("sometime soon".to_string())
        );
    }

    #[test]
    fn party_size_extracts_first_digit_run() {
        assert_eq!(normalize_party_size(Some("2 people")), Some(2));
        assert_eq!(normalize_party_size(Some("a table for 12, maybe 14")), Some(12));
    }

    #[test]
    fn party_size_rejects_absent_and_digitless_input() {
        assert_eq!(normalize_party_size(None), None);
        assert_eq!(normalize_party_size(Some("no idea")), None);
        assert_eq!(normalize_party_size(Some("")), None);
    }

    #[test]
    fn party_size_rejects_zero() {
        assert_eq!(normalize_party_size(Some("0 people")), None);
    }

    #[test]
    fn price_two_numbers_become_min_and_max() {
        let range = normalize_price(Some("20-50€")).unwrap();
        assert_eq!(range.min, Some(20));
        assert_eq!(range.max, Some(50));

        // Order of appearance does not matter.
        let range = normalize_price(Some("at most 50, at least 20")).unwrap();
        assert_eq!(range.min, Some(20));
        assert_eq!(range.max, Some(50));
    }

    #[test]
    fn price_single_number_with_upper_bound_marker() {
        let range = normalize_price(Some("under 30€")).unwrap();
        assert_eq!(range.min, None);
        assert_eq!(range.max, Some(30));

        let range = normalize_price(Some("not more than 30€")).unwrap();
        assert_eq!(range.min, None);
        assert_eq!(range.max, Some(30));
    }

    #[test]
    fn price_single_number_with_lower_bound_marker() {
        let range = normalize_price(Some("over 15€")).unwrap();
        assert_eq!(range.min, Some(15));
        assert_eq!(range.max, None);
    }

    #[test]
    fn price_bare_number_is_exact_target() {
        let range = normalize_price(Some("30€")).unwrap();
        assert_eq!(range.min, Some(30));
        assert_eq!(range.max, Some(30));
    }

    #[test]
    fn price_without_numbers_is_none() {
        assert_eq!(normalize_price(Some("cheap-ish")), None);
        assert_eq!(normalize_price(None), None);
    }
}
