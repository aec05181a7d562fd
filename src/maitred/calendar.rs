//! Calendar-invite link generation.
//!
//! Pure string work: given an event title, an ISO-8601 start time, a duration
//! in hours, a description, and a location, produce a Google-Calendar "render"
//! URL with percent-encoded fields and `YYYYMMDDTHHMMSSZ` timestamps for the
//! start and computed end.

use crate::maitred::error::ConciergeError;
use chrono::{Duration, NaiveDateTime};

/// Timestamp layout Google Calendar expects in the `dates` parameter.
const CALENDAR_STAMP: &str = "%Y%m%dT%H%M%SZ";

/// Start-time layouts accepted, tried in order.
const START_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Build an "Add to Google Calendar" URL.
///
/// `start_time` must be ISO-8601 (e.g. `2025-10-19T19:00:00`); anything else
/// is a [`ConciergeError::DateFormat`].
///
/// ```rust
/// let url = maitred::calendar::calendar_link(
///     "Dinner",
///     "2025-10-19T19:00:00",
///     2,
///     "Reservation for 2 people",
///     "123 Rue X",
/// )
/// .unwrap();
/// assert!(url.contains("dates=20251019T190000Z/20251019T210000Z"));
/// ```
pub fn calendar_link(
    title: &str,
    start_time: &str,
    duration_hours: i64,
    description: &str,
    location: &str,
) -> Result<String, ConciergeError> {
    let start = parse_start(start_time)?;
    let end = start + Duration::hours(duration_hours);

    Ok(format!(
        "https://www.google.com/calendar/render?action=TEMPLATE\
         &text={title}\
         &dates={start}/{end}\
         &details={details}\
         &location={location}",
        title = urlencoding::encode(title),
        start = start.format(CALENDAR_STAMP),
        end = end.format(CALENDAR_STAMP),
        details = urlencoding::encode(description),
        location = urlencoding::encode(location),
    ))
}

fn parse_start(raw: &str) -> Result<NaiveDateTime, ConciergeError> {
    let candidate = raw.trim();
    for format in START_FORMATS.iter() {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(candidate, format) {
            return Ok(parsed);
        }
    }
    Err(ConciergeError::DateFormat(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_start_and_computed_end() {
        let url = calendar_link(
            "Dinner",
            "2025-10-19T19:00:00",
            2,
            "desc",
            "123 Rue X",
        )
        .unwrap();
        assert!(url.starts_with("https://www.google.com/calendar/render?action=TEMPLATE"));
        assert!(url.contains("dates=20251019T190000Z/20251019T210000Z"));
        assert!(url.contains("text=Dinner"));
    }

    #[test]
    fn percent_encodes_free_text_fields() {
        let url = calendar_link(
            "Dîner chez Paul",
            "2025-10-19T19:00",
            1,
            "Réservation pour 2 personnes",
            "13 Rue de Charonne, Paris",
        )
        .unwrap();
        assert!(url.contains("text=D%C3%AEner%20chez%20Paul"));
        assert!(url.contains("location=13%20Rue%20de%20Charonne%2C%20Paris"));
    }

    #[test]
    fn duration_can_cross_midnight() {
        let url = calendar_link("Late", "2025-12-31T23:00:00", 2, "", "").unwrap();
        assert!(url.contains("dates=20251231T230000Z/20260101T010000Z"));
    }

    #[test]
    fn non_iso_start_is_a_date_format_error() {
        let err = calendar_link("Dinner", "next sunday", 2, "", "").unwrap_err();
        assert!(matches!(err, ConciergeError::DateFormat(_)));
    }
}
