use crate::state::db_objects::DbEvent;
use chrono::{Duration, NaiveDateTime};
use icalendar::{Calendar, Component, Event, EventLike};

///used when an event has no end time
pub const DEFAULT_EVENT_LENGTH_HOURS: i64 = 2;

pub fn event_end(event: &DbEvent) -> NaiveDateTime {
    event
        .ends_at
        .unwrap_or(event.starts_at + Duration::hours(DEFAULT_EVENT_LENGTH_HOURS))
}

pub fn event_to_ics(event: &DbEvent, domain: &str) -> String {
    let host = domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    let mut ical_event = Event::new();
    ical_event
        .uid(&format!("event-{}@{host}", event.id))
        .summary(&event.title)
        .starts(event.starts_at)
        .ends(event_end(event));

    if let Some(description) = &event.description {
        ical_event.description(description);
    }
    if let Some(location) = &event.location {
        ical_event.location(location);
    }

    let mut calendar = Calendar::new();
    calendar.push(ical_event.done());
    calendar.done().to_string()
}

///turns an event title into something safe for a `Content-Disposition` filename
pub fn ics_filename(event: &DbEvent) -> String {
    let slug: String = event
        .title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        format!("event-{}.ics", event.id)
    } else {
        format!("{slug}.ics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(ends_at: Option<NaiveDateTime>) -> DbEvent {
        DbEvent {
            id: 7,
            title: "Climate Action Walk!".into(),
            description: Some("Bring water".into()),
            starts_at: NaiveDate::from_ymd_opt(2024, 9, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            ends_at,
            location: Some("Main Gate".into()),
            max_attendees: None,
            is_published: true,
            registration_required: true,
            image_url: None,
        }
    }

    #[test]
    fn missing_end_defaults_to_two_hours() {
        let ics = event_to_ics(&event(None), "ahsac.org");
        assert!(ics.contains("DTSTART:20240901T100000"));
        assert!(ics.contains("DTEND:20240901T120000"));
        assert!(ics.contains("SUMMARY:Climate Action Walk!"));
        assert!(ics.contains("LOCATION:Main Gate"));
        assert!(ics.contains("UID:event-7@ahsac.org"));
    }

    #[test]
    fn explicit_end_is_kept() {
        let end = NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(16, 30, 0)
            .unwrap();
        let ics = event_to_ics(&event(Some(end)), "https://ahsac.org/");
        assert!(ics.contains("DTEND:20240901T163000"));
        assert!(ics.contains("UID:event-7@ahsac.org"));
    }

    #[test]
    fn filenames() {
        assert_eq!(ics_filename(&event(None)), "climate-action-walk.ics");

        let mut e = event(None);
        e.title = "!!!".into();
        assert_eq!(ics_filename(&e), "event-7.ics");
    }
}
