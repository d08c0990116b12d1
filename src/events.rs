//! Event queries, the admin event form, and how events are shown on pages.

use crate::{
    calendar::event_end,
    error::{ClubError, SqlxAction, SqlxSnafu},
    event_registration::Capacity,
    liquid_utils::CustomFormat,
    state::db_objects::{DbEvent, DbRegistration, EVENT_COLUMNS},
    validation::{non_blank, FieldErrors},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::{Pool, Postgres};

///what `<input type="datetime-local">` posts
pub const HTML_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Serialize, Debug, Clone)]
pub struct EventView {
    #[serde(flatten)]
    pub event: DbEvent,
    pub starts: String,
    pub ends: String,
    pub starts_input: String,
    pub ends_input: String,
    pub capacity: Capacity,
    pub spots_label: String,
    pub is_fully_booked: bool,
    pub is_past: bool,
}

impl EventView {
    pub fn new(event: DbEvent, registered: i64, fmt: &str, now: NaiveDateTime) -> Self {
        let capacity = Capacity::new(event.max_attendees, registered);
        Self {
            starts: event.starts_at.to_env_string(fmt),
            ends: event_end(&event).to_env_string(fmt),
            starts_input: event.starts_at.format(HTML_DATETIME_FORMAT).to_string(),
            ends_input: event
                .ends_at
                .map(|e| e.format(HTML_DATETIME_FORMAT).to_string())
                .unwrap_or_default(),
            spots_label: capacity.label(),
            is_fully_booked: capacity.is_fully_booked(),
            is_past: event_end(&event) < now,
            capacity,
            event,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct EventForm {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: String,
    pub ends_at: Option<String>,
    pub location: Option<String>,
    pub max_attendees: Option<String>,
    pub image_url: Option<String>,
    ///checkboxes are only sent when ticked
    pub is_published: Option<String>,
    pub registration_required: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub max_attendees: Option<i32>,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub registration_required: bool,
}

impl EventForm {
    pub fn to_liquid(&self) -> liquid::Object {
        liquid::object!({
            "title": self.title.as_str(),
            "description": self.description.clone().unwrap_or_default(),
            "starts_input": self.starts_at.as_str(),
            "ends_input": self.ends_at.clone().unwrap_or_default(),
            "location": self.location.clone().unwrap_or_default(),
            "max_attendees": self.max_attendees.clone().unwrap_or_default(),
            "image_url": self.image_url.clone().unwrap_or_default(),
            "is_published": self.is_published.is_some(),
            "registration_required": self.registration_required.is_some(),
        })
    }

    pub fn validate(self) -> Result<NewEvent, FieldErrors> {
        let mut errors = FieldErrors::new();

        if errors.required("title", &self.title, "Title") {
            errors.max_len("title", self.title.trim(), 200, "Title");
        }

        let starts_at = NaiveDateTime::parse_from_str(self.starts_at.trim(), HTML_DATETIME_FORMAT).ok();
        if starts_at.is_none() {
            errors.add("starts_at", "Please enter a start date and time");
        }

        let ends_at = match non_blank(self.ends_at) {
            None => None,
            Some(e) => match NaiveDateTime::parse_from_str(&e, HTML_DATETIME_FORMAT) {
                Ok(e) => Some(e),
                Err(_) => {
                    errors.add("ends_at", "Please enter a valid end date and time");
                    None
                }
            },
        };
        if let (Some(s), Some(e)) = (starts_at, ends_at) {
            if e < s {
                errors.add("ends_at", "The event can't end before it starts");
            }
        }

        let max_attendees = match non_blank(self.max_attendees) {
            None => None,
            Some(m) => match m.parse::<i32>() {
                Ok(m) if m >= 0 => Some(m),
                _ => {
                    errors.add("max_attendees", "Max attendees must be a whole number, or blank for no limit");
                    None
                }
            },
        };

        match starts_at {
            Some(starts_at) if errors.is_empty() => Ok(NewEvent {
                title: self.title.trim().to_string(),
                description: non_blank(self.description),
                starts_at,
                ends_at,
                location: non_blank(self.location),
                max_attendees,
                image_url: non_blank(self.image_url),
                is_published: self.is_published.is_some(),
                registration_required: self.registration_required.is_some(),
            }),
            _ => Err(errors),
        }
    }
}

pub async fn published_events(pool: &Pool<Postgres>) -> Result<Vec<DbEvent>, ClubError> {
    sqlx::query_as::<_, DbEvent>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE is_published ORDER BY starts_at"
    ))
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAllEvents,
    })
}

pub async fn all_events(pool: &Pool<Postgres>) -> Result<Vec<DbEvent>, ClubError> {
    sqlx::query_as::<_, DbEvent>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAllEvents,
    })
}

pub async fn find_event(pool: &Pool<Postgres>, id: i32) -> Result<DbEvent, ClubError> {
    sqlx::query_as::<_, DbEvent>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingEvent(id),
        })
}

///visitors only ever see published events
pub async fn find_published_event(pool: &Pool<Postgres>, id: i32) -> Result<DbEvent, ClubError> {
    sqlx::query_as::<_, DbEvent>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND is_published"
    ))
    .bind(id)
    .fetch_one(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingEvent(id),
    })
}

pub async fn add_event(pool: &Pool<Postgres>, event: &NewEvent) -> Result<i32, ClubError> {
    sqlx::query_scalar(
        r#"
INSERT INTO public.events
(title, description, starts_at, ends_at, location, max_attendees, image_url, is_published, registration_required)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
RETURNING id
        "#,
    )
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.starts_at)
    .bind(event.ends_at)
    .bind(&event.location)
    .bind(event.max_attendees)
    .bind(&event.image_url)
    .bind(event.is_published)
    .bind(event.registration_required)
    .fetch_one(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingEvent,
    })
}

pub async fn update_event(pool: &Pool<Postgres>, id: i32, event: &NewEvent) -> Result<(), ClubError> {
    sqlx::query(
        r#"
UPDATE public.events
SET title = $2, description = $3, starts_at = $4, ends_at = $5, location = $6, max_attendees = $7, image_url = $8, is_published = $9, registration_required = $10
WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.starts_at)
    .bind(event.ends_at)
    .bind(&event.location)
    .bind(event.max_attendees)
    .bind(&event.image_url)
    .bind(event.is_published)
    .bind(event.registration_required)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingEvent(id),
    })?;
    Ok(())
}

pub async fn toggle_published(pool: &Pool<Postgres>, id: i32) -> Result<(), ClubError> {
    sqlx::query("UPDATE public.events SET is_published = NOT is_published WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::UpdatingEvent(id),
        })?;
    Ok(())
}

pub async fn delete_event(pool: &Pool<Postgres>, id: i32) -> Result<(), ClubError> {
    sqlx::query("DELETE FROM public.events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::RemovingEvent(id),
        })?;
    Ok(())
}

pub async fn registrations_for(
    pool: &Pool<Postgres>,
    event_id: i32,
) -> Result<Vec<DbRegistration>, ClubError> {
    sqlx::query_as::<_, DbRegistration>(
        r#"
SELECT id, event_id, full_name, email, whatsapp_number, created_at
FROM event_registrations
WHERE event_id = $1
ORDER BY created_at
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingRegistrations(Some(event_id)),
    })
}

pub async fn delete_registration(pool: &Pool<Postgres>, id: i32) -> Result<Option<i32>, ClubError> {
    sqlx::query_scalar("DELETE FROM public.event_registrations WHERE id = $1 RETURNING event_id")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::RemovingRegistration(id),
        })
}

///events a member has been checked in to, newest first
pub async fn attended_by_member(
    pool: &Pool<Postgres>,
    member_id: i32,
) -> Result<Vec<DbEvent>, ClubError> {
    sqlx::query_as::<_, DbEvent>(
        r#"
SELECT e.id, e.title, e.description, e.starts_at, e.ends_at, e.location, e.max_attendees, e.is_published, e.registration_required, e.image_url
FROM events e
INNER JOIN event_attendance a ON a.event_id = e.id
WHERE a.member_id = $1
ORDER BY e.starts_at DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAttendance(None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EventForm {
        EventForm {
            title: " Beach Clean-up ".into(),
            description: Some(String::new()),
            starts_at: "2024-10-05T08:00".into(),
            ends_at: Some(String::new()),
            location: Some("Bar Beach".into()),
            max_attendees: Some("40".into()),
            image_url: None,
            is_published: Some("on".into()),
            registration_required: None,
        }
    }

    #[test]
    fn parses_datetime_local_inputs() {
        let event = form().validate().unwrap();
        assert_eq!(event.title, "Beach Clean-up");
        assert_eq!(event.starts_at.to_string(), "2024-10-05 08:00:00");
        assert_eq!(event.ends_at, None);
        assert_eq!(event.description, None);
        assert_eq!(event.max_attendees, Some(40));
        assert!(event.is_published);
        assert!(!event.registration_required);
    }

    #[test]
    fn blank_max_means_uncapped_and_negative_is_rejected() {
        let mut f = form();
        f.max_attendees = Some(" ".into());
        assert_eq!(f.validate().unwrap().max_attendees, None);

        let mut f = form();
        f.max_attendees = Some("-3".into());
        assert!(f.validate().unwrap_err().get("max_attendees").is_some());
    }

    #[test]
    fn end_before_start() {
        let mut f = form();
        f.ends_at = Some("2024-10-05T07:00".into());
        assert_eq!(
            f.validate().unwrap_err().get("ends_at"),
            Some("The event can't end before it starts")
        );
    }

    #[test]
    fn views_show_capacity() {
        let event = form().validate().unwrap();
        let db = DbEvent {
            id: 1,
            title: event.title,
            description: None,
            starts_at: event.starts_at,
            ends_at: None,
            location: None,
            max_attendees: Some(2),
            is_published: true,
            registration_required: true,
            image_url: None,
        };

        let view = EventView::new(db, 2, "%d/%m/%Y %H:%M", event.starts_at);
        assert!(view.is_fully_booked);
        assert_eq!(view.spots_label, "Fully Booked");
        assert_eq!(view.ends, "05/10/2024 10:00");
        assert!(!view.is_past);
    }
}
