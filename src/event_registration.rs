//! Registering visitors for events, with the optional attendee cap.
//!
//! The cap check and the insert happen inside one transaction that holds a row lock on the event,
//! so two people can't both take the last spot.

use crate::{
    calendar::event_end,
    error::{ClubError, SqlxAction, SqlxSnafu},
    state::db_objects::{DbEvent, EVENT_COLUMNS},
    validation::{non_blank, FieldErrors},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::{Pool, Postgres};
use std::collections::HashMap;

pub const UNIQUE_REGISTRANT_CONSTRAINT: &str = "event_registrations_unique_registrant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub max_attendees: Option<i32>,
    pub registered: i64,
}

impl Capacity {
    pub fn new(max_attendees: Option<i32>, registered: i64) -> Self {
        Self {
            max_attendees,
            registered,
        }
    }

    ///`None` means the event has no cap
    pub fn spots_left(&self) -> Option<i64> {
        self.max_attendees
            .map(|max| (i64::from(max) - self.registered).max(0))
    }

    pub fn is_fully_booked(&self) -> bool {
        self.spots_left().is_some_and(|left| left <= 0)
    }

    pub fn label(&self) -> String {
        match self.spots_left() {
            None => "Open".into(),
            Some(0) => "Fully Booked".into(),
            Some(1) => "1 spot left".into(),
            Some(n) => format!("{n} spots left"),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: Option<String>,
    pub whatsapp_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub full_name: String,
    pub email: Option<String>,
    pub whatsapp_number: Option<String>,
}

impl RegistrationForm {
    pub fn validate(self) -> Result<NewRegistration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = non_blank(self.email);
        let whatsapp_number = non_blank(self.whatsapp_number);

        if errors.required("full_name", &self.full_name, "Full name") {
            errors.max_len("full_name", self.full_name.trim(), 120, "Full name");
        }
        errors.optional_email("email", email.as_deref());
        errors.optional_phone("whatsapp_number", whatsapp_number.as_deref());

        errors.into_result().map(|()| NewRegistration {
            full_name: self.full_name.trim().to_string(),
            email,
            whatsapp_number,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Inserted,
    Duplicate,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyRegistered,
    FullyBooked,
    RegistrationClosed,
    EventNotFound,
    Invalid(FieldErrors),
}

#[async_trait::async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_event(&self, event_id: i32) -> Result<Option<DbEvent>, ClubError>;

    ///must check the cap and insert atomically
    async fn insert_within_capacity(
        &self,
        event_id: i32,
        max_attendees: Option<i32>,
        registration: &NewRegistration,
    ) -> Result<InsertResult, ClubError>;
}

///events close once they've ended, as well as when unpublished or not taking registrations
#[instrument(level = "debug", skip(store, form))]
pub async fn register_for_event(
    store: &impl RegistrationStore,
    event_id: i32,
    form: RegistrationForm,
    now: NaiveDateTime,
) -> Result<RegisterOutcome, ClubError> {
    let registration = match form.validate() {
        Ok(r) => r,
        Err(errors) => return Ok(RegisterOutcome::Invalid(errors)),
    };

    let Some(event) = store.find_event(event_id).await? else {
        return Ok(RegisterOutcome::EventNotFound);
    };
    if !event.is_published || !event.registration_required || event_end(&event) < now {
        return Ok(RegisterOutcome::RegistrationClosed);
    }

    let result = match store
        .insert_within_capacity(event_id, event.max_attendees, &registration)
        .await
    {
        Ok(r) => r,
        Err(e) if e.unique_violation() == Some(UNIQUE_REGISTRANT_CONSTRAINT) => {
            InsertResult::Duplicate
        }
        Err(e) => return Err(e),
    };

    Ok(match result {
        InsertResult::Inserted => {
            info!(%event_id, "New event registration");
            RegisterOutcome::Registered
        }
        InsertResult::Duplicate => RegisterOutcome::AlreadyRegistered,
        InsertResult::Full => RegisterOutcome::FullyBooked,
    })
}

#[derive(Clone, Debug)]
pub struct PgRegistrationStore {
    pool: Pool<Postgres>,
}

impl PgRegistrationStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn find_event(&self, event_id: i32) -> Result<Option<DbEvent>, ClubError> {
        sqlx::query_as::<_, DbEvent>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingEvent(event_id),
            })
    }

    async fn insert_within_capacity(
        &self,
        event_id: i32,
        max_attendees: Option<i32>,
        registration: &NewRegistration,
    ) -> Result<InsertResult, ClubError> {
        let mut tx = self.pool.begin().await.context(SqlxSnafu {
            action: SqlxAction::BeginningTransaction,
        })?;

        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingEvent(event_id),
            })?;

        let already: bool = sqlx::query_scalar(
            r#"
SELECT EXISTS (
    SELECT 1 FROM event_registrations
    WHERE event_id = $1 AND LOWER(TRIM(full_name)) = LOWER(TRIM($2))
)"#,
        )
        .bind(event_id)
        .bind(&registration.full_name)
        .fetch_one(&mut *tx)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingRegistrations(Some(event_id)),
        })?;
        if already {
            return Ok(InsertResult::Duplicate);
        }

        let registered: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM event_registrations WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await
                .context(SqlxSnafu {
                    action: SqlxAction::CountingRegistrations(event_id),
                })?;
        if Capacity::new(max_attendees, registered).is_fully_booked() {
            return Ok(InsertResult::Full);
        }

        let inserted: Option<i32> = sqlx::query_scalar(
            r#"
INSERT INTO public.event_registrations
(event_id, full_name, email, whatsapp_number)
VALUES ($1, $2, $3, $4)
ON CONFLICT DO NOTHING
RETURNING id
        "#,
        )
        .bind(event_id)
        .bind(&registration.full_name)
        .bind(&registration.email)
        .bind(&registration.whatsapp_number)
        .fetch_optional(&mut *tx)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::AddingRegistration(event_id),
        })?;

        tx.commit().await.context(SqlxSnafu {
            action: SqlxAction::CommittingTransaction,
        })?;

        Ok(if inserted.is_some() {
            InsertResult::Inserted
        } else {
            InsertResult::Duplicate
        })
    }
}

pub async fn registration_count(pool: &Pool<Postgres>, event_id: i32) -> Result<i64, ClubError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM event_registrations WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::CountingRegistrations(event_id),
        })
}

///registrations per event, events with none are missing from the map
pub async fn registration_counts(pool: &Pool<Postgres>) -> Result<HashMap<i32, i64>, ClubError> {
    let rows: Vec<(i32, i64)> = sqlx::query_as(
        "SELECT event_id, COUNT(*) FROM event_registrations GROUP BY event_id",
    )
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingRegistrations(None),
    })?;

    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::test_errors::unique_violation_on;
    use chrono::NaiveDate;
    use tokio::sync::Mutex;

    struct MemoryStore {
        event: DbEvent,
        registrations: Mutex<Vec<String>>,
        ///acts like another request inserted the same name between our check and insert
        lost_race: bool,
    }

    impl MemoryStore {
        fn new(max_attendees: Option<i32>) -> Self {
            Self {
                event: DbEvent {
                    id: 1,
                    title: "Beach clean-up".into(),
                    description: None,
                    starts_at: NaiveDate::from_ymd_opt(2025, 6, 5)
                        .unwrap()
                        .and_hms_opt(9, 0, 0)
                        .unwrap(),
                    ends_at: None,
                    location: Some("Bar Beach".into()),
                    max_attendees,
                    is_published: true,
                    registration_required: true,
                    image_url: None,
                },
                registrations: Mutex::new(vec![]),
                lost_race: false,
            }
        }
    }

    fn before_the_event() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[async_trait::async_trait]
    impl RegistrationStore for MemoryStore {
        async fn find_event(&self, event_id: i32) -> Result<Option<DbEvent>, ClubError> {
            Ok((event_id == self.event.id).then(|| self.event.clone()))
        }

        async fn insert_within_capacity(
            &self,
            _event_id: i32,
            max_attendees: Option<i32>,
            registration: &NewRegistration,
        ) -> Result<InsertResult, ClubError> {
            if self.lost_race {
                return Err(unique_violation_on(UNIQUE_REGISTRANT_CONSTRAINT));
            }
            let mut regs = self.registrations.lock().await;
            let key = registration.full_name.to_lowercase();
            if regs.contains(&key) {
                return Ok(InsertResult::Duplicate);
            }
            if Capacity::new(max_attendees, regs.len() as i64).is_fully_booked() {
                return Ok(InsertResult::Full);
            }
            regs.push(key);
            Ok(InsertResult::Inserted)
        }
    }

    fn form(name: &str) -> RegistrationForm {
        RegistrationForm {
            full_name: name.into(),
            email: Some(String::new()),
            whatsapp_number: None,
        }
    }

    #[test]
    fn capacity_arithmetic() {
        assert_eq!(Capacity::new(None, 40).spots_left(), None);
        assert!(!Capacity::new(None, 40).is_fully_booked());
        assert_eq!(Capacity::new(Some(10), 7).spots_left(), Some(3));
        assert_eq!(Capacity::new(Some(10), 7).label(), "3 spots left");
        assert_eq!(Capacity::new(Some(10), 12).spots_left(), Some(0));
    }

    #[test]
    fn n_of_n_is_fully_booked() {
        let cap = Capacity::new(Some(25), 25);
        assert!(cap.is_fully_booked());
        assert_eq!(cap.label(), "Fully Booked");
    }

    #[test]
    fn zero_cap_is_fully_booked() {
        assert!(Capacity::new(Some(0), 0).is_fully_booked());
    }

    #[tokio::test]
    async fn second_registration_is_already_registered() {
        let store = MemoryStore::new(None);

        let first = register_for_event(&store, 1, form("Chidi Okeke"), before_the_event())
            .await
            .unwrap();
        let second = register_for_event(&store, 1, form("  chidi okeke "), before_the_event())
            .await
            .unwrap();

        assert_eq!(first, RegisterOutcome::Registered);
        assert_eq!(second, RegisterOutcome::AlreadyRegistered);
        assert_eq!(store.registrations.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn full_events_refuse_registrations() {
        let store = MemoryStore::new(Some(1));

        register_for_event(&store, 1, form("Amaka"), before_the_event())
            .await
            .unwrap();
        let outcome = register_for_event(&store, 1, form("Bola"), before_the_event())
            .await
            .unwrap();

        assert_eq!(outcome, RegisterOutcome::FullyBooked);
    }

    #[tokio::test]
    async fn names_are_required() {
        let store = MemoryStore::new(None);
        let outcome = register_for_event(&store, 1, form("   "), before_the_event())
            .await
            .unwrap();

        let RegisterOutcome::Invalid(errors) = outcome else {
            panic!("expected validation failure, got {outcome:?}");
        };
        assert_eq!(errors.get("full_name"), Some("Full name is required"));
        assert!(store.registrations.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unpublished_events_are_closed() {
        let mut store = MemoryStore::new(None);
        store.event.is_published = false;

        let outcome = register_for_event(&store, 1, form("Amaka"), before_the_event())
            .await
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::RegistrationClosed);
    }

    #[tokio::test]
    async fn unknown_events() {
        let store = MemoryStore::new(None);
        let outcome = register_for_event(&store, 99, form("Amaka"), before_the_event())
            .await
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::EventNotFound);
    }

    #[tokio::test]
    async fn finished_events_are_closed() {
        let store = MemoryStore::new(None);
        //starts 09:00 with no end time, so it's over by 11:01
        let after = NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(11, 1, 0)
            .unwrap();

        let outcome = register_for_event(&store, 1, form("Amaka"), after)
            .await
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::RegistrationClosed);
        assert!(store.registrations.lock().await.is_empty());
    }

    #[tokio::test]
    async fn racing_duplicate_is_already_registered() {
        let mut store = MemoryStore::new(None);
        store.lost_race = true;

        let outcome = register_for_event(&store, 1, form("Chidi Okeke"), before_the_event())
            .await
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::AlreadyRegistered);
    }

    #[tokio::test]
    async fn other_constraint_failures_are_errors() {
        struct BrokenStore(MemoryStore);

        #[async_trait::async_trait]
        impl RegistrationStore for BrokenStore {
            async fn find_event(&self, event_id: i32) -> Result<Option<DbEvent>, ClubError> {
                self.0.find_event(event_id).await
            }

            async fn insert_within_capacity(
                &self,
                _event_id: i32,
                _max_attendees: Option<i32>,
                _registration: &NewRegistration,
            ) -> Result<InsertResult, ClubError> {
                Err(unique_violation_on("some_other_key"))
            }
        }

        let store = BrokenStore(MemoryStore::new(None));
        let result = register_for_event(&store, 1, form("Amaka"), before_the_event()).await;
        assert!(result.is_err());
    }
}
