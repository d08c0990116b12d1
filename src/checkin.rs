//! Event check-in, either from a scanned member QR code or from a manual pick.
//!
//! The browser renders and decodes the QR images; the server only deals with the JSON payload
//! `{"type":"ahsac_member","id":<member id>,"matric":"<matric number>"}`.
//!
//! `scan → decode → lookup member → duplicate check → insert`, where every step can end the flow early
//! with a [`CheckInOutcome`] instead of an error.

use crate::{
    error::{ClubError, SqlxAction, SqlxSnafu},
    state::db_objects::DbAttendance,
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::{FromRow, Pool, Postgres};

pub const MEMBER_QR_TYPE: &str = "ahsac_member";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberQrPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i32,
    pub matric: String,
}

impl MemberQrPayload {
    pub fn for_member(id: i32, matric: impl Into<String>) -> Self {
        Self {
            kind: MEMBER_QR_TYPE.into(),
            id,
            matric: matric.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "type": self.kind, "id": self.id, "matric": self.matric }).to_string()
    }

    ///`None` for anything that isn't one of our member codes
    pub fn parse(raw: &str) -> Option<Self> {
        let payload: Self = match serde_json::from_str(raw.trim()) {
            Ok(p) => p,
            Err(e) => {
                debug!(?e, "Scanned text is not a member payload");
                return None;
            }
        };

        (payload.kind == MEMBER_QR_TYPE).then_some(payload)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CheckInTarget {
    Member(i32),
    Registration(i32),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CheckInCandidate {
    pub member_id: Option<i32>,
    pub registration_id: Option<i32>,
    pub full_name: String,
    pub matric_number: Option<String>,
}

impl CheckInCandidate {
    pub fn target(&self) -> Option<CheckInTarget> {
        self.member_id
            .map(CheckInTarget::Member)
            .or(self.registration_id.map(CheckInTarget::Registration))
    }

    ///whether an attendance row for `recorded` (checked in under `recorded_name`) is this candidate.
    ///
    ///registrants and members are linked by name, so a member who also registered counts once
    pub fn is_same_attendee(&self, recorded: CheckInTarget, recorded_name: &str) -> bool {
        match (self.target(), recorded) {
            (Some(mine), recorded) if mine == recorded => true,
            (Some(CheckInTarget::Member(_)), CheckInTarget::Registration(_))
            | (Some(CheckInTarget::Registration(_)), CheckInTarget::Member(_)) => {
                same_name(&self.full_name, recorded_name)
            }
            _ => false,
        }
    }
}

///matches `LOWER(TRIM(..))` in the queries
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckInOutcome {
    CheckedIn { name: String },
    AlreadyCheckedIn { name: String },
    InvalidQrCode,
    MemberNotFound,
    EventNotFound,
}

impl CheckInOutcome {
    pub fn title(&self) -> &'static str {
        match self {
            Self::CheckedIn { .. } => "Checked In",
            Self::AlreadyCheckedIn { .. } => "Already Checked In",
            Self::InvalidQrCode => "Invalid QR Code",
            Self::MemberNotFound => "Member Not Found",
            Self::EventNotFound => "Event Not Found",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::CheckedIn { name } => format!("{name} has been checked in."),
            Self::AlreadyCheckedIn { name } => {
                format!("{name} has already been checked in to this event.")
            }
            Self::InvalidQrCode => "This QR code is not a valid member code.".into(),
            Self::MemberNotFound => "No member matches this code.".into(),
            Self::EventNotFound => "This event no longer exists.".into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::CheckedIn { .. })
    }
}

#[derive(Serialize, Debug)]
pub struct CheckInResponse {
    #[serde(flatten)]
    pub outcome: CheckInOutcome,
    pub title: &'static str,
    pub message: String,
    pub success: bool,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        Self {
            title: outcome.title(),
            message: outcome.message(),
            success: outcome.is_success(),
            outcome,
        }
    }
}

#[async_trait::async_trait]
pub trait CheckInStore: Send + Sync {
    async fn event_exists(&self, event_id: i32) -> Result<bool, ClubError>;

    ///looks a target up by id, returning the name to show
    async fn find_target(
        &self,
        event_id: i32,
        target: CheckInTarget,
    ) -> Result<Option<CheckInCandidate>, ClubError>;

    async fn find_member_by_qr(
        &self,
        payload: &MemberQrPayload,
    ) -> Result<Option<CheckInCandidate>, ClubError>;

    ///looks at rows for either kind of target, see [`CheckInCandidate::is_same_attendee`]
    async fn is_checked_in(
        &self,
        event_id: i32,
        candidate: &CheckInCandidate,
    ) -> Result<bool, ClubError>;

    ///`false` if a row for this target was already there
    async fn record(
        &self,
        event_id: i32,
        candidate: &CheckInCandidate,
        checked_in_by: i32,
    ) -> Result<bool, ClubError>;
}

#[instrument(level = "debug", skip(store, raw))]
pub async fn check_in_scanned(
    store: &impl CheckInStore,
    event_id: i32,
    raw: &str,
    checked_in_by: i32,
) -> Result<CheckInOutcome, ClubError> {
    let Some(payload) = MemberQrPayload::parse(raw) else {
        return Ok(CheckInOutcome::InvalidQrCode);
    };
    if !store.event_exists(event_id).await? {
        return Ok(CheckInOutcome::EventNotFound);
    }

    let Some(candidate) = store.find_member_by_qr(&payload).await? else {
        warn!(id = %payload.id, "Scanned member code that doesn't match a member");
        return Ok(CheckInOutcome::MemberNotFound);
    };

    check_in_candidate(store, event_id, candidate, checked_in_by).await
}

#[instrument(level = "debug", skip(store))]
pub async fn check_in_target(
    store: &impl CheckInStore,
    event_id: i32,
    target: CheckInTarget,
    checked_in_by: i32,
) -> Result<CheckInOutcome, ClubError> {
    if !store.event_exists(event_id).await? {
        return Ok(CheckInOutcome::EventNotFound);
    }
    let Some(candidate) = store.find_target(event_id, target).await? else {
        return Ok(CheckInOutcome::MemberNotFound);
    };

    check_in_candidate(store, event_id, candidate, checked_in_by).await
}

async fn check_in_candidate(
    store: &impl CheckInStore,
    event_id: i32,
    candidate: CheckInCandidate,
    checked_in_by: i32,
) -> Result<CheckInOutcome, ClubError> {
    let Some(target) = candidate.target() else {
        return Ok(CheckInOutcome::MemberNotFound);
    };

    if store.is_checked_in(event_id, &candidate).await? {
        return Ok(CheckInOutcome::AlreadyCheckedIn {
            name: candidate.full_name,
        });
    }

    //the unique indexes catch a check-in that raced us between the read above and this insert
    let recorded = store.record(event_id, &candidate, checked_in_by).await?;
    let name = candidate.full_name;
    Ok(if recorded {
        info!(%event_id, ?target, "Checked in");
        CheckInOutcome::CheckedIn { name }
    } else {
        CheckInOutcome::AlreadyCheckedIn { name }
    })
}

#[derive(Clone, Debug)]
pub struct PgCheckInStore {
    pool: Pool<Postgres>,
}

impl PgCheckInStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    ///name/matric substring search over members and this event's registrants.
    ///
    ///registrants who are also members only show up once, as the member
    pub async fn search(
        &self,
        event_id: i32,
        query: &str,
    ) -> Result<Vec<CheckInCandidate>, ClubError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }
        let pattern = format!("%{}%", escape_like(query));

        sqlx::query_as::<_, CheckInCandidate>(
            r#"
(SELECT m.id AS member_id, NULL::INTEGER AS registration_id, m.full_name, m.matric_number
 FROM members m
 WHERE m.full_name ILIKE $2 OR m.matric_number ILIKE $2
 ORDER BY m.full_name
 LIMIT 20)
UNION ALL
(SELECT NULL::INTEGER AS member_id, r.id AS registration_id, r.full_name, NULL::TEXT AS matric_number
 FROM event_registrations r
 WHERE r.event_id = $1 AND r.full_name ILIKE $2
 AND NOT EXISTS (
     SELECT 1 FROM members m2 WHERE LOWER(TRIM(m2.full_name)) = LOWER(TRIM(r.full_name))
 )
 ORDER BY r.full_name
 LIMIT 20)
        "#,
        )
        .bind(event_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::SearchingMembers,
        })
    }

    pub async fn attendance(&self, event_id: i32) -> Result<Vec<DbAttendance>, ClubError> {
        sqlx::query_as::<_, DbAttendance>(
            r#"
SELECT a.id, a.event_id, a.member_id, a.registration_id, a.attendee_name,
       a.attendee_matric AS matric_number, a.checked_in_at, u.email AS checked_in_by
FROM event_attendance a
LEFT JOIN users u ON u.id = a.checked_in_by
WHERE a.event_id = $1
ORDER BY a.checked_in_at DESC
        "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingAttendance(Some(event_id)),
        })
    }

    ///returns the event the removed row belonged to
    pub async fn undo(&self, attendance_id: i32) -> Result<Option<i32>, ClubError> {
        sqlx::query_scalar("DELETE FROM event_attendance WHERE id = $1 RETURNING event_id")
            .bind(attendance_id)
            .fetch_optional(&self.pool)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::RemovingAttendance(attendance_id),
            })
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait::async_trait]
impl CheckInStore for PgCheckInStore {
    async fn event_exists(&self, event_id: i32) -> Result<bool, ClubError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingEvent(event_id),
            })
    }

    async fn find_target(
        &self,
        event_id: i32,
        target: CheckInTarget,
    ) -> Result<Option<CheckInCandidate>, ClubError> {
        let query = match target {
            CheckInTarget::Member(id) => sqlx::query_as::<_, CheckInCandidate>(
                r#"
SELECT id AS member_id, NULL::INTEGER AS registration_id, full_name, matric_number
FROM members WHERE id = $1
                "#,
            )
            .bind(id),
            CheckInTarget::Registration(id) => sqlx::query_as::<_, CheckInCandidate>(
                r#"
SELECT NULL::INTEGER AS member_id, id AS registration_id, full_name, NULL::TEXT AS matric_number
FROM event_registrations WHERE id = $1 AND event_id = $2
                "#,
            )
            .bind(id)
            .bind(event_id),
        };

        query
            .fetch_optional(&self.pool)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::SearchingMembers,
            })
    }

    async fn find_member_by_qr(
        &self,
        payload: &MemberQrPayload,
    ) -> Result<Option<CheckInCandidate>, ClubError> {
        sqlx::query_as::<_, CheckInCandidate>(
            r#"
SELECT id AS member_id, NULL::INTEGER AS registration_id, full_name, matric_number
FROM members WHERE id = $1 AND matric_number = $2
            "#,
        )
        .bind(payload.id)
        .bind(&payload.matric)
        .fetch_optional(&self.pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::SearchingMembers,
        })
    }

    async fn is_checked_in(
        &self,
        event_id: i32,
        candidate: &CheckInCandidate,
    ) -> Result<bool, ClubError> {
        sqlx::query_scalar(
            r#"
SELECT EXISTS (
    SELECT 1 FROM event_attendance
    WHERE event_id = $1
    AND (
        member_id = $2
        OR registration_id = $3
        OR ($2::INTEGER IS NOT NULL AND registration_id IS NOT NULL
            AND LOWER(TRIM(attendee_name)) = LOWER(TRIM($4)))
        OR ($3::INTEGER IS NOT NULL AND member_id IS NOT NULL
            AND LOWER(TRIM(attendee_name)) = LOWER(TRIM($4)))
    )
)"#,
        )
        .bind(event_id)
        .bind(candidate.member_id)
        .bind(candidate.registration_id)
        .bind(&candidate.full_name)
        .fetch_one(&self.pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingAttendance(Some(event_id)),
        })
    }

    async fn record(
        &self,
        event_id: i32,
        candidate: &CheckInCandidate,
        checked_in_by: i32,
    ) -> Result<bool, ClubError> {
        sqlx::query(
            r#"
INSERT INTO public.event_attendance
(event_id, member_id, registration_id, attendee_name, attendee_matric, checked_in_by)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(candidate.member_id)
        .bind(candidate.registration_id)
        .bind(&candidate.full_name)
        .bind(&candidate.matric_number)
        .bind(checked_in_by)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected() == 1)
        .context(SqlxSnafu {
            action: SqlxAction::AddingAttendance { event_id },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct MemoryStore {
        events: Vec<i32>,
        members: Vec<(i32, String, String)>,
        registrations: Vec<(i32, String)>,
        attendance: Mutex<Vec<(i32, CheckInTarget, String)>>,
        lookups: AtomicUsize,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                events: vec![5, 6],
                members: vec![],
                registrations: vec![],
                attendance: Mutex::new(vec![]),
                lookups: AtomicUsize::new(0),
            }
        }

        fn member(mut self, id: i32, name: &str, matric: &str) -> Self {
            self.members.push((id, name.into(), matric.into()));
            self
        }

        fn registrant(mut self, id: i32, name: &str) -> Self {
            self.registrations.push((id, name.into()));
            self
        }

        fn candidate(&self, target: CheckInTarget) -> Option<CheckInCandidate> {
            match target {
                CheckInTarget::Member(id) => self
                    .members
                    .iter()
                    .find(|(mid, _, _)| *mid == id)
                    .map(|(id, name, matric)| CheckInCandidate {
                        member_id: Some(*id),
                        registration_id: None,
                        full_name: name.clone(),
                        matric_number: Some(matric.clone()),
                    }),
                CheckInTarget::Registration(id) => self
                    .registrations
                    .iter()
                    .find(|(rid, _)| *rid == id)
                    .map(|(id, name)| CheckInCandidate {
                        member_id: None,
                        registration_id: Some(*id),
                        full_name: name.clone(),
                        matric_number: None,
                    }),
            }
        }
    }

    #[async_trait::async_trait]
    impl CheckInStore for MemoryStore {
        async fn event_exists(&self, event_id: i32) -> Result<bool, ClubError> {
            Ok(self.events.contains(&event_id))
        }

        async fn find_target(
            &self,
            _event_id: i32,
            target: CheckInTarget,
        ) -> Result<Option<CheckInCandidate>, ClubError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidate(target))
        }

        async fn find_member_by_qr(
            &self,
            payload: &MemberQrPayload,
        ) -> Result<Option<CheckInCandidate>, ClubError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .candidate(CheckInTarget::Member(payload.id))
                .filter(|c| c.matric_number.as_deref() == Some(payload.matric.as_str())))
        }

        async fn is_checked_in(
            &self,
            event_id: i32,
            candidate: &CheckInCandidate,
        ) -> Result<bool, ClubError> {
            Ok(self
                .attendance
                .lock()
                .await
                .iter()
                .any(|(e, target, name)| *e == event_id && candidate.is_same_attendee(*target, name)))
        }

        async fn record(
            &self,
            event_id: i32,
            candidate: &CheckInCandidate,
            _checked_in_by: i32,
        ) -> Result<bool, ClubError> {
            let Some(target) = candidate.target() else {
                return Ok(false);
            };
            let mut rows = self.attendance.lock().await;
            if rows.iter().any(|(e, t, _)| *e == event_id && *t == target) {
                return Ok(false);
            }
            rows.push((event_id, target, candidate.full_name.clone()));
            Ok(true)
        }
    }

    #[test]
    fn payload_matches_printed_codes() {
        let payload = MemberQrPayload::for_member(12, "ENG/19/0123");
        let parsed: serde_json::Value = serde_json::from_str(&payload.to_json()).unwrap();

        assert_eq!(parsed["type"], "ahsac_member");
        assert_eq!(parsed["id"], 12);
        assert_eq!(parsed["matric"], "ENG/19/0123");
        assert_eq!(MemberQrPayload::parse(&payload.to_json()), Some(payload));
    }

    #[test]
    fn foreign_codes_do_not_parse() {
        assert_eq!(
            MemberQrPayload::parse(r#"{"type":"wifi","id":1,"matric":"x"}"#),
            None
        );
        assert_eq!(MemberQrPayload::parse("https://example.com"), None);
        assert_eq!(MemberQrPayload::parse(r#"{"type":"ahsac_member"}"#), None);
    }

    #[tokio::test]
    async fn wrong_type_is_invalid_and_writes_nothing() {
        let store = MemoryStore::new().member(1, "Ngozi Eze", "190404012");

        let outcome = check_in_scanned(
            &store,
            5,
            r#"{"type":"library_card","id":1,"matric":"190404012"}"#,
            99,
        )
        .await
        .unwrap();

        assert_eq!(outcome, CheckInOutcome::InvalidQrCode);
        assert_eq!(outcome.title(), "Invalid QR Code");
        assert!(store.attendance.lock().await.is_empty());
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scanning_twice_is_already_checked_in() {
        let store = MemoryStore::new().member(1, "Ngozi Eze", "190404012");
        let raw = MemberQrPayload::for_member(1, "190404012").to_json();

        let first = check_in_scanned(&store, 5, &raw, 99).await.unwrap();
        let second = check_in_scanned(&store, 5, &raw, 99).await.unwrap();

        assert_eq!(first, CheckInOutcome::CheckedIn { name: "Ngozi Eze".into() });
        assert_eq!(
            second,
            CheckInOutcome::AlreadyCheckedIn { name: "Ngozi Eze".into() }
        );
        assert_eq!(second.title(), "Already Checked In");
        assert_eq!(store.attendance.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn member_scanned_then_picked_as_registrant_counts_once() {
        let store = MemoryStore::new()
            .member(1, "Chidi Okeke", "190404001")
            .registrant(40, "  chidi okeke");
        let raw = MemberQrPayload::for_member(1, "190404001").to_json();

        let scanned = check_in_scanned(&store, 5, &raw, 99).await.unwrap();
        let picked = check_in_target(&store, 5, CheckInTarget::Registration(40), 99)
            .await
            .unwrap();

        assert!(scanned.is_success());
        assert_eq!(
            picked,
            CheckInOutcome::AlreadyCheckedIn { name: "  chidi okeke".into() }
        );
        assert_eq!(store.attendance.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn registrant_picked_then_scanned_as_member_counts_once() {
        let store = MemoryStore::new()
            .member(1, "Chidi Okeke", "190404001")
            .registrant(40, "Chidi Okeke");
        let raw = MemberQrPayload::for_member(1, "190404001").to_json();

        check_in_target(&store, 5, CheckInTarget::Registration(40), 99)
            .await
            .unwrap();
        let scanned = check_in_scanned(&store, 5, &raw, 99).await.unwrap();

        assert_eq!(
            scanned,
            CheckInOutcome::AlreadyCheckedIn { name: "Chidi Okeke".into() }
        );
        assert_eq!(store.attendance.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn different_registrants_are_not_confused_with_members() {
        let store = MemoryStore::new()
            .member(1, "Chidi Okeke", "190404001")
            .registrant(40, "Amaka Obi");

        check_in_target(&store, 5, CheckInTarget::Member(1), 99).await.unwrap();
        let other = check_in_target(&store, 5, CheckInTarget::Registration(40), 99)
            .await
            .unwrap();

        assert!(other.is_success());
        assert_eq!(store.attendance.lock().await.len(), 2);
    }

    #[test]
    fn same_attendee_rules() {
        let member = CheckInCandidate {
            member_id: Some(1),
            registration_id: None,
            full_name: "Ngozi Eze".into(),
            matric_number: Some("190404012".into()),
        };

        assert!(member.is_same_attendee(CheckInTarget::Member(1), "Someone Else"));
        assert!(member.is_same_attendee(CheckInTarget::Registration(3), "NGOZI EZE "));
        assert!(!member.is_same_attendee(CheckInTarget::Registration(3), "Ngozi Obi"));
        //two members sharing a name are still two people
        assert!(!member.is_same_attendee(CheckInTarget::Member(2), "Ngozi Eze"));
    }

    #[tokio::test]
    async fn same_member_at_another_event_is_fine() {
        let store = MemoryStore::new().member(1, "Ngozi Eze", "190404012");

        check_in_target(&store, 5, CheckInTarget::Member(1), 99).await.unwrap();
        let other = check_in_target(&store, 6, CheckInTarget::Member(1), 99)
            .await
            .unwrap();

        assert!(other.is_success());
    }

    #[tokio::test]
    async fn mismatched_matric_is_not_found() {
        let store = MemoryStore::new().member(1, "Ngozi Eze", "190404012");
        let raw = MemberQrPayload::for_member(1, "000000000").to_json();

        let outcome = check_in_scanned(&store, 5, &raw, 99).await.unwrap();
        assert_eq!(outcome, CheckInOutcome::MemberNotFound);
        assert!(store.attendance.lock().await.is_empty());
    }

    #[tokio::test]
    async fn manual_pick_of_unknown_target() {
        let store = MemoryStore::new();
        let outcome = check_in_target(&store, 5, CheckInTarget::Registration(3), 99)
            .await
            .unwrap();
        assert_eq!(outcome, CheckInOutcome::MemberNotFound);
    }

    #[tokio::test]
    async fn unknown_event_is_reported_not_inserted() {
        let store = MemoryStore::new().member(1, "Ngozi Eze", "190404012");
        let raw = MemberQrPayload::for_member(1, "190404012").to_json();

        let scanned = check_in_scanned(&store, 404, &raw, 99).await.unwrap();
        let picked = check_in_target(&store, 404, CheckInTarget::Member(1), 99)
            .await
            .unwrap();

        assert_eq!(scanned, CheckInOutcome::EventNotFound);
        assert_eq!(picked, CheckInOutcome::EventNotFound);
        assert_eq!(scanned.title(), "Event Not Found");
        assert!(store.attendance.lock().await.is_empty());
    }

    #[test]
    fn responses_flatten_for_the_scanner() {
        let response = CheckInResponse::from(CheckInOutcome::AlreadyCheckedIn {
            name: "Ngozi".into(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "already_checked_in");
        assert_eq!(json["title"], "Already Checked In");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
