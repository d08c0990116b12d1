use crate::{
    auth::{backend::Auth, get_auth_object},
    error::{ClubError, SqlxAction, SqlxSnafu},
    event_registration::registration_counts,
    events::all_events,
    members::all_members,
    notice::NoticeQuery,
    state::ClubState,
    stats::{members_per_faculty, members_per_level, per_event, DashboardCounts},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use snafu::ResultExt;
use sqlx::{FromRow, Pool, Postgres};
use std::collections::HashMap;

async fn fetch_counts(pool: &Pool<Postgres>) -> Result<DashboardCounts, ClubError> {
    #[derive(FromRow)]
    struct Row {
        alumni: i64,
        events: i64,
        upcoming_events: i64,
        pending_feedback: i64,
    }

    let Row {
        alumni,
        events,
        upcoming_events,
        pending_feedback,
    } = sqlx::query_as::<_, Row>(
        r#"
SELECT
    (SELECT COUNT(*) FROM alumni) AS alumni,
    (SELECT COUNT(*) FROM events) AS events,
    (SELECT COUNT(*) FROM events WHERE starts_at >= LOCALTIMESTAMP) AS upcoming_events,
    (SELECT COUNT(*) FROM feedback WHERE NOT is_approved) AS pending_feedback
        "#,
    )
    .fetch_one(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::CountingTotals,
    })?;

    Ok(DashboardCounts {
        members: 0,
        alumni,
        events,
        upcoming_events,
        pending_feedback,
    })
}

async fn attendance_counts(pool: &Pool<Postgres>) -> Result<HashMap<i32, i64>, ClubError> {
    let rows: Vec<(i32, i64)> =
        sqlx::query_as("SELECT event_id, COUNT(*) FROM event_attendance GROUP BY event_id")
            .fetch_all(pool)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingAttendance(None),
            })?;

    Ok(rows.into_iter().collect())
}

#[axum::debug_handler]
async fn get_dashboard(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let members = all_members(state.pool()).await?;
    let events = all_events(state.pool()).await?;

    let mut counts = fetch_counts(state.pool()).await?;
    counts.members = members.len() as i64;

    let registrations = per_event(&events, &registration_counts(state.pool()).await?);
    let attendance = per_event(&events, &attendance_counts(state.pool()).await?);

    state
        .compile(
            "www/admin/dashboard.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "counts": counts,
                "members_per_faculty": members_per_faculty(&members),
                "members_per_level": members_per_level(&members),
                "registrations_per_event": registrations,
                "attendance_per_event": attendance,
            }),
            Some("Admin Dashboard".into()),
        )
        .await
}

pub fn router() -> Router<ClubState> {
    Router::new().route("/admin", get(get_dashboard))
}
