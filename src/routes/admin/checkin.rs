//! The check-in desk: a camera scanner page that posts decoded QR text, plus manual search.
//!
//! The scanner talks JSON so it can show a toast without reloading the page.

use crate::{
    auth::{backend::Auth, get_auth_object},
    checkin::{
        check_in_scanned, check_in_target, CheckInCandidate, CheckInResponse, CheckInTarget,
        PgCheckInStore,
    },
    error::ClubError,
    events::{find_event, EventView},
    notice::{Notice, NoticeQuery},
    state::ClubState,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

#[axum::debug_handler]
async fn get_checkin(
    auth: Auth,
    State(state): State<ClubState>,
    Path(event_id): Path<i32>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let event = find_event(state.pool(), event_id).await?;
    let attendance = PgCheckInStore::new(state.pool().clone())
        .attendance(event_id)
        .await?;
    let view = EventView::new(
        event,
        0,
        &state.settings.niche.date_time_format,
        chrono::Local::now().naive_local(),
    );
    let title = format!("Check-in: {}", view.event.title);

    state
        .compile(
            "www/admin/checkin.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "event": view,
                "attendance": attendance,
                "attendance_count": attendance.len(),
            }),
            Some(title),
        )
        .await
}

#[derive(Deserialize)]
struct Scan {
    payload: String,
}

#[axum::debug_handler]
async fn post_scan(
    auth: Auth,
    State(state): State<ClubState>,
    Path(event_id): Path<i32>,
    Json(Scan { payload }): Json<Scan>,
) -> Result<Json<CheckInResponse>, ClubError> {
    let admin_id = auth.user.as_ref().map(|u| u.id).ok_or(ClubError::NotLoggedIn)?;
    let store = PgCheckInStore::new(state.pool().clone());

    let outcome = check_in_scanned(&store, event_id, &payload, admin_id).await?;
    Ok(Json(outcome.into()))
}

#[axum::debug_handler]
async fn post_manual(
    auth: Auth,
    State(state): State<ClubState>,
    Path(event_id): Path<i32>,
    Json(target): Json<CheckInTarget>,
) -> Result<Json<CheckInResponse>, ClubError> {
    let admin_id = auth.user.as_ref().map(|u| u.id).ok_or(ClubError::NotLoggedIn)?;
    let store = PgCheckInStore::new(state.pool().clone());

    let outcome = check_in_target(&store, event_id, target, admin_id).await?;
    Ok(Json(outcome.into()))
}

#[derive(Deserialize)]
struct Search {
    q: Option<String>,
}

#[axum::debug_handler]
async fn get_search(
    State(state): State<ClubState>,
    Path(event_id): Path<i32>,
    Query(Search { q }): Query<Search>,
) -> Result<Json<Vec<CheckInCandidate>>, ClubError> {
    let found = PgCheckInStore::new(state.pool().clone())
        .search(event_id, q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(found))
}

#[axum::debug_handler]
async fn post_undo(
    State(state): State<ClubState>,
    Path(attendance_id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    let back = match PgCheckInStore::new(state.pool().clone())
        .undo(attendance_id)
        .await?
    {
        Some(event_id) => format!("/admin/events/{event_id}/checkin"),
        None => "/admin/events".to_string(),
    };
    info!(%attendance_id, "Undid check-in");
    Ok(Redirect::to(&Notice::Deleted.redirect_to(&back)))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/events/:id/checkin", get(get_checkin))
        .route("/admin/events/:id/checkin/scan", post(post_scan))
        .route("/admin/events/:id/checkin/manual", post(post_manual))
        .route("/admin/events/:id/checkin/search", get(get_search))
        .route("/admin/attendance/:id/undo", post(post_undo))
}
