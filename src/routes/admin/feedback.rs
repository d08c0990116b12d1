use crate::{
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    feedback,
    notice::{Notice, NoticeQuery},
    state::ClubState,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Router,
};

const BACK: &str = "/admin/feedback";

#[axum::debug_handler]
async fn get_feedback(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let feedback = feedback::all(state.pool()).await?;

    state
        .compile(
            "www/admin/feedback.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "feedback": feedback,
            }),
            Some("Feedback".into()),
        )
        .await
}

#[axum::debug_handler]
async fn post_approve(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    feedback::set_approved(state.pool(), id, true).await?;
    Ok(Redirect::to(&Notice::Saved.redirect_to(BACK)))
}

#[axum::debug_handler]
async fn post_unapprove(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    feedback::set_approved(state.pool(), id, false).await?;
    Ok(Redirect::to(&Notice::Saved.redirect_to(BACK)))
}

#[axum::debug_handler]
async fn post_delete(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    feedback::delete(state.pool(), id).await?;
    Ok(Redirect::to(&Notice::Deleted.redirect_to(BACK)))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/feedback", get(get_feedback))
        .route("/admin/feedback/:id/approve", post(post_approve))
        .route("/admin/feedback/:id/unapprove", post(post_unapprove))
        .route("/admin/feedback/:id/delete", post(post_delete))
}
