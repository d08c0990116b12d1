use crate::{
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    notice::{Notice, NoticeQuery},
    registration_links::{self, clean_slug, random_slug, SLUG_CONSTRAINT},
    state::ClubState,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use axum_extra::extract::Form;
use serde::Deserialize;

const BACK: &str = "/admin/links";

#[axum::debug_handler]
async fn get_links(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let links = registration_links::all(state.pool()).await?;

    state
        .compile(
            "www/admin/links.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "links": links,
            }),
            Some("Registration Links".into()),
        )
        .await
}

#[derive(Deserialize)]
struct NewLink {
    slug: Option<String>,
}

#[axum::debug_handler]
async fn post_new_link(
    State(state): State<ClubState>,
    Form(NewLink { slug }): Form<NewLink>,
) -> Result<impl IntoResponse, ClubError> {
    let slug = clean_slug(slug.as_deref()).unwrap_or_else(random_slug);

    let notice = match registration_links::create(state.pool(), &slug).await {
        Ok(()) => {
            info!(%slug, "Added registration link");
            Notice::Saved
        }
        Err(e) if e.unique_violation() == Some(SLUG_CONSTRAINT) => Notice::DuplicateSlug,
        Err(e) => return Err(e),
    };
    Ok(Redirect::to(&notice.redirect_to(BACK)))
}

#[axum::debug_handler]
async fn post_toggle(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    registration_links::toggle(state.pool(), id).await?;
    Ok(Redirect::to(&Notice::Saved.redirect_to(BACK)))
}

#[axum::debug_handler]
async fn post_delete(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    registration_links::delete(state.pool(), id).await?;
    Ok(Redirect::to(&Notice::Deleted.redirect_to(BACK)))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/links", get(get_links).post(post_new_link))
        .route("/admin/links/:id/toggle", post(post_toggle))
        .route("/admin/links/:id/delete", post(post_delete))
}
