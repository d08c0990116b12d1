use crate::{
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    event_registration::registration_counts,
    events::{published_events, EventView},
    feedback::approved_testimonials,
    notice::NoticeQuery,
    organization,
    state::ClubState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub const UPCOMING_ON_HOME_PAGE: usize = 3;

#[axum::debug_handler]
async fn get_index(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let organization = organization::load(state.pool()).await?;
    let counts = registration_counts(state.pool()).await?;
    let now = chrono::Local::now().naive_local();

    let upcoming: Vec<EventView> = published_events(state.pool())
        .await?
        .into_iter()
        .map(|e| {
            let registered = counts.get(&e.id).copied().unwrap_or_default();
            EventView::new(e, registered, &state.settings.niche.date_time_format, now)
        })
        .filter(|e| !e.is_past)
        .take(UPCOMING_ON_HOME_PAGE)
        .collect();

    let testimonials = approved_testimonials(state.pool()).await?;

    state
        .compile(
            "www/index.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "organization": organization,
                "upcoming": upcoming,
                "testimonials": testimonials,
            }),
            None,
        )
        .await
}

pub fn router() -> Router<ClubState> {
    Router::new().route("/", get(get_index))
}
