use crate::{
    auth::{backend::Auth, get_auth_object},
    calendar::{event_to_ics, ics_filename},
    error::ClubError,
    event_registration::{
        register_for_event, registration_count, registration_counts, PgRegistrationStore,
        RegisterOutcome, RegistrationForm,
    },
    events::{find_published_event, published_events, EventView},
    exports::download,
    notice::{Notice, NoticeQuery},
    state::ClubState,
    validation::FieldErrors,
};
use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use axum_extra::extract::Form;
use http::StatusCode;

#[axum::debug_handler]
async fn get_events(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let counts = registration_counts(state.pool()).await?;
    let now = chrono::Local::now().naive_local();

    let (past, upcoming): (Vec<EventView>, Vec<EventView>) = published_events(state.pool())
        .await?
        .into_iter()
        .map(|e| {
            let registered = counts.get(&e.id).copied().unwrap_or_default();
            EventView::new(e, registered, &state.settings.niche.date_time_format, now)
        })
        .partition(|e| e.is_past);
    //most recent first
    let past: Vec<EventView> = past.into_iter().rev().collect();

    state
        .compile(
            "www/events.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "upcoming": upcoming,
                "past": past,
            }),
            Some("Events".into()),
        )
        .await
}

async fn render_event(
    state: &ClubState,
    auth: &Auth,
    event_id: i32,
    notice: liquid::model::Value,
    errors: &FieldErrors,
    form: &RegistrationForm,
) -> Result<Html<String>, ClubError> {
    let event = find_published_event(state.pool(), event_id).await?;
    let registered = registration_count(state.pool(), event_id).await?;
    let view = EventView::new(
        event,
        registered,
        &state.settings.niche.date_time_format,
        chrono::Local::now().naive_local(),
    );
    let title = view.event.title.clone();

    state
        .compile(
            "www/event.liquid",
            liquid::object!({
                "auth": get_auth_object(auth),
                "notice": notice,
                "event": view,
                "errors": errors,
                "form": liquid::object!({
                    "full_name": form.full_name.as_str(),
                    "email": form.email.clone().unwrap_or_default(),
                    "whatsapp_number": form.whatsapp_number.clone().unwrap_or_default(),
                }),
            }),
            Some(title),
        )
        .await
}

#[axum::debug_handler]
async fn get_event(
    auth: Auth,
    State(state): State<ClubState>,
    Path(event_id): Path<i32>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    render_event(
        &state,
        &auth,
        event_id,
        notice.to_liquid(),
        &FieldErrors::new(),
        &RegistrationForm::default(),
    )
    .await
}

#[axum::debug_handler]
async fn post_register(
    auth: Auth,
    State(state): State<ClubState>,
    Path(event_id): Path<i32>,
    OriginalUri(uri): OriginalUri,
    Form(form): Form<RegistrationForm>,
) -> Result<impl IntoResponse, ClubError> {
    let back = format!("/events/{event_id}");
    let store = PgRegistrationStore::new(state.pool().clone());

    let now = chrono::Local::now().naive_local();

    let outcome = match register_for_event(&store, event_id, form.clone(), now).await {
        Ok(o) => o,
        Err(e) => {
            error!(?e, %event_id, "Unable to register for event");
            return Ok(Redirect::to(&Notice::Failed.redirect_to(&back)).into_response());
        }
    };

    let notice = match outcome {
        RegisterOutcome::Registered => Notice::Registered,
        RegisterOutcome::AlreadyRegistered => Notice::AlreadyRegistered,
        RegisterOutcome::FullyBooked => Notice::FullyBooked,
        RegisterOutcome::RegistrationClosed => Notice::RegistrationClosed,
        RegisterOutcome::EventNotFound => {
            return Err(ClubError::PageNotFound {
                was_looking_for: uri,
            })
        }
        RegisterOutcome::Invalid(errors) => {
            let html = render_event(
                &state,
                &auth,
                event_id,
                liquid::model::Value::Nil,
                &errors,
                &form,
            )
            .await?;
            return Ok((StatusCode::BAD_REQUEST, html).into_response());
        }
    };

    Ok(Redirect::to(&notice.redirect_to(&back)).into_response())
}

#[axum::debug_handler]
async fn get_calendar(
    State(state): State<ClubState>,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    let event = find_published_event(state.pool(), event_id).await?;
    let ics = event_to_ics(&event, &state.settings.brand.domain);

    Ok(download(
        "text/calendar; charset=utf-8",
        &ics_filename(&event),
        ics.into_bytes(),
    ))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/events", get(get_events))
        .route("/events/:id", get(get_event))
        .route("/events/:id/register", post(post_register))
        .route("/events/:id/calendar.ics", get(get_calendar))
}
