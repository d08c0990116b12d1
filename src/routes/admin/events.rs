use crate::{
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    event_registration::registration_counts,
    events::{
        add_event, all_events, delete_event, delete_registration, find_event, registrations_for,
        toggle_published, update_event, EventForm, EventView,
    },
    exports::{csv_download, registrations_csv},
    notice::{Notice, NoticeQuery},
    state::ClubState,
    validation::FieldErrors,
};
use axum::{
    extract::{Path, Query, State},
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

    let events: Vec<EventView> = all_events(state.pool())
        .await?
        .into_iter()
        .map(|e| {
            let registered = counts.get(&e.id).copied().unwrap_or_default();
            EventView::new(e, registered, &state.settings.niche.date_time_format, now)
        })
        .collect();

    state
        .compile(
            "www/admin/events.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "events": events,
            }),
            Some("Manage Events".into()),
        )
        .await
}

///`id` is `None` when adding a new event
async fn render_event_form(
    state: &ClubState,
    auth: &Auth,
    id: Option<i32>,
    form: liquid::Object,
    errors: &FieldErrors,
) -> Result<Html<String>, ClubError> {
    let title = if id.is_some() { "Edit Event" } else { "New Event" };

    state
        .compile(
            "www/admin/event_form.liquid",
            liquid::object!({
                "auth": get_auth_object(auth),
                "id": id,
                "form": form,
                "errors": errors,
            }),
            Some(title.into()),
        )
        .await
}

#[axum::debug_handler]
async fn get_new_event(
    auth: Auth,
    State(state): State<ClubState>,
) -> Result<impl IntoResponse, ClubError> {
    let defaults = EventForm {
        registration_required: Some("on".into()),
        ..EventForm::default()
    };
    render_event_form(&state, &auth, None, defaults.to_liquid(), &FieldErrors::new()).await
}

#[axum::debug_handler]
async fn post_new_event(
    auth: Auth,
    State(state): State<ClubState>,
    Form(form): Form<EventForm>,
) -> Result<impl IntoResponse, ClubError> {
    let refill = form.to_liquid();

    match form.validate() {
        Ok(event) => {
            let id = add_event(state.pool(), &event).await?;
            info!(%id, title = %event.title, "Added event");
            Ok(Redirect::to(&Notice::Saved.redirect_to("/admin/events")).into_response())
        }
        Err(errors) => {
            let html = render_event_form(&state, &auth, None, refill, &errors).await?;
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
    }
}

#[axum::debug_handler]
async fn get_edit_event(
    auth: Auth,
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    let event = find_event(state.pool(), id).await?;
    let view = EventView::new(
        event,
        0,
        &state.settings.niche.date_time_format,
        chrono::Local::now().naive_local(),
    );

    let form = EventForm {
        title: view.event.title.clone(),
        description: view.event.description.clone(),
        starts_at: view.starts_input.clone(),
        ends_at: Some(view.ends_input.clone()),
        location: view.event.location.clone(),
        max_attendees: view.event.max_attendees.map(|m| m.to_string()),
        image_url: view.event.image_url.clone(),
        is_published: view.event.is_published.then(|| "on".to_string()),
        registration_required: view.event.registration_required.then(|| "on".to_string()),
    };

    render_event_form(&state, &auth, Some(id), form.to_liquid(), &FieldErrors::new()).await
}

#[axum::debug_handler]
async fn post_edit_event(
    auth: Auth,
    State(state): State<ClubState>,
    Path(id): Path<i32>,
    Form(form): Form<EventForm>,
) -> Result<impl IntoResponse, ClubError> {
    let refill = form.to_liquid();

    match form.validate() {
        Ok(event) => {
            update_event(state.pool(), id, &event).await?;
            Ok(Redirect::to(&Notice::Saved.redirect_to("/admin/events")).into_response())
        }
        Err(errors) => {
            let html = render_event_form(&state, &auth, Some(id), refill, &errors).await?;
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
    }
}

#[axum::debug_handler]
async fn post_delete_event(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    delete_event(state.pool(), id).await?;
    info!(%id, "Removed event");
    Ok(Redirect::to(&Notice::Deleted.redirect_to("/admin/events")))
}

#[axum::debug_handler]
async fn post_toggle_published(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    toggle_published(state.pool(), id).await?;
    Ok(Redirect::to(&Notice::Saved.redirect_to("/admin/events")))
}

#[axum::debug_handler]
async fn get_registrations(
    auth: Auth,
    State(state): State<ClubState>,
    Path(id): Path<i32>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let event = find_event(state.pool(), id).await?;
    let registrations = registrations_for(state.pool(), id).await?;
    let view = EventView::new(
        event,
        registrations.len() as i64,
        &state.settings.niche.date_time_format,
        chrono::Local::now().naive_local(),
    );
    let title = format!("Registrations for {}", view.event.title);

    state
        .compile(
            "www/admin/registrations.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "event": view,
                "registrations": registrations,
            }),
            Some(title),
        )
        .await
}

#[axum::debug_handler]
async fn get_registrations_csv(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    let registrations = registrations_for(state.pool(), id).await?;
    let csv = registrations_csv(&registrations, &state.settings.niche.date_time_format).await?;

    Ok(csv_download(&format!("event-{id}-registrations.csv"), csv))
}

#[axum::debug_handler]
async fn post_delete_registration(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    let back = match delete_registration(state.pool(), id).await? {
        Some(event_id) => format!("/admin/events/{event_id}/registrations"),
        None => "/admin/events".to_string(),
    };
    Ok(Redirect::to(&Notice::Deleted.redirect_to(&back)))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/events", get(get_events))
        .route("/admin/events/new", get(get_new_event).post(post_new_event))
        .route(
            "/admin/events/:id/edit",
            get(get_edit_event).post(post_edit_event),
        )
        .route("/admin/events/:id/delete", post(post_delete_event))
        .route("/admin/events/:id/publish", post(post_toggle_published))
        .route("/admin/events/:id/registrations", get(get_registrations))
        .route(
            "/admin/events/:id/registrations.csv",
            get(get_registrations_csv),
        )
        .route(
            "/admin/registrations/:id/delete",
            post(post_delete_registration),
        )
}
