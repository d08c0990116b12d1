use crate::{
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    feedback::{self, FeedbackForm},
    notice::{Notice, NoticeQuery},
    state::{db_objects::FeedbackKind, ClubState},
    validation::FieldErrors,
};
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use http::StatusCode;
use strum::IntoEnumIterator;

async fn render_feedback(
    state: &ClubState,
    auth: &Auth,
    notice: liquid::model::Value,
    form: &FeedbackForm,
    errors: &FieldErrors,
) -> Result<Html<String>, ClubError> {
    let kinds: Vec<String> = FeedbackKind::iter().map(|k| k.to_string()).collect();

    state
        .compile(
            "www/feedback.liquid",
            liquid::object!({
                "auth": get_auth_object(auth),
                "notice": notice,
                "kinds": kinds,
                "form": liquid::object!({
                    "full_name": form.full_name.as_str(),
                    "email": form.email.clone().unwrap_or_default(),
                    "message": form.message.as_str(),
                    "kind": form.kind.as_str(),
                }),
                "errors": errors,
            }),
            Some("Feedback".into()),
        )
        .await
}

#[axum::debug_handler]
async fn get_feedback(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    render_feedback(
        &state,
        &auth,
        notice.to_liquid(),
        &FeedbackForm::default(),
        &FieldErrors::new(),
    )
    .await
}

#[axum::debug_handler]
async fn post_feedback(
    auth: Auth,
    State(state): State<ClubState>,
    Form(form): Form<FeedbackForm>,
) -> Result<impl IntoResponse, ClubError> {
    match form.clone().validate() {
        Ok(new) => {
            feedback::add(state.pool(), &new).await?;
            info!(kind = %new.kind, "New feedback");
            Ok(Redirect::to(&Notice::FeedbackReceived.redirect_to("/feedback")).into_response())
        }
        Err(errors) => {
            let html =
                render_feedback(&state, &auth, liquid::model::Value::Nil, &form, &errors).await?;
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
    }
}

pub fn router() -> Router<ClubState> {
    Router::new().route("/feedback", get(get_feedback).post(post_feedback))
}
