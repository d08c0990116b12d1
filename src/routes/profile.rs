use crate::{
    auth::{
        backend::{Auth, ClubAuthBackend},
        get_auth_object,
    },
    checkin::MemberQrPayload,
    error::ClubError,
    events::{attended_by_member, EventView},
    members::{current_year, join_years, member_for_user, update_profile, ProfileForm},
    notice::{Notice, NoticeQuery},
    state::{db_objects::DbMember, ClubState},
    validation::{FieldErrors, LEVELS_OF_STUDY},
};
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use axum_login::login_required;
use http::StatusCode;

async fn render_profile(
    state: &ClubState,
    auth: &Auth,
    member: Option<DbMember>,
    notice: liquid::model::Value,
    errors: &FieldErrors,
) -> Result<Html<String>, ClubError> {
    let now = chrono::Local::now().naive_local();

    let (qr_payload, attended) = match &member {
        Some(m) => {
            let attended: Vec<EventView> = attended_by_member(state.pool(), m.id)
                .await?
                .into_iter()
                .map(|e| EventView::new(e, 0, &state.settings.niche.date_format, now))
                .collect();
            (
                MemberQrPayload::for_member(m.id, &m.matric_number).to_json(),
                attended,
            )
        }
        None => (String::new(), vec![]),
    };
    let years: Vec<i32> = join_years(current_year()).collect();

    state
        .compile(
            "www/profile.liquid",
            liquid::object!({
                "auth": get_auth_object(auth),
                "notice": notice,
                "member": member,
                "qr_payload": qr_payload,
                "attended": attended,
                "levels": LEVELS_OF_STUDY,
                "years": years,
                "errors": errors,
            }),
            Some("My Profile".into()),
        )
        .await
}

#[axum::debug_handler]
async fn get_profile(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let Some(user) = auth.user.clone() else {
        return Err(ClubError::NotLoggedIn);
    };
    let member = member_for_user(state.pool(), user.id).await?;

    render_profile(&state, &auth, member, notice.to_liquid(), &FieldErrors::new()).await
}

#[axum::debug_handler]
async fn post_profile(
    auth: Auth,
    State(state): State<ClubState>,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse, ClubError> {
    let Some(user) = auth.user.clone() else {
        return Err(ClubError::NotLoggedIn);
    };
    let Some(member) = member_for_user(state.pool(), user.id).await? else {
        //admins without a member row have nothing to edit
        return Ok(Redirect::to("/profile").into_response());
    };

    match form.validate(current_year()) {
        Ok(profile) => {
            update_profile(state.pool(), member.id, &profile).await?;
            Ok(Redirect::to(&Notice::ProfileUpdated.redirect_to("/profile")).into_response())
        }
        Err(errors) => {
            let html = render_profile(
                &state,
                &auth,
                Some(member),
                liquid::model::Value::Nil,
                &errors,
            )
            .await?;
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
    }
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/profile", get(get_profile).post(post_profile))
        .route_layer(login_required!(ClubAuthBackend, login_url = "/login"))
}
