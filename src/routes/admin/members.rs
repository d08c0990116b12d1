use crate::{
    academics::{load_hierarchy, Hierarchy},
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    graduation::{graduate_member, graduate_members, graduating_members},
    members::{
        admin_years, all_alumni, all_members, current_year, delete_member, duplicate_errors,
        find_member, matches_filter, update_member, MemberFields,
    },
    notice::{Notice, NoticeQuery},
    state::{db_objects::DbMember, ClubState},
    validation::{FieldErrors, LEVELS_OF_STUDY},
};
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use axum_extra::extract::Form;
use http::StatusCode;
use serde::Deserialize;

#[derive(Deserialize, Default)]
struct MemberSearch {
    q: Option<String>,
    notice: Option<Notice>,
}

#[axum::debug_handler]
async fn get_members(
    auth: Auth,
    State(state): State<ClubState>,
    Query(MemberSearch { q, notice }): Query<MemberSearch>,
) -> Result<impl IntoResponse, ClubError> {
    let q = q.unwrap_or_default();
    let members: Vec<DbMember> = all_members(state.pool())
        .await?
        .into_iter()
        .filter(|m| matches_filter(m, &q))
        .collect();

    state
        .compile(
            "www/admin/members.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": NoticeQuery { notice }.to_liquid(),
                "members": members,
                "q": q,
            }),
            Some("Members".into()),
        )
        .await
}

async fn render_edit(
    state: &ClubState,
    auth: &Auth,
    member: &DbMember,
    hierarchy: &Hierarchy,
    errors: &FieldErrors,
) -> Result<Html<String>, ClubError> {
    let years: Vec<i32> = admin_years(current_year()).collect();

    state
        .compile(
            "www/admin/edit_member.liquid",
            liquid::object!({
                "auth": get_auth_object(auth),
                "member": member,
                "hierarchy": hierarchy,
                "levels": LEVELS_OF_STUDY,
                "years": years,
                "errors": errors,
            }),
            Some(format!("Edit {}", member.full_name)),
        )
        .await
}

#[axum::debug_handler]
async fn get_edit_member(
    auth: Auth,
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    let member = find_member(state.pool(), id).await?;
    let hierarchy = load_hierarchy(state.pool()).await?;

    render_edit(&state, &auth, &member, &hierarchy, &FieldErrors::new()).await
}

#[axum::debug_handler]
async fn post_edit_member(
    auth: Auth,
    State(state): State<ClubState>,
    Path(id): Path<i32>,
    Form(form): Form<MemberFields>,
) -> Result<impl IntoResponse, ClubError> {
    let member = find_member(state.pool(), id).await?;
    let hierarchy = load_hierarchy(state.pool()).await?;

    let errors = match form.validate(&hierarchy, &admin_years(current_year())) {
        Err(errors) => errors,
        Ok(valid) => match update_member(state.pool(), id, &valid).await {
            Ok(()) => {
                return Ok(Redirect::to(&Notice::Saved.redirect_to("/admin/members")).into_response())
            }
            Err(e) => duplicate_errors(&e).ok_or(e)?,
        },
    };

    let html = render_edit(&state, &auth, &member, &hierarchy, &errors).await?;
    Ok((StatusCode::BAD_REQUEST, html).into_response())
}

#[axum::debug_handler]
async fn post_delete_member(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    delete_member(state.pool(), id).await?;
    info!(%id, "Removed member");
    Ok(Redirect::to(&Notice::Deleted.redirect_to("/admin/members")))
}

#[axum::debug_handler]
async fn get_graduation(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let year = current_year();
    let graduating = graduating_members(all_members(state.pool()).await?, year);

    state
        .compile(
            "www/admin/graduation.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "graduating": graduating,
                "year": year,
            }),
            Some("Graduating Members".into()),
        )
        .await
}

#[axum::debug_handler]
async fn post_graduate_one(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ClubError> {
    let notice = match graduate_member(state.pool(), id, current_year()).await {
        Ok(true) => Notice::Graduated,
        Ok(false) => Notice::Failed,
        Err(e) => {
            error!(?e, %id, "Unable to graduate member");
            Notice::Failed
        }
    };
    Ok(Redirect::to(&notice.redirect_to("/admin/graduation")))
}

#[axum::debug_handler]
async fn post_graduate_all(State(state): State<ClubState>) -> Result<impl IntoResponse, ClubError> {
    let year = current_year();
    let ids: Vec<i32> = graduating_members(all_members(state.pool()).await?, year)
        .into_iter()
        .map(|m| m.id)
        .collect();

    let notice = match graduate_members(state.pool(), &ids, year).await {
        Ok(_) => Notice::Graduated,
        Err(e) => {
            error!(?e, "Unable to graduate everyone");
            Notice::Failed
        }
    };
    Ok(Redirect::to(&notice.redirect_to("/admin/graduation")))
}

#[axum::debug_handler]
async fn get_alumni(
    auth: Auth,
    State(state): State<ClubState>,
) -> Result<impl IntoResponse, ClubError> {
    let alumni = all_alumni(state.pool()).await?;

    state
        .compile(
            "www/admin/alumni.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "alumni": alumni,
            }),
            Some("Alumni".into()),
        )
        .await
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/members", get(get_members))
        .route(
            "/admin/members/:id/edit",
            get(get_edit_member).post(post_edit_member),
        )
        .route("/admin/members/:id/delete", post(post_delete_member))
        .route("/admin/graduation", get(get_graduation))
        .route("/admin/graduation/all", post(post_graduate_all))
        .route("/admin/graduation/:id", post(post_graduate_one))
        .route("/admin/alumni", get(get_alumni))
}
