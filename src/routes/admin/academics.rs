use crate::{
    academics::{
        add_college, add_department, add_faculty, delete_unit, load_hierarchy, rename_unit,
        reparent_faculty, AcademicUnit, FacultyParent,
    },
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    notice::{Notice, NoticeQuery},
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

const BACK: &str = "/admin/academics";

#[axum::debug_handler]
async fn get_academics(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let hierarchy = load_hierarchy(state.pool()).await?;

    state
        .compile(
            "www/admin/academics.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "hierarchy": hierarchy,
            }),
            Some("Academic Structure".into()),
        )
        .await
}

#[derive(Deserialize)]
struct NewUnit {
    name: String,
    #[serde(default)]
    display_order: Option<i32>,
    ///faculties: `""` or a college id. departments: the faculty id
    #[serde(default)]
    parent: String,
}

fn blank_name(name: &str) -> Option<Redirect> {
    name.trim()
        .is_empty()
        .then(|| Redirect::to(&Notice::Failed.redirect_to(BACK)))
}

#[axum::debug_handler]
async fn post_add(
    State(state): State<ClubState>,
    Path(unit): Path<AcademicUnit>,
    Form(NewUnit {
        name,
        display_order,
        parent,
    }): Form<NewUnit>,
) -> Result<impl IntoResponse, ClubError> {
    if let Some(back) = blank_name(&name) {
        return Ok(back);
    }
    let display_order = display_order.unwrap_or_default();

    match unit {
        AcademicUnit::College => add_college(state.pool(), &name, display_order).await?,
        AcademicUnit::Faculty => {
            let Some(parent) = FacultyParent::from_form(&parent) else {
                return Ok(Redirect::to(&Notice::Failed.redirect_to(BACK)));
            };
            add_faculty(state.pool(), &name, parent, display_order).await?;
        }
        AcademicUnit::Department => {
            let Ok(faculty_id) = parent.trim().parse::<i32>() else {
                return Ok(Redirect::to(&Notice::Failed.redirect_to(BACK)));
            };
            add_department(state.pool(), &name, faculty_id, display_order).await?;
        }
    }

    Ok(Redirect::to(&Notice::Saved.redirect_to(BACK)))
}

#[derive(Deserialize)]
struct Rename {
    name: String,
    #[serde(default)]
    display_order: Option<i32>,
}

#[axum::debug_handler]
async fn post_rename(
    State(state): State<ClubState>,
    Path((unit, id)): Path<(AcademicUnit, i32)>,
    Form(Rename { name, display_order }): Form<Rename>,
) -> Result<impl IntoResponse, ClubError> {
    if let Some(back) = blank_name(&name) {
        return Ok(back);
    }

    rename_unit(
        state.pool(),
        unit,
        id,
        &name,
        display_order.unwrap_or_default(),
    )
    .await?;
    Ok(Redirect::to(&Notice::Saved.redirect_to(BACK)))
}

#[derive(Deserialize)]
struct Reparent {
    college_id: String,
}

#[axum::debug_handler]
async fn post_reparent(
    State(state): State<ClubState>,
    Path(id): Path<i32>,
    Form(Reparent { college_id }): Form<Reparent>,
) -> Result<impl IntoResponse, ClubError> {
    let Some(parent) = FacultyParent::from_form(&college_id) else {
        return Ok(Redirect::to(&Notice::Failed.redirect_to(BACK)));
    };

    reparent_faculty(state.pool(), id, parent).await?;
    Ok(Redirect::to(&Notice::Saved.redirect_to(BACK)))
}

#[axum::debug_handler]
async fn post_delete(
    State(state): State<ClubState>,
    Path((unit, id)): Path<(AcademicUnit, i32)>,
) -> Result<impl IntoResponse, ClubError> {
    delete_unit(state.pool(), unit, id).await?;
    info!(?unit, %id, "Removed academic unit");
    Ok(Redirect::to(&Notice::Deleted.redirect_to(BACK)))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/academics", get(get_academics))
        .route("/admin/faculties/:id/parent", post(post_reparent))
        .route("/admin/academics/:unit", post(post_add))
        .route("/admin/academics/:unit/:id/rename", post(post_rename))
        .route("/admin/academics/:unit/:id/delete", post(post_delete))
}
