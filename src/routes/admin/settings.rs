//! Organization settings and user roles.

use crate::{
    auth::{backend::Auth, get_auth_object},
    error::{ClubError, SqlxAction, SqlxSnafu},
    notice::{Notice, NoticeQuery},
    organization::{self, OrganizationForm},
    state::{
        db_objects::{AppRole, DbOrganizationSettings},
        ClubState,
    },
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use axum_extra::extract::Form;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::FromRow;

#[axum::debug_handler]
async fn get_settings(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let organization = organization::load(state.pool()).await?;

    state
        .compile(
            "www/admin/settings.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "organization": organization,
                "aims": organization.aims.join("\n"),
                "objectives": organization.objectives.join("\n"),
            }),
            Some("Organization Settings".into()),
        )
        .await
}

#[axum::debug_handler]
async fn post_settings(
    State(state): State<ClubState>,
    Form(form): Form<OrganizationForm>,
) -> Result<impl IntoResponse, ClubError> {
    organization::save(state.pool(), &DbOrganizationSettings::from(form)).await?;
    Ok(Redirect::to(&Notice::Saved.redirect_to("/admin/settings")))
}

#[derive(Serialize, FromRow)]
struct UserWithRole {
    id: i32,
    email: String,
    role: AppRole,
}

#[axum::debug_handler]
async fn get_roles(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    let users = sqlx::query_as::<_, UserWithRole>(
        r#"
SELECT u.id, u.email, COALESCE(r.role, 'user') AS role
FROM users u
LEFT JOIN user_roles r ON r.user_id = u.id
ORDER BY u.email
        "#,
    )
    .fetch_all(state.pool())
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingUsers,
    })?;

    state
        .compile(
            "www/admin/roles.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "notice": notice.to_liquid(),
                "users": users,
            }),
            Some("User Roles".into()),
        )
        .await
}

#[derive(Deserialize)]
struct RoleChange {
    role: AppRole,
}

#[axum::debug_handler]
async fn post_role(
    auth: Auth,
    State(state): State<ClubState>,
    Path(user_id): Path<i32>,
    Form(RoleChange { role }): Form<RoleChange>,
) -> Result<impl IntoResponse, ClubError> {
    let is_self = auth.user.as_ref().is_some_and(|u| u.id == user_id);
    if is_self && role != AppRole::Admin {
        return Ok(Redirect::to(
            &Notice::CannotDemoteSelf.redirect_to("/admin/roles"),
        ));
    }

    sqlx::query(
        r#"
INSERT INTO public.user_roles (user_id, role)
VALUES ($1, $2)
ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role
        "#,
    )
    .bind(user_id)
    .bind(role)
    .execute(state.pool())
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingRole(user_id.into()),
    })?;

    info!(%user_id, ?role, "Changed role");
    Ok(Redirect::to(&Notice::Saved.redirect_to("/admin/roles")))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/settings", get(get_settings).post(post_settings))
        .route("/admin/roles", get(get_roles))
        .route("/admin/roles/:id", post(post_role))
}
