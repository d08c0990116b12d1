//! Member self-registration, only reachable through an active registration link.

use crate::{
    academics::{load_hierarchy, Hierarchy},
    auth::{
        backend::{Auth, USER_SELECT},
        get_auth_object,
    },
    error::{ClubError, JoinSnafu, SqlxAction, SqlxSnafu, ThreadReason},
    members::{
        current_year, duplicate_errors, join_years, JoinForm, ValidJoin,
    },
    notice::Notice,
    registration_links,
    state::{db_objects::DbUser, ClubState},
    validation::{FieldErrors, LEVELS_OF_STUDY},
};
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use bcrypt::{hash, DEFAULT_COST};
use http::StatusCode;
use serde::Deserialize;
use snafu::ResultExt;

#[derive(Deserialize, Debug, Default)]
struct JoinQuery {
    #[serde(rename = "ref")]
    link: Option<String>,
}

async fn link_is_open(state: &ClubState, link: Option<&str>) -> Result<bool, ClubError> {
    match link.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(false),
        Some(slug) => registration_links::is_active(state.pool(), slug).await,
    }
}

async fn render_closed(state: &ClubState, auth: &Auth) -> Result<impl IntoResponse, ClubError> {
    let html = state
        .compile(
            "www/join_closed.liquid",
            liquid::object!({ "auth": get_auth_object(auth) }),
            Some("Registration Closed".into()),
        )
        .await?;
    Ok((StatusCode::NOT_FOUND, html))
}

async fn render_form(
    state: &ClubState,
    auth: &Auth,
    hierarchy: &Hierarchy,
    link: &str,
    form: liquid::Object,
    errors: &FieldErrors,
) -> Result<Html<String>, ClubError> {
    let years: Vec<i32> = join_years(current_year()).collect();

    state
        .compile(
            "www/join.liquid",
            liquid::object!({
                "auth": get_auth_object(auth),
                "ref": link,
                "hierarchy": hierarchy,
                "levels": LEVELS_OF_STUDY,
                "years": years,
                "form": form,
                "errors": errors,
            }),
            Some("Join".into()),
        )
        .await
}

#[axum::debug_handler]
async fn get_join(
    auth: Auth,
    State(state): State<ClubState>,
    Query(JoinQuery { link }): Query<JoinQuery>,
) -> Result<impl IntoResponse, ClubError> {
    if !link_is_open(&state, link.as_deref()).await? {
        return Ok(render_closed(&state, &auth).await?.into_response());
    }

    let hierarchy = load_hierarchy(state.pool()).await?;
    Ok(render_form(
        &state,
        &auth,
        &hierarchy,
        link.as_deref().unwrap_or_default(),
        JoinForm::default().to_liquid(),
        &FieldErrors::new(),
    )
    .await?
    .into_response())
}

enum CreateOutcome {
    Created(DbUser),
    Rejected(FieldErrors),
}

fn rejected_or(e: ClubError) -> Result<CreateOutcome, ClubError> {
    duplicate_errors(&e).map(CreateOutcome::Rejected).ok_or(e)
}

///user, role and member rows go in together or not at all
#[instrument(level = "debug", skip(state, join), fields(email = %join.email))]
async fn create_member(state: &ClubState, join: ValidJoin) -> Result<CreateOutcome, ClubError> {
    let ValidJoin {
        email,
        password,
        member,
    } = join;

    let hashed_password = tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .context(JoinSnafu {
            title: ThreadReason::HashingPassword,
        })??;

    let mut tx = state.begin().await?;

    let user_id: Result<i32, ClubError> = sqlx::query_scalar(
        "INSERT INTO public.users (email, hashed_password) VALUES ($1, $2) RETURNING id",
    )
    .bind(&email)
    .bind(&hashed_password)
    .fetch_one(&mut *tx)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingUser,
    });
    let user_id = match user_id {
        Ok(id) => id,
        Err(e) => return rejected_or(e),
    };

    sqlx::query("INSERT INTO public.user_roles (user_id, role) VALUES ($1, 'user')")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::UpdatingRole(user_id.into()),
        })?;

    let inserted = sqlx::query(
        r#"
INSERT INTO public.members
(full_name, matric_number, level_of_study, faculty_id, department_id, whatsapp_number, expected_graduation_year, user_id)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&member.full_name)
    .bind(&member.matric_number)
    .bind(&member.level_of_study)
    .bind(member.faculty_id)
    .bind(member.department_id)
    .bind(&member.whatsapp_number)
    .bind(member.expected_graduation_year)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingMember,
    });
    if let Err(e) = inserted {
        return rejected_or(e);
    }

    let user = sqlx::query_as::<_, DbUser>(&format!("{USER_SELECT} WHERE u.id = $1"))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingUser(user_id.into()),
        })?;

    tx.commit().await.context(SqlxSnafu {
        action: SqlxAction::CommittingTransaction,
    })?;

    info!(%user_id, "New member joined");
    Ok(CreateOutcome::Created(user))
}

#[axum::debug_handler]
async fn post_join(
    mut auth: Auth,
    State(state): State<ClubState>,
    Form(form): Form<JoinForm>,
) -> Result<impl IntoResponse, ClubError> {
    let link = form.link.clone().unwrap_or_default();
    if !link_is_open(&state, Some(&link)).await? {
        return Ok(render_closed(&state, &auth).await?.into_response());
    }

    let hierarchy = load_hierarchy(state.pool()).await?;
    let refill = form.to_liquid();

    let errors = match form.validate(&hierarchy, current_year()) {
        Err(errors) => errors,
        Ok(join) => match create_member(&state, join).await? {
            CreateOutcome::Rejected(errors) => errors,
            CreateOutcome::Created(user) => {
                auth.login(&user).await?;
                return Ok(Redirect::to(&Notice::Joined.redirect_to("/profile")).into_response());
            }
        },
    };

    let html = render_form(&state, &auth, &hierarchy, &link, refill, &errors).await?;
    Ok((StatusCode::BAD_REQUEST, html).into_response())
}

pub fn router() -> Router<ClubState> {
    Router::new().route("/join", get(get_join).post(post_join))
}
