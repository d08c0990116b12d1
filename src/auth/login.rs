use crate::{
    auth::{
        backend::{Auth, ClubAuthBackend},
        get_auth_object,
    },
    error::{ALError, ClubError, LoginFailureReason},
    state::ClubState,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use axum_login::login_required;
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub unhashed_password: String,
    pub next: Option<String>,
}

#[derive(Clone)]
pub struct LoginCreds {
    pub email: String,
    pub unhashed_password: String,
}

#[derive(Deserialize, Default)]
pub struct NextPage {
    pub next: Option<String>,
}

#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug)]
pub enum FailureReason {
    #[serde(rename = "bad_password")]
    BadPassword,
    #[serde(rename = "user_not_found")]
    UserNotFound,
}

impl FailureReason {
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::BadPassword => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::UserNotFound => "We couldn't find an account with that email.",
            Self::BadPassword => "That password is incorrect.",
        }
    }
}

///only ever redirect within the site
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

#[axum::debug_handler]
async fn get_login(
    auth: Auth,
    State(state): State<ClubState>,
    Query(NextPage { next }): Query<NextPage>,
) -> Result<impl IntoResponse, ClubError> {
    state
        .compile(
            "www/login.liquid",
            liquid::object!({ "auth": get_auth_object(&auth), "next": safe_next(next.as_deref()) }),
            Some("Login".into()),
        )
        .await
}

#[axum::debug_handler]
async fn post_login(
    mut auth: Auth,
    State(state): State<ClubState>,
    Form(LoginForm {
        email,
        unhashed_password,
        next,
    }): Form<LoginForm>,
) -> Result<impl IntoResponse, ClubError> {
    let next = safe_next(next.as_deref()).to_string();

    let failure = match auth
        .authenticate(LoginCreds {
            email: email.clone(),
            unhashed_password,
        })
        .await
    {
        Ok(Some(user)) => {
            auth.login(&user).await?;
            info!(id = %user.id, "User logged in");
            return Ok(Redirect::to(&next).into_response());
        }
        Ok(None) => FailureReason::UserNotFound,
        Err(ALError::Backend(ClubError::LoginFailure {
            reason: LoginFailureReason::IncorrectPassword,
        })) => {
            warn!(?email, "Wrong password for trying to login");
            FailureReason::BadPassword
        }
        Err(e) => return Err(e.into()),
    };

    let html = state
        .compile(
            "www/login.liquid",
            liquid::object!({
                "auth": get_auth_object(&auth),
                "next": next,
                "email": email,
                "failure": failure.message(),
            }),
            Some("Login".into()),
        )
        .await?;

    Ok((failure.status_code(), html).into_response())
}

#[axum::debug_handler]
async fn get_logout(mut auth: Auth) -> Result<impl IntoResponse, ClubError> {
    auth.logout().await?;
    Ok(Redirect::to("/"))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/logout", get(get_logout))
        .route_layer(login_required!(ClubAuthBackend, login_url = "/login"))
        .route("/login", get(get_login).post(post_login))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_stays_on_site() {
        assert_eq!(safe_next(Some("/admin/events")), "/admin/events");
        assert_eq!(safe_next(Some("//evil.example.com")), "/");
        assert_eq!(safe_next(Some("https://evil.example.com")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
