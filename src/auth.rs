pub mod backend;
pub mod login;
pub mod pg_session;

use crate::{
    auth::backend::Auth,
    state::{
        db_objects::{AppRole, DbUser},
        ClubState,
    },
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use http::StatusCode;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AdminGate {
    Allow,
    NeedsLogin,
    Denied,
}

impl AdminGate {
    pub fn for_user(user: Option<&DbUser>) -> Self {
        match user {
            None => Self::NeedsLogin,
            Some(u) if u.role == AppRole::Admin => Self::Allow,
            Some(_) => Self::Denied,
        }
    }
}

///Middleware for everything under `/admin` - visitors go to the login page, logged in non-admins get an access-denied page
pub async fn require_admin(
    auth: Auth,
    State(state): State<ClubState>,
    request: Request,
    next: Next,
) -> Response {
    match AdminGate::for_user(auth.user.as_ref()) {
        AdminGate::Allow => next.run(request).await,
        AdminGate::NeedsLogin => {
            Redirect::to(&format!("/login?next={}", request.uri().path())).into_response()
        }
        AdminGate::Denied => {
            warn!(user = ?auth.user, path = %request.uri().path(), "Non-admin tried to reach admin page");
            match state
                .compile(
                    "www/access_denied.liquid",
                    liquid::object!({ "auth": get_auth_object(&auth) }),
                    Some("Access Denied".into()),
                )
                .await
            {
                Ok(html) => (StatusCode::FORBIDDEN, html).into_response(),
                Err(e) => e.into_response(),
            }
        }
    }
}

pub fn get_auth_object(auth: &Auth) -> liquid::Object {
    if let Some(user) = &auth.user {
        liquid::object!({
            "role": user.role,
            "is_admin": user.role == AppRole::Admin,
            "logged_in": true,
            "user": liquid::object!({ "id": user.id, "email": user.email.as_str() }),
        })
    } else {
        liquid::object!({ "role": "visitor", "is_admin": false, "logged_in": false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: AppRole) -> DbUser {
        DbUser {
            id: 1,
            email: "someone@example.com".into(),
            hashed_password: "$2b$12$hash".into(),
            role,
        }
    }

    #[test]
    fn visitors_are_sent_to_login() {
        assert_eq!(AdminGate::for_user(None), AdminGate::NeedsLogin);
    }

    #[test]
    fn plain_users_are_denied() {
        assert_eq!(AdminGate::for_user(Some(&user(AppRole::User))), AdminGate::Denied);
    }

    #[test]
    fn admins_pass() {
        assert_eq!(AdminGate::for_user(Some(&user(AppRole::Admin))), AdminGate::Allow);
    }
}
