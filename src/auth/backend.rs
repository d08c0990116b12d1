use crate::{
    auth::login::LoginCreds,
    error::{
        ClubError, DatabaseIDMethod, JoinSnafu, LoginFailureReason, SqlxAction, SqlxSnafu,
        ThreadReason,
    },
    state::db_objects::DbUser,
};
use axum_login::{AuthSession, AuthUser, AuthnBackend, UserId};
use bcrypt::verify;
use snafu::ResultExt;
use sqlx::{Pool, Postgres};

pub type Auth = AuthSession<ClubAuthBackend>;

pub const USER_SELECT: &str = r#"
SELECT u.id, u.email, u.hashed_password, COALESCE(r.role, 'user') AS role
FROM users u
LEFT JOIN user_roles r ON r.user_id = u.id
"#;

impl AuthUser for DbUser {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        //changing the password invalidates every other session
        self.hashed_password.as_bytes()
    }
}

#[derive(Clone, Debug)]
pub struct ClubAuthBackend {
    pool: Pool<Postgres>,
}

impl ClubAuthBackend {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuthnBackend for ClubAuthBackend {
    type User = DbUser;
    type Credentials = LoginCreds;
    type Error = ClubError;

    async fn authenticate(
        &self,
        LoginCreds {
            email,
            unhashed_password,
        }: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let db_user = sqlx::query_as::<_, DbUser>(&format!(
            "{USER_SELECT} WHERE LOWER(u.email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingUser(DatabaseIDMethod::Email(email.clone())),
        })?;

        let Some(db_user) = db_user else {
            return Ok(None);
        };

        let hashed_password = db_user.hashed_password.clone();
        let matches = tokio::task::spawn_blocking(move || verify(unhashed_password, &hashed_password))
            .await
            .context(JoinSnafu {
                title: ThreadReason::HashingPassword,
            })??;

        if matches {
            Ok(Some(db_user))
        } else {
            Err(ClubError::LoginFailure {
                reason: LoginFailureReason::IncorrectPassword,
            })
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        sqlx::query_as::<_, DbUser>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingUser((*user_id).into()),
            })
    }
}
