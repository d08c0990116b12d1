use crate::auth::backend::ClubAuthBackend;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};
use http::Uri;
use snafu::Snafu;
use std::path::PathBuf;

pub type ALError = axum_login::Error<ClubAuthBackend>;

#[derive(Debug)]
pub enum LoginFailureReason {
    IncorrectPassword,
}

#[derive(Debug)]
pub enum LettreAction {
    BuildMessage,
}

#[derive(Debug)]
pub enum IOAction {
    ReadingFile(PathBuf),
    BindingListener(String),
    ServingApp,
}

#[derive(Debug)]
pub enum LiquidAction {
    BuildingCompiler,
    Parsing { text: String },
    Rendering,
}

#[derive(Debug)]
pub enum ThreadReason {
    LiquidCompiler,
    HashingPassword,
}

#[derive(Debug)]
pub enum DatabaseIDMethod {
    Id(i32),
    Email(String),
    Slug(String),
}
impl From<i32> for DatabaseIDMethod {
    fn from(value: i32) -> Self {
        Self::Id(value)
    }
}

#[derive(Debug)]
pub enum SqlxAction {
    AcquiringConnection,
    BeginningTransaction,
    CommittingTransaction,

    FindingUser(DatabaseIDMethod),
    AddingUser,
    UpdatingRole(DatabaseIDMethod),
    FindingUsers,

    FindingMember(DatabaseIDMethod),
    FindingMembers,
    AddingMember,
    UpdatingMember(DatabaseIDMethod),
    RemovingMember(DatabaseIDMethod),
    SearchingMembers,

    FindingAlumni,
    AddingAlumnus(DatabaseIDMethod),

    FindingEvent(i32),
    FindingAllEvents,
    AddingEvent,
    UpdatingEvent(i32),
    RemovingEvent(i32),

    CountingRegistrations(i32),
    FindingRegistrations(Option<i32>),
    AddingRegistration(i32),
    RemovingRegistration(i32),

    FindingAttendance(Option<i32>),
    AddingAttendance { event_id: i32 },
    RemovingAttendance(i32),

    FindingAcademics,
    AddingAcademicUnit,
    UpdatingAcademicUnit(DatabaseIDMethod),
    RemovingAcademicUnit(DatabaseIDMethod),

    FindingFeedback,
    AddingFeedback,
    UpdatingFeedback(i32),
    RemovingFeedback(i32),

    FindingRegistrationLink(DatabaseIDMethod),
    FindingRegistrationLinks,
    AddingRegistrationLink,
    UpdatingRegistrationLink(i32),
    RemovingRegistrationLink(i32),

    FindingSettings,
    UpdatingSettings,
    CountingTotals,

    FindingSession,
    AddingSession,
    RemovingSession,
    DeletingOldSessions,
}

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum ClubError {
    //external errors
    #[snafu(display("Database Error: {source:?}. Cause: {action:?}"))]
    Sqlx {
        source: sqlx::Error,
        action: SqlxAction,
    },
    #[snafu(display("Migration Error: {source:?}"), context(false))]
    Migrate {
        source: sqlx::migrate::MigrateError,
    },
    #[snafu(display("Liquid Error: {source:?} caused by {attempt:?}"))]
    Liquid {
        source: liquid::Error,
        attempt: LiquidAction,
    },
    #[snafu(display("IO Error: {source:?} doing {action:?}"))]
    IO {
        source: std::io::Error,
        action: IOAction,
    },
    #[snafu(display("Tokio Join Error: {source:?} which was started to {title:?}"))]
    Join {
        source: tokio::task::JoinError,
        title: ThreadReason,
    },
    #[snafu(display("Error with Encrypting: {source:?}"), context(false))]
    Bcrypt { source: bcrypt::BcryptError },
    #[snafu(display("Error parsing email address: {source:?}"), context(false))]
    LettreAddress {
        source: lettre::address::AddressError,
    },
    #[snafu(display("Error with Emails: {source:?}"))]
    LettreEmail {
        source: lettre::error::Error,
        trying_to: LettreAction,
    },
    #[snafu(display("Error with SMTP: {source:?}"), context(false))]
    LettreSMTP {
        source: lettre::transport::smtp::Error,
    },
    #[snafu(display("Error with CSV Files: {source:?}"), context(false))]
    Csv { source: csv_async::Error },
    #[snafu(display("Configuration error: {source:?}"), context(false))]
    Config { source: config::ConfigError },
    #[snafu(display("Authentication layer error: {source:?}"), context(false))]
    AxumLogin {
        #[snafu(source(from(ALError, Box::new)))]
        source: Box<ALError>,
    },
    #[snafu(display("Not able to find page {was_looking_for:?}"))]
    PageNotFound { was_looking_for: Uri },

    // internal errors
    #[snafu(display("Mail thread is no longer running"))]
    MailChannelClosed,
    #[snafu(display("Failure to login due to {reason:?}"))]
    LoginFailure { reason: LoginFailureReason },
    #[snafu(display("Must be logged in to see this page"))]
    NotLoggedIn,
}

impl ClubError {
    ///postgres reports unique violations with SQLSTATE 23505 - we hand back the constraint so callers can rephrase it
    pub fn unique_violation(&self) -> Option<&str> {
        match self {
            Self::Sqlx {
                source: sqlx::Error::Database(db),
                ..
            } if db.code().as_deref() == Some("23505") => Some(db.constraint().unwrap_or_default()),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Sqlx {
                source: sqlx::Error::RowNotFound,
                ..
            }
            | Self::PageNotFound { .. } => StatusCode::NOT_FOUND,
            Self::LoginFailure { .. } => StatusCode::BAD_REQUEST,
            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn get_error_page(error_code: StatusCode, content: ClubError) -> (StatusCode, Html<String>) {
    error!(?content, ?error_code, "Dealing with Error page");

    //we never show internals to visitors - the log line above has the details
    let friendly = match error_code {
        StatusCode::NOT_FOUND => "We couldn't find what you were looking for.",
        StatusCode::BAD_REQUEST => "Something about that request wasn't quite right.",
        StatusCode::UNAUTHORIZED => "You need to be logged in to see this page.",
        _ => "Something went wrong on our side. Please try again.",
    };

    (
        error_code,
        Html(format!(
            include_str!("../www/server_error.html"),
            message = friendly,
            code = error_code
        )),
    )
}

#[axum::debug_handler]
pub async fn not_found_fallback(uri: Uri) -> (StatusCode, Html<String>) {
    get_error_page(
        StatusCode::NOT_FOUND,
        ClubError::PageNotFound {
            was_looking_for: uri,
        },
    )
}

impl IntoResponse for ClubError {
    fn into_response(self) -> axum::response::Response {
        let code = self.status_code();
        get_error_page(code, self).into_response()
    }
}

///errors shaped like the ones postgres hands back, for exercising the constraint mappings
#[cfg(test)]
pub mod test_errors {
    use super::{ClubError, SqlxAction};
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error, fmt};

    #[derive(Debug)]
    struct UniqueViolation(&'static str);

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"{}\"", self.0)
        }
    }

    impl Error for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.0)
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    pub fn unique_violation_on(constraint: &'static str) -> ClubError {
        ClubError::Sqlx {
            source: sqlx::Error::Database(Box::new(UniqueViolation(constraint))),
            action: SqlxAction::AddingMember,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_are_not_found() {
        let e = ClubError::Sqlx {
            source: sqlx::Error::RowNotFound,
            action: SqlxAction::FindingEvent(4),
        };
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        assert!(e.unique_violation().is_none());
    }

    #[test]
    fn unique_violations_name_their_constraint() {
        let e = test_errors::unique_violation_on("members_matric_number_key");
        assert_eq!(e.unique_violation(), Some("members_matric_number_key"));
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn pool_failures_are_internal() {
        let e = ClubError::Sqlx {
            source: sqlx::Error::PoolTimedOut,
            action: SqlxAction::AcquiringConnection,
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_page_hides_internals() {
        let (code, Html(body)) = get_error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            ClubError::Sqlx {
                source: sqlx::Error::PoolTimedOut,
                action: SqlxAction::FindingAllEvents,
            },
        );
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Please try again"));
        assert!(!body.contains("PoolTimedOut"));
    }
}
