//! Visitor feedback, testimonials and recommendations, plus the moderation queries.

use crate::{
    error::{ClubError, SqlxAction, SqlxSnafu},
    state::db_objects::{DbFeedback, FeedbackKind},
    validation::{non_blank, FieldErrors},
};
use serde::Deserialize;
use snafu::ResultExt;
use sqlx::{Pool, Postgres};
use std::str::FromStr;

pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct FeedbackForm {
    pub full_name: String,
    pub email: Option<String>,
    pub message: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub full_name: String,
    pub email: Option<String>,
    pub message: String,
    pub kind: FeedbackKind,
}

impl FeedbackForm {
    pub fn validate(self) -> Result<NewFeedback, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = non_blank(self.email);

        if errors.required("full_name", &self.full_name, "Name") {
            errors.max_len("full_name", self.full_name.trim(), 120, "Name");
        }
        errors.optional_email("email", email.as_deref());
        if errors.required("message", &self.message, "Message") {
            errors.max_len("message", self.message.trim(), MAX_MESSAGE_LEN, "Message");
        }
        let kind = FeedbackKind::from_str(self.kind.trim()).ok();
        if kind.is_none() {
            errors.add("kind", "Please pick what kind of feedback this is");
        }

        match kind {
            Some(kind) if errors.is_empty() => Ok(NewFeedback {
                full_name: self.full_name.trim().to_string(),
                email,
                message: self.message.trim().to_string(),
                kind,
            }),
            _ => Err(errors),
        }
    }
}

pub async fn add(pool: &Pool<Postgres>, feedback: &NewFeedback) -> Result<(), ClubError> {
    sqlx::query(
        "INSERT INTO public.feedback (full_name, email, message, kind) VALUES ($1, $2, $3, $4)",
    )
    .bind(&feedback.full_name)
    .bind(&feedback.email)
    .bind(&feedback.message)
    .bind(feedback.kind)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingFeedback,
    })?;
    Ok(())
}

const FEEDBACK_COLUMNS: &str = "id, full_name, email, message, kind, is_approved, created_at";

pub async fn all(pool: &Pool<Postgres>) -> Result<Vec<DbFeedback>, ClubError> {
    sqlx::query_as::<_, DbFeedback>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingFeedback,
    })
}

pub async fn approved_testimonials(pool: &Pool<Postgres>) -> Result<Vec<DbFeedback>, ClubError> {
    sqlx::query_as::<_, DbFeedback>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE is_approved AND kind = 'testimonial' ORDER BY created_at DESC LIMIT 6"
    ))
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingFeedback,
    })
}

pub async fn set_approved(pool: &Pool<Postgres>, id: i32, approved: bool) -> Result<(), ClubError> {
    sqlx::query("UPDATE public.feedback SET is_approved = $2 WHERE id = $1")
        .bind(id)
        .bind(approved)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::UpdatingFeedback(id),
        })?;
    Ok(())
}

pub async fn delete(pool: &Pool<Postgres>, id: i32) -> Result<(), ClubError> {
    sqlx::query("DELETE FROM public.feedback WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::RemovingFeedback(id),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_the_select() {
        let fb = FeedbackForm {
            full_name: "Tunde".into(),
            email: Some(" ".into()),
            message: "Loved the tree planting!".into(),
            kind: "testimonial".into(),
        }
        .validate()
        .unwrap();

        assert_eq!(fb.kind, FeedbackKind::Testimonial);
        assert_eq!(fb.email, None);
    }

    #[test]
    fn unknown_kind_and_blank_message() {
        let errors = FeedbackForm {
            full_name: "Tunde".into(),
            email: None,
            message: "  ".into(),
            kind: "complaint".into(),
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.get("message"), Some("Message is required"));
        assert!(errors.get("kind").is_some());
    }
}
