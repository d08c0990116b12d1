use crate::{
    auth::{backend::Auth, get_auth_object},
    error::ClubError,
    notice::{Notice, NoticeQuery},
    state::{mail::EmailToSend, ClubState},
    validation::FieldErrors,
};
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use http::StatusCode;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ContactForm {
    pub full_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(self) -> Result<EmailToSend, FieldErrors> {
        let mut errors = FieldErrors::new();

        if errors.required("full_name", &self.full_name, "Name") {
            errors.max_len("full_name", self.full_name.trim(), 120, "Name");
        }
        if errors.required("email", &self.email, "Email") {
            errors.email("email", &self.email);
        }
        if errors.required("subject", &self.subject, "Subject") {
            errors.max_len("subject", self.subject.trim(), 200, "Subject");
        }
        if errors.required("message", &self.message, "Message") {
            errors.max_len("message", self.message.trim(), 5000, "Message");
        }

        errors.into_result().map(|()| EmailToSend {
            //newlines in a display name would break the headers
            from_name: self.full_name.trim().replace(['\r', '\n', '"', '<', '>'], " "),
            from_email: self.email.trim().to_string(),
            subject: self.subject.trim().replace(['\r', '\n'], " "),
            message: self.message.trim().to_string(),
        })
    }
}

async fn render_contact(
    state: &ClubState,
    auth: &Auth,
    notice: liquid::model::Value,
    form: &ContactForm,
    errors: &FieldErrors,
) -> Result<Html<String>, ClubError> {
    state
        .compile(
            "www/contact.liquid",
            liquid::object!({
                "auth": get_auth_object(auth),
                "notice": notice,
                "form": liquid::object!({
                    "full_name": form.full_name.as_str(),
                    "email": form.email.as_str(),
                    "subject": form.subject.as_str(),
                    "message": form.message.as_str(),
                }),
                "errors": errors,
            }),
            Some("Contact Us".into()),
        )
        .await
}

#[axum::debug_handler]
async fn get_contact(
    auth: Auth,
    State(state): State<ClubState>,
    Query(notice): Query<NoticeQuery>,
) -> Result<impl IntoResponse, ClubError> {
    render_contact(
        &state,
        &auth,
        notice.to_liquid(),
        &ContactForm::default(),
        &FieldErrors::new(),
    )
    .await
}

#[axum::debug_handler]
async fn post_contact(
    auth: Auth,
    State(state): State<ClubState>,
    Form(form): Form<ContactForm>,
) -> Result<impl IntoResponse, ClubError> {
    match form.clone().validate() {
        Ok(email) => {
            //delivery happens on the mail thread, failures there are only logged
            state.send_email(email)?;
            Ok(Redirect::to(&Notice::MessageSent.redirect_to("/contact")).into_response())
        }
        Err(errors) => {
            let html =
                render_contact(&state, &auth, liquid::model::Value::Nil, &form, &errors).await?;
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
    }
}

pub fn router() -> Router<ClubState> {
    Router::new().route("/contact", get(get_contact).post(post_contact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_breaking_characters_are_stripped() {
        let email = ContactForm {
            full_name: "Ada\r\nBcc: someone@example.com".into(),
            email: "ada@example.com".into(),
            subject: "Hi\nthere".into(),
            message: "Hello".into(),
        }
        .validate()
        .unwrap();

        assert!(!email.from_name.contains('\n'));
        assert_eq!(email.subject, "Hi there");
    }

    #[test]
    fn every_field_is_required() {
        let errors = ContactForm::default().validate().unwrap_err();
        for field in ["full_name", "email", "subject", "message"] {
            assert!(errors.get(field).is_some(), "{field} should be required");
        }
    }
}
