//! One-shot notifications ("toasts") carried across a redirect in the `notice` query parameter.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Registered,
    Joined,
    AlreadyRegistered,
    FullyBooked,
    RegistrationClosed,
    FeedbackReceived,
    MessageSent,
    ProfileUpdated,
    Saved,
    Deleted,
    Graduated,
    CannotDemoteSelf,
    DuplicateSlug,
    Failed,
}

#[derive(Serialize, Copy, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

impl Notice {
    pub fn title(self) -> &'static str {
        match self {
            Self::Registered => "Registered",
            Self::Joined => "Welcome",
            Self::AlreadyRegistered => "Already Registered",
            Self::FullyBooked => "Fully Booked",
            Self::RegistrationClosed => "Registration Closed",
            Self::FeedbackReceived => "Thank You",
            Self::MessageSent => "Message Sent",
            Self::ProfileUpdated => "Profile Updated",
            Self::Saved => "Saved",
            Self::Deleted => "Deleted",
            Self::Graduated => "Moved to Alumni",
            Self::CannotDemoteSelf => "Not Allowed",
            Self::DuplicateSlug => "Slug Taken",
            Self::Failed => "Failed",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Registered => "You're registered for this event. See you there!",
            Self::Joined => "Your membership has been registered. Welcome aboard!",
            Self::AlreadyRegistered => "You have already registered for this event.",
            Self::FullyBooked => "Sorry, this event has no spots left.",
            Self::RegistrationClosed => "Registration is not open for this event.",
            Self::FeedbackReceived => "Your feedback has been submitted.",
            Self::MessageSent => "Your message is on its way. We'll get back to you soon.",
            Self::ProfileUpdated => "Your profile has been updated.",
            Self::Saved => "Your changes have been saved.",
            Self::Deleted => "The item has been deleted.",
            Self::Graduated => "The member has been moved to the alumni list.",
            Self::CannotDemoteSelf => "You cannot remove your own admin role.",
            Self::DuplicateSlug => "A registration link with that slug already exists.",
            Self::Failed => "That didn't work. Please try again.",
        }
    }

    pub fn level(self) -> NoticeLevel {
        match self {
            Self::Registered
            | Self::Joined
            | Self::FeedbackReceived
            | Self::MessageSent
            | Self::ProfileUpdated
            | Self::Saved
            | Self::Deleted
            | Self::Graduated => NoticeLevel::Success,
            Self::AlreadyRegistered | Self::RegistrationClosed => NoticeLevel::Info,
            Self::FullyBooked | Self::CannotDemoteSelf | Self::DuplicateSlug | Self::Failed => {
                NoticeLevel::Error
            }
        }
    }

    pub fn to_liquid(self) -> liquid::Object {
        liquid::object!({
            "title": self.title(),
            "message": self.message(),
            "level": self.level(),
        })
    }

    ///`path` must not already carry a query string
    pub fn redirect_to(self, path: &str) -> String {
        //serde_json gives us the same snake_case name the query extractor expects
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(ToString::to_string))
            .unwrap_or_default();
        format!("{path}?notice={name}")
    }
}

#[derive(Deserialize, Default, Debug)]
pub struct NoticeQuery {
    pub notice: Option<Notice>,
}

impl NoticeQuery {
    pub fn to_liquid(&self) -> liquid::model::Value {
        match self.notice {
            Some(n) => liquid::model::Value::Object(n.to_liquid()),
            None => liquid::model::Value::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_carry_snake_case_names() {
        assert_eq!(
            Notice::AlreadyRegistered.redirect_to("/events/3"),
            "/events/3?notice=already_registered"
        );
    }

    #[test]
    fn duplicate_registration_is_not_a_generic_failure() {
        assert_eq!(Notice::AlreadyRegistered.title(), "Already Registered");
        assert_ne!(
            Notice::AlreadyRegistered.message(),
            Notice::Failed.message()
        );
    }

    #[test]
    fn query_round_trips_through_serde() {
        let parsed: NoticeQuery = serde_json::from_str(r#"{"notice":"fully_booked"}"#).unwrap();
        assert_eq!(parsed.notice, Some(Notice::FullyBooked));
    }
}
