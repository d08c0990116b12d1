//! Form checks that run before anything touches the database.
//!
//! Every check records a message against the form field it belongs to, so templates can show it next to the input.

use serde::Serialize;
use std::collections::BTreeMap;

pub const LEVELS_OF_STUDY: &[&str] = &["100", "200", "300", "400", "500", "600", "700", "Postgraduate"];

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        //first message wins, it's usually the most useful one
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn required(&mut self, field: &'static str, value: &str, label: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, format!("{label} is required"));
            false
        } else {
            true
        }
    }

    pub fn max_len(&mut self, field: &'static str, value: &str, max: usize, label: &str) {
        if value.chars().count() > max {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        if !looks_like_email(value) {
            self.add(field, "Please enter a valid email address");
        }
    }

    pub fn optional_email(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            self.email(field, value);
        }
    }

    pub fn optional_phone(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            if !looks_like_phone(value) {
                self.add(
                    field,
                    "WhatsApp number may only contain digits, spaces and a leading +",
                );
            }
        }
    }
}

impl IntoIterator for FieldErrors {
    type Item = (&'static str, String);
    type IntoIter = std::collections::btree_map::IntoIter<&'static str, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

///trims, and turns blank strings into `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !value.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

pub fn looks_like_phone(value: &str) -> bool {
    let value = value.trim();
    let digits = value.strip_prefix('+').unwrap_or(value);
    let n_digits = digits.chars().filter(char::is_ascii_digit).count();

    (7..=15).contains(&n_digits)
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
}

pub fn looks_like_matric(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value.len() <= 32
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '-')
}

///one entry per non-blank line
pub fn lines_to_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(looks_like_email("ada@unilag.edu.ng"));
        assert!(looks_like_email("  ada@example.com "));
        assert!(!looks_like_email("ada@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada example@example.com"));
        assert!(!looks_like_email("ada.example.com"));
    }

    #[test]
    fn phones() {
        assert!(looks_like_phone("+234 803 123 4567"));
        assert!(looks_like_phone("08031234567"));
        assert!(!looks_like_phone("0803-CALL-NOW"));
        assert!(!looks_like_phone("123"));
    }

    #[test]
    fn matric_numbers() {
        assert!(looks_like_matric("190404012"));
        assert!(looks_like_matric("ENG/19/0123"));
        assert!(!looks_like_matric("ENG 19 0123"));
        assert!(!looks_like_matric(""));
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        assert!(!errors.required("full_name", "   ", "Full name"));
        errors.max_len("full_name", "", 3, "Full name");
        errors.optional_email("email", Some("nope"));
        errors.optional_phone("whatsapp_number", None);

        assert_eq!(errors.get("full_name"), Some("Full name is required"));
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(errors.get("whatsapp_number"), None);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" x ".into())), Some("x".into()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn list_lines() {
        assert_eq!(
            lines_to_list("Quality education\r\n\n  Climate action  \n"),
            vec!["Quality education".to_string(), "Climate action".to_string()]
        );
    }
}
