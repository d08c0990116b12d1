//! Row types for everything we read out of postgres.
//!
//! Queries are written with `query_as::<_, T>` so that every `SELECT` lists the columns below explicitly.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumIter, EnumString};

#[derive(
    sqlx::Type, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug,
)]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    User,
    Admin,
}

#[derive(
    sqlx::Type,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Display,
    EnumString,
    EnumIter,
)]
#[sqlx(type_name = "feedback_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeedbackKind {
    Feedback,
    Testimonial,
    Recommendation,
}

//get everything `u.id, u.email, u.hashed_password, r.role`
#[derive(Clone, FromRow)]
pub struct DbUser {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub role: AppRole,
}

impl std::fmt::Debug for DbUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

pub const MEMBER_COLUMNS: &str = r#"m.id, m.full_name, m.matric_number, m.faculty_id, f.name AS faculty_name, m.department_id, d.name AS department_name, m.level_of_study, m.whatsapp_number, m.expected_graduation_year, m.user_id"#;
pub const MEMBER_JOINS: &str = r#"members m
LEFT JOIN faculties f ON f.id = m.faculty_id
LEFT JOIN departments d ON d.id = m.department_id"#;

#[derive(Deserialize, Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct DbMember {
    pub id: i32,
    pub full_name: String,
    pub matric_number: String,
    pub faculty_id: Option<i32>,
    pub faculty_name: Option<String>,
    pub department_id: Option<i32>,
    pub department_name: Option<String>,
    pub level_of_study: String,
    pub whatsapp_number: Option<String>,
    pub expected_graduation_year: i32,
    pub user_id: Option<i32>,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbAlumnus {
    pub id: i32,
    pub full_name: String,
    pub matric_number: String,
    pub faculty_name: Option<String>,
    pub department_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub graduation_year: i32,
}

pub const EVENT_COLUMNS: &str = r#"id, title, description, starts_at, ends_at, location, max_attendees, is_published, registration_required, image_url"#;

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbEvent {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub max_attendees: Option<i32>,
    pub is_published: bool,
    pub registration_required: bool,
    pub image_url: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbRegistration {
    pub id: i32,
    pub event_id: i32,
    pub full_name: String,
    pub email: Option<String>,
    pub whatsapp_number: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbAttendance {
    pub id: i32,
    pub event_id: i32,
    pub member_id: Option<i32>,
    pub registration_id: Option<i32>,
    pub attendee_name: String,
    pub matric_number: Option<String>,
    pub checked_in_at: NaiveDateTime,
    pub checked_in_by: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbFeedback {
    pub id: i32,
    pub full_name: String,
    pub email: Option<String>,
    pub message: String,
    pub kind: FeedbackKind,
    pub is_approved: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbRegistrationLink {
    pub id: i32,
    pub slug: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct DbCollege {
    pub id: i32,
    pub name: String,
    pub display_order: i32,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct DbFaculty {
    pub id: i32,
    pub name: String,
    pub college_id: Option<i32>,
    pub display_order: i32,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct DbDepartment {
    pub id: i32,
    pub name: String,
    pub faculty_id: i32,
    pub display_order: i32,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug, Default)]
pub struct DbOrganizationSettings {
    pub mission: String,
    pub vision: String,
    pub about: String,
    pub aims: Vec<String>,
    pub objectives: Vec<String>,
}
