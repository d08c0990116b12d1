//! Members: validation for the join/profile/admin forms, and the queries every page shares.

use crate::{
    academics::Hierarchy,
    error::{ClubError, DatabaseIDMethod, SqlxAction, SqlxSnafu},
    state::db_objects::{DbAlumnus, DbMember, MEMBER_COLUMNS, MEMBER_JOINS},
    validation::{looks_like_matric, non_blank, FieldErrors, LEVELS_OF_STUDY},
};
use chrono::Datelike;
use serde::Deserialize;
use snafu::ResultExt;
use sqlx::{Pool, Postgres};
use std::ops::RangeInclusive;

pub const MATRIC_CONSTRAINT: &str = "members_matric_number_key";
pub const EMAIL_CONSTRAINT: &str = "users_email_key";
pub const DUPLICATE_MATRIC_MESSAGE: &str = "A member with this matric number is already registered";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "An account with this email already exists";

///turns a write that tripped the matric or email unique key into the message for that field.
///`None` for any other failure
pub fn duplicate_errors(error: &ClubError) -> Option<FieldErrors> {
    let (field, message) = match error.unique_violation()? {
        MATRIC_CONSTRAINT => ("matric_number", DUPLICATE_MATRIC_MESSAGE),
        EMAIL_CONSTRAINT => ("email", DUPLICATE_EMAIL_MESSAGE),
        _ => return None,
    };

    let mut errors = FieldErrors::new();
    errors.add(field, message);
    Some(errors)
}

pub const MIN_PASSWORD_LEN: usize = 8;
pub const GRADUATION_YEAR_WINDOW: i32 = 10;

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

///years a new member may pick as their expected graduation year
pub fn join_years(current_year: i32) -> RangeInclusive<i32> {
    current_year..=current_year + GRADUATION_YEAR_WINDOW
}

///admins also need to be able to fix up members who should already have graduated
pub fn admin_years(current_year: i32) -> RangeInclusive<i32> {
    current_year - GRADUATION_YEAR_WINDOW..=current_year + GRADUATION_YEAR_WINDOW
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMember {
    pub full_name: String,
    pub matric_number: String,
    pub level_of_study: String,
    pub faculty_id: i32,
    pub department_id: i32,
    pub whatsapp_number: Option<String>,
    pub expected_graduation_year: i32,
}

///the member half of the join form, and the whole of the admin edit form.
///
///Selects post `""` for "nothing picked", so the ids come in as strings.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MemberFields {
    pub full_name: String,
    pub matric_number: String,
    pub level_of_study: String,
    pub faculty_id: String,
    pub department_id: String,
    pub whatsapp_number: Option<String>,
    pub expected_graduation_year: String,
}

fn check_level(errors: &mut FieldErrors, level: &str) {
    if !LEVELS_OF_STUDY.contains(&level) {
        errors.add("level_of_study", "Please pick a level of study");
    }
}

fn check_year(errors: &mut FieldErrors, year: &str, allowed: &RangeInclusive<i32>) -> Option<i32> {
    match year.trim().parse::<i32>() {
        Ok(y) if allowed.contains(&y) => Some(y),
        _ => {
            errors.add(
                "expected_graduation_year",
                format!(
                    "Expected graduation year must be between {} and {}",
                    allowed.start(),
                    allowed.end()
                ),
            );
            None
        }
    }
}

impl MemberFields {
    pub fn validate(
        self,
        hierarchy: &Hierarchy,
        allowed_years: &RangeInclusive<i32>,
    ) -> Result<ValidMember, FieldErrors> {
        let mut errors = FieldErrors::new();
        let whatsapp_number = non_blank(self.whatsapp_number);

        if errors.required("full_name", &self.full_name, "Full name") {
            errors.max_len("full_name", self.full_name.trim(), 120, "Full name");
        }
        if errors.required("matric_number", &self.matric_number, "Matric number")
            && !looks_like_matric(&self.matric_number)
        {
            errors.add(
                "matric_number",
                "Matric number may only contain letters, digits, / and -",
            );
        }
        check_level(&mut errors, &self.level_of_study);
        errors.optional_phone("whatsapp_number", whatsapp_number.as_deref());
        let year = check_year(&mut errors, &self.expected_graduation_year, allowed_years);

        let faculty_id = self.faculty_id.trim().parse::<i32>().ok();
        let department_id = self.department_id.trim().parse::<i32>().ok();
        match (faculty_id, department_id) {
            (None, _) => errors.add("faculty_id", "Please pick a faculty"),
            (Some(_), None) => errors.add("department_id", "Please pick a department"),
            (Some(f), Some(d)) if !hierarchy.department_belongs_to(d, f) => {
                errors.add("department_id", "That department is not in the chosen faculty");
            }
            _ => {}
        }

        errors.into_result()?;

        //all the `None`s above add an error, so we can't get here without values
        match (faculty_id, department_id, year) {
            (Some(faculty_id), Some(department_id), Some(expected_graduation_year)) => {
                Ok(ValidMember {
                    full_name: self.full_name.trim().to_string(),
                    matric_number: self.matric_number.trim().to_uppercase(),
                    level_of_study: self.level_of_study,
                    faculty_id,
                    department_id,
                    whatsapp_number,
                    expected_graduation_year,
                })
            }
            _ => Err(FieldErrors::new()),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct JoinForm {
    #[serde(rename = "ref")]
    pub link: Option<String>,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub matric_number: String,
    pub level_of_study: String,
    pub faculty_id: String,
    pub department_id: String,
    pub whatsapp_number: Option<String>,
    pub expected_graduation_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidJoin {
    pub email: String,
    pub password: String,
    pub member: ValidMember,
}

impl JoinForm {
    ///for refilling the form after a failed attempt - never includes the passwords
    pub fn to_liquid(&self) -> liquid::Object {
        liquid::object!({
            "email": self.email.as_str(),
            "full_name": self.full_name.as_str(),
            "matric_number": self.matric_number.as_str(),
            "level_of_study": self.level_of_study.as_str(),
            "faculty_id": self.faculty_id.as_str(),
            "department_id": self.department_id.as_str(),
            "whatsapp_number": self.whatsapp_number.clone().unwrap_or_default(),
            "expected_graduation_year": self.expected_graduation_year.as_str(),
        })
    }

    pub fn validate(
        self,
        hierarchy: &Hierarchy,
        current_year: i32,
    ) -> Result<ValidJoin, FieldErrors> {
        let mut errors = FieldErrors::new();

        if errors.required("email", &self.email, "Email") {
            errors.email("email", &self.email);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        let member = MemberFields {
            full_name: self.full_name,
            matric_number: self.matric_number,
            level_of_study: self.level_of_study,
            faculty_id: self.faculty_id,
            department_id: self.department_id,
            whatsapp_number: self.whatsapp_number,
            expected_graduation_year: self.expected_graduation_year,
        }
        .validate(hierarchy, &join_years(current_year));

        match member {
            Ok(member) if errors.is_empty() => Ok(ValidJoin {
                email: self.email.trim().to_lowercase(),
                password: self.password,
                member,
            }),
            Ok(_) => Err(errors),
            Err(member_errors) => {
                for (field, message) in member_errors {
                    errors.add(field, message);
                }
                Err(errors)
            }
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProfileForm {
    pub full_name: String,
    pub whatsapp_number: Option<String>,
    pub level_of_study: String,
    pub expected_graduation_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub full_name: String,
    pub whatsapp_number: Option<String>,
    pub level_of_study: String,
    pub expected_graduation_year: i32,
}

impl ProfileForm {
    pub fn validate(self, current_year: i32) -> Result<ValidProfile, FieldErrors> {
        let mut errors = FieldErrors::new();
        let whatsapp_number = non_blank(self.whatsapp_number);

        if errors.required("full_name", &self.full_name, "Full name") {
            errors.max_len("full_name", self.full_name.trim(), 120, "Full name");
        }
        errors.optional_phone("whatsapp_number", whatsapp_number.as_deref());
        check_level(&mut errors, &self.level_of_study);
        let year = check_year(
            &mut errors,
            &self.expected_graduation_year,
            &join_years(current_year),
        );

        match year {
            Some(expected_graduation_year) if errors.is_empty() => Ok(ValidProfile {
                full_name: self.full_name.trim().to_string(),
                whatsapp_number,
                level_of_study: self.level_of_study,
                expected_graduation_year,
            }),
            _ => Err(errors),
        }
    }
}

///case-insensitive substring match on name or matric number
pub fn matches_filter(member: &DbMember, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty()
        || member.full_name.to_lowercase().contains(&query)
        || member.matric_number.to_lowercase().contains(&query)
}

pub async fn all_members(pool: &Pool<Postgres>) -> Result<Vec<DbMember>, ClubError> {
    sqlx::query_as::<_, DbMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM {MEMBER_JOINS} ORDER BY m.full_name"
    ))
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingMembers,
    })
}

pub async fn find_member(pool: &Pool<Postgres>, id: i32) -> Result<DbMember, ClubError> {
    sqlx::query_as::<_, DbMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM {MEMBER_JOINS} WHERE m.id = $1"
    ))
    .bind(id)
    .fetch_one(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingMember(id.into()),
    })
}

pub async fn member_for_user(
    pool: &Pool<Postgres>,
    user_id: i32,
) -> Result<Option<DbMember>, ClubError> {
    sqlx::query_as::<_, DbMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM {MEMBER_JOINS} WHERE m.user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingMember(DatabaseIDMethod::Id(user_id)),
    })
}

pub async fn update_member(
    pool: &Pool<Postgres>,
    id: i32,
    member: &ValidMember,
) -> Result<(), ClubError> {
    sqlx::query(
        r#"
UPDATE public.members
SET full_name = $2, matric_number = $3, level_of_study = $4, faculty_id = $5, department_id = $6, whatsapp_number = $7, expected_graduation_year = $8
WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&member.full_name)
    .bind(&member.matric_number)
    .bind(&member.level_of_study)
    .bind(member.faculty_id)
    .bind(member.department_id)
    .bind(&member.whatsapp_number)
    .bind(member.expected_graduation_year)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingMember(id.into()),
    })?;
    Ok(())
}

pub async fn update_profile(
    pool: &Pool<Postgres>,
    id: i32,
    profile: &ValidProfile,
) -> Result<(), ClubError> {
    sqlx::query(
        r#"
UPDATE public.members
SET full_name = $2, whatsapp_number = $3, level_of_study = $4, expected_graduation_year = $5
WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&profile.full_name)
    .bind(&profile.whatsapp_number)
    .bind(&profile.level_of_study)
    .bind(profile.expected_graduation_year)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingMember(id.into()),
    })?;
    Ok(())
}

pub async fn delete_member(pool: &Pool<Postgres>, id: i32) -> Result<(), ClubError> {
    sqlx::query("DELETE FROM public.members WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::RemovingMember(id.into()),
        })?;
    Ok(())
}

pub async fn all_alumni(pool: &Pool<Postgres>) -> Result<Vec<DbAlumnus>, ClubError> {
    sqlx::query_as::<_, DbAlumnus>(
        r#"
SELECT a.id, a.full_name, a.matric_number, f.name AS faculty_name, d.name AS department_name, a.whatsapp_number, a.graduation_year
FROM alumni a
LEFT JOIN faculties f ON f.id = a.faculty_id
LEFT JOIN departments d ON d.id = a.department_id
ORDER BY a.graduation_year DESC, a.full_name
        "#,
    )
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAlumni,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::test_errors::unique_violation_on,
        state::db_objects::{DbCollege, DbDepartment, DbFaculty},
    };

    #[test]
    fn duplicate_matric_gets_its_own_message() {
        let errors = duplicate_errors(&unique_violation_on(MATRIC_CONSTRAINT)).unwrap();
        assert_eq!(errors.get("matric_number"), Some(DUPLICATE_MATRIC_MESSAGE));
        assert_eq!(errors.get("email"), None);
    }

    #[test]
    fn duplicate_email_gets_its_own_message() {
        let errors = duplicate_errors(&unique_violation_on(EMAIL_CONSTRAINT)).unwrap();
        assert_eq!(errors.get("email"), Some(DUPLICATE_EMAIL_MESSAGE));
    }

    #[test]
    fn other_failures_are_not_duplicates() {
        assert!(duplicate_errors(&unique_violation_on("registration_links_slug_key")).is_none());
        assert!(duplicate_errors(&ClubError::Sqlx {
            source: sqlx::Error::RowNotFound,
            action: SqlxAction::AddingMember,
        })
        .is_none());
    }

    fn hierarchy() -> Hierarchy {
        Hierarchy::build(
            vec![DbCollege {
                id: 1,
                name: "Sciences".into(),
                display_order: 0,
            }],
            vec![
                DbFaculty {
                    id: 10,
                    name: "Physical Sciences".into(),
                    college_id: Some(1),
                    display_order: 0,
                },
                DbFaculty {
                    id: 11,
                    name: "Law".into(),
                    college_id: None,
                    display_order: 0,
                },
            ],
            vec![DbDepartment {
                id: 100,
                name: "Physics".into(),
                faculty_id: 10,
                display_order: 0,
            }],
        )
    }

    fn join_form() -> JoinForm {
        JoinForm {
            link: Some("abc".into()),
            email: " Ngozi@Example.com ".into(),
            password: "sdg4ever!".into(),
            confirm_password: "sdg4ever!".into(),
            full_name: " Ngozi Eze ".into(),
            matric_number: "eng/19/0123".into(),
            level_of_study: "300".into(),
            faculty_id: "10".into(),
            department_id: "100".into(),
            whatsapp_number: Some(String::new()),
            expected_graduation_year: "2026".into(),
        }
    }

    #[test]
    fn valid_join_is_normalised() {
        let join = join_form().validate(&hierarchy(), 2024).unwrap();
        assert_eq!(join.email, "ngozi@example.com");
        assert_eq!(join.member.full_name, "Ngozi Eze");
        assert_eq!(join.member.matric_number, "ENG/19/0123");
        assert_eq!(join.member.whatsapp_number, None);
    }

    #[test]
    fn password_rules() {
        let mut form = join_form();
        form.password = "short".into();
        form.confirm_password = "shorter".into();

        let errors = form.validate(&hierarchy(), 2024).unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters")
        );
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
    }

    #[test]
    fn department_must_be_in_faculty() {
        let mut form = join_form();
        form.faculty_id = "11".into();

        let errors = form.validate(&hierarchy(), 2024).unwrap_err();
        assert_eq!(
            errors.get("department_id"),
            Some("That department is not in the chosen faculty")
        );
    }

    #[test]
    fn graduation_year_window() {
        let mut form = join_form();
        form.expected_graduation_year = "2035".into();
        let errors = form.validate(&hierarchy(), 2024).unwrap_err();
        assert_eq!(
            errors.get("expected_graduation_year"),
            Some("Expected graduation year must be between 2024 and 2034")
        );

        let mut form = join_form();
        form.expected_graduation_year = "2023".into();
        assert!(form.validate(&hierarchy(), 2024).is_err());
    }

    #[test]
    fn profile_level_must_be_known() {
        let errors = ProfileForm {
            full_name: "Ngozi".into(),
            whatsapp_number: None,
            level_of_study: "900".into(),
            expected_graduation_year: "2025".into(),
        }
        .validate(2024)
        .unwrap_err();

        assert_eq!(errors.get("level_of_study"), Some("Please pick a level of study"));
    }

    #[test]
    fn member_filter() {
        let member = DbMember {
            id: 1,
            full_name: "Ngozi Eze".into(),
            matric_number: "ENG/19/0123".into(),
            faculty_id: None,
            faculty_name: None,
            department_id: None,
            department_name: None,
            level_of_study: "300".into(),
            whatsapp_number: None,
            expected_graduation_year: 2026,
            user_id: None,
        };

        assert!(matches_filter(&member, ""));
        assert!(matches_filter(&member, "ngozi"));
        assert!(matches_filter(&member, "19/01"));
        assert!(!matches_filter(&member, "tunde"));
    }
}
