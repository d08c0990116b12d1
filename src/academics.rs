//! Colleges, faculties and departments.
//!
//! A faculty either sits under a college or stands alone, and every department belongs to one faculty.
//! Deleting a parent cascades inside postgres, so nothing here walks the tree to delete it.

use crate::{
    error::{ClubError, DatabaseIDMethod, SqlxAction, SqlxSnafu},
    state::db_objects::{DbCollege, DbDepartment, DbFaculty},
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::{Pool, Postgres};
use std::collections::HashMap;

///where a faculty hangs, parsed from the `college_id` select box where `""` means standalone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacultyParent {
    Standalone,
    College(i32),
}

impl FacultyParent {
    pub fn from_form(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            Some(Self::Standalone)
        } else {
            value.parse().ok().map(Self::College)
        }
    }

    pub fn college_id(self) -> Option<i32> {
        match self {
            Self::Standalone => None,
            Self::College(id) => Some(id),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FacultyNode {
    #[serde(flatten)]
    pub faculty: DbFaculty,
    pub departments: Vec<DbDepartment>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CollegeNode {
    #[serde(flatten)]
    pub college: DbCollege,
    pub faculties: Vec<FacultyNode>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub colleges: Vec<CollegeNode>,
    pub standalone_faculties: Vec<FacultyNode>,
}

impl Hierarchy {
    ///nests flat rows. Faculties pointing at a college we don't have are shown as standalone, departments
    ///pointing at a missing faculty are dropped.
    pub fn build(
        mut colleges: Vec<DbCollege>,
        mut faculties: Vec<DbFaculty>,
        mut departments: Vec<DbDepartment>,
    ) -> Self {
        colleges.sort_by(|a, b| (a.display_order, &a.name).cmp(&(b.display_order, &b.name)));
        faculties.sort_by(|a, b| (a.display_order, &a.name).cmp(&(b.display_order, &b.name)));
        departments.sort_by(|a, b| (a.display_order, &a.name).cmp(&(b.display_order, &b.name)));

        let mut departments_by_faculty: HashMap<i32, Vec<DbDepartment>> = HashMap::new();
        for department in departments {
            departments_by_faculty
                .entry(department.faculty_id)
                .or_default()
                .push(department);
        }

        let mut faculties_by_college: HashMap<i32, Vec<FacultyNode>> = HashMap::new();
        let mut standalone_faculties = vec![];
        for faculty in faculties {
            let node = FacultyNode {
                departments: departments_by_faculty.remove(&faculty.id).unwrap_or_default(),
                faculty,
            };

            match node.faculty.college_id {
                Some(cid) if colleges.iter().any(|c| c.id == cid) => {
                    faculties_by_college.entry(cid).or_default().push(node);
                }
                _ => standalone_faculties.push(node),
            }
        }

        if !departments_by_faculty.is_empty() {
            warn!(
                n = departments_by_faculty.values().map(Vec::len).sum::<usize>(),
                "Found departments without a faculty"
            );
        }

        let colleges = colleges
            .into_iter()
            .map(|college| CollegeNode {
                faculties: faculties_by_college.remove(&college.id).unwrap_or_default(),
                college,
            })
            .collect();

        Self {
            colleges,
            standalone_faculties,
        }
    }

    pub fn faculties(&self) -> impl Iterator<Item = &FacultyNode> {
        self.colleges
            .iter()
            .flat_map(|c| c.faculties.iter())
            .chain(self.standalone_faculties.iter())
    }

    pub fn department_belongs_to(&self, department_id: i32, faculty_id: i32) -> bool {
        self.faculties()
            .find(|f| f.faculty.id == faculty_id)
            .is_some_and(|f| f.departments.iter().any(|d| d.id == department_id))
    }
}

pub async fn load_hierarchy(pool: &Pool<Postgres>) -> Result<Hierarchy, ClubError> {
    let colleges = sqlx::query_as::<_, DbCollege>(
        "SELECT id, name, display_order FROM colleges",
    )
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAcademics,
    })?;
    let faculties = sqlx::query_as::<_, DbFaculty>(
        "SELECT id, name, college_id, display_order FROM faculties",
    )
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAcademics,
    })?;
    let departments = sqlx::query_as::<_, DbDepartment>(
        "SELECT id, name, faculty_id, display_order FROM departments",
    )
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAcademics,
    })?;

    Ok(Hierarchy::build(colleges, faculties, departments))
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AcademicUnit {
    College,
    Faculty,
    Department,
}

impl AcademicUnit {
    fn table(self) -> &'static str {
        match self {
            Self::College => "colleges",
            Self::Faculty => "faculties",
            Self::Department => "departments",
        }
    }
}

pub async fn add_college(pool: &Pool<Postgres>, name: &str, display_order: i32) -> Result<(), ClubError> {
    sqlx::query("INSERT INTO public.colleges (name, display_order) VALUES ($1, $2)")
        .bind(name.trim())
        .bind(display_order)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::AddingAcademicUnit,
        })?;
    Ok(())
}

pub async fn add_faculty(
    pool: &Pool<Postgres>,
    name: &str,
    parent: FacultyParent,
    display_order: i32,
) -> Result<(), ClubError> {
    sqlx::query(
        "INSERT INTO public.faculties (name, college_id, display_order) VALUES ($1, $2, $3)",
    )
    .bind(name.trim())
    .bind(parent.college_id())
    .bind(display_order)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingAcademicUnit,
    })?;
    Ok(())
}

pub async fn add_department(
    pool: &Pool<Postgres>,
    name: &str,
    faculty_id: i32,
    display_order: i32,
) -> Result<(), ClubError> {
    sqlx::query(
        "INSERT INTO public.departments (name, faculty_id, display_order) VALUES ($1, $2, $3)",
    )
    .bind(name.trim())
    .bind(faculty_id)
    .bind(display_order)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingAcademicUnit,
    })?;
    Ok(())
}

pub async fn rename_unit(
    pool: &Pool<Postgres>,
    unit: AcademicUnit,
    id: i32,
    name: &str,
    display_order: i32,
) -> Result<(), ClubError> {
    //table names come from a closed enum, never from the request
    sqlx::query(&format!(
        "UPDATE public.{} SET name = $2, display_order = $3 WHERE id = $1",
        unit.table()
    ))
    .bind(id)
    .bind(name.trim())
    .bind(display_order)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingAcademicUnit(DatabaseIDMethod::Id(id)),
    })?;
    Ok(())
}

pub async fn reparent_faculty(
    pool: &Pool<Postgres>,
    faculty_id: i32,
    parent: FacultyParent,
) -> Result<(), ClubError> {
    sqlx::query("UPDATE public.faculties SET college_id = $2 WHERE id = $1")
        .bind(faculty_id)
        .bind(parent.college_id())
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::UpdatingAcademicUnit(DatabaseIDMethod::Id(faculty_id)),
        })?;
    Ok(())
}

pub async fn delete_unit(pool: &Pool<Postgres>, unit: AcademicUnit, id: i32) -> Result<(), ClubError> {
    sqlx::query(&format!("DELETE FROM public.{} WHERE id = $1", unit.table()))
        .bind(id)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::RemovingAcademicUnit(DatabaseIDMethod::Id(id)),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn college(id: i32, name: &str, display_order: i32) -> DbCollege {
        DbCollege {
            id,
            name: name.into(),
            display_order,
        }
    }
    fn faculty(id: i32, name: &str, college_id: Option<i32>) -> DbFaculty {
        DbFaculty {
            id,
            name: name.into(),
            college_id,
            display_order: 0,
        }
    }
    fn department(id: i32, name: &str, faculty_id: i32) -> DbDepartment {
        DbDepartment {
            id,
            name: name.into(),
            faculty_id,
            display_order: 0,
        }
    }

    #[test]
    fn parents_from_forms() {
        assert_eq!(FacultyParent::from_form(""), Some(FacultyParent::Standalone));
        assert_eq!(FacultyParent::from_form(" 4 "), Some(FacultyParent::College(4)));
        assert_eq!(FacultyParent::from_form("abc"), None);
        assert_eq!(FacultyParent::College(4).college_id(), Some(4));
    }

    #[test]
    fn nests_in_display_order() {
        let h = Hierarchy::build(
            vec![college(1, "Sciences", 2), college(2, "Arts", 1)],
            vec![
                faculty(10, "Physical Sciences", Some(1)),
                faculty(11, "Law", None),
                faculty(12, "Humanities", Some(2)),
            ],
            vec![
                department(100, "Physics", 10),
                department(101, "Chemistry", 10),
                department(102, "Private Law", 11),
            ],
        );

        let names: Vec<_> = h.colleges.iter().map(|c| c.college.name.as_str()).collect();
        assert_eq!(names, ["Arts", "Sciences"]);

        let sciences = &h.colleges[1];
        assert_eq!(sciences.faculties.len(), 1);
        let departments: Vec<_> = sciences.faculties[0]
            .departments
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(departments, ["Chemistry", "Physics"]);

        assert_eq!(h.standalone_faculties.len(), 1);
        assert_eq!(h.standalone_faculties[0].faculty.name, "Law");
    }

    #[test]
    fn orphans_do_not_panic() {
        let h = Hierarchy::build(
            vec![],
            vec![faculty(10, "Lost Faculty", Some(99))],
            vec![department(100, "Lost Department", 42)],
        );

        assert!(h.colleges.is_empty());
        assert_eq!(h.standalone_faculties.len(), 1);
        assert!(h.standalone_faculties[0].departments.is_empty());
    }

    #[test]
    fn department_membership() {
        let h = Hierarchy::build(
            vec![college(1, "Sciences", 0)],
            vec![faculty(10, "Physical Sciences", Some(1)), faculty(11, "Law", None)],
            vec![department(100, "Physics", 10)],
        );

        assert!(h.department_belongs_to(100, 10));
        assert!(!h.department_belongs_to(100, 11));
        assert!(!h.department_belongs_to(5, 10));
    }
}
