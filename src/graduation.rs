//! Moving members whose expected graduation year has arrived over to the alumni table.

use crate::{
    error::{ClubError, DatabaseIDMethod, SqlxAction, SqlxSnafu},
    state::db_objects::DbMember,
};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, Transaction};

pub fn is_graduating(expected_graduation_year: i32, current_year: i32) -> bool {
    expected_graduation_year <= current_year
}

pub fn graduating_members(members: Vec<DbMember>, current_year: i32) -> Vec<DbMember> {
    members
        .into_iter()
        .filter(|m| is_graduating(m.expected_graduation_year, current_year))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    NoSuchMember,
    NotDue,
    Graduate,
}

fn decide(expected_graduation_year: Option<i32>, current_year: i32) -> Move {
    match expected_graduation_year {
        None => Move::NoSuchMember,
        Some(year) if !is_graduating(year, current_year) => Move::NotDue,
        Some(_) => Move::Graduate,
    }
}

///copies then deletes - returns `false` if there was no such member, or they aren't due yet.
///
///attendance rows stay behind with their member reference nulled
async fn move_to_alumni(
    tx: &mut Transaction<'_, Postgres>,
    member_id: i32,
    current_year: i32,
) -> Result<bool, ClubError> {
    let expected: Option<i32> =
        sqlx::query_scalar("SELECT expected_graduation_year FROM members WHERE id = $1 FOR UPDATE")
            .bind(member_id)
            .fetch_optional(&mut **tx)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingMember(DatabaseIDMethod::Id(member_id)),
            })?;

    match decide(expected, current_year) {
        Move::Graduate => {}
        Move::NoSuchMember => return Ok(false),
        Move::NotDue => {
            warn!(%member_id, ?expected, "Refusing to graduate member who isn't due yet");
            return Ok(false);
        }
    }

    sqlx::query(
        r#"
INSERT INTO public.alumni
(full_name, matric_number, faculty_id, department_id, whatsapp_number, graduation_year, user_id)
SELECT full_name, matric_number, faculty_id, department_id, whatsapp_number, expected_graduation_year, user_id
FROM members
WHERE id = $1
        "#,
    )
    .bind(member_id)
    .execute(&mut **tx)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingAlumnus(DatabaseIDMethod::Id(member_id)),
    })?;

    sqlx::query("DELETE FROM public.members WHERE id = $1")
        .bind(member_id)
        .execute(&mut **tx)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::RemovingMember(DatabaseIDMethod::Id(member_id)),
        })?;

    Ok(true)
}

#[instrument(level = "debug", skip(pool))]
pub async fn graduate_member(
    pool: &Pool<Postgres>,
    member_id: i32,
    current_year: i32,
) -> Result<bool, ClubError> {
    graduate_members(pool, &[member_id], current_year)
        .await
        .map(|n| n == 1)
}

///all-or-nothing: if any member fails to move (eg. a clashing alumni matric number) nobody moves
#[instrument(level = "debug", skip(pool))]
pub async fn graduate_members(
    pool: &Pool<Postgres>,
    member_ids: &[i32],
    current_year: i32,
) -> Result<usize, ClubError> {
    let mut tx = pool.begin().await.context(SqlxSnafu {
        action: SqlxAction::BeginningTransaction,
    })?;

    let mut moved = 0;
    for id in member_ids {
        if move_to_alumni(&mut tx, *id, current_year).await? {
            moved += 1;
        }
    }

    tx.commit().await.context(SqlxSnafu {
        action: SqlxAction::CommittingTransaction,
    })?;

    info!(%moved, "Moved members to alumni");
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i32, year: i32) -> DbMember {
        DbMember {
            id,
            full_name: format!("Member {id}"),
            matric_number: format!("M{id}"),
            faculty_id: None,
            faculty_name: None,
            department_id: None,
            department_name: None,
            level_of_study: "400".into(),
            whatsapp_number: None,
            expected_graduation_year: year,
            user_id: None,
        }
    }

    #[test]
    fn graduating_years() {
        assert!(is_graduating(2023, 2024));
        assert!(is_graduating(2024, 2024));
        assert!(!is_graduating(2025, 2024));
    }

    #[test]
    fn only_due_members_are_moved() {
        assert_eq!(decide(None, 2024), Move::NoSuchMember);
        assert_eq!(decide(Some(2027), 2024), Move::NotDue);
        assert_eq!(decide(Some(2024), 2024), Move::Graduate);
        assert_eq!(decide(Some(2020), 2024), Move::Graduate);
    }

    #[test]
    fn attendance_outlives_graduated_members() {
        let schema = include_str!("../migrations/20240901000000_initial.sql");
        let table = schema
            .split("CREATE TABLE public.event_attendance (")
            .nth(1)
            .and_then(|rest| rest.split(");").next())
            .unwrap();
        let column = |name: &str| {
            table
                .lines()
                .map(str::trim)
                .find(|l| l.starts_with(name))
                .unwrap()
        };

        assert!(column("member_id ").ends_with("ON DELETE SET NULL,"));
        assert!(column("registration_id ").ends_with("ON DELETE SET NULL,"));
        assert!(column("attendee_name ").contains("NOT NULL"));
        assert!(table.contains("CHECK (member_id IS NULL OR registration_id IS NULL)"));
    }

    #[test]
    fn only_due_members_are_listed() {
        let due = graduating_members(vec![member(1, 2024), member(2, 2026), member(3, 2019)], 2024);
        let ids: Vec<_> = due.iter().map(|m| m.id).collect();
        assert_eq!(ids, [1, 3]);
    }
}
