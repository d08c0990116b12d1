//! Invite links that open the member self-registration form at `/join?ref=<slug>`.

use crate::{
    error::{ClubError, DatabaseIDMethod, SqlxAction, SqlxSnafu},
    state::db_objects::DbRegistrationLink,
};
use rand::{distributions::Alphanumeric, Rng};
use snafu::ResultExt;
use sqlx::{Pool, Postgres};

pub const SLUG_LEN: usize = 10;
pub const SLUG_CONSTRAINT: &str = "registration_links_slug_key";

pub fn random_slug() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_LEN)
        .map(char::from)
        .collect()
}

///custom slugs keep to url-safe characters, blank means "make one up"
pub fn clean_slug(custom: Option<&str>) -> Option<String> {
    let custom = custom.map(str::trim).filter(|s| !s.is_empty())?;
    let cleaned: String = custom
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

pub async fn is_active(pool: &Pool<Postgres>, slug: &str) -> Result<bool, ClubError> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM registration_links WHERE slug = $1 AND is_active)",
    )
    .bind(slug)
    .fetch_one(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingRegistrationLink(DatabaseIDMethod::Slug(slug.to_string())),
    })
}

pub async fn all(pool: &Pool<Postgres>) -> Result<Vec<DbRegistrationLink>, ClubError> {
    sqlx::query_as::<_, DbRegistrationLink>(
        "SELECT id, slug, is_active, created_at FROM registration_links ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingRegistrationLinks,
    })
}

pub async fn create(pool: &Pool<Postgres>, slug: &str) -> Result<(), ClubError> {
    sqlx::query("INSERT INTO public.registration_links (slug) VALUES ($1)")
        .bind(slug)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::AddingRegistrationLink,
        })?;
    Ok(())
}

pub async fn toggle(pool: &Pool<Postgres>, id: i32) -> Result<(), ClubError> {
    sqlx::query("UPDATE public.registration_links SET is_active = NOT is_active WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::UpdatingRegistrationLink(id),
        })?;
    Ok(())
}

pub async fn delete(pool: &Pool<Postgres>, id: i32) -> Result<(), ClubError> {
    sqlx::query("DELETE FROM public.registration_links WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::RemovingRegistrationLink(id),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_slugs_are_alphanumeric() {
        let slug = random_slug();
        assert_eq!(slug.len(), SLUG_LEN);
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_slug(), random_slug());
    }

    #[test]
    fn custom_slugs() {
        assert_eq!(clean_slug(Some(" freshers-2024 ")), Some("freshers-2024".into()));
        assert_eq!(clean_slug(Some("a b/c")), Some("abc".into()));
        assert_eq!(clean_slug(Some("   ")), None);
        assert_eq!(clean_slug(Some("!!!")), None);
        assert_eq!(clean_slug(None), None);
    }
}
