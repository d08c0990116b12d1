//! The single `organization_settings` row shown on the home page.

use crate::{
    error::{ClubError, SqlxAction, SqlxSnafu},
    state::db_objects::DbOrganizationSettings,
    validation::lines_to_list,
};
use serde::Deserialize;
use snafu::ResultExt;
use sqlx::{Pool, Postgres};

pub async fn load(pool: &Pool<Postgres>) -> Result<DbOrganizationSettings, ClubError> {
    let found = sqlx::query_as::<_, DbOrganizationSettings>(
        "SELECT mission, vision, about, aims, objectives FROM organization_settings WHERE id = 1",
    )
    .fetch_optional(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingSettings,
    })?;

    Ok(found.unwrap_or_default())
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct OrganizationForm {
    pub mission: String,
    pub vision: String,
    pub about: String,
    ///one aim per line
    pub aims: String,
    pub objectives: String,
}

impl From<OrganizationForm> for DbOrganizationSettings {
    fn from(form: OrganizationForm) -> Self {
        Self {
            mission: form.mission.trim().to_string(),
            vision: form.vision.trim().to_string(),
            about: form.about.trim().to_string(),
            aims: lines_to_list(&form.aims),
            objectives: lines_to_list(&form.objectives),
        }
    }
}

pub async fn save(pool: &Pool<Postgres>, settings: &DbOrganizationSettings) -> Result<(), ClubError> {
    sqlx::query(
        r#"
INSERT INTO public.organization_settings (id, mission, vision, about, aims, objectives)
VALUES (1, $1, $2, $3, $4, $5)
ON CONFLICT (id) DO UPDATE
SET mission = EXCLUDED.mission, vision = EXCLUDED.vision, about = EXCLUDED.about, aims = EXCLUDED.aims, objectives = EXCLUDED.objectives
        "#,
    )
    .bind(&settings.mission)
    .bind(&settings.vision)
    .bind(&settings.about)
    .bind(&settings.aims)
    .bind(&settings.objectives)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingSettings,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_lines_become_arrays() {
        let settings = DbOrganizationSettings::from(OrganizationForm {
            mission: " Advocate the SDGs ".into(),
            vision: String::new(),
            about: String::new(),
            aims: "Quality education\n\nClimate action\n".into(),
            objectives: "   ".into(),
        });

        assert_eq!(settings.mission, "Advocate the SDGs");
        assert_eq!(settings.aims, ["Quality education", "Climate action"]);
        assert!(settings.objectives.is_empty());
    }
}
