use crate::{
    cfg::Settings,
    error::{ClubError, JoinSnafu, LiquidAction, LiquidSnafu, ThreadReason},
    liquid_utils::partials::PARTIALS,
    state::cache::ClubCache,
};
use axum::response::Html;
use chrono::NaiveDateTime;
use liquid::{model::Value, Object, ParserBuilder};
use snafu::ResultExt;
use std::{fmt::Debug, path::Path};

pub mod partials;

pub trait CustomFormat {
    fn to_env_string(&self, format: &str) -> String;
}

impl CustomFormat for NaiveDateTime {
    fn to_env_string(&self, format: &str) -> String {
        self.format(format).to_string()
    }
}

#[instrument(level = "debug", skip(globals, settings, cache))]
pub async fn compile_with_newtitle(
    path: impl AsRef<Path> + Debug,
    mut globals: Object,
    settings: &Settings,
    cache: &ClubCache,
    title_additional_info: Option<String>,
) -> Result<Html<String>, ClubError> {
    debug!("Reading in file + partials");

    let liquid = cache.get(path).await?.to_string();
    let partial_compiler = PARTIALS.read().await.to_compiler();

    debug!("Inserting globals");

    let project_name = settings.brand.instance_name.clone();
    let title = match title_additional_info {
        None => project_name.clone(),
        Some(x) => format!("{x} | {project_name}"),
    };

    //the header partial shows a toast when there is one
    globals.entry("notice").or_insert(Value::Nil);

    globals.insert(
        "siteinfo".into(),
        Value::Object(liquid::object!({
            "instance_name": project_name,
            "html_title": title,
            "domain": settings.brand.domain.as_str(),
            "tagline": settings.brand.tagline.as_str(),
        })),
    );

    let html: Result<String, ClubError> = tokio::task::spawn_blocking(move || {
        debug!("Compiling");
        let res = ParserBuilder::with_stdlib()
            .partials(partial_compiler)
            .build()
            .context(LiquidSnafu {
                attempt: LiquidAction::BuildingCompiler,
            })?
            .parse(&liquid)
            .with_context(|_e| LiquidSnafu {
                attempt: LiquidAction::Parsing { text: liquid },
            })?
            .render(&globals)
            .context(LiquidSnafu {
                attempt: LiquidAction::Rendering,
            })?;
        Ok(res)
    })
    .await
    .context(JoinSnafu {
        title: ThreadReason::LiquidCompiler,
    })?;

    Ok(Html(html?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn dates_use_configured_format() {
        let dt = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            dt.to_env_string("%A %d %B %Y at %H:%M"),
            "Saturday 01 March 2025 at 10:30"
        );
    }
}
