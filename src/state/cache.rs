use crate::error::{ClubError, IOAction, IOSnafu};
use async_walkdir::WalkDir;
use futures::StreamExt;
use moka::future::{Cache, CacheBuilder};
use snafu::ResultExt;
use std::{
    io::{Error as IOError, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs::read_to_string;

pub const TEMPLATES_DIR: &str = "www/";

#[derive(Clone, Debug)]
pub struct ClubCache {
    templates_cache: Cache<PathBuf, Arc<str>>,
}

impl ClubCache {
    pub fn new() -> Self {
        let templates_cache = CacheBuilder::default().name("templates_cache").build();

        Self { templates_cache }
    }

    pub async fn get(&self, path: impl AsRef<Path>) -> Result<Arc<str>, ClubError> {
        let path = path.as_ref().to_path_buf();

        if let Some(found) = self.templates_cache.get(&path).await {
            return Ok(found);
        }

        if !path.exists() {
            return Err(ClubError::IO {
                source: IOError::from(ErrorKind::NotFound),
                action: IOAction::ReadingFile(path),
            });
        }

        let read_in = read_to_string(path.clone())
            .await
            .with_context(|_e| IOSnafu {
                action: IOAction::ReadingFile(path.clone()),
            })?;
        let read_in: Arc<str> = read_in.into();
        self.templates_cache.insert(path, read_in.clone()).await;

        Ok(read_in)
    }

    pub async fn pre_populate(&self) {
        let des: Vec<_> = WalkDir::new(TEMPLATES_DIR).collect().await;

        for path in des.into_iter().filter_map(Result::ok).map(|x| x.path()) {
            if path.extension().map_or(true, |ext| ext != "liquid") {
                continue;
            }

            let contents = read_to_string(path.clone())
                .await
                .with_context(|_e| IOSnafu {
                    action: IOAction::ReadingFile(path.clone()),
                });
            let contents: Arc<str> = match contents {
                Ok(c) => c.into(),
                Err(e) => {
                    warn!(?e, ?path, "Error reading file for pre-population");
                    continue;
                }
            };

            self.templates_cache.insert(path, contents).await;
        }

        debug!(n = self.templates_cache.entry_count(), "Pre-populated template cache");
    }
}

impl Default for ClubCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_templates_are_io_errors() {
        let cache = ClubCache::new();
        let err = cache
            .get("www/definitely_not_a_template.liquid")
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::IO { .. }));
    }
}
