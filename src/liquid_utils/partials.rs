use async_walkdir::WalkDir;
use futures::StreamExt;
use liquid::partials::{EagerCompiler, InMemorySource};
use std::{ffi::OsStr, sync::LazyLock};
use tokio::{fs::read_to_string, sync::RwLock};

#[derive(Debug)]
pub struct Partials(InMemorySource);

impl Partials {
    pub fn to_compiler(&self) -> EagerCompiler<InMemorySource> {
        EagerCompiler::new(self.0.clone())
    }
}

impl Default for Partials {
    fn default() -> Self {
        Self(InMemorySource::new())
    }
}

pub static PARTIALS: LazyLock<RwLock<Partials>> = LazyLock::new(RwLock::default);

pub async fn init_partials() {
    const PARTIALS_DIR: &str = "www/partials/";
    const LIQUID_PARTIALS_NAME: &str = "partials/";
    const PARTIALS_EXTENSIONS: &[&str] = &["html", "liquid"];

    let mut in_memory_source = InMemorySource::new();

    let entries: Vec<_> = WalkDir::new(PARTIALS_DIR).collect().await;
    for partial in entries
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|x| {
            x.extension()
                .and_then(OsStr::to_str)
                .is_some_and(|x| PARTIALS_EXTENSIONS.contains(&x))
        })
    {
        match read_to_string(&partial).await {
            Ok(source) => {
                debug!(?partial, "Got partial");
                if let Some(name) = partial.file_name().and_then(OsStr::to_str) {
                    in_memory_source.add(LIQUID_PARTIALS_NAME.to_string() + name, source);
                } else {
                    error!("Got partial, could not transform name to UTF-8");
                }
            }
            Err(e) => {
                error!(?partial, ?e, "Error reading partial");
            }
        }
    }

    *PARTIALS.write().await = Partials(in_memory_source);
}
