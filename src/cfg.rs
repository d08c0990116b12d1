use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::task::spawn_blocking;

#[derive(Debug, Deserialize, Clone)]
pub struct BrandSettings {
    pub instance_name: String,
    pub domain: String,
    pub tagline: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NicheSettings {
    pub date_time_format: String,
    pub date_format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    pub username: String,
    pub password: String,
    pub smtp: String,
    ///where contact form messages end up
    pub contact_inbox: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    ///promoted to admin at start-up if an account with this email exists
    pub bootstrap_admin_email: Option<String>,
    pub session_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub niche: NicheSettings,
    pub brand: BrandSettings,
    pub mail: MailSettings,
    pub auth: AuthSettings,
    pub bind_address: String,
}

impl Settings {
    pub async fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("niche.date_time_format", "%A %d %B %Y at %H:%M")?
            .set_default("niche.date_format", "%d %B %Y")?
            .set_default("brand.instance_name", "AHSAC")?
            .set_default("brand.domain", "http://localhost:8080")?
            .set_default("brand.tagline", "Advancing the Sustainable Development Goals on campus")?
            .set_default("mail.username", "")?
            .set_default("mail.password", "")?
            .set_default("mail.smtp", "localhost")?
            .set_default("mail.contact_inbox", "")?
            .set_default("auth.session_days", 7)?
            .set_default("bind_address", "0.0.0.0:8080")?;

        spawn_blocking(move || {
            builder
                .add_source(File::from(PathBuf::from("config.toml")).required(false))
                .add_source(Environment::with_prefix("CLUB").separator("__"))
                .build()
                .and_then(Config::try_deserialize)
        })
        .await
        .map_err(|e| ConfigError::Message(format!("unable to join config thread: {e}")))?
    }
}
