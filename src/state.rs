pub mod cache;
pub mod db_objects;
pub mod mail;

use crate::{
    cfg::Settings,
    error::{ClubError, SqlxAction, SqlxSnafu},
    liquid_utils::compile_with_newtitle,
    state::{
        cache::ClubCache,
        mail::{email_sender_thread, EmailToSend},
    },
};
use axum::response::Html;
use liquid::Object;
use snafu::ResultExt;
use sqlx::{Pool, Postgres, Transaction};
use std::{fmt::Debug, path::Path};
use tokio::sync::{broadcast, mpsc::UnboundedSender};

#[derive(Clone, Debug)]
pub struct ClubState {
    postgres: Pool<Postgres>,
    pub settings: Settings,
    pub cache: ClubCache,
    mail_sender: UnboundedSender<EmailToSend>,
    stop_senders: broadcast::Sender<()>,
}

impl ClubState {
    pub async fn new(postgres: Pool<Postgres>, settings: Settings) -> Self {
        let (stop_senders, stop_rx) = broadcast::channel(1);
        let mail_sender = email_sender_thread(settings.clone(), stop_rx);

        let cache = ClubCache::new();
        cache.pre_populate().await;

        Self {
            postgres,
            settings,
            cache,
            mail_sender,
            stop_senders,
        }
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, ClubError> {
        self.postgres.begin().await.context(SqlxSnafu {
            action: SqlxAction::BeginningTransaction,
        })
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.postgres
    }

    pub fn send_email(&self, email: EmailToSend) -> Result<(), ClubError> {
        self.mail_sender
            .send(email)
            .map_err(|_e| ClubError::MailChannelClosed)
    }

    pub fn stop_background_tasks(&self) {
        if let Err(e) = self.stop_senders.send(()) {
            warn!(?e, "No background tasks were listening for the stop signal");
        }
    }

    pub async fn compile(
        &self,
        path: impl AsRef<Path> + Debug,
        globals: Object,
        title_additional_info: Option<String>,
    ) -> Result<Html<String>, ClubError> {
        compile_with_newtitle(
            path,
            globals,
            &self.settings,
            &self.cache,
            title_additional_info,
        )
        .await
    }

    pub fn subscribe_to_stop(&self) -> broadcast::Receiver<()> {
        self.stop_senders.subscribe()
    }
}
