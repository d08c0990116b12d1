use crate::error::{ClubError, SqlxAction, SqlxSnafu};
use axum_login::tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};
use snafu::ResultExt;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tokio::sync::broadcast::Receiver as BroadcastReceiver;

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn delete_expired(&self) -> Result<u64, ClubError> {
        sqlx::query("DELETE FROM public.sessions WHERE expiry_unix < $1")
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .context(SqlxSnafu {
                action: SqlxAction::DeletingOldSessions,
            })
    }

    ///Runs [`Self::delete_expired`] every `period` until told to stop
    pub fn spawn_deletion_task(self, period: Duration, mut stop_rx: BroadcastReceiver<()>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _stop = stop_rx.recv() => {
                        info!("Session deletion task stopping");
                        return;
                    },
                    _tick = interval.tick() => {
                        match self.delete_expired().await {
                            Ok(n) => trace!(%n, "Deleted expired sessions"),
                            Err(e) => error!(?e, "Error deleting expired sessions"),
                        }
                    }
                }
            }
        });
    }
}

fn backend_error(e: ClubError) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

#[async_trait::async_trait]
impl SessionStore for PostgresStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data =
            serde_json::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;

        sqlx::query(
            r#"
INSERT INTO public.sessions (id, data, expiry_unix)
VALUES ($1, $2, $3)
ON CONFLICT (id) DO UPDATE
SET data = excluded.data, expiry_unix = excluded.expiry_unix
        "#,
        )
        .bind(record.id.to_string())
        .bind(data)
        .bind(record.expiry_date.unix_timestamp())
        .execute(&self.pool)
        .await
        .map(|_| ())
        .context(SqlxSnafu {
            action: SqlxAction::AddingSession,
        })
        .map_err(backend_error)
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let data: Option<Vec<u8>> = sqlx::query_scalar(
            "SELECT data FROM public.sessions WHERE id = $1 AND expiry_unix > $2",
        )
        .bind(session_id.to_string())
        .bind(chrono::Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingSession,
        })
        .map_err(backend_error)?;

        data.map(|data| {
            serde_json::from_slice(&data).map_err(|e| session_store::Error::Decode(e.to_string()))
        })
        .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        sqlx::query("DELETE FROM public.sessions WHERE id = $1")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map(|_| ())
            .context(SqlxSnafu {
                action: SqlxAction::RemovingSession,
            })
            .map_err(backend_error)
    }
}
