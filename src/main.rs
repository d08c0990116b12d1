#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::items_after_statements,
    clippy::cast_possible_wrap
)]

mod academics;
mod auth;
mod calendar;
mod cfg;
mod checkin;
mod error;
mod event_registration;
mod events;
mod exports;
mod feedback;
mod graduation;
mod liquid_utils;
mod members;
mod notice;
mod organization;
mod registration_links;
mod routes;
mod state;
mod stats;
mod validation;

#[macro_use]
extern crate tracing;

use crate::{
    auth::{backend::ClubAuthBackend, pg_session::PostgresStore},
    cfg::Settings,
    error::{not_found_fallback, ClubError, IOAction, IOSnafu, SqlxAction, SqlxSnafu},
    liquid_utils::partials::init_partials,
    state::ClubState,
};
use axum::Router;
use axum_login::{
    tower_sessions::{
        cookie::{time, SameSite},
        Expiry, SessionManagerLayer,
    },
    AuthManagerLayerBuilder,
};
use snafu::ResultExt;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_JSON").is_ok() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

///makes sure the configured account is an admin, so a fresh install has someone who can log in to `/admin`
async fn bootstrap_admin(pool: &Pool<Postgres>, email: &str) -> Result<(), ClubError> {
    let promoted = sqlx::query(
        r#"
INSERT INTO public.user_roles (user_id, role)
SELECT id, 'admin' FROM users WHERE LOWER(email) = LOWER($1)
ON CONFLICT (user_id) DO UPDATE SET role = 'admin'
        "#,
    )
    .bind(email)
    .execute(pool)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingRole(error::DatabaseIDMethod::Email(email.to_string())),
    })?
    .rows_affected();

    if promoted == 0 {
        warn!(%email, "Bootstrap admin has no account yet - join first, then restart");
    } else {
        info!(%email, "Bootstrap admin has the admin role");
    }
    Ok(())
}

async fn shutdown_signal(state: ClubState) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(?e, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(?e, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down");
    state.stop_background_tasks();
}

#[tokio::main]
async fn main() -> Result<(), ClubError> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Not loading .env: {e}");
    }
    setup_tracing();

    let settings = Settings::new().await?;

    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_e| {
        warn!("DATABASE_URL not set, using local default");
        "postgres://localhost/ahsac".into()
    });
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::AcquiringConnection,
        })?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations up to date");

    if let Some(email) = &settings.auth.bootstrap_admin_email {
        bootstrap_admin(&pool, email).await?;
    }

    init_partials().await;

    let bind_address = settings.bind_address.clone();
    let session_days = settings.auth.session_days;
    let state = ClubState::new(pool.clone(), settings).await;

    let session_store = PostgresStore::new(pool.clone());
    session_store
        .clone()
        .spawn_deletion_task(Duration::from_secs(60 * 60), state.subscribe_to_stop());

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(session_days)));
    let auth_layer =
        AuthManagerLayerBuilder::new(ClubAuthBackend::new(pool), session_layer).build();

    let app = Router::new()
        .merge(routes::index::router())
        .merge(routes::events::router())
        .merge(routes::join::router())
        .merge(routes::profile::router())
        .merge(routes::feedback::router())
        .merge(routes::contact::router())
        .merge(auth::login::router())
        .merge(routes::admin::router(state.clone()))
        .nest_service("/public", ServeDir::new("public"))
        .fallback(not_found_fallback)
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let listener = TcpListener::bind(&bind_address)
        .await
        .context(IOSnafu {
            action: IOAction::BindingListener(bind_address.clone()),
        })?;
    info!(%bind_address, "Serving");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context(IOSnafu {
            action: IOAction::ServingApp,
        })?;

    Ok(())
}
