//! Everything under `/admin`. The whole router sits behind [`require_admin`].

pub mod academics;
pub mod checkin;
pub mod dashboard;
pub mod events;
pub mod exports;
pub mod feedback;
pub mod links;
pub mod members;
pub mod settings;

use crate::{auth::require_admin, state::ClubState};
use axum::{middleware::from_fn_with_state, Router};

pub fn router(state: ClubState) -> Router<ClubState> {
    Router::new()
        .merge(dashboard::router())
        .merge(members::router())
        .merge(events::router())
        .merge(checkin::router())
        .merge(feedback::router())
        .merge(academics::router())
        .merge(links::router())
        .merge(settings::router())
        .merge(exports::router())
        .layer(from_fn_with_state(state, require_admin))
}
