use crate::{
    error::ClubError,
    exports::{alumni_csv, csv_download, whatsapp_csv},
    members::{all_alumni, all_members},
    state::ClubState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

#[axum::debug_handler]
async fn get_alumni_csv(State(state): State<ClubState>) -> Result<impl IntoResponse, ClubError> {
    let alumni = all_alumni(state.pool()).await?;
    Ok(csv_download("alumni.csv", alumni_csv(&alumni).await?))
}

#[axum::debug_handler]
async fn get_whatsapp_csv(State(state): State<ClubState>) -> Result<impl IntoResponse, ClubError> {
    let members = all_members(state.pool()).await?;
    Ok(csv_download("whatsapp.csv", whatsapp_csv(&members).await?))
}

pub fn router() -> Router<ClubState> {
    Router::new()
        .route("/admin/export/alumni.csv", get(get_alumni_csv))
        .route("/admin/export/whatsapp.csv", get(get_whatsapp_csv))
}
