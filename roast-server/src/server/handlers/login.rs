use axum::{extract::State, response::Response};

use super::found;
use crate::server::AppState;

#[tracing::instrument(name = "login", skip_all)]
pub async fn login(State(state): State<AppState>) -> Response {
    let auth_url = state.oauth.authorize_url();
    tracing::debug!("Redirecting to provider for consent");
    found(&auth_url)
}
