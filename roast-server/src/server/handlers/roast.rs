use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;

use super::{found, TOKEN_INFO_KEY};
use crate::common::{RoastResult, TokenInfo};
use crate::error::RoastError;
use crate::server::{
    pages,
    services::{build_prompt, ensure_fresh},
    session::Session,
    AppState,
};

#[tracing::instrument(name = "roast", skip_all)]
pub async fn roast(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Response) {
    let mut session = state.session(jar);
    let response = render_roast(&state, &mut session).await;
    (session.into_jar(), response)
}

/// Fetch, generate and render a roast for the session's user.
///
/// Without a token, or on any failure, the user is sent back to `/`.
pub async fn render_roast<S: Session>(state: &AppState, session: &mut S) -> Response {
    let Some(token) = session.get::<TokenInfo>(TOKEN_INFO_KEY) else {
        tracing::debug!("No token in session");
        return found("/");
    };

    match produce_roast(state, session, token).await {
        Ok(result) => {
            tracing::info!(artists = result.artists.len(), "Roast generated");
            Html(pages::roast_page(&result)).into_response()
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Roast failed");
            found("/")
        }
    }
}

async fn produce_roast<S: Session>(
    state: &AppState,
    session: &mut S,
    token: TokenInfo,
) -> Result<RoastResult, RoastError> {
    let fresh = ensure_fresh(state.oauth.as_ref(), token.clone(), Utc::now()).await?;
    if fresh != token {
        session
            .set(TOKEN_INFO_KEY, &fresh)
            .map_err(|e| RoastError::AuthFailed(format!("Could not store token: {}", e)))?;
    }

    let snapshot = state.profiles.fetch_top(&fresh.access_token).await?;
    let prompt = build_prompt(&snapshot);
    let text = state.generator.generate(&prompt).await?;

    Ok(RoastResult {
        text,
        artists: snapshot.top_artist_names,
        image: snapshot.top_artist_image_url,
    })
}
