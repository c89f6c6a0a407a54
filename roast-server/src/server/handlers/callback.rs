use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use axum_extra::extract::PrivateCookieJar;
use url::form_urlencoded;

use super::{found, TOKEN_INFO_KEY};
use crate::common::TokenInfo;
use crate::error::RoastError;
use crate::server::{models::CallbackParams, session::Session, AppState};

/// Shown on the landing page after a failed login.
pub const AUTH_FAILED_MESSAGE: &str = "Auth failed";

#[tracing::instrument(name = "oauth_callback", skip_all)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> (PrivateCookieJar, Response) {
    let params = params.map(|Query(params)| params).map_err(|rejection| {
        RoastError::AuthFailed(format!("Malformed callback query: {}", rejection.body_text()))
    });

    let mut session = state.session(jar);
    let response = complete_callback(&state, &mut session, params).await;
    (session.into_jar(), response)
}

/// Trade the authorization code for tokens and keep them in the session.
///
/// A query string that could not be parsed arrives as `Err` and fails like
/// any other callback.
pub async fn complete_callback<S: Session>(
    state: &AppState,
    session: &mut S,
    params: Result<CallbackParams, RoastError>,
) -> Response {
    match store_tokens(state, session, params).await {
        Ok(()) => {
            tracing::info!("OAuth callback successful");
            found("/roast")
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "OAuth callback failed");
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("error", AUTH_FAILED_MESSAGE)
                .finish();
            found(&format!("/?{}", query))
        }
    }
}

async fn store_tokens<S: Session>(
    state: &AppState,
    session: &mut S,
    params: Result<CallbackParams, RoastError>,
) -> Result<(), RoastError> {
    let params = params?;
    if let Some(error) = params.error {
        return Err(RoastError::AuthFailed(format!("Provider returned error: {}", error)));
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| RoastError::AuthFailed("Missing authorization code".to_string()))?;

    let grant = state.oauth.exchange_code(&code).await?;
    let token = TokenInfo::from_grant(grant, state.oauth.requested_scope())?;

    session
        .set(TOKEN_INFO_KEY, &token)
        .map_err(|e| RoastError::AuthFailed(format!("Could not store token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::session::MemorySession;
    use crate::testing::{Mocks, VALID_CODE};
    use axum::http::{header, StatusCode};

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    fn params(code: Option<&str>, error: Option<&str>) -> Result<CallbackParams, RoastError> {
        Ok(CallbackParams {
            code: code.map(str::to_string),
            error: error.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn valid_code_stores_token_and_redirects_to_roast() {
        let state = Mocks::new().state();
        let mut session = MemorySession::new();

        let response = complete_callback(&state, &mut session, params(Some(VALID_CODE), None)).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/roast");
        let token: TokenInfo = session.get(TOKEN_INFO_KEY).unwrap();
        assert_eq!(token.scope, "user-top-read");
        assert!(!token.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn invalid_code_redirects_with_error() {
        let state = Mocks::new().state();
        let mut session = MemorySession::new();

        let response = complete_callback(&state, &mut session, params(Some("bogus"), None)).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/?error=Auth+failed");
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn provider_error_or_missing_code_redirects_with_error() {
        let mocks = Mocks::new();
        let state = mocks.state();

        for p in [params(None, Some("access_denied")), params(None, None), params(Some(""), None)] {
            let mut session = MemorySession::new();
            let response = complete_callback(&state, &mut session, p).await;
            assert_eq!(location(&response), "/?error=Auth+failed");
            assert!(session.is_empty());
        }
        assert_eq!(mocks.oauth.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn unparseable_query_redirects_with_error() {
        let mocks = Mocks::new();
        let mut session = MemorySession::new();

        let response = complete_callback(
            &mocks.state(),
            &mut session,
            Err(RoastError::AuthFailed("Malformed callback query: duplicate field `code`".to_string())),
        )
        .await;

        assert_eq!(location(&response), "/?error=Auth+failed");
        assert!(session.is_empty());
        assert_eq!(mocks.oauth.exchange_calls(), 0);
    }
}
