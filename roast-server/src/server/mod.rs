pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod services;
pub mod session;

pub use config::Configuration;
pub use error::ServerError;

use axum::{extract::FromRef, routing::get, Router};
use axum_extra::extract::{cookie::Key, PrivateCookieJar};
use services::{GeminiClient, OAuthClient, ProfileFetcher, ProfileSource, TextGenerator, TokenProvider};
use session::CookieSession;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub oauth: Arc<dyn TokenProvider>,
    pub profiles: Arc<dyn ProfileSource>,
    pub generator: Arc<dyn TextGenerator>,
    pub cookies: CookieSettings,
}

/// How the session cookie is named, sealed and flagged.
#[derive(Clone)]
pub struct CookieSettings {
    pub key: Key,
    pub name: String,
    pub secure: bool,
}

impl AppState {
    /// Wire the real collaborators from configuration.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, ServerError> {
        Ok(Self {
            oauth: Arc::new(OAuthClient::new(&configuration.spotify)?),
            profiles: Arc::new(ProfileFetcher::new(
                configuration.spotify.api_base_url.clone(),
            )),
            generator: Arc::new(GeminiClient::new(&configuration.gemini)),
            cookies: CookieSettings {
                key: Key::derive_from(configuration.session.secret.as_bytes()),
                name: configuration.session.cookie_name.clone(),
                secure: configuration.session.secure_cookies,
            },
        })
    }

    pub fn session(&self, jar: PrivateCookieJar) -> CookieSession {
        CookieSession::from_jar(jar, &self.cookies.name, self.cookies.secure)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookies.key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login))
        .route("/callback", get(handlers::oauth_callback))
        .route("/roast", get(handlers::roast))
        .route("/logout", get(handlers::logout))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `server.host:server.port` and serve the app until the listener fails.
pub async fn serve(configuration: &Configuration) -> Result<(), ServerError> {
    let app = router(AppState::from_configuration(configuration)?);

    let addr = configuration.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::sample_configuration;

    #[tokio::test]
    async fn serve_reports_bind_failure_as_io_error() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut configuration = sample_configuration();
        configuration.server.host = "127.0.0.1".to_string();
        configuration.server.port = taken.local_addr().unwrap().port();

        let err = serve(&configuration).await.unwrap_err();

        assert!(matches!(err, ServerError::Io(_)));
    }

    #[test]
    fn builds_state_from_configuration() {
        let state = AppState::from_configuration(&sample_configuration()).unwrap();

        assert_eq!(state.cookies.name, "session");
        assert!(state.oauth.authorize_url().contains("client_id=client-id"));
    }
}
