mod callback;
mod login;
mod roast;

pub use callback::{complete_callback, oauth_callback, AUTH_FAILED_MESSAGE};
pub use login::login;
pub use roast::{render_roast, roast};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use axum_extra::extract::PrivateCookieJar;

use crate::server::{
    models::{HealthResponse, IndexParams},
    pages,
    session::Session,
    AppState,
};

/// Session key holding the serialized [`crate::common::TokenInfo`].
pub const TOKEN_INFO_KEY: &str = "token_info";

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Landing page. An unreadable query string just drops the error banner.
pub async fn index(params: Result<Query<IndexParams>, QueryRejection>) -> Html<String> {
    let error = match params {
        Ok(Query(params)) => params.error,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Ignoring malformed landing query");
            None
        }
    };

    Html(pages::landing_page(error.as_deref()))
}

#[tracing::instrument(name = "logout", skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Response) {
    let mut session = state.session(jar);
    let response = end_session(&mut session);
    (session.into_jar(), response)
}

pub fn end_session<S: Session>(session: &mut S) -> Response {
    session.clear();
    tracing::info!("Session cleared");
    found("/")
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
