use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse},
    AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpRequest,
    HttpResponse, RedirectUrl, RefreshToken, RequestTokenError, StandardErrorResponse,
    TokenResponse, TokenUrl,
};
use url::Url;

use super::TokenProvider;
use crate::common::{TokenGrant, TokenInfo};
use crate::error::RoastError;
use crate::server::config::SpotifyConfiguration;
use crate::server::error::ServerError;

/// Read-only access to the user's top artists and tracks.
pub const SCOPE: &str = "user-top-read";

type SpotifyTokenClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

type TokenRequestError =
    RequestTokenError<reqwest::Error, StandardErrorResponse<BasicErrorResponseType>>;

// Simple async HTTP client for OAuth2
async fn http_client(request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
    let client = reqwest::Client::new();
    let mut builder = client
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;

    Ok(http_response)
}

pub struct OAuthClient {
    authorize_url: Url,
    client: SpotifyTokenClient,
}

impl OAuthClient {
    pub fn new(config: &SpotifyConfiguration) -> Result<Self, ServerError> {
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| ServerError::Configuration(format!("Invalid token URL: {}", e)))?;

        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| ServerError::Configuration(format!("Invalid redirect URI: {}", e)))?;

        let authorize_url = Url::parse_with_params(
            &config.auth_url,
            &[
                ("client_id", config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("scope", SCOPE),
            ],
        )
        .map_err(|e| ServerError::Configuration(format!("Invalid auth URL: {}", e)))?;

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        Ok(Self {
            authorize_url,
            client,
        })
    }

    fn grant_from(token_result: &BasicTokenResponse) -> Result<TokenGrant, RoastError> {
        let expires_in = token_result
            .expires_in()
            .ok_or_else(|| RoastError::AuthFailed("No expiration time in response".to_string()))?;

        let expires_at = Duration::from_std(expires_in)
            .ok()
            .and_then(|expires_in| Utc::now().checked_add_signed(expires_in))
            .ok_or_else(|| {
                RoastError::AuthFailed(format!("Expiration out of range: {:?}", expires_in))
            })?;

        let scope = token_result.scopes().map(|scopes| {
            scopes
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        });

        Ok(TokenGrant {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|token| token.secret().to_string()),
            expires_at,
            scope,
        })
    }
}

/// Flatten a token endpoint failure into a log line, keeping apart a
/// provider that refused the request from one we could not reach.
fn describe_token_error(operation: &str, err: TokenRequestError) -> RoastError {
    let detail = match err {
        RequestTokenError::ServerResponse(response) => {
            tracing::warn!(operation, error = %response.error(), "Provider rejected token request");
            format!("provider rejected {}: {}", operation, response)
        }
        RequestTokenError::Request(e) => {
            tracing::error!(operation, error = %e, "Token endpoint unreachable");
            format!("{} request failed: {}", operation, e)
        }
        RequestTokenError::Parse(e, _) => {
            tracing::error!(operation, error = %e, "Unparseable token response");
            format!("{} response unparseable: {}", operation, e)
        }
        RequestTokenError::Other(msg) => format!("{} failed: {}", operation, msg),
    };
    RoastError::AuthFailed(detail)
}

#[async_trait]
impl TokenProvider for OAuthClient {
    fn authorize_url(&self) -> String {
        self.authorize_url.to_string()
    }

    fn requested_scope(&self) -> &str {
        SCOPE
    }

    /// Exchange authorization code for access and refresh tokens
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, RoastError> {
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| describe_token_error("code exchange", e))?;

        let grant = Self::grant_from(&token_result)?;

        tracing::debug!(
            "Successfully exchanged code for tokens, expires_at: {}",
            grant.expires_at
        );

        Ok(grant)
    }

    /// Refresh an expired access token using a refresh token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, RoastError> {
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| describe_token_error("token refresh", e))?;

        let grant = Self::grant_from(&token_result)?;

        tracing::debug!("Successfully refreshed tokens, expires_at: {}", grant.expires_at);

        Ok(grant)
    }
}

/// Return a token that is good for at least another minute, refreshing it
/// through `provider` when it is not.
pub async fn ensure_fresh(
    provider: &dyn TokenProvider,
    token: TokenInfo,
    now: DateTime<Utc>,
) -> Result<TokenInfo, RoastError> {
    if !token.is_expired(now) {
        return Ok(token);
    }

    tracing::debug!(expires_at = %token.expires_at, "Access token expiring, refreshing");
    let grant = provider.refresh(&token.refresh_token).await?;
    Ok(token.refreshed_with(grant))
}
