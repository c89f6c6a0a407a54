pub mod generation;
pub mod oauth_client;
pub mod profile_fetcher;
pub mod prompt;

pub use generation::GeminiClient;
pub use oauth_client::{ensure_fresh, OAuthClient, SCOPE};
pub use profile_fetcher::ProfileFetcher;
pub use prompt::build_prompt;

use async_trait::async_trait;

use crate::common::{ProfileSnapshot, TokenGrant};
use crate::error::RoastError;

/// The OAuth provider as seen by the routes.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Where to send the browser to ask for consent.
    fn authorize_url(&self) -> String;

    /// The scope requested in [`TokenProvider::authorize_url`].
    fn requested_scope(&self) -> &str;

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, RoastError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, RoastError>;
}

/// Source of a listener's top artists and tracks.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_top(&self, access_token: &str) -> Result<ProfileSnapshot, RoastError>;
}

/// Hosted text generation model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RoastError>;
}
