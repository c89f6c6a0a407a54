use thiserror::Error;

/// Failures a roast request can run into.
///
/// The detail string is for logs only; the route layer never shows it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoastError {
    #[error("Auth failed: {0}")]
    AuthFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl RoastError {
    pub fn kind(&self) -> &'static str {
        match self {
            RoastError::AuthFailed(_) => "auth_failed",
            RoastError::FetchFailed(_) => "fetch_failed",
            RoastError::GenerationFailed(_) => "generation_failed",
        }
    }
}

impl From<spotify_api::SpotifyApiError> for RoastError {
    fn from(err: spotify_api::SpotifyApiError) -> Self {
        RoastError::FetchFailed(err.to_string())
    }
}
