use serde::{Deserialize, Serialize};
use tower_api_client::{Error as ApiError, StatusCode};

#[derive(Debug)]
pub enum SpotifyApiError {
    Spotify(StatusCode, ErrorDetail),
    Internal(ApiError),
}

impl From<ApiError> for SpotifyApiError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::ClientError(status, detail) | ApiError::ServerError(status, detail) => {
                // Gateways in front of the API sometimes answer with plain text
                let error = serde_json::from_str::<ErrorResponse>(&detail)
                    .map(|response| response.error)
                    .unwrap_or_else(|_| ErrorDetail {
                        status: status.as_u16(),
                        message: detail,
                    });
                SpotifyApiError::Spotify(status, error)
            }
            e => SpotifyApiError::Internal(e),
        }
    }
}

impl std::fmt::Display for SpotifyApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpotifyApiError::Internal(e) => write!(f, "Internal error: {}", e),
            SpotifyApiError::Spotify(status, detail) => {
                write!(f, "({}) {}", status, detail.message)
            }
        }
    }
}

impl std::error::Error for SpotifyApiError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub status: u16,
    pub message: String,
}
