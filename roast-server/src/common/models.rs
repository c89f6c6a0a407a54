use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoastError;

/// Tokens are refreshed once fewer than this many seconds remain.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(60);

/// Token record kept in the browser session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
    pub scope: String,
}

impl TokenInfo {
    /// Build the session record from a code-exchange grant.
    ///
    /// `requested_scope` stands in when the provider does not echo the
    /// granted scope back.
    pub fn from_grant(grant: TokenGrant, requested_scope: &str) -> Result<Self, RoastError> {
        let refresh_token = grant.refresh_token.ok_or_else(|| {
            RoastError::AuthFailed("No refresh token in response".to_string())
        })?;

        Ok(Self {
            access_token: grant.access_token,
            refresh_token,
            expires_at: grant.expires_at,
            scope: grant.scope.unwrap_or_else(|| requested_scope.to_string()),
        })
    }

    /// Replace this token with a refresh grant, keeping the refresh token and
    /// scope when the provider leaves them out.
    pub fn refreshed_with(self, grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.unwrap_or(self.refresh_token),
            expires_at: grant.expires_at,
            scope: grant.scope.unwrap_or(self.scope),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now < EXPIRY_MARGIN
    }
}

/// Result of a single token endpoint call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: Option<String>,
}

/// What we know about a listener for one roast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSnapshot {
    pub top_artist_names: Vec<String>,
    pub top_track_descriptions: Vec<String>,
    pub top_artist_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoastResult {
    pub text: String,
    pub artists: Vec<String>,
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(expires_at: DateTime<Utc>) -> TokenInfo {
        TokenInfo {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            scope: "user-top-read".to_string(),
        }
    }

    #[test]
    fn expiry_uses_sixty_second_margin() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert!(!token(now + Duration::seconds(60)).is_expired(now));
        assert!(!token(now + Duration::hours(1)).is_expired(now));
        assert!(token(now + Duration::seconds(59)).is_expired(now));
        assert!(token(now).is_expired(now));
        assert!(token(now - Duration::hours(1)).is_expired(now));
    }

    #[test]
    fn serializes_expiry_as_epoch_seconds() {
        let expires_at = Utc.timestamp_opt(1_714_564_800, 0).unwrap();
        let json = serde_json::to_value(token(expires_at)).unwrap();

        assert_eq!(json["expires_at"], 1_714_564_800);
        let back: TokenInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back.expires_at, expires_at);
    }

    #[test]
    fn code_grant_without_refresh_token_is_rejected() {
        let grant = TokenGrant {
            access_token: "access".to_string(),
            refresh_token: None,
            expires_at: Utc::now(),
            scope: None,
        };

        let err = TokenInfo::from_grant(grant, "user-top-read").unwrap_err();
        assert!(matches!(err, RoastError::AuthFailed(_)));
    }

    #[test]
    fn code_grant_falls_back_to_requested_scope() {
        let grant = TokenGrant {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Utc::now(),
            scope: None,
        };

        let info = TokenInfo::from_grant(grant, "user-top-read").unwrap();
        assert_eq!(info.scope, "user-top-read");
        assert_eq!(info.refresh_token, "refresh");
    }

    #[test]
    fn refresh_grant_carries_over_missing_fields() {
        let now = Utc::now();
        let grant = TokenGrant {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_at: now + Duration::hours(1),
            scope: None,
        };

        let refreshed = token(now).refreshed_with(grant);
        assert_eq!(refreshed.access_token, "new-access");
        assert_eq!(refreshed.refresh_token, "refresh");
        assert_eq!(refreshed.scope, "user-top-read");
        assert_eq!(refreshed.expires_at, now + Duration::hours(1));
    }
}
