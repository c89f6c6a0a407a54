use serde::Deserialize;

use crate::server::error::ServerError;

/// Minimum length of `session.secret`; the cookie key is derived from it.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfiguration,
    pub spotify: SpotifyConfiguration,
    pub gemini: GeminiConfiguration,
    pub session: SessionConfiguration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfiguration {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpotifyConfiguration {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,

    #[serde(default = "default_spotify_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_spotify_token_url")]
    pub token_url: String,

    #[serde(default = "default_spotify_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfiguration {
    pub api_key: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfiguration {
    pub secret: String,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_spotify_auth_url() -> String {
    "https://accounts.spotify.com/authorize".to_string()
}

fn default_spotify_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_spotify_api_base_url() -> String {
    spotify_api::BASE_URL.to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_cookie_name() -> String {
    "session".to_string()
}

impl Configuration {
    /// Load `config.toml` (if present) overlaid with `ROAST__*` environment
    /// variables, e.g. `ROAST__SPOTIFY__CLIENT_ID`.
    pub fn new() -> Result<Self, ServerError> {
        let mut builder = config::Config::builder();

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(config::File::with_name("config"));
        }

        builder = builder.add_source(config::Environment::with_prefix("ROAST").separator("__"));

        let configuration: Self = builder.build()?.try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        let required = [
            ("spotify.client_id", &self.spotify.client_id),
            ("spotify.client_secret", &self.spotify.client_secret),
            ("spotify.redirect_uri", &self.spotify.redirect_uri),
            ("gemini.api_key", &self.gemini.api_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ServerError::Configuration(format!("{} is required", name)));
            }
        }

        if self.session.secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ServerError::Configuration(format!(
                "session.secret must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }

        if self.session.cookie_name.is_empty() {
            return Err(ServerError::Configuration(
                "session.cookie_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// A valid configuration pointing at the real endpoints.
#[cfg(test)]
pub(crate) fn sample_configuration() -> Configuration {
    Configuration {
        server: ServerConfiguration::default(),
        spotify: SpotifyConfiguration {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://127.0.0.1:8080/callback".to_string(),
            auth_url: default_spotify_auth_url(),
            token_url: default_spotify_token_url(),
            api_base_url: default_spotify_api_base_url(),
        },
        gemini: GeminiConfiguration {
            api_key: "gemini-key".to_string(),
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        },
        session: SessionConfiguration {
            secret: "x".repeat(MIN_SESSION_SECRET_LEN),
            cookie_name: default_cookie_name(),
            secure_cookies: false,
        },
    }
}
