use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use axum_extra::extract::{cookie::Key, PrivateCookieJar};
use chrono::{Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

use crate::common::{ProfileSnapshot, TokenGrant, TokenInfo};
use crate::error::RoastError;
use crate::server::{
    handlers::TOKEN_INFO_KEY,
    router,
    services::{ProfileSource, TextGenerator, TokenProvider, SCOPE},
    session::{CookieSession, Session},
    AppState, CookieSettings,
};

/// The only authorization code [`MockOAuth`] accepts.
pub const VALID_CODE: &str = "valid-code";

const TEST_SECRET: &[u8] = b"test-session-secret-that-is-long-enough-for-key-derivation";
const COOKIE_NAME: &str = "session";

/// Token provider that accepts [`VALID_CODE`] and counts refreshes
pub struct MockOAuth {
    exchange_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    fail_refresh: bool,
}

impl MockOAuth {
    pub fn new() -> Self {
        Self {
            exchange_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            fail_refresh: false,
        }
    }

    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockOAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for MockOAuth {
    fn authorize_url(&self) -> String {
        "https://accounts.example.test/authorize?client_id=test-client&response_type=code\
         &redirect_uri=http%3A%2F%2Flocalhost%2Fcallback&scope=user-top-read"
            .to_string()
    }

    fn requested_scope(&self) -> &str {
        SCOPE
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, RoastError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if code != VALID_CODE {
            return Err(RoastError::AuthFailed(
                "provider rejected code exchange: invalid_grant".to_string(),
            ));
        }

        Ok(TokenGrant {
            access_token: "access-0".to_string(),
            refresh_token: Some("refresh-0".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
            scope: Some(SCOPE.to_string()),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, RoastError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_refresh {
            return Err(RoastError::AuthFailed(
                "provider rejected token refresh: invalid_grant".to_string(),
            ));
        }

        Ok(TokenGrant {
            access_token: format!("access-{}", n),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
            scope: None,
        })
    }
}

/// Five artists and five tracks, the first artist with an image.
pub fn sample_snapshot() -> ProfileSnapshot {
    ProfileSnapshot {
        top_artist_names: ["Taylor Swift", "Nickelback", "Coldplay", "Drake", "Creed"]
            .map(String::from)
            .to_vec(),
        top_track_descriptions: [
            "Anti-Hero by Taylor Swift",
            "Photograph by Nickelback",
            "Yellow by Coldplay",
            "Hotline Bling by Drake",
            "With Arms Wide Open by Creed",
        ]
        .map(String::from)
        .to_vec(),
        top_artist_image_url: Some("https://i.scdn.co/image/taylor".to_string()),
    }
}

pub struct MockProfiles {
    snapshot: Option<ProfileSnapshot>,
    calls: AtomicUsize,
    last_access_token: Mutex<Option<String>>,
}

impl MockProfiles {
    pub fn new() -> Self {
        Self::with_snapshot(sample_snapshot())
    }

    pub fn with_snapshot(snapshot: ProfileSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: AtomicUsize::new(0),
            last_access_token: Mutex::new(None),
        }
    }

    /// Fails every fetch as if the network were down.
    pub fn failing() -> Self {
        Self {
            snapshot: None,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_access_token(&self) -> Option<String> {
        self.last_access_token.lock().unwrap().clone()
    }
}

impl Default for MockProfiles {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileSource for MockProfiles {
    async fn fetch_top(&self, access_token: &str) -> Result<ProfileSnapshot, RoastError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_access_token.lock().unwrap() = Some(access_token.to_string());

        self.snapshot
            .clone()
            .ok_or_else(|| RoastError::FetchFailed("HTTP error: connection refused".to_string()))
    }
}

pub struct MockGenerator {
    fail: bool,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    pub const ROAST_TEXT: &'static str = "You listen to Nickelback unironically.";

    pub fn new() -> Self {
        Self {
            fail: false,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RoastError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if self.fail {
            return Err(RoastError::GenerationFailed("Model returned 503".to_string()));
        }
        Ok(Self::ROAST_TEXT.to_string())
    }
}

/// Mock collaborators, shared with the state built from them so tests can
/// inspect calls afterwards.
#[derive(Clone, Default)]
pub struct Mocks {
    pub oauth: Arc<MockOAuth>,
    pub profiles: Arc<MockProfiles>,
    pub generator: Arc<MockGenerator>,
}

impl Mocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AppState {
        AppState {
            oauth: self.oauth.clone(),
            profiles: self.profiles.clone(),
            generator: self.generator.clone(),
            cookies: CookieSettings {
                key: Key::derive_from(TEST_SECRET),
                name: COOKIE_NAME.to_string(),
                secure: false,
            },
        }
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn assert_redirect(&self, to: &str) {
        assert_eq!(self.status, StatusCode::FOUND, "body: {}", self.body);
        assert_eq!(self.location(), Some(to));
    }
}

/// Drives the real router with mock collaborators, carrying cookies from
/// one request to the next like a browser would.
pub struct TestApp {
    router: Router,
    state: AppState,
    cookies: BTreeMap<String, String>,
    pub mocks: Mocks,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mocks(Mocks::new())
    }

    pub fn with_mocks(mocks: Mocks) -> Self {
        let state = mocks.state();
        Self {
            router: router(state.clone()),
            state,
            cookies: BTreeMap::new(),
            mocks,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = self.cookie_header() {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(Body::empty()).unwrap();

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status();
        let headers = response.headers().clone();
        self.store_cookies(&headers);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// Put a token into the browser's session cookie.
    pub fn seed_token(&mut self, token: &TokenInfo) {
        let mut session = self.state.session(PrivateCookieJar::new(self.state.cookies.key.clone()));
        session.set(TOKEN_INFO_KEY, token).unwrap();
        let response = session.into_jar().into_response();
        self.store_cookies(response.headers());
    }

    /// Decrypt the token the browser currently holds, if any.
    pub fn session_token(&self) -> Option<TokenInfo> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = self.cookie_header() {
            headers.insert(header::COOKIE, cookie);
        }
        let jar = PrivateCookieJar::from_headers(&headers, self.state.cookies.key.clone());
        CookieSession::from_jar(jar, COOKIE_NAME, false).get(TOKEN_INFO_KEY)
    }

    /// Store a raw cookie as-is, bypassing encryption.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn has_session_cookie(&self) -> bool {
        self.cookies.contains_key(COOKIE_NAME)
    }

    fn cookie_header(&self) -> Option<HeaderValue> {
        if self.cookies.is_empty() {
            return None;
        }
        let cookie = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&cookie).ok()
    }

    fn store_cookies(&mut self, headers: &HeaderMap) {
        for set_cookie in headers.get_all(header::SET_COOKIE) {
            let Ok(set_cookie) = set_cookie.to_str() else {
                continue;
            };
            let mut attributes = set_cookie.split(';').map(str::trim);
            let Some((name, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };

            let removed = attributes.any(|attr| attr.eq_ignore_ascii_case("max-age=0"));
            if removed || value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A request as seen by [`StubServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Local HTTP server standing in for a remote API.
///
/// Each path answers with a canned JSON reply; anything else is a 404.
/// Every request is recorded in arrival order.
#[derive(Clone, Default)]
pub struct StubServer {
    replies: Arc<Mutex<HashMap<String, (StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, path: &str, status: StatusCode, body: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
        self
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn start(&self) -> String {
        let stub = self.clone();
        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: String| {
                let stub = stub.clone();
                async move { stub.answer(method, uri, headers, body) }
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(&self, method: Method, uri: Uri, headers: HeaderMap, body: String) -> Response {
        let path = uri.path().to_string();
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.clone(),
            query: uri.query().map(str::to_string),
            headers,
            body,
        });

        match self.replies.lock().unwrap().get(&path) {
            Some((status, body)) => (
                *status,
                [(header::CONTENT_TYPE, "application/json")],
                body.clone(),
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// A base URL with nothing listening behind it.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
