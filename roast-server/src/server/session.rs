use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    PrivateCookieJar,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Per-browser key/value storage handed to the route logic.
pub trait Session {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), serde_json::Error>;

    /// Drop every key.
    fn clear(&mut self);
}

/// Session kept entirely in one encrypted cookie.
///
/// The cookie value is the JSON object of all keys. Changes are written back
/// by [`CookieSession::into_jar`]; an emptied session removes the cookie.
pub struct CookieSession {
    jar: PrivateCookieJar,
    name: String,
    secure: bool,
    values: Map<String, Value>,
    changed: bool,
}

impl CookieSession {
    pub fn from_jar(jar: PrivateCookieJar, name: &str, secure: bool) -> Self {
        let values = jar
            .get(name)
            .and_then(|cookie| {
                serde_json::from_str::<Map<String, Value>>(cookie.value())
                    .map_err(|e| tracing::debug!(error = %e, "Discarding unreadable session cookie"))
                    .ok()
            })
            .unwrap_or_default();

        Self {
            jar,
            name: name.to_string(),
            secure,
            values,
            changed: false,
        }
    }

    pub fn into_jar(self) -> PrivateCookieJar {
        if !self.changed {
            return self.jar;
        }

        if self.values.is_empty() {
            let removal = Cookie::build((self.name, "")).path("/").build();
            return self.jar.remove(removal);
        }

        let value = Value::Object(self.values).to_string();
        let cookie = Cookie::build((self.name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        self.jar.add(cookie)
    }
}

impl Session for CookieSession {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        read_value(&self.values, key)
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.changed = true;
        Ok(())
    }

    fn clear(&mut self) {
        self.values.clear();
        self.changed = true;
    }
}

/// In-memory session for exercising route logic without cookies.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: Map<String, Value>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Session for MemorySession {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        read_value(&self.values, key)
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

fn read_value<T: DeserializeOwned>(values: &Map<String, Value>, key: &str) -> Option<T> {
    let value = values.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed session value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    fn key() -> Key {
        Key::derive_from(&[7u8; 32])
    }

    #[test]
    fn memory_session_get_set_clear() {
        let mut session = MemorySession::new();
        assert_eq!(session.get::<String>("name"), None);

        session.set("name", &"value").unwrap();
        assert_eq!(session.get::<String>("name").as_deref(), Some("value"));

        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.get::<String>("name"), None);
    }

    #[test]
    fn wrong_type_reads_as_absent() {
        let mut session = MemorySession::new();
        session.set("count", &"not a number").unwrap();

        assert_eq!(session.get::<u32>("count"), None);
    }

    #[test]
    fn cookie_session_writes_encrypted_cookie() {
        let mut session = CookieSession::from_jar(PrivateCookieJar::new(key()), "session", false);
        session.set("answer", &42).unwrap();

        let jar = session.into_jar();
        let cookie = jar.get("session").unwrap();
        assert_eq!(cookie.value(), r#"{"answer":42}"#);

        let reopened = CookieSession::from_jar(jar, "session", false);
        assert_eq!(reopened.get::<u32>("answer"), Some(42));
    }

    #[test]
    fn untouched_cookie_session_leaves_jar_alone() {
        let session = CookieSession::from_jar(PrivateCookieJar::new(key()), "session", false);
        let jar = session.into_jar();

        assert!(jar.get("session").is_none());
    }

    #[test]
    fn cleared_cookie_session_drops_cookie() {
        let mut session = CookieSession::from_jar(PrivateCookieJar::new(key()), "session", false);
        session.set("answer", &42).unwrap();
        let jar = session.into_jar();

        let mut session = CookieSession::from_jar(jar, "session", false);
        session.clear();
        let jar = session.into_jar();

        assert!(jar.get("session").is_none());
    }
}
