//! Cookie sessions
//!
//! Tokens come from the `session` cookie. A token the client presents is
//! adopted as-is, whether or not this server issued it, and login keeps using
//! it. Logout only expires the browser cookie; the stored entry stays valid.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use bank_common::Account;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

/// Ten years; "permanent" sessions never expire in practice.
const PERMANENT_MAX_AGE_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub permanent: bool,
    pub theme: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Default for SessionData {
    fn default() -> Self {
        Self {
            user_id: None,
            username: None,
            permanent: false,
            theme: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    /// Active sessions: token -> SessionData
    sessions: Arc<DashMap<String, SessionData>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, token: &str) -> Option<SessionData> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    /// Bind `account` to `token` and return the `Set-Cookie` value.
    ///
    /// The token is never rotated, so whoever chose it before login owns the
    /// authenticated session afterwards.
    pub fn start_session(&self, token: &str, account: &Account, permanent: bool) -> String {
        let mut data = self.get(token).unwrap_or_default();
        data.user_id = Some(account.id);
        data.username = Some(account.username.clone());
        data.permanent = permanent;
        self.sessions.insert(token.to_string(), data);

        tracing::debug!(user_id = account.id, permanent, "Session started");
        session_cookie(token, permanent)
    }

    /// Clear the caller's view of the session and return the expiring cookie.
    /// The server-side entry for `token` is left in place.
    pub fn end_session(&self, token: &str) -> String {
        tracing::debug!(known = self.sessions.contains_key(token), "Session cleared client-side");
        format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE)
    }

    /// Returns `None` when `token` has no session yet.
    pub fn set_theme(&self, token: &str, theme: &str) -> Option<()> {
        let mut entry = self.sessions.get_mut(token)?;
        entry.theme = Some(theme.to_string());
        Some(())
    }
}

/// `Set-Cookie` value for a session token. No `HttpOnly`, `Secure` or `SameSite`.
pub fn session_cookie(token: &str, permanent: bool) -> String {
    if permanent {
        format!(
            "{}={}; Path=/; Max-Age={}",
            SESSION_COOKIE, token, PERMANENT_MAX_AGE_SECS
        )
    } else {
        format!("{}={}; Path=/", SESSION_COOKIE, token)
    }
}

/// Pull the session token out of the `Cookie` header(s).
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// The request's session, resolved from the cookie.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: String,
    /// True when the client sent no token and one was minted for this request
    pub issued: bool,
    pub data: Option<SessionData>,
}

impl CurrentSession {
    pub fn user_id(&self) -> Option<i64> {
        self.data.as_ref().and_then(|d| d.user_id)
    }

    pub fn username(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.username.as_deref())
    }

    pub fn theme(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.theme.as_deref())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let (token, issued) = match token_from_headers(&parts.headers) {
            Some(token) => (token, false),
            None => (Uuid::new_v4().to_string(), true),
        };
        let data = store.get(&token);

        Ok(Self {
            token,
            issued,
            data,
        })
    }
}
