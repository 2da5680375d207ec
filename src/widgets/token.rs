//! OAuth token storage for the music widget

use chrono::{DateTime, Duration, Utc};
use std::sync::{PoisonError, RwLock};

/// Refresh this long before the upstream expiry
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Tokens returned by the authorization server
#[derive(Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    /// Token granted at `now`, valid for `expires_in` seconds
    pub fn issued(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in.max(0)),
        }
    }
}

/// What a handler must do before using the stored token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Fresh,
    NeedsRefresh,
    Missing,
}

/// Decide whether a token can be used as-is
pub fn token_state(token: Option<&StoredToken>, now: DateTime<Utc>, margin: Duration) -> TokenState {
    match token {
        None => TokenState::Missing,
        Some(token) if token.expires_at - margin <= now => TokenState::NeedsRefresh,
        Some(_) => TokenState::Fresh,
    }
}

/// Where the widget keeps its tokens between requests
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<StoredToken>;
    fn set(&self, token: StoredToken);
    fn clear(&self);
}

/// Process-local token store; tokens are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<StoredToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self) -> Option<StoredToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: StoredToken) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
