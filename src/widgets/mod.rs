//! Live widget proxies
//!
//! Each widget fetches a third-party API on behalf of the browser, keeps
//! credentials server-side, and reshapes the payload into a small typed
//! JSON document. Failures come back as `{ "error": ... }`.

mod error;
mod github;
mod spotify;
mod token;
mod wakatime;

pub use error::WidgetError;
pub use github::{PullRequest, PullRequests};
pub use spotify::{NowPlaying, TrackInfo};
pub use token::{token_state, InMemoryTokenStore, StoredToken, TokenState, TokenStore, REFRESH_MARGIN_SECS};
pub use wakatime::{StatsRange, WakatimeStats};

use anyhow::Result;
use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WidgetConfig;

/// Shared state of the widget handlers
#[derive(Clone)]
pub struct WidgetState {
    pub config: Arc<WidgetConfig>,
    pub client: reqwest::Client,
    pub tokens: Arc<dyn TokenStore>,
}

impl WidgetState {
    /// State with an in-memory token store
    pub fn new(config: WidgetConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            client,
            tokens: Arc::new(InMemoryTokenStore::new()),
        })
    }

    /// Replace the token store
    pub fn with_token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }
}

/// Routes of every widget proxy
pub fn router(state: WidgetState) -> Router {
    Router::new()
        .route("/api/github", get(github::pull_requests))
        .route("/api/wakatime", get(wakatime::stats))
        .route("/api/spotify", get(spotify::spotify))
        .route("/api/spotify/callback", get(spotify::callback))
        .with_state(state)
}

/// JSON response the browser may cache for `max_age_secs`
pub(crate) fn cached_json<T: Serialize>(value: T, max_age_secs: u64) -> Response {
    (
        [(
            header::CACHE_CONTROL,
            format!("public, max-age={}", max_age_secs),
        )],
        Json(value),
    )
        .into_response()
}

/// `Authorization: Basic` value of already joined credentials
pub(crate) fn basic_auth(credentials: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(credentials))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `router` on an ephemeral local port and return its base URL
    pub async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth() {
        assert_eq!(basic_auth("waka_123"), "Basic d2FrYV8xMjM=");
        assert_eq!(basic_auth("id:secret"), "Basic aWQ6c2VjcmV0");
    }
}
