//! Currently playing track from Spotify
//!
//! `?action=auth` hands out the authorization URL, the callback exchanges
//! the code for tokens kept in the [`TokenStore`](super::TokenStore), and
//! `?action=current-track` reads the player with those tokens, refreshing
//! them shortly before they expire.
//!
//! There is one token store for the whole site: it holds the site owner's
//! session and a completed callback replaces it. Set `spotify_auth_state`
//! to restrict who can connect. With it, `?action=auth` needs a matching
//! `state` parameter, and callbacks carrying any other `state` are refused
//! before the code is exchanged.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{Duration, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode as UpstreamStatus;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::check_status;
use super::token::{token_state, StoredToken, TokenState, REFRESH_MARGIN_SECS};
use super::{basic_auth, WidgetError, WidgetState};
use crate::config::{configured, WidgetConfig};

const SCOPES: &str = "user-read-currently-playing user-read-playback-state";

#[derive(Debug, Deserialize)]
pub struct SpotifyQuery {
    action: Option<String>,
    state: Option<String>,
}

/// `GET /api/spotify?action=auth|current-track`
pub async fn spotify(
    State(state): State<WidgetState>,
    Query(query): Query<SpotifyQuery>,
    headers: HeaderMap,
) -> Result<Response, WidgetError> {
    match query.action.as_deref() {
        Some("auth") => {
            if !state_matches(&state.config, query.state.as_deref()) {
                return Err(WidgetError::Unauthorized("Invalid state".to_string()));
            }
            Ok(Json(AuthUrl {
                auth_url: authorize_url(&state.config)?,
            })
            .into_response())
        }
        Some("current-track") => {
            let token = match bearer_token(&headers) {
                Some(token) => token.to_string(),
                None => access_token(&state).await?,
            };
            let now_playing = current_track(&state, &token).await?;
            Ok(([(header::CACHE_CONTROL, "no-store")], Json(now_playing)).into_response())
        }
        _ => Err(WidgetError::BadRequest("Invalid action".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

/// `GET /api/spotify/callback?code=|error=`, always redirects home
pub async fn callback(State(state): State<WidgetState>, Query(query): Query<CallbackQuery>) -> Redirect {
    if let Some(error) = query.error {
        tracing::warn!("Spotify authorization denied: {}", error);
        return Redirect::to("/?error=spotify_auth");
    }
    if !state_matches(&state.config, query.state.as_deref()) {
        tracing::warn!("Spotify callback with a foreign state ignored");
        return Redirect::to("/?error=state_mismatch");
    }
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Redirect::to("/?error=no_code");
    };

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", state.config.spotify_redirect_uri.as_str()),
    ];
    match request_token(&state, &form).await {
        Ok(grant) => {
            state.tokens.set(grant.into_stored(None));
            tracing::info!("Spotify account connected");
            Redirect::to("/")
        }
        Err(WidgetError::Request(e)) => {
            tracing::error!("Spotify token exchange failed: {}", e);
            Redirect::to("/?error=server_error")
        }
        Err(e) => {
            tracing::warn!("Spotify token exchange rejected: {}", e);
            Redirect::to("/?error=token_exchange")
        }
    }
}

fn authorize_url(config: &WidgetConfig) -> Result<String, WidgetError> {
    let client_id =
        configured(&config.spotify_client_id).ok_or(WidgetError::NotConfigured("Spotify client"))?;

    let mut url = accounts_url(config, &["authorize"])?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &config.spotify_redirect_uri)
        .append_pair("scope", SCOPES);
    if let Some(auth_state) = configured(&config.spotify_auth_state) {
        url.query_pairs_mut().append_pair("state", auth_state);
    }
    Ok(url.into())
}

/// Without a configured state anyone may connect
fn state_matches(config: &WidgetConfig, given: Option<&str>) -> bool {
    match configured(&config.spotify_auth_state) {
        Some(expected) => given == Some(expected),
        None => true,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// A usable access token from the store, refreshed when close to expiry
async fn access_token(state: &WidgetState) -> Result<String, WidgetError> {
    let stored = state.tokens.get();
    let margin = Duration::seconds(REFRESH_MARGIN_SECS);

    match (token_state(stored.as_ref(), Utc::now(), margin), stored) {
        (TokenState::Fresh, Some(token)) => Ok(token.access_token),
        (TokenState::NeedsRefresh, Some(token)) => {
            let Some(refresh_token) = token.refresh_token else {
                state.tokens.clear();
                return Err(WidgetError::Unauthorized("Spotify session expired".to_string()));
            };

            tracing::debug!("Refreshing Spotify access token");
            let form = [
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ];
            match request_token(state, &form).await {
                Ok(grant) => {
                    let refreshed = grant.into_stored(Some(refresh_token.clone()));
                    let access = refreshed.access_token.clone();
                    state.tokens.set(refreshed);
                    Ok(access)
                }
                Err(e) => {
                    tracing::warn!("Spotify token refresh failed: {}", e);
                    state.tokens.clear();
                    Err(WidgetError::Unauthorized("Spotify session expired".to_string()))
                }
            }
        }
        _ => Err(WidgetError::Unauthorized("No access token provided".to_string())),
    }
}

async fn request_token(state: &WidgetState, form: &[(&str, &str)]) -> Result<TokenGrant, WidgetError> {
    let config = &state.config;
    let client_id =
        configured(&config.spotify_client_id).ok_or(WidgetError::NotConfigured("Spotify client"))?;
    let client_secret = configured(&config.spotify_client_secret)
        .ok_or(WidgetError::NotConfigured("Spotify client secret"))?;

    let response = state
        .client
        .post(accounts_url(config, &["api", "token"])?)
        .header(AUTHORIZATION, basic_auth(&format!("{}:{}", client_id, client_secret)))
        .form(form)
        .send()
        .await?;

    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| WidgetError::Payload(e.to_string()))
}

async fn current_track(state: &WidgetState, access_token: &str) -> Result<NowPlaying, WidgetError> {
    let mut url = Url::parse(&state.config.spotify_api_base).map_err(|e| WidgetError::Payload(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| WidgetError::Payload("Spotify API base cannot take a path".to_string()))?
        .pop_if_empty()
        .extend(["me", "player", "currently-playing"]);

    let response = state
        .client
        .get(url)
        .header(AUTHORIZATION, format!("Bearer {}", access_token))
        .send()
        .await?;

    // Nothing playing
    if response.status() == UpstreamStatus::NO_CONTENT {
        return Ok(NowPlaying::idle());
    }
    if response.status() == UpstreamStatus::UNAUTHORIZED {
        return Err(WidgetError::Unauthorized("Spotify rejected the access token".to_string()));
    }

    let playback: Playback = check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| WidgetError::Payload(e.to_string()))?;

    Ok(NowPlaying::from(playback))
}

fn accounts_url(config: &WidgetConfig, segments: &[&str]) -> Result<Url, WidgetError> {
    let mut url =
        Url::parse(&config.spotify_accounts_base).map_err(|e| WidgetError::Payload(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| WidgetError::Payload("Spotify accounts base cannot take a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// Upstream shapes

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

impl TokenGrant {
    /// Refresh grants may omit the refresh token; keep the previous one then
    fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken::issued(
            self.access_token,
            self.refresh_token.or(previous_refresh),
            self.expires_in,
            Utc::now(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct Playback {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    item: Option<PlayingItem>,
}

/// The player reports either a music track or a podcast episode
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum PlayingItem {
    Track {
        name: String,
        #[serde(default)]
        artists: Vec<Named>,
        album: Album,
        #[serde(default)]
        external_urls: ExternalUrls,
    },
    Episode {
        name: String,
        show: Show,
        #[serde(default)]
        external_urls: ExternalUrls,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    name: String,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Show {
    name: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

// Response shapes

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthUrl {
    auth_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NowPlaying {
    pub is_playing: bool,
    pub item: Option<TrackInfo>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackInfo {
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub image_url: Option<String>,
    pub url: Option<String>,
}

impl NowPlaying {
    fn idle() -> Self {
        Self {
            is_playing: false,
            item: None,
        }
    }
}

impl From<Playback> for NowPlaying {
    fn from(playback: Playback) -> Self {
        let item = match playback.item {
            Some(PlayingItem::Track {
                name,
                artists,
                album,
                external_urls,
            }) => Some(TrackInfo {
                name,
                artists: artists.into_iter().map(|a| a.name).collect(),
                image_url: album.images.into_iter().next().map(|i| i.url),
                album: album.name,
                url: external_urls.spotify,
            }),
            Some(PlayingItem::Episode {
                name,
                show,
                external_urls,
            }) => Some(TrackInfo {
                name,
                artists: if show.publisher.is_empty() {
                    Vec::new()
                } else {
                    vec![show.publisher]
                },
                image_url: show.images.into_iter().next().map(|i| i.url),
                album: show.name,
                url: external_urls.spotify,
            }),
            Some(PlayingItem::Unknown) | None => None,
        };

        Self {
            is_playing: playback.is_playing && item.is_some(),
            item,
        }
    }
}
