//! Coding-time statistics from WakaTime

use axum::{
    extract::{Query, State},
    response::Response,
};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::check_status;
use super::{basic_auth, cached_json, WidgetError, WidgetState};
use crate::config::configured;

/// Stats window; anything other than `all_time` means the last week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsRange {
    LastSevenDays,
    AllTime,
}

impl StatsRange {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("all_time") => StatsRange::AllTime,
            _ => StatsRange::LastSevenDays,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatsRange::LastSevenDays => "last_7_days",
            StatsRange::AllTime => "all_time",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WakatimeQuery {
    username: Option<String>,
    range: Option<String>,
}

/// `GET /api/wakatime?username=&range=`
pub async fn stats(
    State(state): State<WidgetState>,
    Query(query): Query<WakatimeQuery>,
) -> Result<Response, WidgetError> {
    let username = query
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| WidgetError::BadRequest("Username is required".to_string()))?;
    let api_key = configured(&state.config.wakatime_api_key)
        .ok_or(WidgetError::NotConfigured("WakaTime API key"))?;
    let range = StatsRange::parse(query.range.as_deref());

    tracing::debug!("Fetching {} coding stats for {}", range.as_str(), username);
    let stats = fetch_stats(
        &state.client,
        &state.config.wakatime_api_base,
        api_key,
        username,
        range,
    )
    .await?;

    Ok(cached_json(stats, state.config.cache_max_age_secs))
}

async fn fetch_stats(
    client: &reqwest::Client,
    api_base: &str,
    api_key: &str,
    username: &str,
    range: StatsRange,
) -> Result<WakatimeStats, WidgetError> {
    let mut url = Url::parse(api_base).map_err(|e| WidgetError::Payload(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| WidgetError::Payload("WakaTime API base cannot take a path".to_string()))?
        .pop_if_empty()
        .extend(["users", username, "stats", range.as_str()]);

    let response = client
        .get(url)
        .header(AUTHORIZATION, basic_auth(api_key))
        .send()
        .await?;

    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| WidgetError::Payload(e.to_string()))
}

/// Stats document, keeping only the fields the site displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakatimeStats {
    pub data: StatsData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsData {
    pub total_seconds: f64,
    pub daily_average: f64,
    pub human_readable_total: String,
    pub human_readable_daily_average: String,
    pub best_day: Option<BestDay>,
    pub languages: Vec<Share>,
    pub editors: Vec<Share>,
    pub operating_systems: Vec<Share>,
    pub categories: Vec<Share>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BestDay {
    pub date: String,
    pub total_seconds: f64,
}

/// Time spent in one language, editor, OS or category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Share {
    pub name: String,
    pub total_seconds: f64,
    pub percent: f64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WidgetConfig;
    use crate::widgets::{router, test_support::spawn_upstream, WidgetState};
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };

    #[test]
    fn test_range_parse() {
        assert_eq!(StatsRange::parse(Some("all_time")), StatsRange::AllTime);
        assert_eq!(StatsRange::parse(Some("last_30_days")), StatsRange::LastSevenDays);
        assert_eq!(StatsRange::parse(None).as_str(), "last_7_days");
    }

    #[test]
    fn test_stats_tolerates_missing_fields() {
        let stats: WakatimeStats = serde_json::from_value(serde_json::json!({
            "data": {
                "total_seconds": 3600.5,
                "human_readable_total": "1 hr",
                "languages": [{"name": "Rust", "percent": 80.0, "total_seconds": 2880}],
                "is_up_to_date": true
            }
        }))
        .unwrap();
        assert_eq!(stats.data.languages[0].name, "Rust");
        assert!(stats.data.editors.is_empty());
        assert!(stats.data.best_day.is_none());
    }

    async fn upstream() -> String {
        let router = Router::new().route(
            "/users/:user/stats/:range",
            get(
                |Path((user, range)): Path<(String, String)>, headers: HeaderMap| async move {
                    if headers["authorization"] != "Basic d2FrYV8xMjM=" {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    Ok(Json(serde_json::json!({
                        "data": {
                            "username": user,
                            "range": range,
                            "total_seconds": 7200,
                            "human_readable_total": "2 hrs",
                            "languages": [{"name": "Rust", "percent": 100.0}]
                        }
                    })))
                },
            ),
        );
        spawn_upstream(router).await
    }

    #[tokio::test]
    async fn test_proxy_end_to_end() {
        let api_base = upstream().await;
        let state = WidgetState::new(WidgetConfig {
            wakatime_api_key: Some("waka_123".to_string()),
            wakatime_api_base: api_base,
            ..Default::default()
        })
        .unwrap();
        let base = spawn_upstream(router(state)).await;

        let response = reqwest::get(format!("{}/api/wakatime?username=jane&range=all_time", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["data"]["human_readable_total"], "2 hrs");
        assert_eq!(body["data"]["languages"][0]["name"], "Rust");
        // Fields the site does not use are dropped
        assert!(body["data"].get("username").is_none());
    }

    #[tokio::test]
    async fn test_wrong_key_forwards_status() {
        let api_base = upstream().await;
        let state = WidgetState::new(WidgetConfig {
            wakatime_api_key: Some("other".to_string()),
            wakatime_api_base: api_base,
            ..Default::default()
        })
        .unwrap();
        let base = spawn_upstream(router(state)).await;

        let response = reqwest::get(format!("{}/api/wakatime?username=jane", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn test_placeholder_key_is_not_configured() {
        let state = WidgetState::new(WidgetConfig {
            wakatime_api_key: Some("your_wakatime_api_key_here".to_string()),
            ..Default::default()
        })
        .unwrap();
        let base = spawn_upstream(router(state)).await;

        let response = reqwest::get(format!("{}/api/wakatime?username=jane", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "WakaTime API key not configured");
    }
}
