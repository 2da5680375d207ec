//! Recent pull requests of a GitHub user

use axum::{
    extract::{Query, State},
    response::Response,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::check_status;
use super::{cached_json, WidgetError, WidgetState};
use crate::config::configured;

/// Number of pull requests returned
const PULL_REQUEST_COUNT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct GithubQuery {
    username: Option<String>,
}

/// `GET /api/github?username=`
pub async fn pull_requests(
    State(state): State<WidgetState>,
    Query(query): Query<GithubQuery>,
) -> Result<Response, WidgetError> {
    let username = valid_username(query.username.as_deref())?;
    let token = configured(&state.config.github_token).ok_or(WidgetError::NotConfigured("GitHub token"))?;

    tracing::debug!("Fetching pull requests for {}", username);
    let pull_requests =
        fetch_pull_requests(&state.client, &state.config.github_api_base, token, username).await?;

    Ok(cached_json(
        PullRequests { pull_requests },
        state.config.cache_max_age_secs,
    ))
}

async fn fetch_pull_requests(
    client: &reqwest::Client,
    api_base: &str,
    token: &str,
    username: &str,
) -> Result<Vec<PullRequest>, WidgetError> {
    let mut url = Url::parse(api_base).map_err(|e| WidgetError::Payload(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| WidgetError::Payload("GitHub API base cannot take a path".to_string()))?
        .pop_if_empty()
        .extend(["search", "issues"]);
    url.query_pairs_mut()
        .append_pair("q", &format!("author:{} type:pr", username))
        .append_pair("sort", "updated")
        .append_pair("order", "desc")
        .append_pair("per_page", &PULL_REQUEST_COUNT.to_string());

    let response = client
        .get(url)
        .header(AUTHORIZATION, format!("token {}", token))
        .header(ACCEPT, "application/vnd.github.v3+json")
        .send()
        .await?;
    let search: SearchResponse = check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| WidgetError::Payload(e.to_string()))?;

    Ok(search.items.into_iter().map(PullRequest::from).collect())
}

/// GitHub logins are alphanumerics and single hyphens
fn valid_username(username: Option<&str>) -> Result<&str, WidgetError> {
    let username = username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| WidgetError::BadRequest("Username is required".to_string()))?;

    if username.len() > 39 || !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(WidgetError::BadRequest("Invalid username".to_string()));
    }
    Ok(username)
}

// Upstream shapes

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: u64,
    number: u64,
    title: String,
    html_url: String,
    state: String,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(flatten)]
    repository: RepositoryRef,
}

/// Search results carry either an embedded repository or only its API URL
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepositoryRef {
    Embedded { repository: Repository },
    Linked { repository_url: String },
    Missing(IgnoredAny),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Repository {
    html_url: Option<String>,
    description: Option<String>,
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    avatar_url: Option<String>,
}

// Response shapes

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequests {
    pub pull_requests: Vec<PullRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub repository: RepositorySummary,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositorySummary {
    pub html_url: String,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl From<SearchItem> for PullRequest {
    fn from(item: SearchItem) -> Self {
        let repository = match item.repository {
            RepositoryRef::Embedded { repository } => RepositorySummary {
                html_url: repository.html_url.unwrap_or_else(|| item.html_url.clone()),
                avatar_url: repository.owner.and_then(|o| o.avatar_url),
                description: repository.description,
            },
            RepositoryRef::Linked { repository_url } => RepositorySummary {
                html_url: repository_page(&repository_url).unwrap_or_else(|| item.html_url.clone()),
                avatar_url: None,
                description: None,
            },
            RepositoryRef::Missing(_) => RepositorySummary {
                html_url: item.html_url.clone(),
                avatar_url: None,
                description: None,
            },
        };

        Self {
            id: item.id,
            number: item.number,
            title: item.title,
            html_url: item.html_url,
            state: item.state,
            created_at: item.created_at,
            updated_at: item.updated_at,
            repository,
            labels: item.labels,
        }
    }
}

/// `https://api.github.com/repos/o/r` -> `https://github.com/o/r`
fn repository_page(api_url: &str) -> Option<String> {
    let url = Url::parse(api_url).ok()?;
    let mut segments = url.path_segments()?;
    if segments.next()? != "repos" {
        return None;
    }
    let owner = segments.next()?;
    let name = segments.next()?;
    Some(format!("https://github.com/{}/{}", owner, name))
}
