//! Remote content fetcher - posts hosted on a dev.to compatible blog API

use anyhow::Result;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{Body, ContentError, Origin, Post};
use crate::config::RemoteConfig;

/// An article as returned by the blog API
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub published_at: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub slug: String,
    pub url: String,
    /// Only populated by the single-article endpoint
    #[serde(default)]
    pub body_markdown: Option<String>,
}

impl Article {
    /// List entry: the description stands in for the body
    pub fn into_summary_post(self, prefix: &str) -> Post {
        let summary = self.description.clone().unwrap_or_default();
        self.into_post(prefix, summary.clone(), summary)
    }

    /// Detail entry: full markdown body, falling back to the description
    pub fn into_full_post(self, prefix: &str) -> Post {
        let summary = self.description.clone().unwrap_or_default();
        let body = self
            .body_markdown
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| summary.clone());
        self.into_post(prefix, summary, body)
    }

    fn into_post(self, prefix: &str, summary: String, markdown: String) -> Post {
        Post {
            slug: format!("{}{}", prefix, self.slug),
            title: self.title,
            published_at: self.published_at,
            summary,
            image: self.cover_image.filter(|i| !i.trim().is_empty()),
            body: Body::Markdown(markdown),
            origin: Origin::Remote {
                canonical_url: self.url,
            },
        }
    }
}

/// Client for one account on the remote blog API
#[derive(Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    api_base: String,
    account: String,
    per_page: usize,
    prefix: String,
}

impl RemoteSource {
    /// Create a client; every request is bounded by `timeout_secs`
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            account: config.account.clone(),
            per_page: config.per_page,
            prefix: config.prefix.clone(),
        })
    }

    /// Slug namespace of remote posts
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Summary posts of the account; empty on any failure
    pub async fn list_posts(&self) -> Vec<Post> {
        match self.try_list_posts().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!("Remote posts unavailable: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_list_posts(&self) -> Result<Vec<Post>, ContentError> {
        let mut url = self.endpoint(&["articles"])?;
        url.query_pairs_mut()
            .append_pair("username", &self.account)
            .append_pair("per_page", &self.per_page.to_string());

        tracing::debug!("Fetching remote posts from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContentError::unavailable("remote", e))?;

        if !response.status().is_success() {
            return Err(ContentError::unavailable(
                "remote",
                format!("list request returned {}", response.status()),
            ));
        }

        let entries: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ContentError::unavailable("remote", e))?;

        let posts: Vec<Post> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Article>(entry) {
                Ok(article) => Some(article.into_summary_post(&self.prefix)),
                Err(e) => {
                    tracing::warn!("Skipping malformed remote article: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Fetched {} remote posts", posts.len());
        Ok(posts)
    }

    /// Full post by its un-prefixed slug
    pub async fn fetch_post(&self, slug: &str) -> Result<Post, ContentError> {
        if slug.is_empty() || slug.contains('/') {
            return Err(ContentError::NotFound(slug.to_string()));
        }

        let url = self.endpoint(&["articles", &self.account, slug])?;
        tracing::debug!("Fetching remote post from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContentError::unavailable("remote", e))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ContentError::NotFound(slug.to_string())),
            status => {
                return Err(ContentError::unavailable(
                    "remote",
                    format!("article request returned {}", status),
                ))
            }
        }

        let article: Article = response
            .json()
            .await
            .map_err(|e| ContentError::malformed(slug, e))?;

        Ok(article.into_full_post(&self.prefix))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ContentError> {
        let mut url =
            Url::parse(&self.api_base).map_err(|e| ContentError::unavailable("remote", e))?;
        url.path_segments_mut()
            .map_err(|_| ContentError::unavailable("remote", "API base cannot take a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_json() -> serde_json::Value {
        serde_json::json!({
            "id": 42,
            "title": "Shipping Rust",
            "description": "Notes from production",
            "published_at": "2025-06-01T09:00:00Z",
            "cover_image": null,
            "slug": "shipping-rust-1a2b",
            "url": "https://dev.to/jane/shipping-rust-1a2b",
            "tag_list": ["rust"]
        })
    }

    #[test]
    fn test_summary_mapping() {
        let article: Article = serde_json::from_value(article_json()).unwrap();
        let post = article.into_summary_post("devto-");
        assert_eq!(post.slug, "devto-shipping-rust-1a2b");
        assert_eq!(post.title, "Shipping Rust");
        assert_eq!(post.summary, "Notes from production");
        assert_eq!(post.published_at, "2025-06-01T09:00:00Z");
        assert_eq!(post.image, None);
        assert_eq!(post.body, Body::Markdown("Notes from production".to_string()));
        assert_eq!(
            post.canonical_url(),
            Some("https://dev.to/jane/shipping-rust-1a2b")
        );
    }

    #[test]
    fn test_full_mapping_prefers_body_markdown() {
        let mut json = article_json();
        json["body_markdown"] = serde_json::json!("# Full\n\nText");
        json["cover_image"] = serde_json::json!("https://cdn.example.com/c.png");
        let article: Article = serde_json::from_value(json).unwrap();
        let post = article.into_full_post("devto-");
        assert_eq!(post.body, Body::Markdown("# Full\n\nText".to_string()));
        assert_eq!(post.image.as_deref(), Some("https://cdn.example.com/c.png"));
    }

    #[test]
    fn test_full_mapping_falls_back_to_description() {
        let article: Article = serde_json::from_value(article_json()).unwrap();
        let post = article.into_full_post("devto-");
        assert_eq!(post.body, Body::Markdown("Notes from production".to_string()));
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let mut json = article_json();
        json.as_object_mut().unwrap().remove("slug");
        assert!(serde_json::from_value::<Article>(json).is_err());
    }

    #[test]
    fn test_endpoint_building() {
        let config = RemoteConfig {
            api_base: "https://dev.to/api/".to_string(),
            account: "jane".to_string(),
            ..Default::default()
        };
        let source = RemoteSource::new(&config).unwrap();
        let url = source.endpoint(&["articles", "jane", "a b"]).unwrap();
        assert_eq!(url.as_str(), "https://dev.to/api/articles/jane/a%20b");
    }

    #[tokio::test]
    async fn test_timeout_is_a_source_failure() {
        use axum::{Json, Router};

        let upstream = Router::new().fallback(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Json(serde_json::json!([article_json()]))
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let source = RemoteSource::new(&RemoteConfig {
            api_base: format!("http://{}", addr),
            account: "jane".to_string(),
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();

        assert!(source.list_posts().await.is_empty());
        let err = source.fetch_post("shipping-rust-1a2b").await.unwrap_err();
        assert!(matches!(err, ContentError::SourceUnavailable { .. }));
    }
}
