//! Post model

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::helpers::{post_path, resolve_date};

/// Body of a post
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "source", rename_all = "lowercase")]
pub enum Body {
    /// Rendered HTML (local posts are rendered when read)
    Html(String),
    /// Markdown still to be rendered (remote posts)
    Markdown(String),
}

/// Where a post came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Origin {
    Local,
    Remote { canonical_url: String },
}

/// A blog post from either content source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Unique slug; remote slugs carry the remote prefix
    pub slug: String,

    /// Post title
    pub title: String,

    /// Publication date as written by the source
    pub published_at: String,

    /// Short description
    pub summary: String,

    /// Cover image URL or site-relative path
    pub image: Option<String>,

    pub body: Body,

    pub origin: Origin,
}

impl Post {
    /// Whether the post comes from the remote blog platform
    pub fn is_remote(&self) -> bool {
        matches!(self.origin, Origin::Remote { .. })
    }

    /// Link back to the remote platform, if any
    pub fn canonical_url(&self) -> Option<&str> {
        match &self.origin {
            Origin::Remote { canonical_url } => Some(canonical_url),
            Origin::Local => None,
        }
    }

    /// Resolved publication instant
    pub fn published(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        resolve_date(&self.published_at, now)
    }

    /// Site-relative URL of the detail page
    pub fn path(&self) -> String {
        post_path(&self.slug)
    }
}

/// A post without its body, as listed by the JSON API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub published_at: String,
    pub summary: String,
    pub image: Option<String>,
    pub path: String,
    pub remote: bool,
    pub canonical_url: Option<String>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            published_at: post.published_at.clone(),
            summary: post.summary.clone(),
            image: post.image.clone(),
            path: post.path(),
            remote: post.is_remote(),
            canonical_url: post.canonical_url().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_post() -> Post {
        Post {
            slug: "devto-hello".to_string(),
            title: "Hello".to_string(),
            published_at: "2024-05-01T10:00:00Z".to_string(),
            summary: "Greetings".to_string(),
            image: None,
            body: Body::Markdown("Greetings".to_string()),
            origin: Origin::Remote {
                canonical_url: "https://dev.to/jane/hello".to_string(),
            },
        }
    }

    #[test]
    fn test_origin_accessors() {
        let post = remote_post();
        assert!(post.is_remote());
        assert_eq!(post.canonical_url(), Some("https://dev.to/jane/hello"));
        assert_eq!(post.path(), "/blog/devto-hello");
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = PostSummary::from(&remote_post());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["publishedAt"], "2024-05-01T10:00:00Z");
        assert_eq!(json["canonicalUrl"], "https://dev.to/jane/hello");
        assert_eq!(json["remote"], true);
    }
}
