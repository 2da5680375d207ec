//! Content aggregator - one sorted collection over local and remote posts

use chrono::{DateTime, Utc};
use std::cmp::Reverse;

use super::{LocalSource, Post, RemoteSource};

/// Merges the local and remote sources
///
/// Neither source can fail the aggregation: a source that errors, panics
/// or times out simply contributes no posts.
#[derive(Clone)]
pub struct ContentAggregator {
    local: LocalSource,
    remote: Option<RemoteSource>,
    prefix: String,
}

impl ContentAggregator {
    /// `prefix` namespaces remote slugs; it is honored even without a remote
    /// source, so prefixed slugs never fall through to local files.
    pub fn new<S: Into<String>>(
        local: LocalSource,
        remote: Option<RemoteSource>,
        prefix: S,
    ) -> Self {
        Self {
            local,
            remote,
            prefix: prefix.into(),
        }
    }

    pub fn local(&self) -> &LocalSource {
        &self.local
    }

    /// Every post from both sources, newest first
    pub async fn list_all_posts(&self) -> Vec<Post> {
        let local = self.local.clone();
        let local_task = tokio::task::spawn_blocking(move || local.list_posts());

        let remote = self.remote.clone();
        let remote_task = tokio::spawn(async move {
            match remote {
                Some(remote) => remote.list_posts().await,
                None => Vec::new(),
            }
        });

        let (local_result, remote_result) = tokio::join!(local_task, remote_task);

        let mut posts = local_result.unwrap_or_else(|e| {
            tracing::warn!("Local source failed: {}", e);
            Vec::new()
        });
        // Prefixed slugs resolve only remotely, so local files named that way
        // would link nowhere or collide with a remote post
        posts.retain(|post| {
            let shadowed = self.remote_slug(&post.slug).is_some();
            if shadowed {
                tracing::warn!(
                    "Skipping local post {}: slug uses the remote prefix {:?}",
                    post.slug,
                    self.prefix
                );
            }
            !shadowed
        });
        let remote_posts = remote_result.unwrap_or_else(|e| {
            tracing::warn!("Remote source failed: {}", e);
            Vec::new()
        });

        tracing::debug!(
            "Aggregated {} local and {} remote posts",
            posts.len(),
            remote_posts.len()
        );
        posts.extend(remote_posts);

        sort_by_published(&mut posts, Utc::now());
        posts
    }

    /// A single post with its full body, or `None` when no source has it
    pub async fn get_post(&self, slug: &str) -> Option<Post> {
        if let Some(remote_slug) = self.remote_slug(slug) {
            let remote = self.remote.as_ref()?;
            return match remote.fetch_post(remote_slug).await {
                Ok(post) => Some(post),
                Err(e) if e.is_not_found() => None,
                Err(e) => {
                    tracing::warn!("Remote post {} unavailable: {}", slug, e);
                    None
                }
            };
        }

        let local = self.local.clone();
        let owned = slug.to_string();
        match tokio::task::spawn_blocking(move || local.read_post(&owned)).await {
            Ok(Ok(post)) => Some(post),
            Ok(Err(e)) if e.is_not_found() => None,
            Ok(Err(e)) => {
                tracing::warn!("Local post {} unreadable: {}", slug, e);
                None
            }
            Err(e) => {
                tracing::warn!("Local source failed reading {}: {}", slug, e);
                None
            }
        }
    }

    fn remote_slug<'a>(&self, slug: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return None;
        }
        slug.strip_prefix(self.prefix.as_str())
    }
}

/// Stable sort, newest first; posts without a resolvable date go last
pub fn sort_by_published(posts: &mut [Post], now: DateTime<Utc>) {
    posts.sort_by_cached_key(|post| Reverse(post.published(now)));
}
