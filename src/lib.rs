//! folio: a personal portfolio and blog server
//!
//! Blog posts come from two places, markdown files in the content directory
//! and a dev.to compatible blog API. They are merged into one collection
//! sorted by publication date and rendered with syntax-highlighted code.
//! The site also proxies a few live widgets (recent pull requests, coding
//! time, currently playing music).

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;
pub mod widgets;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use content::{ContentAggregator, LocalSource, MarkdownRenderer, RemoteSource};

/// The main folio application
#[derive(Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content (posts) directory
    pub content_dir: PathBuf,
    /// Static files directory
    pub public_dir: PathBuf,
}

impl Folio {
    /// Create a new instance from a directory, reading `_config.yml` and
    /// the environment
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            content_dir,
            public_dir,
        }
    }

    /// Markdown renderer with the configured highlight themes
    pub fn renderer(&self) -> Result<MarkdownRenderer> {
        let highlight = &self.config.highlight;
        MarkdownRenderer::with_themes(&highlight.light_theme, &highlight.dark_theme)
    }

    /// Aggregator over the content directory and, when an account is set,
    /// the remote blog
    pub fn aggregator(&self, renderer: Arc<MarkdownRenderer>) -> Result<ContentAggregator> {
        let remote_config = &self.config.remote;
        let local = LocalSource::new(&self.content_dir, renderer);

        let remote = if remote_config.enabled && !remote_config.account.trim().is_empty() {
            Some(RemoteSource::new(remote_config)?)
        } else {
            tracing::debug!("Remote posts disabled");
            None
        };

        Ok(ContentAggregator::new(local, remote, &remote_config.prefix))
    }

    /// Create a new post
    pub fn new_post(&self, title: &str) -> Result<PathBuf> {
        commands::new::run(self, title)
    }
}
