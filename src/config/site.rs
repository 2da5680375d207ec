//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub url: String,

    // Home page
    pub summary: String,
    pub skills: Vec<String>,
    pub social: Vec<SocialLink>,

    // Directory
    pub content_dir: String,
    pub public_dir: String,

    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub widgets: WidgetConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            author: "John Doe".to_string(),
            description: String::new(),
            keywords: vec![
                "blog".to_string(),
                "software development".to_string(),
                "programming".to_string(),
            ],
            url: "http://localhost:3000".to_string(),

            summary: String::new(),
            skills: Vec::new(),
            social: Vec::new(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),

            highlight: HighlightConfig::default(),
            remote: RemoteConfig::default(),
            server: ServerConfig::default(),
            widgets: WidgetConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Override secrets and endpoints from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override secrets and endpoints using the given lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_ACCESS_TOKEN") {
            self.widgets.github_token = Some(token);
        }
        if let Some(key) = get("WAKATIME_API_KEY") {
            self.widgets.wakatime_api_key = Some(key);
        }
        if let Some(id) = get("SPOTIFY_CLIENT_ID") {
            self.widgets.spotify_client_id = Some(id);
        }
        if let Some(secret) = get("SPOTIFY_CLIENT_SECRET") {
            self.widgets.spotify_client_secret = Some(secret);
        }
        if let Some(uri) = get("SPOTIFY_REDIRECT_URI") {
            self.widgets.spotify_redirect_uri = uri;
        }
        if let Some(auth_state) = get("SPOTIFY_AUTH_STATE") {
            self.widgets.spotify_auth_state = Some(auth_state);
        }
        if let Some(account) = get("DEVTO_USERNAME") {
            self.remote.account = account;
        }
    }
}

/// A profile link shown on the home page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
}

/// Code highlighting themes (syntect theme names)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub light_theme: String,
    pub dark_theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            light_theme: "InspiredGitHub".to_string(),
            dark_theme: "base16-ocean.dark".to_string(),
        }
    }
}

/// Remote blog platform (dev.to compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub api_base: String,
    pub account: String,
    /// Fixed upper bound on the list call; not paginated
    pub per_page: usize,
    /// Slug namespace for remote posts
    pub prefix: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://dev.to/api".to_string(),
            account: String::new(),
            per_page: 100,
            prefix: "devto-".to_string(),
            timeout_secs: 10,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
        }
    }
}

/// Live widget proxies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Accounts shown on the home page; a widget without one is hidden
    pub github_username: Option<String>,
    pub wakatime_username: Option<String>,

    pub github_token: Option<String>,
    pub github_api_base: String,

    pub wakatime_api_key: Option<String>,
    pub wakatime_api_base: String,

    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_redirect_uri: String,
    pub spotify_api_base: String,
    pub spotify_accounts_base: String,
    /// Shared secret the OAuth `state` must carry; unset lets anyone connect
    pub spotify_auth_state: Option<String>,

    /// `Cache-Control: max-age` for widget responses
    pub cache_max_age_secs: u64,
    pub timeout_secs: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            github_username: None,
            wakatime_username: None,

            github_token: None,
            github_api_base: "https://api.github.com".to_string(),

            wakatime_api_key: None,
            wakatime_api_base: "https://wakatime.com/api/v1".to_string(),

            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_redirect_uri: "http://localhost:3000/api/spotify/callback".to_string(),
            spotify_api_base: "https://api.spotify.com/v1".to_string(),
            spotify_accounts_base: "https://accounts.spotify.com".to_string(),
            spotify_auth_state: None,

            cache_max_age_secs: 60 * 60 * 24,
            timeout_secs: 10,
        }
    }
}

/// Returns the credential unless it is empty or an `your_..._here` placeholder
pub fn configured(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .filter(|v| !(v.starts_with("your_") && v.ends_with("_here")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.remote.per_page, 100);
        assert_eq!(config.remote.prefix, "devto-");
        assert_eq!(config.highlight.light_theme, "InspiredGitHub");
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Jane's Site
author: Jane Roe
url: https://jane.dev
social:
  - name: GitHub
    url: https://github.com/janeroe
remote:
  account: janeroe
  per_page: 30
widgets:
  cache_max_age_secs: 600
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Jane's Site");
        assert_eq!(config.author, "Jane Roe");
        assert_eq!(config.social[0].name, "GitHub");
        assert_eq!(config.remote.account, "janeroe");
        assert_eq!(config.remote.per_page, 30);
        // Unset keys in a partially specified section keep their defaults
        assert_eq!(config.remote.prefix, "devto-");
        assert!(config.remote.enabled);
        assert_eq!(config.widgets.cache_max_age_secs, 600);
        assert_eq!(config.widgets.github_api_base, "https://api.github.com");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GITHUB_ACCESS_TOKEN", "ghp_abc"),
            ("WAKATIME_API_KEY", ""),
            ("DEVTO_USERNAME", "janeroe"),
            ("SPOTIFY_AUTH_STATE", "owner-secret"),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.widgets.wakatime_api_key = Some("from-file".to_string());
        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.widgets.github_token.as_deref(), Some("ghp_abc"));
        assert_eq!(config.widgets.wakatime_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.remote.account, "janeroe");
        assert_eq!(config.widgets.spotify_auth_state.as_deref(), Some("owner-secret"));
    }

    #[test]
    fn test_configured_rejects_placeholders() {
        assert_eq!(configured(&None), None);
        assert_eq!(configured(&Some("  ".to_string())), None);
        assert_eq!(
            configured(&Some("your_github_token_here".to_string())),
            None
        );
        assert_eq!(configured(&Some("ghp_123".to_string())), Some("ghp_123"));
    }
}
