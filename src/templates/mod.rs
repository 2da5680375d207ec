//! Page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is on; only the
//! rendered post body and the JSON-LD block are marked `safe`.

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{configured, SiteConfig, SocialLink};
use crate::content::Post;
use crate::generator::PageMeta;
use crate::helpers::{escape_html, format_date};

/// Number of posts listed on the home page
pub const HOME_POST_COUNT: usize = 5;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        // Keep `/` readable in URLs; Tera's default escaper encodes it
        tera.set_escape_fn(escape_html);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("not_found.html", include_str!("site/not_found.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Home page: profile, widgets and the latest posts
    pub fn render_home(&self, config: &SiteConfig, posts: &[Post], now: DateTime<Utc>) -> Result<String> {
        let mut context = base_context(config, &PageMeta::for_page(config, "/", None), now);
        let cards: Vec<PostCard> = posts
            .iter()
            .take(HOME_POST_COUNT)
            .map(|p| PostCard::new(p, now))
            .collect();
        context.insert("posts", &cards);
        context.insert("widgets", &WidgetLinks::from_config(config));
        self.render("index.html", &context)
    }

    /// Blog index
    pub fn render_blog(&self, config: &SiteConfig, posts: &[Post], now: DateTime<Utc>) -> Result<String> {
        let mut context = base_context(config, &PageMeta::for_page(config, "/blog", Some("Blog")), now);
        let cards: Vec<PostCard> = posts.iter().map(|p| PostCard::new(p, now)).collect();
        context.insert("posts", &cards);
        self.render("blog.html", &context)
    }

    /// Post detail; `body_html` is the already rendered body
    pub fn render_post(
        &self,
        config: &SiteConfig,
        post: &Post,
        body_html: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let mut context = base_context(config, &PageMeta::for_post(config, post), now);
        context.insert(
            "post",
            &PostView {
                title: &post.title,
                date: format_date(&post.published_at, now),
                remote: post.is_remote(),
                canonical_url: post.canonical_url(),
                body_html,
            },
        );
        self.render("post.html", &context)
    }

    /// 404 page for an unknown path
    pub fn render_not_found(&self, config: &SiteConfig, path: &str, now: DateTime<Utc>) -> Result<String> {
        let meta = PageMeta::for_page(config, path, Some("Not found"));
        let mut context = base_context(config, &meta, now);
        context.insert("path", path);
        self.render("not_found.html", &context)
    }
}

fn base_context(config: &SiteConfig, meta: &PageMeta, now: DateTime<Utc>) -> Context {
    let mut context = Context::new();
    context.insert("site", &SiteData::new(config, now));
    context.insert("meta", meta);
    context
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub description: &'a str,
    pub summary: &'a str,
    pub url: &'a str,
    pub skills: &'a [String],
    pub social: &'a [SocialLink],
    pub year: i32,
}

impl<'a> SiteData<'a> {
    pub fn new(config: &'a SiteConfig, now: DateTime<Utc>) -> Self {
        Self {
            title: &config.title,
            author: &config.author,
            description: &config.description,
            summary: &config.summary,
            url: &config.url,
            skills: &config.skills,
            social: &config.social,
            year: now.year(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetLinks<'a> {
    pub github_username: Option<&'a str>,
    pub wakatime_username: Option<&'a str>,
    pub spotify: bool,
}

impl<'a> WidgetLinks<'a> {
    pub fn from_config(config: &'a SiteConfig) -> Self {
        let widgets = &config.widgets;
        Self {
            github_username: configured(&widgets.github_username),
            wakatime_username: configured(&widgets.wakatime_username),
            spotify: configured(&widgets.spotify_client_id).is_some(),
        }
    }
}

/// A post as listed on the home and blog pages
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub title: String,
    pub path: String,
    pub date: String,
    pub summary: String,
    pub remote: bool,
}

impl PostCard {
    pub fn new(post: &Post, now: DateTime<Utc>) -> Self {
        Self {
            title: post.title.clone(),
            path: post.path(),
            date: format_date(&post.published_at, now),
            summary: post.summary.clone(),
            remote: post.is_remote(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView<'a> {
    pub title: &'a str,
    pub date: String,
    pub remote: bool,
    pub canonical_url: Option<&'a str>,
    pub body_html: &'a str,
}
