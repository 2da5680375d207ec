//! SEO metadata for rendered pages

use serde::Serialize;
use serde_json::json;

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers::{encode_query_value, escape_script_json, full_url_for, post_path};

/// Social-card dimensions advertised for every page image
pub const OG_IMAGE_WIDTH: u32 = 1200;
pub const OG_IMAGE_HEIGHT: u32 = 630;

/// Head metadata of one page, as consumed by the layout template
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub canonical: String,
    /// `website` or `article`
    pub og_type: &'static str,
    pub image: String,
    pub image_alt: String,
    pub image_width: u32,
    pub image_height: u32,
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    /// Serialized JSON-LD, already safe to place inside `<script>`
    pub json_ld: Option<String>,
}

impl PageMeta {
    /// Metadata for a site page such as the home page or the blog index
    pub fn for_page(config: &SiteConfig, path: &str, title: Option<&str>) -> Self {
        let title = match title {
            Some(title) => format!("{} - {}", title, config.author),
            None => config.title.clone(),
        };

        Self {
            image: og_placeholder(config, &title),
            image_alt: title.clone(),
            title,
            description: config.description.clone(),
            keywords: keywords(config),
            author: config.author.clone(),
            canonical: full_url_for(config, path),
            og_type: "website",
            image_width: OG_IMAGE_WIDTH,
            image_height: OG_IMAGE_HEIGHT,
            published_time: None,
            modified_time: None,
            json_ld: None,
        }
    }

    /// Metadata for a post detail page
    pub fn for_post(config: &SiteConfig, post: &Post) -> Self {
        let json_ld = blog_posting(config, post).to_string();

        Self {
            title: format!("{} - {}", post.title, config.author),
            description: post.summary.clone(),
            keywords: keywords(config),
            author: config.author.clone(),
            canonical: canonical_url(config, post),
            og_type: "article",
            image: og_image(config, post),
            image_alt: post.title.clone(),
            image_width: OG_IMAGE_WIDTH,
            image_height: OG_IMAGE_HEIGHT,
            published_time: Some(post.published_at.clone()),
            modified_time: Some(post.published_at.clone()),
            json_ld: Some(escape_script_json(&json_ld)),
        }
    }
}

/// Canonical URL of a post on this site
pub fn canonical_url(config: &SiteConfig, post: &Post) -> String {
    full_url_for(config, &post_path(&post.slug))
}

/// Cover image as an absolute URL, or the generated-card placeholder
pub fn og_image(config: &SiteConfig, post: &Post) -> String {
    match post.image.as_deref() {
        Some(image) => full_url_for(config, image),
        None => og_placeholder(config, &post.title),
    }
}

fn og_placeholder(config: &SiteConfig, title: &str) -> String {
    format!(
        "{}?title={}",
        full_url_for(config, "/og"),
        encode_query_value(title)
    )
}

/// schema.org `BlogPosting` for a post
pub fn blog_posting(config: &SiteConfig, post: &Post) -> serde_json::Value {
    json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "datePublished": post.published_at,
        "dateModified": post.published_at,
        "description": post.summary,
        "image": og_image(config, post),
        "url": canonical_url(config, post),
        "author": {
            "@type": "Person",
            "name": config.author,
        },
    })
}

fn keywords(config: &SiteConfig) -> Vec<String> {
    let mut keywords = config.keywords.clone();
    if !config.author.is_empty() && !keywords.contains(&config.author) {
        keywords.push(config.author.clone());
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Body, Origin};

    fn config() -> SiteConfig {
        SiteConfig {
            author: "Jane Roe".to_string(),
            url: "https://jane.dev".to_string(),
            ..Default::default()
        }
    }

    fn post(image: Option<&str>) -> Post {
        Post {
            slug: "hello-world".to_string(),
            title: "Hello & <World>".to_string(),
            published_at: "2024-05-01".to_string(),
            summary: "First post".to_string(),
            image: image.map(str::to_string),
            body: Body::Html(String::new()),
            origin: Origin::Local,
        }
    }

    #[test]
    fn test_post_meta() {
        let meta = PageMeta::for_post(&config(), &post(Some("/images/cover.png")));
        assert_eq!(meta.title, "Hello & <World> - Jane Roe");
        assert_eq!(meta.description, "First post");
        assert_eq!(meta.canonical, "https://jane.dev/blog/hello-world");
        assert_eq!(meta.image, "https://jane.dev/images/cover.png");
        assert_eq!(meta.og_type, "article");
        assert_eq!(meta.published_time.as_deref(), Some("2024-05-01"));
        assert_eq!(meta.modified_time.as_deref(), Some("2024-05-01"));
        assert!(meta.keywords.contains(&"Jane Roe".to_string()));
    }

    #[test]
    fn test_placeholder_image_is_encoded() {
        let image = og_image(&config(), &post(None));
        assert_eq!(
            image,
            "https://jane.dev/og?title=Hello%20%26%20%3CWorld%3E"
        );
    }

    #[test]
    fn test_absolute_cover_image_is_kept() {
        let image = og_image(&config(), &post(Some("https://cdn.dev/c.png")));
        assert_eq!(image, "https://cdn.dev/c.png");
    }

    #[test]
    fn test_json_ld() {
        let value = blog_posting(&config(), &post(None));
        assert_eq!(value["@type"], "BlogPosting");
        assert_eq!(value["headline"], "Hello & <World>");
        assert_eq!(value["datePublished"], "2024-05-01");
        assert_eq!(value["author"]["name"], "Jane Roe");
        assert_eq!(value["url"], "https://jane.dev/blog/hello-world");

        let meta = PageMeta::for_post(&config(), &post(None));
        let embedded = meta.json_ld.unwrap();
        assert!(!embedded.contains('<'));
        let parsed: serde_json::Value = serde_json::from_str(&embedded).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_page_meta() {
        let meta = PageMeta::for_page(&config(), "/blog", Some("Blog"));
        assert_eq!(meta.title, "Blog - Jane Roe");
        assert_eq!(meta.canonical, "https://jane.dev/blog");
        assert_eq!(meta.og_type, "website");
        assert!(meta.json_ld.is_none());
    }
}
