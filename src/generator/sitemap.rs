//! Sitemap generation

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers::{date_xml, escape_xml, full_url_for, post_path};

/// How often a page is expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

/// One `<url>` of the sitemap
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// Home, blog index, then one entry per post in the given order
pub fn sitemap_entries(config: &SiteConfig, posts: &[Post], now: DateTime<Utc>) -> Vec<SitemapEntry> {
    let mut entries = vec![
        SitemapEntry {
            loc: full_url_for(config, "/"),
            lastmod: Some(now),
            changefreq: ChangeFreq::Weekly,
            priority: 1.0,
        },
        SitemapEntry {
            loc: full_url_for(config, "/blog"),
            lastmod: Some(now),
            changefreq: ChangeFreq::Weekly,
            priority: 0.8,
        },
    ];

    entries.extend(posts.iter().map(|post| SitemapEntry {
        loc: full_url_for(config, &post_path(&post.slug)),
        lastmod: post.published(now),
        changefreq: ChangeFreq::Monthly,
        priority: 0.6,
    }));

    entries
}

/// Render entries as sitemap XML
pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        // Posts with an unreadable date simply carry no lastmod
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", date_xml(lastmod)));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq.as_str()
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Sitemap XML for the site and its posts
pub fn build_sitemap(config: &SiteConfig, posts: &[Post], now: DateTime<Utc>) -> String {
    render_sitemap(&sitemap_entries(config, posts, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Body, Origin};
    use chrono::TimeZone;

    fn post(slug: &str, date: &str) -> Post {
        Post {
            slug: slug.to_string(),
            title: slug.to_string(),
            published_at: date.to_string(),
            summary: String::new(),
            image: None,
            body: Body::Html(String::new()),
            origin: Origin::Local,
        }
    }

    fn config() -> SiteConfig {
        SiteConfig {
            url: "https://jane.dev/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_entries_order_and_priorities() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let posts = vec![post("b", "2024-06-01"), post("a&b", "not a date")];
        let entries = sitemap_entries(&config(), &posts, now);

        let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://jane.dev",
                "https://jane.dev/blog",
                "https://jane.dev/blog/b",
                "https://jane.dev/blog/a%26b"
            ]
        );
        assert_eq!(entries[0].priority, 1.0);
        assert_eq!(entries[1].changefreq, ChangeFreq::Weekly);
        assert_eq!(entries[2].changefreq, ChangeFreq::Monthly);
        assert_eq!(entries[2].priority, 0.6);
        assert_eq!(
            entries[2].lastmod,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(entries[3].lastmod, None);
    }

    #[test]
    fn test_render_xml() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let xml = build_sitemap(&config(), &[post("c# tips", "nope")], now);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<loc>https://jane.dev</loc>"));
        assert!(xml.contains("<lastmod>2025-01-01T00:00:00Z</lastmod>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert!(xml.contains("<loc>https://jane.dev/blog/c%23%20tips</loc>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert_eq!(xml.matches("<url>").count(), 3);
        assert_eq!(xml.matches("<lastmod>").count(), 2);
        assert!(xml.trim_end().ends_with("</urlset>"));
    }
}
