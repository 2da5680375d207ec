//! List posts

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::content::Post;
use crate::helpers::format_date;
use crate::Folio;

/// Which posts to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    All,
    Local,
    Remote,
}

impl std::str::FromStr for ListSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" | "post" | "posts" => Ok(ListSource::All),
            "local" => Ok(ListSource::Local),
            "remote" => Ok(ListSource::Remote),
            _ => anyhow::bail!("Unknown list type: {}. Use: all, local, remote", s),
        }
    }
}

/// Run the list command
pub async fn run(folio: &Folio, source: ListSource) -> Result<()> {
    let renderer = Arc::new(folio.renderer()?);
    let aggregator = folio.aggregator(renderer)?;
    let posts = aggregator.list_all_posts().await;

    let lines = format_listing(&posts, source, Utc::now());
    println!("Posts ({}):", lines.len());
    for line in lines {
        println!("{}", line);
    }

    Ok(())
}

fn format_listing(posts: &[Post], source: ListSource, now: DateTime<Utc>) -> Vec<String> {
    posts
        .iter()
        .filter(|post| match source {
            ListSource::All => true,
            ListSource::Local => !post.is_remote(),
            ListSource::Remote => post.is_remote(),
        })
        .map(|post| {
            let marker = if post.is_remote() { "remote" } else { "local" };
            format!(
                "  {}  {} [{}] ({})",
                format_date(&post.published_at, now),
                post.title,
                post.slug,
                marker
            )
        })
        .collect()
}
