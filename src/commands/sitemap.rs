//! Print or write the sitemap

use anyhow::Result;
use chrono::Utc;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::generator::build_sitemap;
use crate::Folio;

/// Build the sitemap from all posts; write it to `output` or stdout
pub async fn run(folio: &Folio, output: Option<&Path>) -> Result<()> {
    let renderer = Arc::new(folio.renderer()?);
    let aggregator = folio.aggregator(renderer)?;
    let posts = aggregator.list_all_posts().await;
    let xml = build_sitemap(&folio.config, &posts, Utc::now());

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, xml)?;
            tracing::info!("Wrote sitemap with {} posts to {:?}", posts.len(), path);
        }
        None => print!("{}", xml),
    }

    Ok(())
}
