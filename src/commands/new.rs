//! Create a new post

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::Folio;

#[derive(Serialize)]
struct NewPostFrontMatter<'a> {
    title: &'a str,
    #[serde(rename = "publishedAt")]
    published_at: String,
    summary: &'a str,
}

/// Write `<content_dir>/<slug>.mdx` with front-matter for `title`
///
/// A `scaffolds/post.md` file in the site root, if present, is used as the
/// template; `{{ title }}` and `{{ date }}` are substituted.
pub fn create_post(folio: &Folio, title: &str, slug: Option<&str>, now: DateTime<Utc>) -> Result<PathBuf> {
    let slug = match slug {
        Some(s) => slug::slugify(s),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title: {:?}", title);
    }

    fs::create_dir_all(&folio.content_dir)?;

    let file_path = folio.content_dir.join(format!("{}.mdx", slug));
    if file_path.exists() || folio.content_dir.join(format!("{}.md", slug)).exists() {
        anyhow::bail!("Post already exists: {:?}", file_path);
    }

    let date = now.format("%Y-%m-%d").to_string();
    let scaffold_path = folio.base_dir.join("scaffolds").join("post.md");
    let content = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
            .replace("{{ title }}", title)
            .replace("{{ date }}", &date)
    } else {
        let front_matter = serde_yaml::to_string(&NewPostFrontMatter {
            title,
            published_at: date,
            summary: "",
        })?;
        format!("---\n{}---\n\n", front_matter)
    };

    fs::write(&file_path, content)?;
    tracing::info!("Created post {}", slug);

    Ok(file_path)
}

/// Run the new command
pub fn run(folio: &Folio, title: &str) -> Result<PathBuf> {
    let path = create_post(folio, title, None, Utc::now())?;
    println!("Created: {:?}", path);
    Ok(path)
}
