//! Local content reader - posts stored as files in the content directory

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::{Body, ContentError, FrontMatter, MarkdownRenderer, Origin, Post};

/// Recognized content extensions, in lookup priority order
pub const CONTENT_EXTENSIONS: [&str; 2] = ["mdx", "md"];

/// Reads posts from a flat directory of front-matter + markdown files
#[derive(Clone)]
pub struct LocalSource {
    dir: PathBuf,
    renderer: Arc<MarkdownRenderer>,
}

impl LocalSource {
    /// Create a reader over `dir`
    pub fn new<P: Into<PathBuf>>(dir: P, renderer: Arc<MarkdownRenderer>) -> Self {
        Self {
            dir: dir.into(),
            renderer,
        }
    }

    /// Content directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Slugs of every content file, sorted. A missing directory has none.
    pub fn list_slugs(&self) -> Vec<String> {
        if !self.dir.is_dir() {
            tracing::debug!("Content directory {:?} does not exist", self.dir);
            return Vec::new();
        }

        let mut slugs: Vec<String> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && is_content_file(e.path()))
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .filter(|slug| is_valid_slug(slug))
            .collect();

        slugs.sort();
        slugs.dedup();
        slugs
    }

    /// Read and render a single post
    pub fn read_post(&self, slug: &str) -> Result<Post, ContentError> {
        let path = self
            .resolve_path(slug)
            .ok_or_else(|| ContentError::NotFound(slug.to_string()))?;

        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ContentError::NotFound(slug.to_string()),
            ErrorKind::InvalidData => ContentError::malformed(slug, e),
            _ => ContentError::unavailable("local", e),
        })?;

        let (fm, body) =
            FrontMatter::parse(&content).map_err(|e| ContentError::malformed(slug, e))?;

        let title = fm
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ContentError::malformed(slug, "missing title"))?;
        let published_at = fm
            .published_at
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| ContentError::malformed(slug, "missing publishedAt"))?;

        let html = self
            .renderer
            .render(body)
            .map_err(|e| ContentError::malformed(slug, e))?;

        Ok(Post {
            slug: slug.to_string(),
            title,
            published_at,
            summary: fm.summary.unwrap_or_default(),
            image: fm.image.filter(|i| !i.trim().is_empty()),
            body: Body::Html(html),
            origin: Origin::Local,
        })
    }

    /// Read every post; files that fail to read are logged and skipped
    pub fn list_posts(&self) -> Vec<Post> {
        self.list_slugs()
            .iter()
            .filter_map(|slug| match self.read_post(slug) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Skipping local post {}: {}", slug, e);
                    None
                }
            })
            .collect()
    }

    /// Path of the file backing `slug`, if one exists
    fn resolve_path(&self, slug: &str) -> Option<PathBuf> {
        if !is_valid_slug(slug) {
            return None;
        }
        CONTENT_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", slug, ext)))
            .find(|path| path.is_file())
    }
}

/// Check if a file has a content extension
fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CONTENT_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Slugs name a file directly inside the content directory
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.starts_with('.') && !slug.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(dir: &Path) -> LocalSource {
        LocalSource::new(dir, Arc::new(MarkdownRenderer::new()))
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let reader = source(&tmp.path().join("nope"));
        assert!(reader.list_slugs().is_empty());
        assert!(reader.list_posts().is_empty());
    }

    #[test]
    fn test_list_slugs_filters_extensions() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b-post.mdx", "");
        write(tmp.path(), "a-post.md", "");
        write(tmp.path(), "notes.txt", "");
        write(tmp.path(), ".hidden.md", "");
        fs::create_dir(tmp.path().join("drafts")).unwrap();
        write(&tmp.path().join("drafts"), "nested.md", "");

        let reader = source(tmp.path());
        assert_eq!(reader.list_slugs(), vec!["a-post", "b-post"]);
    }

    #[test]
    fn test_read_post_round_trip() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "hello.mdx",
            "---\ntitle: \"A\"\npublishedAt: \"2024-05-01\"\nsummary: \"S\"\n---\n# Hi\n",
        );

        let post = source(tmp.path()).read_post("hello").unwrap();
        assert_eq!(post.slug, "hello");
        assert_eq!(post.title, "A");
        assert_eq!(post.published_at, "2024-05-01");
        assert_eq!(post.summary, "S");
        assert_eq!(post.image, None);
        assert_eq!(post.origin, Origin::Local);
        match post.body {
            Body::Html(html) => {
                assert!(html.contains("<h1>Hi</h1>"));
                assert!(!html.contains("# Hi"));
            }
            Body::Markdown(_) => panic!("local posts are rendered when read"),
        }
    }

    #[test]
    fn test_mdx_wins_over_md() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "dup.md", "---\ntitle: From md\npublishedAt: 2024-01-01\n---\n");
        write(tmp.path(), "dup.mdx", "---\ntitle: From mdx\npublishedAt: 2024-01-01\n---\n");

        let reader = source(tmp.path());
        assert_eq!(reader.list_slugs(), vec!["dup"]);
        assert_eq!(reader.read_post("dup").unwrap().title, "From mdx");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = source(tmp.path()).read_post("ghost").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_path_traversal_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        fs::create_dir(&content).unwrap();
        write(tmp.path(), "secret.md", "---\ntitle: Secret\npublishedAt: 2024-01-01\n---\n");

        let reader = source(&content);
        assert!(reader.read_post("../secret").unwrap_err().is_not_found());
        assert!(reader.read_post("..").unwrap_err().is_not_found());
    }

    #[test]
    fn test_bad_frontmatter_is_malformed_and_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "broken.md", "---\ntitle: [oops\n---\nbody");
        write(tmp.path(), "untitled.md", "---\npublishedAt: 2024-01-01\n---\nbody");
        write(tmp.path(), "good.md", "---\ntitle: Good\npublishedAt: 2024-01-01\n---\nbody");

        let reader = source(tmp.path());
        assert!(matches!(
            reader.read_post("broken"),
            Err(ContentError::MalformedContent { .. })
        ));
        assert!(matches!(
            reader.read_post("untitled"),
            Err(ContentError::MalformedContent { .. })
        ));

        let posts = reader.list_posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "good");
    }
}
