//! Content module - local and remote posts, merged into one collection

mod aggregate;
mod error;
mod frontmatter;
mod local;
mod markdown;
mod post;
mod remote;

pub use aggregate::{sort_by_published, ContentAggregator};
pub use error::ContentError;
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use local::{LocalSource, CONTENT_EXTENSIONS};
pub use markdown::{MarkdownRenderer, DEFAULT_DARK_THEME, DEFAULT_LIGHT_THEME};
pub use post::{Body, Origin, Post, PostSummary};
pub use remote::{Article, RemoteSource};
