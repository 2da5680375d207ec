//! Content error taxonomy

use thiserror::Error;

/// Errors raised by the content sources
///
/// None of these reach the end user as an error page: the aggregator turns
/// every variant into either an empty contribution or a not-found result.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("post not found: {0}")]
    NotFound(String),

    #[error("{origin} source unavailable: {reason}")]
    SourceUnavailable { origin: &'static str, reason: String },

    #[error("malformed content for '{slug}': {reason}")]
    MalformedContent { slug: String, reason: String },

    #[error("render error: {0}")]
    Render(String),
}

impl ContentError {
    pub(crate) fn malformed(slug: &str, reason: impl std::fmt::Display) -> Self {
        ContentError::MalformedContent {
            slug: slug.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unavailable(origin: &'static str, reason: impl std::fmt::Display) -> Self {
        ContentError::SourceUnavailable {
            origin,
            reason: reason.to_string(),
        }
    }

    /// Whether the error means the slug simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound(_))
    }
}
