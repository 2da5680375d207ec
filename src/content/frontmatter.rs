//! Front-matter parsing

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Accept any YAML scalar as text, so `title: 2024` stays a title
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct ScalarString;

    impl<'de> Visitor<'de> for ScalarString {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(ScalarString)
        }
    }

    deserializer.deserialize_any(ScalarString)
}

/// Front-matter parse failures
#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("front-matter block is not closed with ---")]
    Unterminated,

    #[error("invalid YAML front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Front-matter data from a content file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(
        rename = "publishedAt",
        alias = "published_at",
        alias = "date",
        deserialize_with = "scalar_string"
    )]
    pub published_at: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub image: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    ///
    /// Content without a leading `---` fence has no front-matter and is
    /// returned whole.
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        let Some(after_open) = content.strip_prefix("---") else {
            return Ok((FrontMatter::default(), content));
        };
        if !(after_open.starts_with('\n') || after_open.starts_with("\r\n")) {
            return Ok((FrontMatter::default(), content));
        }

        let rest = after_open.trim_start_matches(['\n', '\r']);
        let (yaml, remaining) = if let Some(after_close) = rest.strip_prefix("---") {
            ("", after_close)
        } else {
            let end_pos = rest.find("\n---").ok_or(FrontMatterError::Unterminated)?;
            (&rest[..end_pos], &rest[end_pos + 4..])
        };
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        if yaml.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml)?;
        Ok((fm, remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
publishedAt: 2024-01-15
summary: "A first post"
image: /images/hello.png
tags: [rust]
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.published_at.as_deref(), Some("2024-01-15"));
        assert_eq!(fm.summary.as_deref(), Some("A first post"));
        assert_eq!(fm.image.as_deref(), Some("/images/hello.png"));
        assert!(fm.extra.contains_key("tags"));
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_date_alias() {
        let content = "---\ntitle: Old style\ndate: '2023-03-01'\n---\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.published_at.as_deref(), Some("2023-03-01"));
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_numeric_scalars_are_text() {
        let content = "---\ntitle: 2024\npublishedAt: 2024\nsummary: 3.5\nimage: ~\nextra: true\n---\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert_eq!(fm.published_at.as_deref(), Some("2024"));
        assert_eq!(fm.summary.as_deref(), Some("3.5"));
        assert!(fm.image.is_none());
        assert!(fm.extra.contains_key("extra"));
        assert_eq!(remaining, "Body");

        let (fm, _) = FrontMatter::parse("---\ntitle: yes\n---\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("yes"));
    }

    #[test]
    fn test_non_scalar_title_is_rejected() {
        let err = FrontMatter::parse("---\ntitle: [a, b]\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("# Just markdown\n").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "# Just markdown\n");
    }

    #[test]
    fn test_horizontal_rule_is_not_a_fence() {
        let (fm, remaining) = FrontMatter::parse("----\ntext").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "----\ntext");
    }

    #[test]
    fn test_empty_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("---\n---\nBody").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_unterminated_frontmatter() {
        let err = FrontMatter::parse("---\ntitle: Oops\n\nno closing fence").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = FrontMatter::parse("---\ntitle: [unclosed\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "---\r\ntitle: Windows\r\npublishedAt: 2024-02-02\r\n---\r\nBody\r\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Windows"));
        assert_eq!(fm.published_at.as_deref(), Some("2024-02-02"));
        assert_eq!(remaining, "Body\r\n");
    }
}
