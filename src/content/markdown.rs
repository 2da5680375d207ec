//! Markdown rendering with syntax highlighting

use anyhow::{anyhow, Result};
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::ContentError;
use crate::helpers::escape_html;

/// Token classes are emitted as `hl-<scope>` so the theme lives in CSS
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

pub const DEFAULT_LIGHT_THEME: &str = "InspiredGitHub";
pub const DEFAULT_DARK_THEME: &str = "base16-ocean.dark";

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    light: Theme,
    dark: Theme,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer with the default theme pair
    pub fn new() -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            light: themes.remove(DEFAULT_LIGHT_THEME).unwrap_or_default(),
            dark: themes.remove(DEFAULT_DARK_THEME).unwrap_or_default(),
        }
    }

    /// Create with a named light/dark theme pair from the bundled theme set
    pub fn with_themes(light: &str, dark: &str) -> Result<Self> {
        let mut themes = ThemeSet::load_defaults().themes;
        let mut take = |name: &str| {
            themes
                .remove(name)
                .ok_or_else(|| anyhow!("Unknown highlight theme: {}", name))
        };
        let light = take(light)?;
        let dark = take(dark)?;

        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            light,
            dark,
        })
    }

    /// Render markdown to HTML
    ///
    /// Raw HTML in the source is dropped. Fenced code blocks become
    /// `<pre class="hl-code">` blocks with class-based token spans.
    pub fn render(&self, markdown: &str) -> Result<String, ContentError> {
        // Front-matter is split off before rendering, so no metadata blocks here
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => fence_language(&info),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let highlighted = self.highlight_code(&code, lang.as_deref())?;
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) => match code_block.as_mut() {
                    Some((_, code)) => code.push_str(&text),
                    None => events.push(Event::Text(text)),
                },
                Event::Html(_) | Event::InlineHtml(_) => {}
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Render markdown, degrading to escaped raw text when rendering fails
    pub fn render_or_escape(&self, markdown: &str) -> String {
        match self.render(markdown) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Showing raw text instead of rendered markdown: {}", e);
                escaped_source(markdown)
            }
        }
    }

    /// Stylesheet for highlighted code: light rules by default, dark rules
    /// under `prefers-color-scheme: dark`. Background colors are left to the page.
    pub fn theme_css(&self) -> Result<String, ContentError> {
        let light = css_for_theme_with_class_style(&self.light, CLASS_STYLE)
            .map_err(|e| ContentError::Render(e.to_string()))?;
        let dark = css_for_theme_with_class_style(&self.dark, CLASS_STYLE)
            .map_err(|e| ContentError::Render(e.to_string()))?;

        Ok(format!(
            "{}\n@media (prefers-color-scheme: dark) {{\n{}\n}}\n",
            strip_backgrounds(&light),
            strip_backgrounds(&dark)
        ))
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> Result<String, ContentError> {
        let lang = lang.unwrap_or("text");

        // Try to find syntax for the language
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| ContentError::Render(format!("highlighting {}: {}", lang, e)))?;
        }

        Ok(format!(
            r#"<pre class="hl-code" data-lang="{}"><code>{}</code></pre>"#,
            escape_html(lang),
            generator.finalize()
        ))
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Language token of a fence info string (` ```rust {1,3} ` -> `rust`)
/// Raw markdown shown as escaped preformatted text
fn escaped_source(markdown: &str) -> String {
    format!("<pre>{}</pre>", escape_html(markdown))
}

fn fence_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

fn strip_backgrounds(css: &str) -> String {
    css.lines()
        .filter(|line| !line.trim_start().starts_with("background-color"))
        .collect::<Vec<_>>()
        .join("\n")
}
