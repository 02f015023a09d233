//! Rendering configuration.
//!
//! Every struct has working defaults; a config file only needs the fields it
//! changes.

use crate::error::{Error, Result};
use crate::writer::Format;

/// Settings for a whole render.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderConfig {
    pub markdown: MarkdownConfig,
    pub html: HtmlConfig,
    pub latex: LatexConfig,
    pub epub: EpubConfig,
    /// Clean the book before streaming it (default true).
    pub sanitize: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            markdown: MarkdownConfig::default(),
            html: HtmlConfig::default(),
            latex: LatexConfig::default(),
            epub: EpubConfig::default(),
            sanitize: true,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markdown(mut self, markdown: MarkdownConfig) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn with_html(mut self, html: HtmlConfig) -> Self {
        self.html = html;
        self
    }

    pub fn with_latex(mut self, latex: LatexConfig) -> Self {
        self.latex = latex;
        self
    }

    pub fn with_epub(mut self, epub: EpubConfig) -> Self {
        self.epub = epub;
        self
    }

    /// Skip sanitizing; the book is streamed exactly as given.
    pub fn without_sanitize(mut self) -> Self {
        self.sanitize = false;
        self
    }
}

/// Configuration for Markdown output.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarkdownConfig {
    /// Emit a YAML front matter block with the title and description.
    pub front_matter: bool,
}

impl MarkdownConfig {
    pub fn with_front_matter(mut self) -> Self {
        self.front_matter = true;
        self
    }
}

/// Configuration for HTML output.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HtmlConfig {
    /// Wrap the body in a complete XHTML document.
    pub standalone: bool,
    /// Stylesheet href linked from the document head (standalone only).
    pub stylesheet: Option<String>,
}

impl HtmlConfig {
    pub fn standalone() -> Self {
        Self {
            standalone: true,
            stylesheet: None,
        }
    }

    pub fn with_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.stylesheet = Some(href.into());
        self
    }
}

/// Document classes accepted by [`LatexConfig`].
pub const LATEX_DOCUMENT_CLASSES: &[&str] = &[
    "article", "report", "book", "memoir", "scrartcl", "scrreprt", "scrbook",
];

/// Configuration for LaTeX output.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LatexConfig {
    /// `\documentclass` used in standalone output (default `article`).
    pub document_class: String,
    /// Wrap the body in a compilable document with a preamble.
    pub standalone: bool,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            document_class: "article".to_string(),
            standalone: true,
        }
    }
}

impl LatexConfig {
    pub fn with_document_class(mut self, class: impl Into<String>) -> Self {
        self.document_class = class.into();
        self
    }

    /// Emit only the body, for inclusion in another document.
    pub fn fragment(mut self) -> Self {
        self.standalone = false;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !LATEX_DOCUMENT_CLASSES.contains(&self.document_class.as_str()) {
            return Err(Error::InvalidConfig {
                format: Format::Latex,
                reason: format!("unknown document class {:?}", self.document_class),
            });
        }
        Ok(())
    }
}

/// Configuration for EPUB output.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EpubConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
    /// `dc:language` of the package (default `en`).
    pub language: Option<String>,
}

impl EpubConfig {
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level
            && level > 9
        {
            return Err(Error::InvalidConfig {
                format: Format::Epub,
                reason: format!("compression level {level} is out of range 0-9"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(config.sanitize);
        assert_eq!(config.latex.document_class, "article");
        assert!(config.latex.standalone);
        assert!(!config.html.standalone);
        assert_eq!(config.epub.compression_level, None);
    }

    #[test]
    fn test_latex_validation() {
        assert!(LatexConfig::default().validate().is_ok());
        let err = LatexConfig::default()
            .with_document_class("nonsense")
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfig {
                format: Format::Latex,
                ..
            }
        ));
    }

    #[test]
    fn test_epub_validation() {
        assert!(EpubConfig::default().with_compression_level(9).validate().is_ok());
        assert!(EpubConfig::default().with_compression_level(10).validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_config() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"epub": {"language": "de"}, "sanitize": false}"#).unwrap();
        assert!(!config.sanitize);
        assert_eq!(config.epub.language.as_deref(), Some("de"));
        assert_eq!(config.latex.document_class, "article");
    }
}
