//! Format writers.
//!
//! Each output format is a [`FormatWriter`]: a state machine that consumes
//! events one at a time and produces its [`Output`] when finished. The
//! [`Coordinator`] drives several writers from a single event stream.
//!
//! ```
//! use folio::model::{Body, Book, Paragraph};
//! use folio::stream::stream;
//! use folio::writer::{Coordinator, Format};
//! use folio::RenderConfig;
//!
//! let book = Book::new("b", "Title")
//!     .with_body(Body::new(vec![Paragraph::heading(1).with_text("Hello").into()]));
//!
//! let mut coordinator = Coordinator::new(["markdown", "html"], &RenderConfig::default())?;
//! coordinator.process(stream(&book));
//! let outputs = coordinator.flush_all();
//!
//! let markdown = outputs.get(Format::Markdown).unwrap().as_ref().unwrap();
//! assert_eq!(markdown.as_text(), Some("# Hello\n"));
//! # Ok::<(), folio::Error>(())
//! ```

mod coordinator;
mod epub;
mod escape;
mod html;
mod latex;
mod markdown;
mod plaintext;

pub use coordinator::{Coordinator, RenderOutput};
pub use epub::EpubWriter;
pub use escape::{escape_latex, escape_markdown, escape_xml, slugify};
pub use html::HtmlWriter;
pub use latex::LatexWriter;
pub use markdown::MarkdownWriter;
pub use plaintext::PlaintextWriter;

use std::fmt;
use std::str::FromStr;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::stream::Event;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Format {
    Markdown,
    Html,
    Latex,
    Epub,
    Plaintext,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Markdown,
        Format::Html,
        Format::Latex,
        Format::Epub,
        Format::Plaintext,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Html => "html",
            Format::Latex => "latex",
            Format::Epub => "epub",
            Format::Plaintext => "plaintext",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Markdown => ".md",
            Format::Html => ".html",
            Format::Latex => ".tex",
            Format::Epub => ".epub",
            Format::Plaintext => ".txt",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Format::Epub)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Format::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

/// Rendered content of one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

/// Finished output of one writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub format: Format,
    pub content: Content,
}

impl Output {
    pub fn text(format: Format, text: String) -> Self {
        Self {
            format,
            content: Content::Text(text),
        }
    }

    pub fn binary(format: Format, bytes: Vec<u8>) -> Self {
        Self {
            format,
            content: Content::Binary(bytes),
        }
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// The text, for textual formats.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            Content::Binary(_) => None,
        }
    }

    /// Raw bytes of the output, textual or not.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.content {
            Content::Text(text) => text.as_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    /// `<stem><extension>`, e.g. `book-1.epub`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}{}", self.extension())
    }
}

/// A per-format event consumer.
///
/// Writers are fed every event of one document in order, then finished
/// exactly once. `finish` takes the writer by value, so a finished writer
/// cannot accept more events.
pub trait FormatWriter {
    fn format(&self) -> Format;

    /// Consume one event. An error leaves the writer unusable.
    fn handle(&mut self, event: &Event<'_>) -> Result<()>;

    /// Produce the output. Fails if the document was never closed.
    fn finish(self: Box<Self>) -> Result<Output>;
}

/// Boxed writer as held by the coordinator.
pub type BoxedWriter = Box<dyn FormatWriter + Send>;

/// Construct the writer for `format` from its section of `config`.
pub fn create_writer(format: Format, config: &RenderConfig) -> Result<BoxedWriter> {
    let writer: BoxedWriter = match format {
        Format::Markdown => Box::new(MarkdownWriter::new(config.markdown.clone())),
        Format::Html => Box::new(HtmlWriter::new(config.html.clone())),
        Format::Latex => Box::new(LatexWriter::new(config.latex.clone())?),
        Format::Epub => Box::new(EpubWriter::new(config.epub.clone())?),
        Format::Plaintext => Box::new(PlaintextWriter::new()),
    };
    Ok(writer)
}
