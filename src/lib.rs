//! # folio
//!
//! Sanitize structured books and render them to several output formats from a
//! single pass over their content.
//!
//! ## Features
//!
//! - Clean text, link URLs and structural anomalies into an independent copy,
//!   reporting every correction as a [`Warning`]
//! - Walk a book's body as a lazy, balanced stream of [`Event`](stream::Event)s
//! - Render Markdown, HTML, LaTeX, EPUB and plain text side by side, with
//!   failures isolated per format
//!
//! ## Quick Start
//!
//! ```
//! use folio::model::{Body, Book, Paragraph};
//! use folio::writer::Format;
//! use folio::{RenderConfig, render};
//!
//! let book = Book::new("intro-101", "Introduction").with_body(Body::new(vec![
//!     Paragraph::heading(1).with_text("Welcome").into(),
//!     Paragraph::new().with_text("First lesson.").into(),
//! ]));
//!
//! let rendering = render(&book, &["markdown", "epub"], &RenderConfig::default())?;
//! let markdown = rendering.outputs.get(Format::Markdown).unwrap().as_ref().unwrap();
//! assert_eq!(markdown.as_text(), Some("# Welcome\n\nFirst lesson.\n"));
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! ## Lower-level API
//!
//! [`sanitize::sanitize`], [`stream::stream`] and [`writer::Coordinator`] can
//! be used on their own, e.g. to stream an already-clean book or to drive a
//! custom [`writer::FormatWriter`].

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod sanitize;
pub mod stream;
pub mod writer;

pub use config::{EpubConfig, HtmlConfig, LatexConfig, MarkdownConfig, RenderConfig};
pub use error::{Error, Result};
pub use model::Book;
pub use pipeline::{Rendering, render, render_formats};
pub use sanitize::{Issue, Sanitized, Warning, sanitize};
pub use writer::{Format, Output};
