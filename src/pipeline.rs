//! One-call rendering: sanitize, stream and fan out to writers.

use std::borrow::Cow;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::model::Book;
use crate::sanitize::{Sanitized, Warning, sanitize};
use crate::stream::stream;
use crate::writer::{Coordinator, Format, RenderOutput};

/// Outputs of a render plus the corrections sanitizing made.
#[derive(Debug)]
pub struct Rendering {
    pub outputs: RenderOutput,
    /// Empty when sanitizing is disabled.
    pub warnings: Vec<Warning>,
}

/// Render `book` to the named formats.
///
/// Fails only if a format name is unknown. Per-format failures are reported
/// in [`Rendering::outputs`].
///
/// ```
/// use folio::model::{Body, Book, Paragraph};
/// use folio::{RenderConfig, render};
///
/// let book = Book::new("b", "Title")
///     .with_body(Body::new(vec![Paragraph::new().with_text("Hi\u{0}").into()]));
/// let rendering = render(&book, &["plaintext"], &RenderConfig::default())?;
///
/// assert!(rendering.outputs.is_complete());
/// assert_eq!(rendering.warnings.len(), 1);
/// # Ok::<(), folio::Error>(())
/// ```
pub fn render(book: &Book, formats: &[&str], config: &RenderConfig) -> Result<Rendering> {
    let formats = formats
        .iter()
        .map(|name| name.parse::<Format>())
        .collect::<Result<Vec<_>>>()?;
    Ok(render_formats(book, &formats, config))
}

/// Render `book` to already-parsed formats.
pub fn render_formats(book: &Book, formats: &[Format], config: &RenderConfig) -> Rendering {
    let mut coordinator = Coordinator::from_formats(formats, config);

    let (book, warnings) = if config.sanitize {
        let Sanitized { book, warnings } = sanitize(book);
        (Cow::Owned(book), warnings)
    } else {
        (Cow::Borrowed(book), Vec::new())
    };

    let events = coordinator.process(stream(&book));
    let outputs = coordinator.flush_all();
    log::info!(
        "rendered {:?}: {events} events, {} of {} format(s) succeeded",
        book.id,
        outputs.successes().count(),
        outputs.len()
    );

    Rendering { outputs, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{Body, Paragraph};
    use crate::sanitize::Issue;

    fn book() -> Book {
        Book::new("b", "   ").with_body(Body::new(vec![
            Paragraph::heading(1).with_text("Intro").into(),
            Paragraph::new().with_text("a\u{1}b").into(),
        ]))
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let err = render(&book(), &["html", "pdf"], &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(name) if name == "pdf"));
    }

    #[test]
    fn test_sanitizes_by_default() {
        let rendering = render(&book(), &["plaintext"], &RenderConfig::default()).unwrap();
        let issues: Vec<_> = rendering.warnings.iter().map(|w| w.issue).collect();
        assert_eq!(issues, vec![Issue::TextSanitized]);

        let text = rendering.outputs.get(Format::Plaintext).unwrap().as_ref().unwrap();
        assert_eq!(text.as_text(), Some("Intro\nab\n"));
    }

    #[test]
    fn test_sanitize_can_be_disabled() {
        let config = RenderConfig::default().without_sanitize();
        let rendering = render_formats(&book(), &[Format::Plaintext], &config);
        assert!(rendering.warnings.is_empty());

        let text = rendering.outputs.get(Format::Plaintext).unwrap().as_ref().unwrap();
        assert_eq!(text.as_text(), Some("Intro\na\u{1}b\n"));
    }

    #[test]
    fn test_all_formats() {
        let rendering = render_formats(&book(), &Format::ALL, &RenderConfig::default());
        assert!(rendering.outputs.is_complete());
        assert_eq!(rendering.outputs.formats().collect::<Vec<_>>(), Format::ALL.to_vec());
    }
}
