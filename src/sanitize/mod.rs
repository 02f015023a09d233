//! Book sanitizing.
//!
//! [`sanitize`] copies a book and cleans the copy: text is stripped of
//! control characters and invalid code points, link URLs are validated, and
//! structural anomalies (blank titles and headings, empty image URLs) are
//! replaced with placeholders. Every correction is reported as a [`Warning`].
//!
//! Sanitizing never fails. The input book is never modified.
//!
//! ```
//! use folio::model::{Body, Book, Paragraph};
//! use folio::sanitize::{sanitize, Issue};
//!
//! let book = Book::new("b1", "Title")
//!     .with_body(Body::new(vec![Paragraph::heading(1).with_text("   ").into()]));
//! let result = sanitize(&book);
//!
//! assert_eq!(result.warnings.len(), 1);
//! assert_eq!(result.warnings[0].issue, Issue::EmptyHeading);
//! ```

mod text;
mod url;
mod warning;

pub use text::{CleanedText, clean_text, sanitize_bytes, sanitize_text};
pub use url::{EMPTY_URL_PLACEHOLDER, UNSAFE_URL_PLACEHOLDER, UrlCheck, is_unsafe, validate_link_url};
pub use warning::{Issue, Warning, WarningLog};

use std::collections::BTreeMap;

use crate::model::{
    Book, ChapterTree, ContentRun, Image, Link, Paragraph, StructuralElement, TextRun,
};

/// Placeholder for a blank chapter title.
pub const CHAPTER_TITLE_PLACEHOLDER: &str = "Untitled chapter";

/// Placeholder text for a heading with no visible text.
pub const HEADING_PLACEHOLDER: &str = "Untitled section";

/// A sanitized copy of a book and the corrections made to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub book: Book,
    /// Corrections in traversal order: metadata, chapters, body, images.
    pub warnings: Vec<Warning>,
}

/// Produce a cleaned, independent copy of `book`.
pub fn sanitize(book: &Book) -> Sanitized {
    let mut cleaned = book.clone();
    let mut log = WarningLog::new();

    sanitize_metadata(&mut cleaned, &mut log);
    sanitize_chapters(&mut cleaned.chapters, &mut log);
    if let Some(body) = cleaned.body.as_mut() {
        sanitize_elements(&mut body.content, "body", &mut log);
    }
    sanitize_images(&mut cleaned.images, &mut log);

    log::info!(
        "sanitized book {:?}: {} warning(s)",
        cleaned.id,
        log.len()
    );

    Sanitized {
        book: cleaned,
        warnings: log.into_vec(),
    }
}

/// [`sanitize`] for an optional book. `None` yields `None` and no warnings.
pub fn sanitize_option(book: Option<&Book>) -> (Option<Book>, Vec<Warning>) {
    match book {
        Some(book) => {
            let Sanitized { book, warnings } = sanitize(book);
            (Some(book), warnings)
        }
        None => (None, Vec::new()),
    }
}

/// Clean `value` in place, warning if disallowed characters were dropped.
///
/// The locator is built lazily; most fields are already clean.
fn clean_field(value: &mut String, location: impl FnOnce() -> String, log: &mut WarningLog) {
    let cleaned = clean_text(value);
    if cleaned.removed > 0 {
        log.push(
            location(),
            Issue::TextSanitized,
            value.as_str(),
            cleaned.text.as_str(),
        );
    }
    *value = cleaned.text;
}

fn sanitize_metadata(book: &mut Book, log: &mut WarningLog) {
    clean_field(&mut book.title, || "title".to_string(), log);
    clean_field(&mut book.description, || "description".to_string(), log);
}

fn sanitize_chapters(tree: &mut ChapterTree, log: &mut WarningLog) {
    let order: Vec<_> = tree.iter_dfs_located().collect();
    for (id, locator) in order {
        let location = format!("{locator}.title");
        let Some(chapter) = tree.get_mut(id) else {
            continue;
        };

        let original = chapter.title.clone();
        clean_field(&mut chapter.title, || location.clone(), log);
        if chapter.title.trim().is_empty() {
            chapter.title = CHAPTER_TITLE_PLACEHOLDER.to_string();
            log.push(
                location,
                Issue::EmptyChapterTitle,
                original,
                CHAPTER_TITLE_PLACEHOLDER,
            );
        }
    }
}

fn sanitize_elements(elements: &mut [StructuralElement], base: &str, log: &mut WarningLog) {
    for (i, element) in elements.iter_mut().enumerate() {
        let location = format!("{base}[{i}]");
        match element {
            StructuralElement::Paragraph(p) => sanitize_paragraph(p, &location, log),
            StructuralElement::Table(table) => {
                for (r, row) in table.rows.iter_mut().enumerate() {
                    for (c, cell) in row.cells.iter_mut().enumerate() {
                        let cell_base = format!("{location}.table.rows[{r}].cells[{c}].content");
                        sanitize_elements(&mut cell.content, &cell_base, log);
                    }
                }
            }
            StructuralElement::TableOfContents(toc) => {
                sanitize_elements(&mut toc.content, &format!("{location}.toc.content"), log);
            }
            StructuralElement::SectionBreak(_) => {}
        }
    }
}

fn sanitize_paragraph(paragraph: &mut Paragraph, location: &str, log: &mut WarningLog) {
    let heading_text = paragraph
        .is_heading()
        .then(|| paragraph.text().into_owned());

    for (i, run) in paragraph.runs.iter_mut().enumerate() {
        match run {
            ContentRun::Text(text_run) => {
                let run_location = format!("{location}.runs[{i}]");
                clean_field(&mut text_run.text, || format!("{run_location}.text"), log);
                if let Some(link) = text_run.link.as_mut() {
                    sanitize_link(link, &run_location, log);
                }
            }
            ContentRun::Equation(eq) => {
                clean_field(&mut eq.content, || format!("{location}.runs[{i}].equation"), log);
            }
            ContentRun::InlineObject(_)
            | ContentRun::PageBreak
            | ContentRun::ColumnBreak
            | ContentRun::FootnoteReference(_)
            | ContentRun::HorizontalRule => {}
        }
    }

    let blank = paragraph.text().trim().is_empty();
    if let Some(original) = heading_text
        && blank
    {
        fill_heading_placeholder(paragraph);
        log.push(location, Issue::EmptyHeading, original, HEADING_PLACEHOLDER);
    }
}

/// Put the placeholder in the first text run and blank the rest.
fn fill_heading_placeholder(paragraph: &mut Paragraph) {
    let mut placed = false;
    for run in &mut paragraph.runs {
        if let ContentRun::Text(t) = run {
            if placed {
                t.text.clear();
            } else {
                t.text = HEADING_PLACEHOLDER.to_string();
                placed = true;
            }
        }
    }
    if !placed {
        paragraph.runs.push(TextRun::plain(HEADING_PLACEHOLDER).into());
    }
}

fn sanitize_link(link: &mut Link, run_location: &str, log: &mut WarningLog) {
    if link.is_internal() {
        return;
    }

    let location = || format!("{run_location}.link.url");

    // Internal links only need their stray whitespace removed
    if link.target.is_some() && link.url.trim().is_empty() {
        log.push(location(), Issue::LinkUrlWhitespace, link.url.as_str(), "");
        link.url.clear();
        return;
    }

    let check = validate_link_url(&link.url);
    if let Some(issue) = check.issue {
        log.push(location(), issue, link.url.as_str(), check.url.as_str());
    }
    link.url = check.url;
}

fn sanitize_images(images: &mut BTreeMap<String, Image>, log: &mut WarningLog) {
    for (key, image) in images.iter_mut() {
        if image.url.trim().is_empty() {
            log.push(
                format!("images[{key}].url"),
                Issue::EmptyImageUrl,
                image.url.as_str(),
                "",
            );
            image.url.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Body, ChapterNode, Equation, InlineObject, LinkTarget, Table, TableCell, TableOfContents,
        TableRow, TextStyle,
    };

    fn book_with(content: Vec<StructuralElement>) -> Book {
        Book::new("book-1", "A Book").with_body(Body::new(content))
    }

    fn body_paragraph(book: &Book, index: usize) -> &Paragraph {
        match &book.body.as_ref().unwrap().content[index] {
            StructuralElement::Paragraph(p) => p,
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_book_has_no_warnings() {
        let book = book_with(vec![
            Paragraph::heading(1).with_text("Chapter One").into(),
            Paragraph::new()
                .with_text("Plain text,")
                .with_run(
                    TextRun::plain("a link").with_link(Link::external("https://example.com")),
                )
                .into(),
        ]);
        let result = sanitize(&book);
        assert!(result.warnings.is_empty());
        assert_eq!(result.book, book);
    }

    #[test]
    fn test_input_is_not_modified() {
        let book = book_with(vec![Paragraph::new().with_text("a\u{0}b").into()]);
        let snapshot = book.clone();
        let result = sanitize(&book);
        assert_eq!(book, snapshot);
        assert_eq!(body_paragraph(&result.book, 0).text(), "ab");
    }

    #[test]
    fn test_blank_chapter_title() {
        let tree = ChapterTree::from_nodes(vec![
            ChapterNode::new("c1", "Intro"),
            ChapterNode::new("c2", "   "),
        ]);
        let book = Book::new("b", "Title").with_chapters(tree);
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        let w = &result.warnings[0];
        assert_eq!(w.location, "chapters[1].title");
        assert_eq!(w.issue, Issue::EmptyChapterTitle);
        assert_eq!(w.original, "   ");
        assert_eq!(w.fixed, CHAPTER_TITLE_PLACEHOLDER);
    }

    #[test]
    fn test_nested_chapter_locations() {
        let tree = ChapterTree::from_nodes(vec![
            ChapterNode::new("c1", "Intro")
                .with_child(ChapterNode::new("c1.1", ""))
                .with_child(ChapterNode::new("c1.2", "Bad\u{7}title")),
        ]);
        let book = Book::new("b", "Title").with_chapters(tree);
        let result = sanitize(&book);

        let summary: Vec<_> = result
            .warnings
            .iter()
            .map(|w| (w.location.as_str(), w.issue))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("chapters[0].children[0].title", Issue::EmptyChapterTitle),
                ("chapters[0].children[1].title", Issue::TextSanitized),
            ]
        );
    }

    #[test]
    fn test_control_characters_in_text() {
        let book = book_with(vec![
            Paragraph::new()
                .with_text("Text\u{0000}with\u{0001}control\u{0002}chars")
                .into(),
        ]);
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        let w = &result.warnings[0];
        assert_eq!(w.issue, Issue::TextSanitized);
        assert_eq!(w.location, "body[0].runs[0].text");
        assert_eq!(w.fixed, "Textwithcontrolchars");
        assert_eq!(body_paragraph(&result.book, 0).text(), "Textwithcontrolchars");
    }

    #[test]
    fn test_link_whitespace() {
        let book = book_with(vec![
            Paragraph::new()
                .with_run(TextRun::plain("site").with_link(Link::external("  https://example.com  ")))
                .into(),
        ]);
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].issue, Issue::LinkUrlWhitespace);
        assert_eq!(result.warnings[0].location, "body[0].runs[0].link.url");
        let ContentRun::Text(run) = &body_paragraph(&result.book, 0).runs[0] else {
            panic!("expected text run");
        };
        assert_eq!(run.link.as_ref().unwrap().url, "https://example.com");
    }

    #[test]
    fn test_unsafe_link_replaced() {
        let book = book_with(vec![
            Paragraph::new()
                .with_run(TextRun::plain("x").with_link(Link::external("javascript:alert(1)")))
                .into(),
        ]);
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].issue, Issue::UnsafeLinkUrl);
        assert_eq!(result.warnings[0].fixed, UNSAFE_URL_PLACEHOLDER);
    }

    #[test]
    fn test_internal_link_with_empty_url_is_valid() {
        let book = book_with(vec![
            Paragraph::new()
                .with_run(TextRun::plain("see").with_link(Link::heading("h.1")))
                .into(),
        ]);
        assert!(sanitize(&book).warnings.is_empty());
    }

    #[test]
    fn test_internal_link_with_blank_url_is_trimmed() {
        let link = Link {
            url: "  ".to_string(),
            target: Some(LinkTarget::Bookmark("b1".to_string())),
        };
        let book = book_with(vec![
            Paragraph::new().with_run(TextRun::plain("see").with_link(link)).into(),
        ]);
        let result = sanitize(&book);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].issue, Issue::LinkUrlWhitespace);
        let ContentRun::Text(run) = &body_paragraph(&result.book, 0).runs[0] else {
            panic!("expected text run");
        };
        assert!(run.link.as_ref().unwrap().is_internal());
    }

    #[test]
    fn test_whitespace_heading() {
        let book = book_with(vec![Paragraph::heading(2).with_text("   ").into()]);
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        let w = &result.warnings[0];
        assert_eq!(w.issue, Issue::EmptyHeading);
        assert_eq!(w.location, "body[0]");
        assert_eq!(w.original, "   ");

        let heading = body_paragraph(&result.book, 0);
        assert!(heading.is_heading());
        assert_eq!(heading.text(), HEADING_PLACEHOLDER);
    }

    #[test]
    fn test_heading_without_text_runs_gets_placeholder_run() {
        let book = book_with(vec![
            Paragraph::heading(1)
                .with_run(ContentRun::InlineObject(InlineObject {
                    object_id: "img".to_string(),
                }))
                .into(),
        ]);
        let result = sanitize(&book);
        let heading = body_paragraph(&result.book, 0);
        assert_eq!(heading.runs.len(), 2);
        assert_eq!(heading.text(), HEADING_PLACEHOLDER);
    }

    #[test]
    fn test_heading_placeholder_blanks_extra_runs() {
        let book = book_with(vec![
            Paragraph::heading(1)
                .with_text(" ")
                .with_run(TextRun::styled("  ", TextStyle::bold()))
                .into(),
        ]);
        let result = sanitize(&book);
        assert_eq!(body_paragraph(&result.book, 0).text(), HEADING_PLACEHOLDER);
    }

    #[test]
    fn test_table_cell_location() {
        let table = Table {
            rows: vec![TableRow {
                cells: vec![
                    TableCell::default(),
                    TableCell {
                        content: vec![Paragraph::new().with_text("bad\u{1}").into()],
                    },
                ],
            }],
        };
        let book = book_with(vec![Paragraph::new().with_text("ok").into(), table.into()]);
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            result.warnings[0].location,
            "body[1].table.rows[0].cells[1].content[0].runs[0].text"
        );
    }

    #[test]
    fn test_toc_and_equation_are_cleaned() {
        let toc = TableOfContents {
            content: vec![Paragraph::new().with_text("entry\u{2}").into()],
        };
        let eq = Paragraph::new().with_run(ContentRun::Equation(Equation {
            content: "x\u{3}+1".to_string(),
        }));
        let book = book_with(vec![StructuralElement::TableOfContents(toc), eq.into()]);
        let result = sanitize(&book);

        let locations: Vec<_> = result.warnings.iter().map(|w| w.location.as_str()).collect();
        assert_eq!(
            locations,
            vec!["body[0].toc.content[0].runs[0].text", "body[1].runs[0].equation"]
        );
    }

    #[test]
    fn test_empty_image_url() {
        let book = Book::new("b", "Title").with_image(Image::new("obj-7", ""));
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].location, "images[obj-7].url");
        assert_eq!(result.warnings[0].issue, Issue::EmptyImageUrl);
        assert_eq!(result.warnings[0].fixed, "");
    }

    #[test]
    fn test_untitled_book_with_one_blank_chapter() {
        let tree = ChapterTree::from_nodes(vec![
            ChapterNode::new("c1", "Good"),
            ChapterNode::new("c2", "   "),
        ]);
        let book = Book {
            chapters: tree,
            ..Default::default()
        };
        let result = sanitize(&book);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].location, "chapters[1].title");
        assert_eq!(result.book.title, "");
    }

    #[test]
    fn test_blank_book_title_is_only_cleaned() {
        let result = sanitize(&Book::new("b", " \t "));
        assert!(result.warnings.is_empty());
        assert_eq!(result.book.title, "");
    }

    #[test]
    fn test_warning_order_follows_traversal() {
        let tree = ChapterTree::from_nodes(vec![ChapterNode::new("c1", "")]);
        let book = Book::new("b", "")
            .with_chapters(tree)
            .with_body(Body::new(vec![Paragraph::new().with_text("\u{0}x").into()]))
            .with_image(Image::new("img", ""));
        let issues: Vec<_> = sanitize(&book).warnings.iter().map(|w| w.issue).collect();
        assert_eq!(
            issues,
            vec![
                Issue::EmptyChapterTitle,
                Issue::TextSanitized,
                Issue::EmptyImageUrl,
            ]
        );
    }

    #[test]
    fn test_sanitize_option_none() {
        let (book, warnings) = sanitize_option(None);
        assert!(book.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_sanitize_is_idempotent_on_output() {
        let book = book_with(vec![
            Paragraph::heading(1).with_text("").into(),
            Paragraph::new()
                .with_run(TextRun::plain(" a\u{0} ").with_link(Link::external(" https://x.org ")))
                .into(),
        ]);
        let once = sanitize(&book);
        let twice = sanitize(&once.book);
        assert!(twice.warnings.is_empty());
        assert_eq!(twice.book, once.book);
    }
}
