//! Event stream properties over generated books.

use proptest::prelude::*;

use folio::model::{
    Body, Book, ContentRun, Image, InlineObject, Link, ListMembership, Paragraph, SectionBreak,
    StructuralElement, Table, TableCell, TableOfContents, TableRow, TextRun, TextStyle,
};
use folio::stream::{Event, EventKind, stream, validate_balance};
use folio::writer::Format;
use folio::{RenderConfig, render_formats, sanitize};

fn arb_run() -> impl Strategy<Value = ContentRun> {
    prop_oneof![
        6 => ("[a-z \\t]{0,8}", any::<bool>(), any::<bool>()).prop_map(|(text, bold, link)| {
            let style = if bold { TextStyle::bold() } else { TextStyle::default() };
            let run = TextRun::styled(text, style);
            if link {
                run.with_link(Link::external("https://example.com")).into()
            } else {
                run.into()
            }
        }),
        1 => Just(ContentRun::PageBreak),
        1 => Just(ContentRun::HorizontalRule),
        1 => prop::sample::select(vec!["img", "gone"]).prop_map(|id| {
            ContentRun::InlineObject(InlineObject {
                object_id: id.to_string(),
            })
        }),
    ]
}

fn arb_paragraph() -> impl Strategy<Value = StructuralElement> {
    (
        prop::collection::vec(arb_run(), 0..5),
        0u8..4,
        prop::option::of((0u8..2, 0u8..3, any::<bool>())),
    )
        .prop_map(|(runs, heading, list)| {
            let mut paragraph = if heading > 0 {
                Paragraph::heading(heading)
            } else {
                Paragraph::new()
            };
            for run in runs {
                paragraph = paragraph.with_run(run);
            }
            if let Some((id, level, numbered)) = list {
                let membership = ListMembership::new(format!("list-{id}"), level);
                paragraph = paragraph.in_list(if numbered {
                    membership.numbered()
                } else {
                    membership
                });
            }
            paragraph.into()
        })
}

fn table_of(rows: Vec<Vec<Vec<StructuralElement>>>) -> StructuralElement {
    Table {
        rows: rows
            .into_iter()
            .map(|cells| TableRow {
                cells: cells
                    .into_iter()
                    .map(|content| TableCell { content })
                    .collect(),
            })
            .collect(),
    }
    .into()
}

fn arb_elements() -> impl Strategy<Value = Vec<StructuralElement>> {
    let leaf = prop::collection::vec(arb_paragraph(), 0..4);
    leaf.prop_recursive(3, 48, 6, |inner| {
        prop::collection::vec(
            prop_oneof![
                4 => arb_paragraph(),
                1 => prop::collection::vec(prop::collection::vec(inner.clone(), 1..3), 1..3)
                    .prop_map(table_of),
                1 => inner.prop_map(|content| {
                    StructuralElement::TableOfContents(TableOfContents { content })
                }),
                1 => Just(StructuralElement::SectionBreak(SectionBreak::default())),
            ],
            0..6,
        )
    })
}

fn arb_book() -> impl Strategy<Value = Book> {
    (prop::option::of(arb_elements()), "[A-Za-z ]{0,10}").prop_map(|(content, title)| {
        let book = Book::new("generated", title).with_image(Image::new("img", "pics/img.png"));
        match content {
            Some(content) => book.with_body(Body::new(content)),
            None => book,
        }
    })
}

proptest! {
    #[test]
    fn stream_is_balanced(book in arb_book()) {
        let events: Vec<_> = stream(&book).collect();
        prop_assert!(validate_balance(events.iter().cloned()).is_ok());
        prop_assert_eq!(events.first().map(Event::kind), Some(EventKind::StartDocument));
        prop_assert_eq!(events.last().map(Event::kind), Some(EventKind::EndDocument));

        let mut depth: i64 = 0;
        for event in &events {
            let kind = event.kind();
            if kind.is_start() {
                depth += 1;
            } else if kind.is_end() {
                depth -= 1;
            }
            prop_assert!(depth >= 0);
        }
        prop_assert_eq!(depth, 0);
    }

    #[test]
    fn formatting_wraps_only_text(book in arb_book()) {
        let mut open = false;
        for event in stream(&book) {
            match event.kind() {
                EventKind::StartFormatting => {
                    prop_assert!(!open);
                    open = true;
                }
                EventKind::EndFormatting => {
                    prop_assert!(open);
                    open = false;
                }
                EventKind::Text => prop_assert!(open),
                _ => prop_assert!(!open),
            }
        }
    }

    #[test]
    fn sanitized_headings_have_text(book in arb_book()) {
        let cleaned = sanitize(&book).book;
        for event in stream(&cleaned) {
            if let Event::StartHeading(heading) = event {
                prop_assert!(!heading.text.trim().is_empty());
            }
        }
    }

    #[test]
    fn every_writer_accepts_every_book(book in arb_book()) {
        let rendering = render_formats(&book, &Format::ALL, &RenderConfig::default());
        prop_assert!(rendering.outputs.is_complete());
    }
}

#[test]
fn test_missing_body_streams_document_only() {
    let book = Book::new("b", "Title");
    let kinds: Vec<_> = stream(&book).map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EventKind::StartDocument, EventKind::EndDocument]);
}

#[test]
fn test_dropping_a_stream_early_leaves_later_streams_intact() {
    let book = Book::new("b", "Title").with_body(Body::new(vec![
        Paragraph::new().with_text("one").into(),
        Paragraph::new().with_text("two").into(),
    ]));

    let mut partial = stream(&book);
    partial.next();
    partial.next();
    drop(partial);

    let full: Vec<_> = stream(&book).collect();
    assert_eq!(full.len(), 12);
    assert!(validate_balance(full).is_ok());
}

#[test]
fn test_heading_events_survive_sanitizing() {
    let book = Book::new("b", "Title")
        .with_body(Body::new(vec![Paragraph::heading(1).with_text(" \t ").into()]));
    let result = sanitize(&book);
    assert_eq!(result.warnings.len(), 1);

    let headings: Vec<_> = stream(&result.book)
        .filter_map(|event| match event {
            Event::StartHeading(heading) => Some((heading.level, heading.text.into_owned())),
            _ => None,
        })
        .collect();
    assert_eq!(headings, vec![(1, folio::sanitize::HEADING_PLACEHOLDER.to_string())]);
}
