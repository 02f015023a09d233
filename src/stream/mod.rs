//! Event streaming.
//!
//! [`stream`] walks a book's body and yields a flat sequence of [`Event`]s:
//! paired Start/End events for containers, atomic events for leaves. The walk
//! is lazy. Each call to `next` advances by at most one model node, using an
//! explicit frame stack instead of recursion, so deeply nested tables do not
//! grow the call stack.
//!
//! ```
//! use folio::model::{Body, Book, Paragraph};
//! use folio::stream::{stream, EventKind};
//!
//! let book = Book::new("b", "Title")
//!     .with_body(Body::new(vec![Paragraph::new().with_text("Hello").into()]));
//! let kinds: Vec<_> = stream(&book).map(|e| e.kind()).collect();
//!
//! assert_eq!(kinds, vec![
//!     EventKind::StartDocument,
//!     EventKind::StartParagraph,
//!     EventKind::StartFormatting,
//!     EventKind::Text,
//!     EventKind::EndFormatting,
//!     EventKind::EndParagraph,
//!     EventKind::EndDocument,
//! ]);
//! ```

mod balance;
mod event;

pub use balance::{BalanceError, Nesting, validate_balance};
pub use event::{DocumentInfo, Event, EventKind, Formatting, Heading, ImageRef, ListInfo};

use std::collections::VecDeque;
use std::slice;

use crate::model::{Book, ContentRun, StructuralElement, TableCell, TableRow};

/// Stream the events of `book`.
pub fn stream(book: &Book) -> EventStream<'_> {
    EventStream::new(book)
}

/// Lazy event iterator over a borrowed book.
pub struct EventStream<'a> {
    book: &'a Book,
    state: State,
    frames: Vec<Frame<'a>>,
    /// Events produced by the last step, not yet yielded.
    pending: VecDeque<Event<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Walking,
    Done,
}

/// One level of the walk.
struct Frame<'a> {
    cursor: Cursor<'a>,
    /// Event emitted when the cursor is exhausted.
    close: Option<Event<'a>>,
}

enum Cursor<'a> {
    /// Element sequence (body, table cell, or table of contents) with its
    /// own stack of open lists.
    Elements {
        items: slice::Iter<'a, StructuralElement>,
        lists: Vec<ListInfo<'a>>,
    },
    /// Runs of one paragraph and the formatting wrapper currently open.
    Runs {
        runs: slice::Iter<'a, ContentRun>,
        open: Option<Formatting<'a>>,
    },
    Rows(slice::Iter<'a, TableRow>),
    Cells(slice::Iter<'a, TableCell>),
}

impl<'a> EventStream<'a> {
    pub fn new(book: &'a Book) -> Self {
        Self {
            book,
            state: State::Start,
            frames: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    fn start(&mut self) -> Event<'a> {
        self.state = State::Walking;
        if let Some(body) = &self.book.body {
            self.frames.push(Frame {
                cursor: Cursor::Elements {
                    items: body.content.iter(),
                    lists: Vec::new(),
                },
                close: None,
            });
        }
        Event::StartDocument(DocumentInfo {
            id: &self.book.id,
            title: &self.book.title,
            description: &self.book.description,
        })
    }

    /// Advance the walk by one node, queueing whatever it produces.
    fn step(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            self.pending.push_back(Event::EndDocument);
            self.state = State::Done;
            return;
        };

        let pending = &mut self.pending;
        let step = match &mut frame.cursor {
            Cursor::Elements { items, lists } => match items.next() {
                Some(element) => open_element(element, lists, pending),
                None => {
                    close_lists(lists, pending);
                    Step::Pop
                }
            },
            Cursor::Runs { runs, open } => match runs.next() {
                Some(run) => {
                    emit_run(self.book, run, open, pending);
                    Step::Stay
                }
                None => {
                    if open.take().is_some() {
                        pending.push_back(Event::EndFormatting);
                    }
                    Step::Pop
                }
            },
            Cursor::Rows(rows) => match rows.next() {
                Some(row) => {
                    pending.push_back(Event::StartTableRow);
                    Step::Push(Frame {
                        cursor: Cursor::Cells(row.cells.iter()),
                        close: Some(Event::EndTableRow),
                    })
                }
                None => Step::Pop,
            },
            Cursor::Cells(cells) => match cells.next() {
                Some(cell) => {
                    pending.push_back(Event::StartTableCell);
                    Step::Push(Frame {
                        cursor: Cursor::Elements {
                            items: cell.content.iter(),
                            lists: Vec::new(),
                        },
                        close: Some(Event::EndTableCell),
                    })
                }
                None => Step::Pop,
            },
        };

        match step {
            Step::Push(child) => self.frames.push(child),
            Step::Pop => {
                if let Some(mut frame) = self.frames.pop()
                    && let Some(close) = frame.close.take()
                {
                    self.pending.push_back(close);
                }
            }
            Step::Stay => {}
        }
    }
}

/// What the walk does with the frame stack after one step.
enum Step<'a> {
    Push(Frame<'a>),
    Pop,
    Stay,
}

/// Queue the events that open `element` and return the frame for its
/// contents.
fn open_element<'a>(
    element: &'a StructuralElement,
    lists: &mut Vec<ListInfo<'a>>,
    pending: &mut VecDeque<Event<'a>>,
) -> Step<'a> {
    match element {
        StructuralElement::Paragraph(p) => {
            match &p.list {
                Some(membership) => {
                    let info = ListInfo {
                        id: &membership.list_id,
                        level: membership.nesting_level,
                        kind: membership.kind,
                    };
                    enter_list(info, lists, pending);
                }
                None => close_lists(lists, pending),
            }

            let close = match p.style.heading_level() {
                Some(level) => {
                    pending.push_back(Event::StartHeading(Heading {
                        level,
                        text: p.text(),
                    }));
                    Event::EndHeading(level)
                }
                None => {
                    pending.push_back(Event::StartParagraph);
                    Event::EndParagraph
                }
            };
            Step::Push(Frame {
                cursor: Cursor::Runs {
                    runs: p.runs.iter(),
                    open: None,
                },
                close: Some(close),
            })
        }
        StructuralElement::Table(table) => {
            close_lists(lists, pending);
            pending.push_back(Event::StartTable);
            Step::Push(Frame {
                cursor: Cursor::Rows(table.rows.iter()),
                close: Some(Event::EndTable),
            })
        }
        StructuralElement::TableOfContents(toc) => {
            close_lists(lists, pending);
            Step::Push(Frame {
                cursor: Cursor::Elements {
                    items: toc.content.iter(),
                    lists: Vec::new(),
                },
                close: None,
            })
        }
        StructuralElement::SectionBreak(_) => Step::Stay,
    }
}

/// Adjust the open lists for a list paragraph at `info`.
///
/// Lists with a different id or a deeper level are closed; a new list is
/// opened unless the innermost one already matches.
fn enter_list<'a>(
    info: ListInfo<'a>,
    lists: &mut Vec<ListInfo<'a>>,
    pending: &mut VecDeque<Event<'a>>,
) {
    while let Some(top) = lists.last()
        && (top.id != info.id || top.level > info.level)
    {
        if let Some(closed) = lists.pop() {
            pending.push_back(Event::EndList(closed));
        }
    }

    let already_open = lists
        .last()
        .is_some_and(|top| top.id == info.id && top.level == info.level);
    if !already_open {
        pending.push_back(Event::StartList(info));
        lists.push(info);
    }
}

fn close_lists<'a>(lists: &mut Vec<ListInfo<'a>>, pending: &mut VecDeque<Event<'a>>) {
    while let Some(closed) = lists.pop() {
        pending.push_back(Event::EndList(closed));
    }
}

/// Queue the events for one content run.
///
/// Consecutive text runs with equal style and link share a formatting
/// wrapper. Any other run closes the wrapper before its own event.
fn emit_run<'a>(
    book: &'a Book,
    run: &'a ContentRun,
    open: &mut Option<Formatting<'a>>,
    pending: &mut VecDeque<Event<'a>>,
) {
    if let ContentRun::Text(text_run) = run {
        if text_run.text.is_empty() {
            return;
        }
        let formatting = Formatting {
            style: &text_run.style,
            link: text_run.link.as_ref(),
        };
        if open.as_ref() != Some(&formatting) {
            if open.take().is_some() {
                pending.push_back(Event::EndFormatting);
            }
            pending.push_back(Event::StartFormatting(formatting));
            *open = Some(formatting);
        }
        pending.push_back(Event::Text(&text_run.text));
        return;
    }

    if open.take().is_some() {
        pending.push_back(Event::EndFormatting);
    }
    let event = match run {
        ContentRun::InlineObject(object) => Event::Image(ImageRef {
            object_id: &object.object_id,
            image: book.resolve_image(&object.object_id),
        }),
        ContentRun::PageBreak => Event::PageBreak,
        ContentRun::ColumnBreak => Event::ColumnBreak,
        ContentRun::FootnoteReference(footnote) => Event::FootnoteReference(footnote),
        ContentRun::HorizontalRule => Event::HorizontalRule,
        ContentRun::Equation(eq) => Event::Equation(&eq.content),
        ContentRun::Text(_) => return,
    };
    pending.push_back(event);
}

impl<'a> Iterator for EventStream<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.state {
                State::Start => return Some(self.start()),
                State::Walking => self.step(),
                State::Done => return None,
            }
        }
    }
}
