use std::borrow::Cow;

use crate::model::{FootnoteReference, Image, Link, ListKind, TextStyle};

/// A rendering event.
///
/// Events borrow from the book being streamed; only heading text, which is
/// concatenated from several runs, may be owned.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    StartDocument(DocumentInfo<'a>),
    EndDocument,
    StartParagraph,
    EndParagraph,
    StartHeading(Heading<'a>),
    EndHeading(u8),
    StartList(ListInfo<'a>),
    EndList(ListInfo<'a>),
    StartTable,
    EndTable,
    StartTableRow,
    EndTableRow,
    StartTableCell,
    EndTableCell,
    StartFormatting(Formatting<'a>),
    EndFormatting,
    Text(&'a str),
    Image(ImageRef<'a>),
    PageBreak,
    ColumnBreak,
    FootnoteReference(&'a FootnoteReference),
    HorizontalRule,
    Equation(&'a str),
}

/// Book metadata carried by [`Event::StartDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentInfo<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading<'a> {
    /// 1..=6
    pub level: u8,
    /// Concatenated text of the heading's runs.
    pub text: Cow<'a, str>,
}

/// Identity of one open list level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListInfo<'a> {
    pub id: &'a str,
    pub level: u8,
    pub kind: ListKind,
}

/// Style and link shared by a group of adjacent text runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatting<'a> {
    pub style: &'a TextStyle,
    pub link: Option<&'a Link>,
}

/// An inline image and its entry in the image index, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub object_id: &'a str,
    pub image: Option<&'a Image>,
}

impl ImageRef<'_> {
    /// The image URL, if the reference resolved to an image with a URL.
    pub fn url(&self) -> Option<&str> {
        self.image
            .map(|image| image.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Payload-free discriminant of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartDocument,
    EndDocument,
    StartParagraph,
    EndParagraph,
    StartHeading,
    EndHeading,
    StartList,
    EndList,
    StartTable,
    EndTable,
    StartTableRow,
    EndTableRow,
    StartTableCell,
    EndTableCell,
    StartFormatting,
    EndFormatting,
    Text,
    Image,
    PageBreak,
    ColumnBreak,
    FootnoteReference,
    HorizontalRule,
    Equation,
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StartDocument(_) => EventKind::StartDocument,
            Event::EndDocument => EventKind::EndDocument,
            Event::StartParagraph => EventKind::StartParagraph,
            Event::EndParagraph => EventKind::EndParagraph,
            Event::StartHeading(_) => EventKind::StartHeading,
            Event::EndHeading(_) => EventKind::EndHeading,
            Event::StartList(_) => EventKind::StartList,
            Event::EndList(_) => EventKind::EndList,
            Event::StartTable => EventKind::StartTable,
            Event::EndTable => EventKind::EndTable,
            Event::StartTableRow => EventKind::StartTableRow,
            Event::EndTableRow => EventKind::EndTableRow,
            Event::StartTableCell => EventKind::StartTableCell,
            Event::EndTableCell => EventKind::EndTableCell,
            Event::StartFormatting(_) => EventKind::StartFormatting,
            Event::EndFormatting => EventKind::EndFormatting,
            Event::Text(_) => EventKind::Text,
            Event::Image(_) => EventKind::Image,
            Event::PageBreak => EventKind::PageBreak,
            Event::ColumnBreak => EventKind::ColumnBreak,
            Event::FootnoteReference(_) => EventKind::FootnoteReference,
            Event::HorizontalRule => EventKind::HorizontalRule,
            Event::Equation(_) => EventKind::Equation,
        }
    }
}

impl EventKind {
    pub fn is_start(self) -> bool {
        matches!(
            self,
            EventKind::StartDocument
                | EventKind::StartParagraph
                | EventKind::StartHeading
                | EventKind::StartList
                | EventKind::StartTable
                | EventKind::StartTableRow
                | EventKind::StartTableCell
                | EventKind::StartFormatting
        )
    }

    pub fn is_end(self) -> bool {
        self.pair().is_some() && !self.is_start()
    }

    pub fn is_atomic(self) -> bool {
        self.pair().is_none()
    }

    /// The matching End for a Start, or Start for an End.
    pub fn pair(self) -> Option<EventKind> {
        use EventKind::*;
        let paired = match self {
            StartDocument => EndDocument,
            EndDocument => StartDocument,
            StartParagraph => EndParagraph,
            EndParagraph => StartParagraph,
            StartHeading => EndHeading,
            EndHeading => StartHeading,
            StartList => EndList,
            EndList => StartList,
            StartTable => EndTable,
            EndTable => StartTable,
            StartTableRow => EndTableRow,
            EndTableRow => StartTableRow,
            StartTableCell => EndTableCell,
            EndTableCell => StartTableCell,
            StartFormatting => EndFormatting,
            EndFormatting => StartFormatting,
            Text | Image | PageBreak | ColumnBreak | FootnoteReference | HorizontalRule
            | Equation => return None,
        };
        Some(paired)
    }
}
