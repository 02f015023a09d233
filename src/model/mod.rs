//! Core data model for books.
//!
//! This module contains:
//! - Book metadata and the image index
//! - The chapter tree (flat arena with parent back-links)
//! - The document body: structural elements, paragraphs and content runs
//!
//! The closed content variants ([`StructuralElement`], [`ContentRun`]) are
//! enums so that every consumer matches them exhaustively.

mod book;
mod chapter;
mod content;

pub use book::{Book, Image};

pub use chapter::{
    Chapter, ChapterFlags, ChapterId, ChapterNode, ChapterTree, DfsIter, LocatedDfsIter,
};

pub use content::{
    BaselineOffset, Body, ContentRun, Equation, FootnoteReference, HEADING_PREFIX, InlineObject,
    Link, LinkTarget, ListKind, ListMembership, Paragraph, ParagraphStyle, SectionBreak,
    StructuralElement, Table, TableCell, TableOfContents, TableRow, TextRun, TextStyle,
};
