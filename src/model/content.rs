//! Document body: structural elements, paragraphs and content runs.

use std::borrow::Cow;

/// Named-style prefix marking a heading paragraph (`HEADING_1` … `HEADING_6`).
pub const HEADING_PREFIX: &str = "HEADING_";

/// Ordered sequence of structural elements.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Body {
    pub content: Vec<StructuralElement>,
}

impl Body {
    pub fn new(content: Vec<StructuralElement>) -> Self {
        Self { content }
    }
}

/// Block-level element of a body, table cell or table of contents.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum StructuralElement {
    Paragraph(Paragraph),
    Table(Table),
    SectionBreak(SectionBreak),
    TableOfContents(TableOfContents),
}

/// Section boundary. Carries no renderable content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SectionBreak {
    pub section_type: Option<String>,
}

/// Generated table of contents; its entries are ordinary elements.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableOfContents {
    pub content: Vec<StructuralElement>,
}

/// A paragraph of inline runs.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Paragraph {
    pub runs: Vec<ContentRun>,
    pub style: ParagraphStyle,
    /// List membership, if this paragraph is a list item.
    pub list: Option<ListMembership>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `HEADING_<level>` paragraph.
    pub fn heading(level: u8) -> Self {
        Self {
            style: ParagraphStyle::heading(level),
            ..Default::default()
        }
    }

    pub fn with_run(mut self, run: impl Into<ContentRun>) -> Self {
        self.runs.push(run.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_run(TextRun::plain(text))
    }

    pub fn in_list(mut self, list: ListMembership) -> Self {
        self.list = Some(list);
        self
    }

    pub fn is_heading(&self) -> bool {
        self.style.is_heading()
    }

    /// Concatenated text of all text runs.
    pub fn text(&self) -> Cow<'_, str> {
        let mut texts = self.runs.iter().filter_map(|run| match run {
            ContentRun::Text(t) => Some(t.text.as_str()),
            _ => None,
        });
        let Some(first) = texts.next() else {
            return Cow::Borrowed("");
        };
        match texts.next() {
            None => Cow::Borrowed(first),
            Some(second) => {
                let mut out = String::from(first);
                out.push_str(second);
                texts.for_each(|t| out.push_str(t));
                Cow::Owned(out)
            }
        }
    }
}

impl From<Paragraph> for StructuralElement {
    fn from(p: Paragraph) -> Self {
        StructuralElement::Paragraph(p)
    }
}

/// Paragraph-level style tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParagraphStyle {
    /// Named style such as `NORMAL_TEXT`, `TITLE` or `HEADING_2`.
    pub named_style: String,
}

impl ParagraphStyle {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            named_style: name.into(),
        }
    }

    pub fn heading(level: u8) -> Self {
        Self::named(format!("{HEADING_PREFIX}{level}"))
    }

    pub fn is_heading(&self) -> bool {
        self.named_style.starts_with(HEADING_PREFIX)
    }

    /// Heading level from the style's numeric suffix.
    ///
    /// Levels are clamped to 1..=6; a heading style with a missing or
    /// unparsable suffix is treated as level 1.
    pub fn heading_level(&self) -> Option<u8> {
        let suffix = self.named_style.strip_prefix(HEADING_PREFIX)?;
        let level = suffix.parse::<u32>().unwrap_or(1).clamp(1, 6);
        Some(level as u8)
    }
}

/// List membership of a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ListMembership {
    pub list_id: String,
    pub nesting_level: u8,
    pub kind: ListKind,
}

impl ListMembership {
    pub fn new(list_id: impl Into<String>, nesting_level: u8) -> Self {
        Self {
            list_id: list_id.into(),
            nesting_level,
            kind: ListKind::Bullet,
        }
    }

    pub fn numbered(mut self) -> Self {
        self.kind = ListKind::Numbered;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ListKind {
    #[default]
    Bullet,
    Numbered,
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum ContentRun {
    Text(TextRun),
    InlineObject(InlineObject),
    PageBreak,
    ColumnBreak,
    FootnoteReference(FootnoteReference),
    HorizontalRule,
    Equation(Equation),
}

impl From<TextRun> for ContentRun {
    fn from(run: TextRun) -> Self {
        ContentRun::Text(run)
    }
}

/// Literal text with styling and an optional link.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
    pub link: Option<Link>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            link: None,
        }
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.link = Some(link);
        self
    }
}

/// Character-level style record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub small_caps: bool,
    pub baseline: BaselineOffset,
    pub font_family: Option<String>,
    /// Foreground color as `#rrggbb`.
    pub color: Option<String>,
}

impl TextStyle {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Default::default()
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BaselineOffset {
    #[default]
    None,
    Superscript,
    Subscript,
}

/// Hyperlink: an external URL and/or an internal target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Link {
    pub url: String,
    pub target: Option<LinkTarget>,
}

/// Internal link destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkTarget {
    Bookmark(String),
    Heading(String),
}

impl Link {
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target: None,
        }
    }

    pub fn bookmark(id: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            target: Some(LinkTarget::Bookmark(id.into())),
        }
    }

    pub fn heading(id: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            target: Some(LinkTarget::Heading(id.into())),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.url.is_empty() && self.target.is_some()
    }

    /// The href a renderer should emit: the URL, or `#id` for internal links.
    pub fn href(&self) -> Cow<'_, str> {
        match (&self.target, self.url.is_empty()) {
            (Some(LinkTarget::Bookmark(id) | LinkTarget::Heading(id)), true) => {
                Cow::Owned(format!("#{id}"))
            }
            _ => Cow::Borrowed(&self.url),
        }
    }
}

/// Reference to an entry of the book's image index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InlineObject {
    pub object_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FootnoteReference {
    pub footnote_id: String,
    /// Display number, e.g. `"3"`.
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Equation {
    /// Equation source (linear form).
    pub content: String,
}

/// Table of rows of cells; each cell holds nested elements.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableCell {
    pub content: Vec<StructuralElement>,
}

impl Table {
    /// Build a table of single-paragraph cells from plain strings.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| TableRow {
                    cells: row
                        .into_iter()
                        .map(|text| TableCell {
                            content: vec![Paragraph::new().with_text(text).into()],
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Widest row's cell count.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

impl From<Table> for StructuralElement {
    fn from(t: Table) -> Self {
        StructuralElement::Table(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_parsing() {
        assert_eq!(ParagraphStyle::heading(2).heading_level(), Some(2));
        assert_eq!(ParagraphStyle::named("HEADING_9").heading_level(), Some(6));
        assert_eq!(ParagraphStyle::named("HEADING_").heading_level(), Some(1));
        assert_eq!(ParagraphStyle::named("NORMAL_TEXT").heading_level(), None);
        assert_eq!(ParagraphStyle::named("TITLE").heading_level(), None);
    }

    #[test]
    fn test_paragraph_text_concatenates_runs() {
        let p = Paragraph::new()
            .with_text("Hello, ")
            .with_run(ContentRun::PageBreak)
            .with_run(TextRun::styled("World", TextStyle::bold()));
        assert_eq!(p.text(), "Hello, World");

        let single = Paragraph::new().with_text("Only");
        assert!(matches!(single.text(), Cow::Borrowed("Only")));
        assert_eq!(Paragraph::new().text(), "");
    }

    #[test]
    fn test_link_href() {
        assert_eq!(Link::external("https://x.org").href(), "https://x.org");
        assert_eq!(Link::heading("h.abc").href(), "#h.abc");
        assert!(Link::bookmark("b1").is_internal());
        assert!(!Link::external("https://x.org").is_internal());
    }

    #[test]
    fn test_table_from_rows() {
        let table = Table::from_rows([vec!["a", "b"], vec!["c"]]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column_count(), 2);
    }
}
