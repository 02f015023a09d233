//! Markdown writer.
//!
//! Emits CommonMark with a few widely supported extensions: pipe tables,
//! `~~strikethrough~~`, `[^n]` footnote references and `$..$` math.
//! Underline, superscript and subscript fall back to inline HTML.

use std::fmt::Write as _;

use crate::config::MarkdownConfig;
use crate::error::Result;
use crate::model::{BaselineOffset, ListKind};
use crate::stream::{DocumentInfo, Event, Formatting, ImageRef, Nesting};

use super::escape::{escape_markdown, single_line};
use super::{Format, FormatWriter, Output};

/// Tracks list context for numbering and indentation.
#[derive(Debug, Clone)]
struct ListContext {
    is_ordered: bool,
    /// Current item counter.
    counter: usize,
}

impl ListContext {
    /// Width of this list's item marker, which nested content is indented by.
    fn marker_width(&self) -> usize {
        if self.is_ordered {
            self.counter.max(1).to_string().len() + 2
        } else {
            2
        }
    }
}

/// A formatting span being collected.
///
/// Markdown emphasis must hug its text, so the text is buffered until the
/// span ends and surrounding whitespace is moved outside the markers.
#[derive(Debug)]
struct Span {
    open: String,
    close: String,
    text: String,
}

/// Table being collected; cells are rendered once the column count is known.
#[derive(Debug, Default)]
struct TableBuffer {
    rows: Vec<Vec<String>>,
    /// Depth of tables nested inside the current cell; they are flattened.
    nested: usize,
}

/// Markdown format writer.
pub struct MarkdownWriter {
    config: MarkdownConfig,
    nesting: Nesting,
    output: String,
    list_stack: Vec<ListContext>,
    table: Option<TableBuffer>,
    span: Option<Span>,
    /// A `#` line is open; text must not break it.
    in_heading: bool,
}

impl MarkdownWriter {
    pub fn new(config: MarkdownConfig) -> Self {
        Self {
            config,
            nesting: Nesting::new(),
            output: String::new(),
            list_stack: Vec::new(),
            table: None,
            span: None,
            in_heading: false,
        }
    }

    /// Where block-level text currently goes: the open table cell, or the
    /// document.
    fn sink(&mut self) -> &mut String {
        if let Some(cell) = self
            .table
            .as_mut()
            .and_then(|table| table.rows.last_mut())
            .and_then(|row| row.last_mut())
        {
            return cell;
        }
        &mut self.output
    }

    fn push_inline(&mut self, text: &str) {
        match self.span.as_mut() {
            Some(span) => span.text.push_str(text),
            None => self.sink().push_str(text),
        }
    }

    fn in_table(&self) -> bool {
        self.table.is_some()
    }

    /// Make sure the output ends with a blank line (no-op at the start).
    fn ensure_blank_line(&mut self) {
        if self.output.is_empty() || self.output.ends_with("\n\n") {
            return;
        }
        if self.output.ends_with('\n') {
            self.output.push('\n');
        } else {
            self.output.push_str("\n\n");
        }
    }

    fn ensure_line_start(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
    }

    fn write_front_matter(&mut self, info: &DocumentInfo<'_>) {
        self.output.push_str("---\n");
        let _ = writeln!(self.output, "title: {}", yaml_quote(info.title));
        if !info.description.is_empty() {
            let _ = writeln!(self.output, "description: {}", yaml_quote(info.description));
        }
        self.output.push_str("---\n");
    }

    fn start_paragraph(&mut self) {
        if self.in_table() {
            separate_words(self.sink());
            return;
        }

        if self.list_stack.is_empty() {
            self.ensure_blank_line();
        } else {
            self.start_list_item();
        }
    }

    /// Write the marker of the next item in the innermost list.
    fn start_list_item(&mut self) {
        let Some(list) = self.list_stack.last_mut() else {
            return;
        };
        list.counter += 1;
        let marker = if list.is_ordered {
            format!("{}. ", list.counter)
        } else {
            "- ".to_string()
        };
        let depth = self.list_stack.len() - 1;
        let indent: usize = self.list_stack[..depth]
            .iter()
            .map(ListContext::marker_width)
            .sum();

        self.ensure_line_start();
        self.output.push_str(&" ".repeat(indent));
        self.output.push_str(&marker);
    }

    fn end_paragraph(&mut self) {
        if !self.in_table() {
            self.ensure_line_start();
        }
    }

    fn start_heading(&mut self, level: u8) {
        self.start_paragraph();
        if self.in_table() {
            return;
        }
        self.in_heading = true;
        self.output.push_str(&"#".repeat(level as usize));
        self.output.push(' ');
    }

    fn start_list(&mut self, kind: ListKind) {
        if !self.in_table() && self.list_stack.is_empty() {
            self.ensure_blank_line();
        }
        self.list_stack.push(ListContext {
            is_ordered: kind == ListKind::Numbered,
            counter: 0,
        });
    }

    fn start_table(&mut self) {
        match self.table.as_mut() {
            Some(table) => table.nested += 1,
            None => {
                self.ensure_blank_line();
                self.table = Some(TableBuffer::default());
            }
        }
    }

    fn end_table(&mut self) {
        if let Some(table) = self.table.as_mut()
            && table.nested > 0
        {
            table.nested -= 1;
            return;
        }
        if let Some(table) = self.table.take() {
            self.output.push_str(&render_table(&table.rows));
        }
    }

    fn start_row(&mut self) {
        if let Some(table) = self.table.as_mut()
            && table.nested == 0
        {
            table.rows.push(Vec::new());
        }
    }

    fn start_cell(&mut self) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        if table.nested == 0 {
            if let Some(row) = table.rows.last_mut() {
                row.push(String::new());
            }
        } else if let Some(cell) = table.rows.last_mut().and_then(|row| row.last_mut()) {
            separate_words(cell);
        }
    }

    fn start_formatting(&mut self, formatting: &Formatting<'_>) {
        let (open, close) = markers(formatting);
        self.span = Some(Span {
            open,
            close,
            text: String::new(),
        });
    }

    fn end_formatting(&mut self) {
        let Some(span) = self.span.take() else {
            return;
        };
        let trimmed = span.text.trim();
        if trimmed.is_empty() {
            self.push_inline(&span.text);
            return;
        }
        let leading = &span.text[..span.text.len() - span.text.trim_start().len()];
        let trailing = &span.text[span.text.trim_end().len()..];

        let mut rendered = String::with_capacity(span.text.len() + span.open.len() + span.close.len());
        rendered.push_str(leading);
        rendered.push_str(&span.open);
        rendered.push_str(trimmed);
        rendered.push_str(&span.close);
        rendered.push_str(trailing);
        self.push_inline(&rendered);
    }

    fn write_image(&mut self, image: &ImageRef<'_>) {
        let rendered = match image.url() {
            Some(url) => format!("![]({})", escape_url(url)),
            None => "![missing image](#)".to_string(),
        };
        self.push_inline(&rendered);
    }

    fn write_rule(&mut self) {
        if self.in_table() {
            self.push_inline(" ");
            return;
        }
        self.ensure_blank_line();
        self.output.push_str("---\n\n");
    }

    fn write_break(&mut self) {
        if self.in_table() || !self.list_stack.is_empty() {
            self.push_inline(" ");
            return;
        }
        self.ensure_blank_line();
    }
}

impl FormatWriter for MarkdownWriter {
    fn format(&self) -> Format {
        Format::Markdown
    }

    fn handle(&mut self, event: &Event<'_>) -> Result<()> {
        self.nesting.observe(event.kind())?;

        match event {
            Event::StartDocument(info) => {
                if self.config.front_matter {
                    self.write_front_matter(info);
                }
            }
            Event::EndDocument => {}
            Event::StartParagraph => self.start_paragraph(),
            Event::EndParagraph => self.end_paragraph(),
            Event::EndHeading(_) => {
                self.in_heading = false;
                self.end_paragraph();
            }
            Event::StartHeading(heading) => self.start_heading(heading.level),
            Event::StartList(info) => self.start_list(info.kind),
            Event::EndList(_) => {
                self.list_stack.pop();
            }
            Event::StartTable => self.start_table(),
            Event::EndTable => self.end_table(),
            Event::StartTableRow => self.start_row(),
            Event::EndTableRow | Event::EndTableCell => {}
            Event::StartTableCell => self.start_cell(),
            Event::StartFormatting(formatting) => self.start_formatting(formatting),
            Event::EndFormatting => self.end_formatting(),
            Event::Text(text) if self.in_heading => {
                self.push_inline(&escape_markdown(&single_line(text)));
            }
            Event::Text(text) => self.push_inline(&escape_markdown(text)),
            Event::Image(image) => self.write_image(image),
            Event::PageBreak | Event::ColumnBreak => self.write_break(),
            Event::FootnoteReference(footnote) => {
                let label = if footnote.number.is_empty() {
                    &footnote.footnote_id
                } else {
                    &footnote.number
                };
                self.push_inline(&format!("[^{label}]"));
            }
            Event::HorizontalRule => self.write_rule(),
            Event::Equation(content) => self.push_inline(&format!("${content}$")),
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Output> {
        self.nesting.finish()?;
        let mut output = self.output;
        let trimmed_len = output.trim_end().len();
        output.truncate(trimmed_len);
        if !output.is_empty() {
            output.push('\n');
        }
        Ok(Output::text(Format::Markdown, output))
    }
}

/// Append a space unless the text is empty or already ends with one.
fn separate_words(text: &mut String) {
    if !text.is_empty() && !text.ends_with(' ') {
        text.push(' ');
    }
}

/// Opening and closing markers for a formatting span, outermost first.
fn markers(formatting: &Formatting<'_>) -> (String, String) {
    let style = formatting.style;
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    if style.bold {
        pairs.push(("**", "**"));
    }
    if style.italic {
        pairs.push(("*", "*"));
    }
    if style.strikethrough {
        pairs.push(("~~", "~~"));
    }
    if style.underline {
        pairs.push(("<u>", "</u>"));
    }
    match style.baseline {
        BaselineOffset::Superscript => pairs.push(("<sup>", "</sup>")),
        BaselineOffset::Subscript => pairs.push(("<sub>", "</sub>")),
        BaselineOffset::None => {}
    }

    let mut open = String::new();
    let mut close = String::new();
    if formatting.link.is_some() {
        open.push('[');
    }
    for (o, _) in &pairs {
        open.push_str(o);
    }
    for (_, c) in pairs.iter().rev() {
        close.push_str(c);
    }
    if let Some(link) = formatting.link {
        let _ = write!(close, "]({})", escape_url(&link.href()));
    }
    (open, close)
}

/// Percent-encode the characters that would end a Markdown link target.
fn escape_url(url: &str) -> String {
    url.replace(' ', "%20").replace('(', "%28").replace(')', "%29")
}

/// Render collected rows as a pipe table with a separator after the first row.
fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        out.push('|');
        for col in 0..columns {
            let cell = row.get(col).map(|c| c.trim()).unwrap_or("");
            let _ = write!(out, " {} |", cell.replace('\n', " "));
        }
        out.push('\n');
        if i == 0 {
            out.push('|');
            for _ in 0..columns {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// Double-quoted YAML scalar.
fn yaml_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Body, Book, ContentRun, Equation, FootnoteReference, Image, InlineObject, Link,
        ListMembership, Paragraph, StructuralElement, Table, TextRun, TextStyle,
    };
    use crate::stream::stream;

    fn render_with(book: &Book, config: MarkdownConfig) -> String {
        let mut writer = Box::new(MarkdownWriter::new(config));
        for event in stream(book) {
            writer.handle(&event).unwrap();
        }
        let output = writer.finish().unwrap();
        output.as_text().unwrap().to_string()
    }

    fn render(content: Vec<StructuralElement>) -> String {
        let book = Book::new("b", "Title").with_body(Body::new(content));
        render_with(&book, MarkdownConfig::default())
    }

    #[test]
    fn test_simple_paragraph() {
        let result = render(vec![Paragraph::new().with_text("Hello, World!").into()]);
        assert_eq!(result, "Hello, World!\n");
    }

    #[test]
    fn test_heading() {
        let result = render(vec![
            Paragraph::heading(2).with_text("Chapter Title").into(),
            Paragraph::new().with_text("Body").into(),
        ]);
        assert_eq!(result, "## Chapter Title\n\nBody\n");
    }

    #[test]
    fn test_heading_stays_on_one_line() {
        let result = render(vec![
            Paragraph::heading(1).with_text("First line\n\nSecond line").into(),
            Paragraph::new().with_text("Body\ntext").into(),
        ]);
        assert_eq!(result, "# First line Second line\n\nBody\ntext\n");
    }

    #[test]
    fn test_heading_in_list_keeps_marker() {
        let item = || ListMembership::new("l", 0).numbered();
        let result = render(vec![
            Paragraph::new().with_text("One").in_list(item()).into(),
            Paragraph::heading(2).with_text("Two").in_list(item()).into(),
            Paragraph::new().with_text("Three").in_list(item()).into(),
        ]);
        assert_eq!(result, "1. One\n2. ## Two\n3. Three\n");
    }

    #[test]
    fn test_unordered_list() {
        let result = render(vec![
            Paragraph::new()
                .with_text("One")
                .in_list(ListMembership::new("l", 0))
                .into(),
            Paragraph::new()
                .with_text("Two")
                .in_list(ListMembership::new("l", 0))
                .into(),
        ]);
        assert_eq!(result, "- One\n- Two\n");
    }

    #[test]
    fn test_ordered_nested_list() {
        let result = render(vec![
            Paragraph::new()
                .with_text("First")
                .in_list(ListMembership::new("l", 0).numbered())
                .into(),
            Paragraph::new()
                .with_text("Inner")
                .in_list(ListMembership::new("l", 1))
                .into(),
            Paragraph::new()
                .with_text("Second")
                .in_list(ListMembership::new("l", 0).numbered())
                .into(),
            Paragraph::new().with_text("After").into(),
        ]);
        assert_eq!(result, "1. First\n   - Inner\n2. Second\n\nAfter\n");
    }

    #[test]
    fn test_formatting_markers() {
        let result = render(vec![
            Paragraph::new()
                .with_text("plain ")
                .with_run(TextRun::styled("bold ", TextStyle::bold()))
                .with_run(TextRun::styled("it", TextStyle::italic()))
                .into(),
        ]);
        assert_eq!(result, "plain **bold** *it*\n");
    }

    #[test]
    fn test_link() {
        let result = render(vec![
            Paragraph::new()
                .with_text("See ")
                .with_run(TextRun::plain("the docs").with_link(Link::external("https://x.org/a b")))
                .with_text(" and ")
                .with_run(TextRun::plain("intro").with_link(Link::heading("h.1")))
                .into(),
        ]);
        assert_eq!(result, "See [the docs](https://x.org/a%20b) and [intro](#h.1)\n");
    }

    #[test]
    fn test_table() {
        let result = render(vec![
            Table::from_rows([vec!["Name", "Age"], vec!["Ann", "31"], vec!["Bob"]]).into(),
        ]);
        assert_eq!(
            result,
            "| Name | Age |\n| --- | --- |\n| Ann | 31 |\n| Bob |  |\n"
        );
    }

    #[test]
    fn test_nested_table_flattens() {
        let inner = Table::from_rows([vec!["x", "y"]]);
        let outer = Table {
            rows: vec![crate::model::TableRow {
                cells: vec![crate::model::TableCell {
                    content: vec![Paragraph::new().with_text("a").into(), inner.into()],
                }],
            }],
        };
        let result = render(vec![outer.into()]);
        assert_eq!(result, "| a x y |\n| --- |\n");
    }

    #[test]
    fn test_atomic_runs() {
        let result = render(vec![
            Paragraph::new()
                .with_text("Fact")
                .with_run(ContentRun::FootnoteReference(FootnoteReference {
                    footnote_id: "fn1".to_string(),
                    number: "1".to_string(),
                }))
                .with_text(" and ")
                .with_run(ContentRun::Equation(Equation {
                    content: "x^2".to_string(),
                }))
                .into(),
        ]);
        assert_eq!(result, "Fact[^1] and $x^2$\n");
    }

    #[test]
    fn test_images() {
        let book = Book::new("b", "Title")
            .with_body(Body::new(vec![
                Paragraph::new()
                    .with_run(ContentRun::InlineObject(InlineObject {
                        object_id: "img".to_string(),
                    }))
                    .with_run(ContentRun::InlineObject(InlineObject {
                        object_id: "gone".to_string(),
                    }))
                    .into(),
            ]))
            .with_image(Image::new("img", "https://x.org/p.png"));
        let result = render_with(&book, MarkdownConfig::default());
        assert_eq!(result, "![](https://x.org/p.png)![missing image](#)\n");
    }

    #[test]
    fn test_horizontal_rule() {
        let result = render(vec![
            Paragraph::new()
                .with_text("above")
                .with_run(ContentRun::HorizontalRule)
                .with_text("below")
                .into(),
        ]);
        assert_eq!(result, "above\n\n---\n\nbelow\n");
    }

    #[test]
    fn test_markdown_escaping() {
        let result = render(vec![Paragraph::new().with_text("*not bold* [x]").into()]);
        assert_eq!(result, "\\*not bold\\* \\[x\\]\n");
    }

    #[test]
    fn test_front_matter() {
        let book = Book::new("b", "A \"Quoted\" Title").with_description("About it");
        let result = render_with(&book, MarkdownConfig::default().with_front_matter());
        assert_eq!(
            result,
            "---\ntitle: \"A \\\"Quoted\\\" Title\"\ndescription: \"About it\"\n---\n"
        );
    }

    #[test]
    fn test_empty_document() {
        let book = Book::new("b", "Title");
        assert_eq!(render_with(&book, MarkdownConfig::default()), "");
    }

    #[test]
    fn test_rejects_unbalanced_events() {
        let mut writer = MarkdownWriter::new(MarkdownConfig::default());
        let book = Book::new("b", "Title");
        let start = stream(&book).next().unwrap();
        writer.handle(&start).unwrap();
        assert!(writer.handle(&Event::EndParagraph).is_err());
    }
}
