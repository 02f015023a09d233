//! LaTeX writer.
//!
//! Headings map to the sectioning commands, lists to `itemize`/`enumerate`
//! and tables to `tabular`. Tables nested inside a cell are flattened into
//! the cell's text, since `tabular` cells cannot hold paragraphs.

use std::fmt::Write as _;

use crate::config::LatexConfig;
use crate::error::Result;
use crate::model::{BaselineOffset, LinkTarget, ListKind};
use crate::stream::{Event, Formatting, ImageRef, Nesting};

use super::escape::{escape_latex, hex_color, single_line};
use super::{Format, FormatWriter, Output};

const PREAMBLE_PACKAGES: &[&str] = &[
    "\\usepackage[utf8]{inputenc}",
    "\\usepackage[T1]{fontenc}",
    "\\usepackage{graphicx}",
    "\\usepackage[normalem]{ulem}",
    "\\usepackage{xcolor}",
    "\\usepackage{hyperref}",
];

#[derive(Debug, Clone, Copy)]
enum Block {
    List(ListKind),
    Paragraph,
    Heading,
}

#[derive(Debug, Default)]
struct TableBuffer {
    rows: Vec<Vec<String>>,
    nested: usize,
}

/// LaTeX format writer.
pub struct LatexWriter {
    config: LatexConfig,
    nesting: Nesting,
    title: String,
    body: String,
    blocks: Vec<Block>,
    table: Option<TableBuffer>,
    /// Closing braces of the open formatting span.
    close_formatting: Option<String>,
}

impl LatexWriter {
    /// Fails if the configured document class is not supported.
    pub fn new(config: LatexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            nesting: Nesting::new(),
            title: String::new(),
            body: String::new(),
            blocks: Vec::new(),
            table: None,
            close_formatting: None,
        })
    }

    fn sink(&mut self) -> &mut String {
        if let Some(cell) = self
            .table
            .as_mut()
            .and_then(|table| table.rows.last_mut())
            .and_then(|row| row.last_mut())
        {
            return cell;
        }
        &mut self.body
    }

    fn push(&mut self, text: &str) {
        self.sink().push_str(text);
    }

    fn in_table(&self) -> bool {
        self.table.is_some()
    }

    fn in_list(&self) -> bool {
        matches!(self.blocks.last(), Some(Block::List(_)))
    }

    /// Inside a sectioning argument or a `tabular` cell, where a blank line
    /// would end the paragraph early.
    fn single_line_only(&self) -> bool {
        self.in_table() || self.blocks.iter().any(|b| matches!(b, Block::Heading))
    }

    fn ensure_line_start(&mut self) {
        if !self.body.is_empty() && !self.body.ends_with('\n') {
            self.body.push('\n');
        }
    }

    fn ensure_blank_line(&mut self) {
        if self.body.is_empty() || self.body.ends_with("\n\n") {
            return;
        }
        self.ensure_line_start();
        self.body.push('\n');
    }

    fn start_paragraph(&mut self) {
        if self.in_table() {
            separate_words(self.sink());
        } else if self.in_list() {
            self.ensure_line_start();
            self.body.push_str("\\item ");
        } else {
            self.ensure_blank_line();
        }
        self.blocks.push(Block::Paragraph);
    }

    fn start_heading(&mut self, level: u8) {
        if self.in_table() {
            separate_words(self.sink());
        } else {
            if self.in_list() {
                self.ensure_line_start();
                self.body.push_str("\\item ");
            } else {
                self.ensure_blank_line();
            }
            let _ = write!(self.body, "\\{}{{", sectioning_command(level));
        }
        self.blocks.push(Block::Heading);
    }

    fn end_block(&mut self) {
        let block = self.blocks.pop();
        if self.in_table() {
            return;
        }
        if let Some(Block::Heading) = block {
            self.body.push('}');
        }
        self.body.push('\n');
    }

    fn start_list(&mut self, kind: ListKind) {
        if !self.in_table() {
            self.ensure_line_start();
            let _ = writeln!(self.body, "\\begin{{{}}}", list_environment(kind));
        }
        self.blocks.push(Block::List(kind));
    }

    fn end_list(&mut self) {
        if let Some(Block::List(kind)) = self.blocks.pop()
            && !self.in_table()
        {
            self.ensure_line_start();
            let _ = writeln!(self.body, "\\end{{{}}}", list_environment(kind));
        }
    }

    fn start_table(&mut self) {
        match self.table.as_mut() {
            Some(table) => table.nested += 1,
            None => {
                if !self.in_list() {
                    self.ensure_blank_line();
                }
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
            self.ensure_line_start();
            self.body.push_str(&render_tabular(&table.rows));
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
        let style = formatting.style;
        let mut open = String::new();
        let mut depth = 0;

        if let Some(link) = formatting.link {
            match &link.target {
                Some(LinkTarget::Bookmark(id) | LinkTarget::Heading(id)) if link.url.is_empty() => {
                    let _ = write!(open, "\\hyperref[{}]{{", escape_url(id));
                }
                _ => {
                    let _ = write!(open, "\\href{{{}}}{{", escape_url(&link.url));
                }
            }
            depth += 1;
        }
        if let Some(color) = style.color.as_deref().and_then(hex_color) {
            let _ = write!(open, "\\textcolor[HTML]{{{color}}}{{");
            depth += 1;
        }
        for (enabled, command) in [
            (style.bold, "\\textbf{"),
            (style.italic, "\\textit{"),
            (style.underline, "\\uline{"),
            (style.strikethrough, "\\sout{"),
            (style.small_caps, "\\textsc{"),
            (style.baseline == BaselineOffset::Superscript, "\\textsuperscript{"),
            (style.baseline == BaselineOffset::Subscript, "\\textsubscript{"),
        ] {
            if enabled {
                open.push_str(command);
                depth += 1;
            }
        }

        self.push(&open);
        self.close_formatting = Some("}".repeat(depth));
    }

    fn write_image(&mut self, image: &ImageRef<'_>) {
        let rendered = match image.url() {
            Some(url) if is_remote(url) => format!("\\href{{{}}}{{[image]}}", escape_url(url)),
            Some(url) => format!("\\includegraphics[width=\\linewidth]{{{}}}", escape_url(url)),
            None => "[missing image]".to_string(),
        };
        self.push(&rendered);
    }

    fn write_rule(&mut self) {
        if self.in_table() {
            separate_words(self.sink());
            return;
        }
        self.ensure_blank_line();
        self.body.push_str("\\noindent\\rule{\\linewidth}{0.4pt}\n\n");
    }

    fn write_break(&mut self, command: &str) {
        if self.in_table() {
            separate_words(self.sink());
        } else {
            self.body.push_str(command);
        }
    }

    fn document(&self) -> String {
        let mut doc = String::with_capacity(self.body.len() + 512);
        let _ = writeln!(doc, "\\documentclass{{{}}}", self.config.document_class);
        for package in PREAMBLE_PACKAGES {
            doc.push_str(package);
            doc.push('\n');
        }
        let _ = writeln!(doc, "\n\\title{{{}}}", escape_latex(&self.title));
        doc.push_str("\\date{}\n\n\\begin{document}\n\\maketitle\n\n");
        doc.push_str(&self.body);
        doc.push_str("\\end{document}\n");
        doc
    }
}

impl FormatWriter for LatexWriter {
    fn format(&self) -> Format {
        Format::Latex
    }

    fn handle(&mut self, event: &Event<'_>) -> Result<()> {
        self.nesting.observe(event.kind())?;

        match event {
            Event::StartDocument(info) => self.title = info.title.to_string(),
            Event::EndDocument => {}
            Event::StartParagraph => self.start_paragraph(),
            Event::StartHeading(heading) => self.start_heading(heading.level),
            Event::EndParagraph | Event::EndHeading(_) => self.end_block(),
            Event::StartList(info) => self.start_list(info.kind),
            Event::EndList(_) => self.end_list(),
            Event::StartTable => self.start_table(),
            Event::EndTable => self.end_table(),
            Event::StartTableRow => self.start_row(),
            Event::StartTableCell => self.start_cell(),
            Event::EndTableRow | Event::EndTableCell => {}
            Event::StartFormatting(formatting) => self.start_formatting(formatting),
            Event::EndFormatting => {
                if let Some(close) = self.close_formatting.take() {
                    self.push(&close);
                }
            }
            Event::Text(text) if self.single_line_only() => {
                self.push(&escape_latex(&single_line(text)));
            }
            Event::Text(text) => self.push(&escape_latex(text)),
            Event::Image(image) => self.write_image(image),
            Event::PageBreak => self.write_break("\\newpage{}"),
            Event::ColumnBreak => self.write_break("\\newline{}"),
            Event::FootnoteReference(footnote) => {
                let label = if footnote.number.is_empty() {
                    &footnote.footnote_id
                } else {
                    &footnote.number
                };
                self.push(&format!("\\textsuperscript{{{}}}", escape_latex(label)));
            }
            Event::HorizontalRule => self.write_rule(),
            Event::Equation(content) => {
                let math: String = content.chars().filter(|&c| c != '$').collect();
                self.push(&format!("${math}$"));
            }
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Output> {
        self.nesting.finish()?;
        let trimmed_len = self.body.trim_end().len();
        self.body.truncate(trimmed_len);
        if !self.body.is_empty() {
            self.body.push('\n');
        }
        let text = if self.config.standalone {
            self.document()
        } else {
            std::mem::take(&mut self.body)
        };
        Ok(Output::text(Format::Latex, text))
    }
}

/// Sectioning command for a heading level; levels past 5 share the last one.
fn sectioning_command(level: u8) -> &'static str {
    match level {
        0 | 1 => "section",
        2 => "subsection",
        3 => "subsubsection",
        4 => "paragraph",
        _ => "subparagraph",
    }
}

fn list_environment(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bullet => "itemize",
        ListKind::Numbered => "enumerate",
    }
}

fn separate_words(text: &mut String) {
    if !text.is_empty() && !text.ends_with(' ') {
        text.push(' ');
    }
}

fn is_remote(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Escape the characters hyperref and graphicx treat specially in a URL.
fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if matches!(c, '\\' | '#' | '%' | '{' | '}') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `#rrggbb` to the `RRGGBB` form xcolor's HTML model expects.
fn render_tabular(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut out = String::new();
    let _ = writeln!(out, "\\begin{{tabular}}{{|{}}}", "l|".repeat(columns));
    out.push_str("\\hline\n");
    for row in rows {
        let cells: Vec<&str> = (0..columns)
            .map(|col| row.get(col).map(|c| c.trim()).unwrap_or(""))
            .collect();
        let _ = writeln!(out, "{} \\\\ \\hline", cells.join(" & "));
    }
    out.push_str("\\end{tabular}\n\n");
    out
}
