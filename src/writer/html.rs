//! HTML writer.
//!
//! [`HtmlBody`] maps events to XHTML-compatible markup and is shared with the
//! EPUB writer, which renders its section documents through it.

use std::fmt::Write as _;

use crate::config::HtmlConfig;
use crate::error::Result;
use crate::model::{BaselineOffset, ListKind};
use crate::stream::{Event, Formatting, ImageRef, Nesting};

use super::escape::{Slugger, escape_xml, font_family, hex_color};
use super::{Format, FormatWriter, Output};

/// Block context the body renderer is currently inside.
#[derive(Debug)]
enum Block {
    List {
        ordered: bool,
        /// An `<li>` is open and will contain any nested list.
        item_open: bool,
    },
    /// Paragraph rendered as `<p>`, or as the text of a list item.
    Paragraph { item: bool },
    Heading { level: u8, item: bool },
    Table,
    Row,
    Cell,
}

/// Event-to-markup renderer for a document body.
#[derive(Debug, Default)]
pub(crate) struct HtmlBody {
    out: String,
    blocks: Vec<Block>,
    /// Closing tags of the open formatting span, innermost first.
    close_formatting: Option<String>,
    slugger: Slugger,
}

impl HtmlBody {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the markup rendered so far, leaving the context intact.
    pub(crate) fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Render one event. Document-level events produce nothing here.
    ///
    /// Returns the anchor id assigned when the event starts a heading.
    pub(crate) fn render(&mut self, event: &Event<'_>) -> Option<String> {
        match event {
            Event::StartDocument(_) | Event::EndDocument => {}
            Event::StartParagraph => {
                let item = self.open_item();
                if !item {
                    self.out.push_str("<p>");
                }
                self.blocks.push(Block::Paragraph { item });
            }
            Event::EndParagraph => {
                if let Some(Block::Paragraph { item: false }) = self.blocks.pop() {
                    self.out.push_str("</p>\n");
                }
            }
            Event::StartHeading(heading) => {
                let item = self.open_item();
                let id = self.slugger.unique(&heading.text);
                let _ = write!(self.out, "<h{} id=\"{}\">", heading.level, escape_xml(&id));
                self.blocks.push(Block::Heading {
                    level: heading.level,
                    item,
                });
                return Some(id);
            }
            Event::EndHeading(_) => {
                if let Some(Block::Heading { level, item }) = self.blocks.pop() {
                    let _ = write!(self.out, "</h{level}>");
                    if !item {
                        self.out.push('\n');
                    }
                }
            }
            Event::StartList(info) => {
                // A list must sit inside an item when it nests in another list
                if let Some(Block::List { item_open, .. }) = self.blocks.last_mut()
                    && !*item_open
                {
                    self.out.push_str("<li>");
                    *item_open = true;
                }
                let ordered = info.kind == ListKind::Numbered;
                self.out.push_str(if ordered { "<ol>\n" } else { "<ul>\n" });
                self.blocks.push(Block::List {
                    ordered,
                    item_open: false,
                });
            }
            Event::EndList(_) => {
                if let Some(Block::List { ordered, item_open }) = self.blocks.pop() {
                    if item_open {
                        self.out.push_str("</li>\n");
                    }
                    self.out.push_str(if ordered { "</ol>" } else { "</ul>" });
                    self.out.push('\n');
                }
            }
            Event::StartTable => {
                self.out.push_str("<table>\n");
                self.blocks.push(Block::Table);
            }
            Event::EndTable => {
                self.blocks.pop();
                self.out.push_str("</table>\n");
            }
            Event::StartTableRow => {
                self.out.push_str("<tr>");
                self.blocks.push(Block::Row);
            }
            Event::EndTableRow => {
                self.blocks.pop();
                self.out.push_str("</tr>\n");
            }
            Event::StartTableCell => {
                self.out.push_str("<td>");
                self.blocks.push(Block::Cell);
            }
            Event::EndTableCell => {
                self.blocks.pop();
                self.out.push_str("</td>");
            }
            Event::StartFormatting(formatting) => self.start_formatting(formatting),
            Event::EndFormatting => {
                if let Some(close) = self.close_formatting.take() {
                    self.out.push_str(&close);
                }
            }
            Event::Text(text) => self.out.push_str(&escape_xml(text)),
            Event::Image(image) => self.write_image(image),
            Event::PageBreak => self.out.push_str("<br class=\"page-break\"/>"),
            Event::ColumnBreak => self.out.push_str("<br class=\"column-break\"/>"),
            Event::FootnoteReference(footnote) => {
                let label = if footnote.number.is_empty() {
                    &footnote.footnote_id
                } else {
                    &footnote.number
                };
                let _ = write!(
                    self.out,
                    "<sup class=\"footnote-ref\"><a href=\"#{}\">{}</a></sup>",
                    escape_xml(&footnote.footnote_id),
                    escape_xml(label)
                );
            }
            Event::HorizontalRule => {
                // <hr/> cannot live inside <p>; split the paragraph around it
                if let Some(Block::Paragraph { item: false }) = self.blocks.last() {
                    self.out.push_str("</p>\n<hr/>\n<p>");
                } else {
                    self.out.push_str("<hr/>");
                }
            }
            Event::Equation(content) => {
                let _ = write!(
                    self.out,
                    "<span class=\"equation\">{}</span>",
                    escape_xml(content)
                );
            }
        }
        None
    }

    /// Start a list item if the innermost block is a list.
    fn open_item(&mut self) -> bool {
        let Some(Block::List { item_open, .. }) = self.blocks.last_mut() else {
            return false;
        };
        if *item_open {
            self.out.push_str("</li>\n");
        }
        self.out.push_str("<li>");
        *item_open = true;
        true
    }

    fn start_formatting(&mut self, formatting: &Formatting<'_>) {
        let style = formatting.style;
        let mut tags: Vec<&str> = Vec::new();
        let mut open = String::new();

        if let Some(link) = formatting.link {
            let _ = write!(open, "<a href=\"{}\">", escape_xml(&link.href()));
            tags.push("a");
        }

        let mut css = Vec::new();
        if style.small_caps {
            css.push("font-variant: small-caps".to_string());
        }
        if let Some(family) = style.font_family.as_deref().and_then(font_family) {
            css.push(format!("font-family: {family}"));
        }
        if let Some(color) = style.color.as_deref().and_then(hex_color) {
            css.push(format!("color: #{color}"));
        }
        if !css.is_empty() {
            let _ = write!(open, "<span style=\"{}\">", escape_xml(&css.join("; ")));
            tags.push("span");
        }

        for (enabled, tag) in [
            (style.bold, "strong"),
            (style.italic, "em"),
            (style.underline, "u"),
            (style.strikethrough, "s"),
            (style.baseline == BaselineOffset::Superscript, "sup"),
            (style.baseline == BaselineOffset::Subscript, "sub"),
        ] {
            if enabled {
                let _ = write!(open, "<{tag}>");
                tags.push(tag);
            }
        }

        let mut close = String::new();
        for tag in tags.iter().rev() {
            let _ = write!(close, "</{tag}>");
        }

        self.out.push_str(&open);
        self.close_formatting = Some(close);
    }

    fn write_image(&mut self, image: &ImageRef<'_>) {
        match image.url() {
            Some(url) => {
                let _ = write!(
                    self.out,
                    "<img src=\"{}\" alt=\"\"/>",
                    escape_xml(url)
                );
            }
            None => {
                let _ = write!(
                    self.out,
                    "<span class=\"missing-image\" title=\"{}\">[missing image]</span>",
                    escape_xml(image.object_id)
                );
            }
        }
    }
}

/// Wrap body markup in a complete XHTML document.
pub(crate) fn xhtml_document(title: &str, stylesheet_href: Option<&str>, body: &str) -> String {
    let mut doc = String::with_capacity(body.len() + 512);

    // XHTML 1.1 DOCTYPE (compatible with EPUB)
    doc.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8"/>
  <title>"#,
    );
    doc.push_str(&escape_xml(title));
    doc.push_str("</title>\n");

    if let Some(href) = stylesheet_href {
        let _ = writeln!(
            doc,
            "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>",
            escape_xml(href)
        );
    }

    doc.push_str("</head>\n<body>\n");
    doc.push_str(body);
    doc.push_str("</body>\n</html>\n");
    doc
}

/// HTML format writer.
pub struct HtmlWriter {
    config: HtmlConfig,
    nesting: Nesting,
    title: String,
    body: HtmlBody,
}

impl HtmlWriter {
    pub fn new(config: HtmlConfig) -> Self {
        Self {
            config,
            nesting: Nesting::new(),
            title: String::new(),
            body: HtmlBody::new(),
        }
    }
}

impl FormatWriter for HtmlWriter {
    fn format(&self) -> Format {
        Format::Html
    }

    fn handle(&mut self, event: &Event<'_>) -> Result<()> {
        self.nesting.observe(event.kind())?;
        if let Event::StartDocument(info) = event {
            self.title = info.title.to_string();
        }
        self.body.render(event);
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Output> {
        self.nesting.finish()?;
        let body = self.body.take();
        let html = if self.config.standalone {
            xhtml_document(&self.title, self.config.stylesheet.as_deref(), &body)
        } else {
            body
        };
        Ok(Output::text(Format::Html, html))
    }
}
