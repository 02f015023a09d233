//! Plain-text writer.
//!
//! Keeps only text payloads. Paragraphs and headings end a line; table cells
//! are tab-separated with one line per row.

use crate::error::Result;
use crate::stream::{Event, Nesting};

use super::{Format, FormatWriter, Output};

/// Plain-text format writer.
#[derive(Debug, Default)]
pub struct PlaintextWriter {
    nesting: Nesting,
    output: String,
    /// Depth of open tables; only the outermost one lays out cells.
    tables: usize,
    /// Cells started in the current outer row.
    cells_in_row: usize,
}

impl PlaintextWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn separate_words(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with([' ', '\t', '\n']) {
            self.output.push(' ');
        }
    }
}

impl FormatWriter for PlaintextWriter {
    fn format(&self) -> Format {
        Format::Plaintext
    }

    fn handle(&mut self, event: &Event<'_>) -> Result<()> {
        self.nesting.observe(event.kind())?;

        match event {
            Event::StartParagraph | Event::StartHeading(_) if self.tables > 0 => {
                self.separate_words();
            }
            Event::EndParagraph | Event::EndHeading(_) if self.tables == 0 => {
                self.output.push('\n');
            }
            Event::StartTable => self.tables += 1,
            Event::EndTable => self.tables = self.tables.saturating_sub(1),
            Event::StartTableRow if self.tables == 1 => self.cells_in_row = 0,
            Event::EndTableRow if self.tables == 1 => self.output.push('\n'),
            Event::StartTableCell => {
                if self.tables == 1 {
                    if self.cells_in_row > 0 {
                        self.output.push('\t');
                    }
                    self.cells_in_row += 1;
                } else {
                    self.separate_words();
                }
            }
            Event::Text(text) => self.output.push_str(text),
            _ => {}
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Output> {
        self.nesting.finish()?;
        Ok(Output::text(Format::Plaintext, self.output))
    }
}
