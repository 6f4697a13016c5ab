//! Plain-text rendering.
//!
//! Each section becomes a block of lines: an underlined heading, one line per field, stacked
//! values indented under their label and table rows joined with ` | `. Struck text is wrapped in
//! `~~`.

use super::{CellContent, DocumentInfo, ReportRenderer, Row, Section, SectionWriter};
use crate::constants::TEXT_CONTENT_TYPE;
use crate::ReportResult;

#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn content_type(&self) -> &'static str {
        TEXT_CONTENT_TYPE
    }

    fn begin(&self, _info: &DocumentInfo) -> ReportResult<Box<dyn SectionWriter>> {
        Ok(Box::new(TextWriter::default()))
    }
}

#[derive(Default)]
struct TextWriter {
    out: String,
}

impl TextWriter {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn underlined(&mut self, text: &str, rule: char) {
        self.line(text);
        let underline: String = std::iter::repeat(rule).take(text.chars().count()).collect();
        self.line(&underline);
    }

    fn row(&mut self, row: &Row) {
        let is_table = row
            .cells
            .iter()
            .all(|c| matches!(c.content, CellContent::Text { .. } | CellContent::Blank))
            && row
                .cells
                .iter()
                .filter(|c| matches!(c.content, CellContent::Text { .. }))
                .count()
                > 1;

        if is_table {
            let cells: Vec<String> = row
                .cells
                .iter()
                .filter_map(|c| match &c.content {
                    CellContent::Text { text, struck, .. } => Some(strike(text, *struck)),
                    _ => None,
                })
                .collect();
            self.line(&cells.join(" | "));
            return;
        }

        for cell in &row.cells {
            match &cell.content {
                CellContent::Title(text) => self.underlined(text, '='),
                CellContent::Field { label, value } => self.line(&format!("{label}: {value}")),
                CellContent::Stacked { label, lines } => {
                    self.line(&format!("{label}:"));
                    for value in lines {
                        self.line(&format!("  {}", value.trim_start()));
                    }
                }
                CellContent::Text { text, struck, .. } => self.line(&strike(text, *struck)),
                CellContent::Blank => {}
            }
        }
    }
}

fn strike(text: &str, struck: bool) -> String {
    if struck {
        format!("~~{text}~~")
    } else {
        text.to_owned()
    }
}

impl SectionWriter for TextWriter {
    fn write_section(&mut self, section: &Section) -> ReportResult<()> {
        if !self.out.is_empty() {
            self.line("");
        }
        if let Some(heading) = &section.heading {
            self.underlined(heading, '-');
        }
        for row in &section.rows {
            self.row(row);
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> ReportResult<Vec<u8>> {
        Ok(self.out.into_bytes())
    }
}
