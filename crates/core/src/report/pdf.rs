//! PDF rendering with `printpdf`.
//!
//! Sections are laid out top to bottom on A4 pages (or whatever [`PageLayout`] says) using the
//! built-in Helvetica fonts. Each section row is measured first and moved to a fresh page if it
//! does not fit in the space left. A row taller than a whole page continues line by line onto
//! the following pages; only a single line taller than a page is a render error.
//!
//! Text width is estimated from the character count, which is good enough for wrapping and for
//! placing the strikethrough over replaced medication names.

use super::{CellContent, DocumentInfo, ReportRenderer, Row, Section, SectionWriter};
use crate::config::PageLayout;
use crate::constants::PDF_CONTENT_TYPE;
use crate::{ReportError, ReportResult};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use std::io::BufWriter;

const PT_TO_MM: f32 = 25.4 / 72.0;
const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;
const CELL_PADDING_MM: f32 = 1.5;
const SECTION_GAP_MM: f32 = 4.0;
const LAYER_NAME: &str = "Layer 1";

/// Renders reports as paginated PDF documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfRenderer {
    page: PageLayout,
}

impl PdfRenderer {
    pub fn new(page: PageLayout) -> Self {
        Self { page }
    }
}

impl ReportRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }

    fn begin(&self, info: &DocumentInfo) -> ReportResult<Box<dyn SectionWriter>> {
        Ok(Box::new(PdfWriter::start(self.page, info)?))
    }
}

fn builtin_font(doc: &PdfDocumentReference, font: BuiltinFont) -> ReportResult<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| ReportError::Render(format!("PDF font error: {e}")))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// One line of laid-out cell text. A label, if any, is drawn bold in front of the text.
#[derive(Debug, PartialEq)]
struct LaidLine {
    label: Option<String>,
    text: String,
    size: f32,
    bold: bool,
    struck: bool,
}

impl LaidLine {
    fn plain(text: String, size: f32, bold: bool, struck: bool) -> Self {
        Self {
            label: None,
            text,
            size,
            bold,
            struck,
        }
    }

    fn height_mm(&self) -> f32 {
        line_height_mm(self.size)
    }
}

fn line_height_mm(size: f32) -> f32 {
    size * 1.25 * PT_TO_MM
}

fn char_width_mm(size: f32, bold: bool) -> f32 {
    let em = if bold { 0.56 } else { 0.5 };
    size * em * PT_TO_MM
}

fn text_width_mm(text: &str, size: f32, bold: bool) -> f32 {
    text.chars().count() as f32 * char_width_mm(size, bold)
}

fn max_chars(width_mm: f32, size: f32, bold: bool) -> usize {
    ((width_mm / char_width_mm(size, bold)).floor() as usize).max(1)
}

/// Greedy word wrap; a word longer than a line is split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_owned();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            lines.push(head);
        }

        let needed = current.chars().count() + word.chars().count() + 1;
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Lays out one cell into lines that fit `width_mm`.
fn layout_cell(content: &CellContent, width_mm: f32) -> Vec<LaidLine> {
    match content {
        CellContent::Title(text) => wrap_text(text, max_chars(width_mm, TITLE_SIZE, true))
            .into_iter()
            .map(|line| LaidLine::plain(line, TITLE_SIZE, true, false))
            .collect(),
        CellContent::Field { label, value } => {
            let prefix = format!("{label}:");
            let combined = format!("{prefix} {value}");
            let mut lines: Vec<LaidLine> =
                wrap_text(&combined, max_chars(width_mm, BODY_SIZE, true))
                    .into_iter()
                    .map(|line| LaidLine::plain(line, BODY_SIZE, false, false))
                    .collect();
            if let Some(first) = lines.first_mut() {
                if let Some(rest) = first.text.strip_prefix(&prefix) {
                    first.text = rest.trim_start().to_owned();
                    first.label = Some(prefix);
                }
            }
            lines
        }
        CellContent::Stacked { label, lines } => {
            let mut laid = vec![LaidLine::plain(format!("{label}:"), BODY_SIZE, true, false)];
            for value in lines {
                laid.extend(
                    wrap_text(value, max_chars(width_mm, BODY_SIZE, false))
                        .into_iter()
                        .map(|line| LaidLine::plain(line, BODY_SIZE, false, false)),
                );
            }
            laid
        }
        CellContent::Text { text, bold, struck } => {
            wrap_text(text, max_chars(width_mm, BODY_SIZE, *bold))
                .into_iter()
                .map(|line| LaidLine::plain(line, BODY_SIZE, *bold, *struck))
                .collect()
        }
        CellContent::Blank => Vec::new(),
    }
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    page: PageLayout,
    footer: String,
    /// Cursor position in millimetres from the bottom edge.
    y: f32,
    page_number: usize,
}

impl PdfWriter {
    fn start(page: PageLayout, info: &DocumentInfo) -> ReportResult<Self> {
        let (doc, first_page, layer) = PdfDocument::new(
            &info.title,
            Mm(page.width_mm),
            Mm(page.height_mm),
            LAYER_NAME,
        );
        let layer = doc.get_page(first_page).get_layer(layer);
        let fonts = Fonts {
            regular: builtin_font(&doc, BuiltinFont::Helvetica)?,
            bold: builtin_font(&doc, BuiltinFont::HelveticaBold)?,
        };

        let mut writer = Self {
            doc,
            layer,
            fonts,
            page,
            footer: info.author.clone(),
            y: 0.0,
            page_number: 1,
        };
        writer.y = writer.top();
        writer.draw_footer();
        Ok(writer)
    }

    fn top(&self) -> f32 {
        self.page.height_mm - self.page.margin_mm()
    }

    /// Lowest y a row may reach; the footer sits below it.
    fn bottom(&self) -> f32 {
        self.page.margin_mm() + line_height_mm(FOOTER_SIZE)
    }

    fn printable_height(&self) -> f32 {
        self.top() - self.bottom()
    }

    fn left(&self) -> f32 {
        self.page.margin_mm()
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.fonts.bold
        } else {
            &self.fonts.regular
        }
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.page.width_mm),
            Mm(self.page.height_mm),
            LAYER_NAME,
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page_number += 1;
        self.y = self.top();
        self.draw_footer();
    }

    fn draw_footer(&self) {
        let text = format!("{} | Page {}", self.footer, self.page_number);
        self.layer.use_text(
            text,
            FOOTER_SIZE,
            Mm(self.left()),
            Mm(self.page.margin_mm()),
            &self.fonts.regular,
        );
    }

    fn ensure_space(&mut self, height: f32) -> ReportResult<()> {
        if height > self.printable_height() {
            return Err(ReportError::Render(format!(
                "content of {height:.1} mm does not fit on a page"
            )));
        }
        if self.y - height < self.bottom() {
            self.new_page();
        }
        Ok(())
    }

    fn rule(&self, x1: f32, x2: f32, y: f32, thickness: f32) {
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y)), false),
                (Point::new(Mm(x2), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    fn draw_line(&self, line: &LaidLine, x: f32, baseline: f32) {
        let mut x = x;
        if let Some(label) = &line.label {
            self.layer
                .use_text(label, line.size, Mm(x), Mm(baseline), &self.fonts.bold);
            x += text_width_mm(label, line.size, true) + char_width_mm(line.size, false);
        }
        self.layer.use_text(
            &line.text,
            line.size,
            Mm(x),
            Mm(baseline),
            self.font(line.bold),
        );
        if line.struck && !line.text.is_empty() {
            let width = text_width_mm(&line.text, line.size, line.bold);
            let middle = baseline + line.size * 0.3 * PT_TO_MM;
            self.rule(x, x + width, middle, 0.75);
        }
    }

    fn write_heading(&mut self, heading: &str) -> ReportResult<()> {
        let height = line_height_mm(HEADING_SIZE) + CELL_PADDING_MM * 2.0;
        self.ensure_space(height)?;
        let baseline = self.y - line_height_mm(HEADING_SIZE) * 0.8;
        self.layer.use_text(
            heading,
            HEADING_SIZE,
            Mm(self.left()),
            Mm(baseline),
            &self.fonts.bold,
        );
        let underline = baseline - CELL_PADDING_MM;
        self.rule(
            self.left(),
            self.left() + self.page.content_width_mm(),
            underline,
            0.5,
        );
        self.y -= height;
        Ok(())
    }

    fn write_row(&mut self, row: &Row, columns: usize) -> ReportResult<()> {
        let column_width = self.page.content_width_mm() / columns as f32;

        let mut laid_cells = Vec::with_capacity(row.cells.len());
        let mut x = self.left();
        for cell in &row.cells {
            let width = column_width * cell.span as f32;
            let lines = layout_cell(&cell.content, width - CELL_PADDING_MM * 2.0);
            laid_cells.push((x, lines));
            x += width;
        }

        let height = laid_cells
            .iter()
            .map(|(_, lines)| lines.iter().map(LaidLine::height_mm).sum::<f32>())
            .fold(0.0_f32, f32::max)
            + CELL_PADDING_MM * 2.0;

        if height <= self.printable_height() {
            self.ensure_space(height)?;
            let mut cursors = vec![0; laid_cells.len()];
            self.draw_slice(&laid_cells, &mut cursors, height);
            self.y -= height;
            return Ok(());
        }

        self.write_split_row(&laid_cells)
    }

    /// Writes a row taller than a page, continuing each cell's lines on the following pages.
    fn write_split_row(&mut self, laid_cells: &[(f32, Vec<LaidLine>)]) -> ReportResult<()> {
        let mut cursors = vec![0; laid_cells.len()];
        let mut fresh_page = false;

        loop {
            let available = self.y - self.bottom() - CELL_PADDING_MM * 2.0;
            let drawn_before: usize = cursors.iter().sum();
            let used = self.draw_slice(laid_cells, &mut cursors, available);
            let progressed = cursors.iter().sum::<usize>() > drawn_before;

            let done = laid_cells
                .iter()
                .zip(&cursors)
                .all(|((_, lines), cursor)| *cursor >= lines.len());
            if done {
                self.y -= used + CELL_PADDING_MM * 2.0;
                return Ok(());
            }

            if !progressed && fresh_page {
                return Err(ReportError::Render(
                    "a line of text does not fit on a page".into(),
                ));
            }
            self.new_page();
            fresh_page = true;
        }
    }

    /// Draws, for every cell, the lines from its cursor onwards that fit within `available`
    /// millimetres below the cursor. Returns the height of the tallest cell slice drawn.
    fn draw_slice(
        &self,
        laid_cells: &[(f32, Vec<LaidLine>)],
        cursors: &mut [usize],
        available: f32,
    ) -> f32 {
        let mut used = 0.0_f32;
        for ((x, lines), cursor) in laid_cells.iter().zip(cursors.iter_mut()) {
            let mut consumed = 0.0_f32;
            while let Some(line) = lines.get(*cursor) {
                if consumed + line.height_mm() > available {
                    break;
                }
                let top = self.y - CELL_PADDING_MM - consumed;
                let baseline = top - line.height_mm() * 0.8;
                self.draw_line(line, x + CELL_PADDING_MM, baseline);
                consumed += line.height_mm();
                *cursor += 1;
            }
            used = used.max(consumed);
        }
        used
    }
}

impl SectionWriter for PdfWriter {
    fn write_section(&mut self, section: &Section) -> ReportResult<()> {
        if let Some(heading) = &section.heading {
            self.write_heading(heading)?;
        }
        for row in &section.rows {
            self.write_row(row, section.columns)?;
        }
        self.y -= SECTION_GAP_MM;
        Ok(())
    }

    fn finish(self: Box<Self>) -> ReportResult<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ReportError::Render(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ReportError::Render(format!("PDF buffer error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{ObservationRecord, ObservationSet};
    use crate::report::{compose, render_best_effort, Cell, SectionKind};
    use crate::snapshot::tests::encounter_id;
    use crate::snapshot::EncounterSnapshot;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn wrap_text_breaks_on_words() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn wrap_text_splits_overlong_words() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn field_layout_keeps_label_on_first_line() {
        let lines = layout_cell(
            &CellContent::Field {
                label: "Assessment".into(),
                value: "stable".into(),
            },
            100.0,
        );

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label.as_deref(), Some("Assessment:"));
        assert_eq!(lines[0].text, "stable");
    }

    #[test]
    fn renders_a_pdf_document() {
        let rendered = render_best_effort(
            &PdfRenderer::default(),
            &compose(&EncounterSnapshot::empty(encounter_id()), today()),
        );

        assert!(rendered.complete);
        assert_eq!(rendered.content_type, "application/pdf");
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_reports_flow_onto_more_pages() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let records = (0..40)
            .map(|i| ObservationRecord {
                category: Some("onset".into()),
                chief_complaint: Some(format!("Complaint {i}")),
                value: Some("recently".into()),
                recorded_at: at,
            })
            .collect();
        let mut snapshot = EncounterSnapshot::empty(encounter_id());
        snapshot.observations = ObservationSet::new(records).unwrap();

        let rendered = render_best_effort(&PdfRenderer::default(), &compose(&snapshot, today()));

        assert!(rendered.complete);
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_free_text_continues_onto_following_pages() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let record = |category: &str, scope: Option<&str>, value: String| ObservationRecord {
            category: Some(category.into()),
            chief_complaint: scope.map(Into::into),
            value: Some(value),
            recorded_at: at,
        };
        let mut snapshot = EncounterSnapshot::empty(encounter_id());
        snapshot.observations = ObservationSet::new(vec![
            record("assessment", None, "patient reports improvement ".repeat(2_000)),
            record("onset", Some("Headache"), "2 days".into()),
        ])
        .unwrap();
        let report = compose(&snapshot, today());

        let mut writer = PdfWriter::start(PageLayout::a4(), &report.info).unwrap();
        for section in &report.sections {
            writer.write_section(section).unwrap();
        }

        assert!(writer.page_number > 2);
        assert_eq!(
            report.sections.last().map(|s| s.kind),
            Some(SectionKind::ChiefComplaints)
        );

        let rendered = render_best_effort(&PdfRenderer::default(), &report);
        assert!(rendered.complete);
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn line_taller_than_a_page_is_a_render_error() {
        let page = PageLayout {
            width_mm: 210.0,
            height_mm: 20.0,
            margin_pt: 14.0,
        };
        let info = DocumentInfo {
            title: "Patient Report".into(),
            author: "fEMR".into(),
        };
        let mut writer = PdfWriter::start(page, &info).unwrap();
        let row = Row {
            cells: vec![Cell::title("Medical Record"), Cell::text("x ".repeat(400))],
        };

        let err = writer.write_row(&row, 2).expect_err("title line cannot fit");
        assert!(matches!(err, ReportError::Render(_)));
    }
}
