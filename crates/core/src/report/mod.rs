//! Report descriptors and rendering backends.
//!
//! Report generation is split in two:
//! - [`composer::compose`] turns an encounter snapshot into an immutable [`Report`], a list of
//!   [`Section`]s laid out as rows of cells on a column grid. No I/O happens here.
//! - a [`ReportRenderer`] turns a report into bytes. [`pdf::PdfRenderer`] produces the A4
//!   document served to browsers, [`text::TextRenderer`] a plain-text rendition for terminals
//!   and tests.
//!
//! [`render_best_effort`] drives a renderer section by section. A failure stops the remaining
//! sections but still returns what was produced so far; the report is a presentation of data
//! already stored elsewhere, so a partial document is preferred over none.

pub mod composer;
pub mod pdf;
pub mod text;

use crate::ReportResult;

pub use composer::compose;
pub use pdf::PdfRenderer;
pub use text::TextRenderer;

/// Document-level metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    /// Printed in the page footer of paginated output.
    pub author: String,
}

/// A composed report: metadata plus sections in display order.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub info: DocumentInfo,
    pub sections: Vec<Section>,
}

/// Which part of the report a section is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    PatientInfo,
    EncounterInfo,
    Vitals,
    Assessments,
    ChiefComplaints,
}

/// A titled grid of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: Option<String>,
    pub columns: usize,
    pub rows: Vec<Row>,
}

/// One grid row; the spans of its cells add up to the section's column count.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub span: usize,
    pub content: CellContent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    /// Large document title.
    Title(String),
    /// `label: value` on one line.
    Field { label: String, value: String },
    /// A label with one value per line underneath.
    Stacked { label: String, lines: Vec<String> },
    /// Plain table text, optionally bold or struck through.
    Text {
        text: String,
        bold: bool,
        struck: bool,
    },
    Blank,
}

impl Cell {
    pub fn field(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            span: 1,
            content: CellContent::Field {
                label: label.into(),
                value: value.into(),
            },
        }
    }

    pub fn stacked(label: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            span: 1,
            content: CellContent::Stacked {
                label: label.into(),
                lines,
            },
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            span: 1,
            content: CellContent::Text {
                text: text.into(),
                bold: false,
                struck: false,
            },
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            span: 1,
            content: CellContent::Text {
                text: text.into(),
                bold: true,
                struck: false,
            },
        }
    }

    pub fn struck(text: impl Into<String>) -> Self {
        Self {
            span: 1,
            content: CellContent::Text {
                text: text.into(),
                bold: false,
                struck: true,
            },
        }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self {
            span: 1,
            content: CellContent::Title(text.into()),
        }
    }

    pub fn blank() -> Self {
        Self {
            span: 1,
            content: CellContent::Blank,
        }
    }

    pub fn spanning(mut self, span: usize) -> Self {
        self.span = span.max(1);
        self
    }
}

/// Accumulates cells into rows, wrapping when a row is full.
///
/// Used only while composing; the finished [`Section`] is immutable.
pub(crate) struct SectionBuilder {
    kind: SectionKind,
    heading: Option<String>,
    columns: usize,
    rows: Vec<Row>,
    current: Vec<Cell>,
    used: usize,
}

impl SectionBuilder {
    pub(crate) fn new(kind: SectionKind, columns: usize) -> Self {
        Self {
            kind,
            heading: None,
            columns: columns.max(1),
            rows: Vec::new(),
            current: Vec::new(),
            used: 0,
        }
    }

    pub(crate) fn heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    /// Adds a cell, starting a new row first if it does not fit in the current one.
    pub(crate) fn push(&mut self, mut cell: Cell) -> &mut Self {
        cell.span = cell.span.min(self.columns);
        if self.used + cell.span > self.columns {
            self.complete_row();
        }
        self.used += cell.span;
        self.current.push(cell);
        if self.used == self.columns {
            self.flush();
        }
        self
    }

    /// Pads the current row with blank cells and closes it.
    pub(crate) fn complete_row(&mut self) -> &mut Self {
        if self.current.is_empty() {
            return self;
        }
        while self.used < self.columns {
            self.current.push(Cell::blank());
            self.used += 1;
        }
        self.flush();
        self
    }

    fn flush(&mut self) {
        let cells = std::mem::take(&mut self.current);
        self.rows.push(Row { cells });
        self.used = 0;
    }

    pub(crate) fn build(mut self) -> Section {
        self.complete_row();
        Section {
            kind: self.kind,
            heading: self.heading,
            columns: self.columns,
            rows: self.rows,
        }
    }
}

/// Backend that turns sections into bytes.
pub trait ReportRenderer: Send + Sync {
    /// MIME type of the produced bytes.
    fn content_type(&self) -> &'static str;

    /// Starts a new document.
    fn begin(&self, info: &DocumentInfo) -> ReportResult<Box<dyn SectionWriter>>;
}

/// An open document accepting sections in order.
pub trait SectionWriter {
    fn write_section(&mut self, section: &Section) -> ReportResult<()>;

    /// Closes the document and returns its bytes.
    fn finish(self: Box<Self>) -> ReportResult<Vec<u8>>;
}

/// Output of [`render_best_effort`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedReport {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    /// False when a failure cut the document short.
    pub complete: bool,
}

/// Renders every section, logging and stopping at the first failure.
///
/// Whatever was written before the failure is still finished and returned. If the document
/// cannot even be started or closed, the bytes are empty.
pub fn render_best_effort(renderer: &dyn ReportRenderer, report: &Report) -> RenderedReport {
    let content_type = renderer.content_type();

    let mut writer = match renderer.begin(&report.info) {
        Ok(writer) => writer,
        Err(e) => {
            tracing::error!("failed to start report document: {}", e);
            return RenderedReport {
                content_type,
                bytes: Vec::new(),
                complete: false,
            };
        }
    };

    let mut complete = true;
    for section in &report.sections {
        if let Err(e) = writer.write_section(section) {
            tracing::error!(kind = ?section.kind, "failed to render report section: {}", e);
            complete = false;
            break;
        }
    }

    match writer.finish() {
        Ok(bytes) => RenderedReport {
            content_type,
            bytes,
            complete,
        },
        Err(e) => {
            tracing::error!("failed to finish report document: {}", e);
            RenderedReport {
                content_type,
                bytes: Vec::new(),
                complete: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportError;

    #[test]
    fn builder_wraps_full_rows() {
        let mut builder = SectionBuilder::new(SectionKind::Vitals, 2);
        builder
            .push(Cell::text("a"))
            .push(Cell::text("b"))
            .push(Cell::text("c"));
        let section = builder.build();

        assert_eq!(section.rows.len(), 2);
        assert_eq!(section.rows[0].cells, vec![Cell::text("a"), Cell::text("b")]);
        assert_eq!(section.rows[1].cells, vec![Cell::text("c"), Cell::blank()]);
    }

    #[test]
    fn builder_moves_wide_cell_to_next_row() {
        let mut builder = SectionBuilder::new(SectionKind::ChiefComplaints, 2);
        builder
            .push(Cell::text("left"))
            .push(Cell::text("wide").spanning(2));
        let section = builder.build();

        assert_eq!(section.rows.len(), 2);
        assert_eq!(section.rows[1].cells, vec![Cell::text("wide").spanning(2)]);
    }

    #[test]
    fn builder_clamps_span_to_columns() {
        let mut builder = SectionBuilder::new(SectionKind::Header, 2);
        builder.push(Cell::title("x").spanning(5));
        let section = builder.build();

        assert_eq!(section.rows[0].cells[0].span, 2);
    }

    struct FlakyRenderer {
        fail_on: Option<SectionKind>,
        fail_begin: bool,
    }

    struct FlakyWriter {
        fail_on: Option<SectionKind>,
        written: Vec<u8>,
    }

    impl ReportRenderer for FlakyRenderer {
        fn content_type(&self) -> &'static str {
            "test/plain"
        }

        fn begin(&self, _info: &DocumentInfo) -> ReportResult<Box<dyn SectionWriter>> {
            if self.fail_begin {
                return Err(ReportError::Render("no fonts".into()));
            }
            Ok(Box::new(FlakyWriter {
                fail_on: self.fail_on,
                written: Vec::new(),
            }))
        }
    }

    impl SectionWriter for FlakyWriter {
        fn write_section(&mut self, section: &Section) -> ReportResult<()> {
            if Some(section.kind) == self.fail_on {
                return Err(ReportError::Render("boom".into()));
            }
            self.written.push(b'#');
            Ok(())
        }

        fn finish(self: Box<Self>) -> ReportResult<Vec<u8>> {
            Ok(self.written)
        }
    }

    fn report() -> Report {
        let section = |kind| SectionBuilder::new(kind, 1).build();
        Report {
            info: DocumentInfo {
                title: "t".into(),
                author: "a".into(),
            },
            sections: vec![
                section(SectionKind::Header),
                section(SectionKind::PatientInfo),
                section(SectionKind::Vitals),
            ],
        }
    }

    #[test]
    fn best_effort_renders_everything_when_nothing_fails() {
        let renderer = FlakyRenderer {
            fail_on: None,
            fail_begin: false,
        };
        let rendered = render_best_effort(&renderer, &report());

        assert!(rendered.complete);
        assert_eq!(rendered.bytes, b"###");
        assert_eq!(rendered.content_type, "test/plain");
    }

    #[test]
    fn best_effort_keeps_partial_output() {
        let renderer = FlakyRenderer {
            fail_on: Some(SectionKind::PatientInfo),
            fail_begin: false,
        };
        let rendered = render_best_effort(&renderer, &report());

        assert!(!rendered.complete);
        assert_eq!(rendered.bytes, b"#");
    }

    #[test]
    fn best_effort_returns_empty_output_when_document_cannot_start() {
        let renderer = FlakyRenderer {
            fail_on: None,
            fail_begin: true,
        };
        let rendered = render_best_effort(&renderer, &report());

        assert!(!rendered.complete);
        assert!(rendered.bytes.is_empty());
    }
}
