//! Report generation service.
//!
//! [`ReportService`] ties the pipeline together for one encounter: fetch a snapshot from the
//! configured [`EncounterSource`], compose the report and render it in the requested format.
//! The service is synchronous; async callers run it on a blocking thread.

use crate::config::CoreConfig;
use crate::report::{
    compose, render_best_effort, PdfRenderer, RenderedReport, Report, ReportRenderer,
    TextRenderer,
};
use crate::snapshot::{fetch_snapshot, EncounterSnapshot, EncounterSource};
use crate::store::YamlEncounterSource;
use crate::{ReportError, ReportResult};
use chrono::{NaiveDate, Utc};
use femr_types::EncounterId;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Output format of a generated report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Pdf,
    Text,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Text => "text",
        }
    }

    /// Renderer producing this format.
    pub fn renderer(self, cfg: &CoreConfig) -> Box<dyn ReportRenderer> {
        match self {
            ReportFormat::Pdf => Box::new(PdfRenderer::new(cfg.page())),
            ReportFormat::Text => Box::new(TextRenderer),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(ReportError::InvalidInput(format!(
                "unknown report format: {other}"
            ))),
        }
    }
}

/// Custom categories and chief complaints recorded on an encounter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSummary {
    pub custom_categories: Vec<String>,
    pub complaint_scopes: Vec<String>,
}

/// Generates encounter reports.
#[derive(Clone)]
pub struct ReportService {
    cfg: Arc<CoreConfig>,
    source: Arc<dyn EncounterSource>,
}

impl ReportService {
    pub fn new(cfg: Arc<CoreConfig>, source: Arc<dyn EncounterSource>) -> Self {
        Self { cfg, source }
    }

    /// A service reading encounters from the YAML files under the configured data directory.
    pub fn with_yaml_store(cfg: Arc<CoreConfig>) -> Self {
        let source = Arc::new(YamlEncounterSource::new(&cfg));
        Self::new(cfg, source)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn snapshot(&self, encounter_id: EncounterId) -> ReportResult<EncounterSnapshot> {
        fetch_snapshot(self.source.as_ref(), encounter_id)
    }

    /// Fetches and composes the report without rendering it.
    pub fn compose(&self, encounter_id: EncounterId, today: NaiveDate) -> ReportResult<Report> {
        let snapshot = self.snapshot(encounter_id)?;
        Ok(compose(&snapshot, today))
    }

    /// Generates the report for `encounter_id` in `format`.
    ///
    /// # Errors
    ///
    /// Fetch failures and malformed tab fields are returned as errors. Rendering failures are
    /// not: they are logged and the partial document is returned with `complete == false`.
    pub fn generate(
        &self,
        encounter_id: EncounterId,
        format: ReportFormat,
    ) -> ReportResult<RenderedReport> {
        tracing::info!(%encounter_id, %format, "generating encounter report");

        let report = self.compose(encounter_id, Utc::now().date_naive())?;
        let renderer = format.renderer(&self.cfg);
        let rendered = render_best_effort(renderer.as_ref(), &report);

        if rendered.complete {
            tracing::info!(
                %encounter_id,
                bytes = rendered.bytes.len(),
                "encounter report generated"
            );
        } else {
            tracing::warn!(
                %encounter_id,
                bytes = rendered.bytes.len(),
                "encounter report is incomplete"
            );
        }

        Ok(rendered)
    }

    /// Lists the custom categories and chief complaints of an encounter.
    pub fn fields(&self, encounter_id: EncounterId) -> ReportResult<FieldSummary> {
        let snapshot = self.snapshot(encounter_id)?;
        Ok(FieldSummary {
            custom_categories: snapshot.observations.custom_categories().to_vec(),
            complaint_scopes: snapshot.observations.complaint_scopes().to_vec(),
        })
    }
}
