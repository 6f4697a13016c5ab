//! Constants used throughout the fEMR core crate.
//!
//! This module contains the file names, layout values and display strings used by report
//! generation so they stay consistent across the codebase.

/// Default directory for encounter data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "encounter_data";

/// Directory name (under the data directory) holding one folder per encounter.
pub const ENCOUNTERS_DIR_NAME: &str = "encounters";

/// Filename for patient demographics of an encounter.
pub const PATIENT_FILENAME: &str = "patient.yaml";

/// Filename for encounter stage names and timestamps.
pub const ENCOUNTER_FILENAME: &str = "encounter.yaml";

/// Filename for vitals recorded during an encounter.
pub const VITALS_FILENAME: &str = "vitals.yaml";

/// Filename for tab-field observations of an encounter.
pub const TAB_FIELDS_FILENAME: &str = "tab_fields.yaml";

/// Filename for dispensed prescriptions of an encounter.
pub const PRESCRIPTIONS_FILENAME: &str = "prescriptions.yaml";

/// Filename for the problem list of an encounter.
pub const PROBLEMS_FILENAME: &str = "problems.yaml";

/// Default upper bound for fetching a snapshot, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Placeholder rendered for any missing scalar value.
pub const NOT_AVAILABLE: &str = "N/A";

/// A4 page width in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;

/// A4 page height in millimetres.
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Page margin on every side, in points.
pub const PAGE_MARGIN_PT: f32 = 10.0;

/// Title of the first section of every report.
pub const REPORT_HEADING: &str = "Medical Record";

/// Document title stored in the report metadata.
pub const DOCUMENT_TITLE: &str = "Patient Report";

/// Author printed in the report page footer.
pub const DOCUMENT_AUTHOR: &str = "fEMR";

/// MIME type of PDF reports.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// MIME type of plain-text reports.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
