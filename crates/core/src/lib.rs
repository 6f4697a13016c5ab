//! # fEMR Core
//!
//! Core logic for fEMR encounter reports.
//!
//! This crate turns everything recorded during one patient encounter into a printable report:
//! - [`observation`]: resolving the most recent tab-field value per category and chief complaint
//! - [`snapshot`]: fetching every facet of an encounter from an [`EncounterSource`]
//! - [`report`]: composing section descriptors and rendering them as PDF or plain text
//! - [`store`]: a YAML-file backed [`EncounterSource`]
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.
//! Configuration is resolved by the binaries and passed in as a [`CoreConfig`].

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod observation;
pub mod patient;
pub mod prescription;
pub mod report;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod vitals;

pub use config::{CoreConfig, PageLayout};
pub use error::{ReportError, ReportResult};
pub use femr_types::EncounterId;
pub use observation::{Observation, ObservationKey, ObservationRecord, ObservationSet};
pub use report::RenderedReport;
pub use service::{FieldSummary, ReportFormat, ReportService};
pub use snapshot::{EncounterSnapshot, EncounterSource};
pub use store::YamlEncounterSource;
