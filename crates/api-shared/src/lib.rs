//! # API Shared
//!
//! Shared request and response types for the fEMR APIs.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - JSON bodies and query parameters of the report endpoints, with their OpenAPI schemas
//!
//! Used by `api-rest` and the workspace's `femr-run` binary.

pub mod health;
pub mod report;

pub use health::{HealthRes, HealthService};
pub use report::{EncounterFieldsRes, ReportQuery};
