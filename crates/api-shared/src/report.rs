//! Report endpoint types.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string of the report endpoint.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `pdf` (default) or `text`.
    pub format: Option<String>,
}

/// Custom tab-field categories and chief complaints recorded on an encounter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EncounterFieldsRes {
    pub encounter_id: u32,
    pub custom_categories: Vec<String>,
    pub complaint_scopes: Vec<String>,
}
