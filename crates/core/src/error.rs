use femr_types::EncounterId;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An observation record that cannot be indexed (for example one without a category).
    ///
    /// This is a programmer error in whatever produced the records and is never retried.
    #[error("malformed observation at position {index}: {reason}")]
    MalformedObservation { index: usize, reason: String },

    #[error("failed to fetch {facet} for encounter {encounter_id}: {message}")]
    Fetch {
        facet: &'static str,
        encounter_id: EncounterId,
        message: String,
    },

    #[error("failed to render report: {0}")]
    Render(String),
}

impl ReportError {
    pub(crate) fn fetch(
        facet: &'static str,
        encounter_id: EncounterId,
        message: impl Into<String>,
    ) -> Self {
        Self::Fetch {
            facet,
            encounter_id,
            message: message.into(),
        }
    }

    /// True for failures reported by an upstream collaborator rather than by this crate.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
