//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    A4_HEIGHT_MM, A4_WIDTH_MM, DEFAULT_DATA_DIR, DEFAULT_FETCH_TIMEOUT_SECS, ENCOUNTERS_DIR_NAME,
    PAGE_MARGIN_PT,
};
use crate::{ReportError, ReportResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Physical page geometry used by paginated renderers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_pt: f32,
}

impl PageLayout {
    /// A4 portrait with the standard report margins.
    pub fn a4() -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            margin_pt: PAGE_MARGIN_PT,
        }
    }

    /// Margin converted to millimetres.
    pub fn margin_mm(&self) -> f32 {
        self.margin_pt * 25.4 / 72.0
    }

    /// Printable width between the left and right margins.
    pub fn content_width_mm(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm()
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    fetch_timeout: Duration,
    page: PageLayout,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` if the fetch timeout is zero or the page margins leave
    /// no printable area.
    pub fn new(data_dir: PathBuf, fetch_timeout: Duration, page: PageLayout) -> ReportResult<Self> {
        if fetch_timeout.is_zero() {
            return Err(ReportError::InvalidInput(
                "fetch timeout must be greater than zero".into(),
            ));
        }

        if page.content_width_mm() <= 0.0 || page.height_mm <= 2.0 * page.margin_mm() {
            return Err(ReportError::InvalidInput(
                "page margins leave no printable area".into(),
            ));
        }

        Ok(Self {
            data_dir,
            fetch_timeout,
            page,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn encounters_dir(&self) -> PathBuf {
        self.data_dir.join(ENCOUNTERS_DIR_NAME)
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn page(&self) -> PageLayout {
        self.page
    }
}

/// Resolve the encounter data directory without reading environment variables.
///
/// If `override_dir` is provided it must be an existing directory. Otherwise the default
/// `encounter_data/` directory relative to the current working directory is used.
///
/// # Errors
///
/// Returns `ReportError::InvalidInput` if the chosen directory does not exist.
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> ReportResult<PathBuf> {
    let candidate = override_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    if candidate.is_dir() {
        return Ok(candidate);
    }

    Err(ReportError::InvalidInput(format!(
        "encounter data directory does not exist: {}",
        candidate.display()
    )))
}

/// Parse the fetch timeout from an optional string value holding whole seconds.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn fetch_timeout_from_env_value(value: Option<String>) -> ReportResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
    };

    let secs = value.parse::<u64>().map_err(|_| {
        ReportError::InvalidInput(format!("fetch timeout is not a whole number of seconds: {value}"))
    })?;

    if secs == 0 {
        return Err(ReportError::InvalidInput(
            "fetch timeout must be greater than zero".into(),
        ));
    }

    Ok(Duration::from_secs(secs))
}
