//! Tab-field observations and the "most recent value" resolver.
//!
//! Every free-text field captured during an encounter (medical history, assessment, the onset of
//! a chief complaint, ...) is stored as an [`Observation`]: a category name, an optional chief
//! complaint scope, a value and the time it was recorded. A field can be edited several times
//! during an encounter, so reports always show the most recent value per (category, scope).
//!
//! [`ObservationSet`] indexes one encounter's observations under an [`ObservationKey`] and
//! answers:
//! - the most recent observation for a key, or an empty placeholder when there is none
//! - the custom (non-standard) category names, in first-seen order
//! - the chief complaints, in first-seen order ([`ScopeCatalog`])
//!
//! Ties on the recorded timestamp are resolved in favour of the observation that appears later
//! in the source records.

use crate::{ReportError, ReportResult};
use chrono::{DateTime, Utc};
use femr_types::NonEmptyText;
use std::collections::{HashMap, HashSet};

/// Tab-field categories that have a fixed place in the report layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StandardCategory {
    MedicalSurgicalHistory,
    CurrentMedication,
    SocialHistory,
    Assessment,
    FamilyHistory,
    Treatment,
    Onset,
    Quality,
    Severity,
    Provokes,
    Palliates,
    TimeOfDay,
    Radiation,
    PhysicalExamination,
    Narrative,
}

impl StandardCategory {
    /// All standard categories in report order.
    pub const ALL: [StandardCategory; 15] = [
        StandardCategory::MedicalSurgicalHistory,
        StandardCategory::CurrentMedication,
        StandardCategory::SocialHistory,
        StandardCategory::Assessment,
        StandardCategory::FamilyHistory,
        StandardCategory::Treatment,
        StandardCategory::Onset,
        StandardCategory::Quality,
        StandardCategory::Severity,
        StandardCategory::Provokes,
        StandardCategory::Palliates,
        StandardCategory::TimeOfDay,
        StandardCategory::Radiation,
        StandardCategory::PhysicalExamination,
        StandardCategory::Narrative,
    ];

    /// Encounter-wide categories shown in the assessments section.
    pub const ASSESSMENTS: [StandardCategory; 6] = [
        StandardCategory::MedicalSurgicalHistory,
        StandardCategory::CurrentMedication,
        StandardCategory::SocialHistory,
        StandardCategory::Assessment,
        StandardCategory::FamilyHistory,
        StandardCategory::Treatment,
    ];

    /// Categories recorded per chief complaint.
    pub const COMPLAINT_FIELDS: [StandardCategory; 9] = [
        StandardCategory::Onset,
        StandardCategory::Quality,
        StandardCategory::Severity,
        StandardCategory::Provokes,
        StandardCategory::Palliates,
        StandardCategory::TimeOfDay,
        StandardCategory::Radiation,
        StandardCategory::PhysicalExamination,
        StandardCategory::Narrative,
    ];

    /// Name under which the category is stored.
    pub fn name(self) -> &'static str {
        match self {
            StandardCategory::MedicalSurgicalHistory => "medicalSurgicalHistory",
            StandardCategory::CurrentMedication => "currentMedication",
            StandardCategory::SocialHistory => "socialHistory",
            StandardCategory::Assessment => "assessment",
            StandardCategory::FamilyHistory => "familyHistory",
            StandardCategory::Treatment => "treatment",
            StandardCategory::Onset => "onset",
            StandardCategory::Quality => "quality",
            StandardCategory::Severity => "severity",
            StandardCategory::Provokes => "provokes",
            StandardCategory::Palliates => "palliates",
            StandardCategory::TimeOfDay => "timeOfDay",
            StandardCategory::Radiation => "radiation",
            StandardCategory::PhysicalExamination => "physicalExamination",
            StandardCategory::Narrative => "narrative",
        }
    }

    /// Label printed in front of the value in reports.
    pub fn label(self) -> &'static str {
        match self {
            StandardCategory::MedicalSurgicalHistory => "Medical Surgical History",
            StandardCategory::CurrentMedication => "Medication",
            StandardCategory::SocialHistory => "Social History",
            StandardCategory::Assessment => "Assessment",
            StandardCategory::FamilyHistory => "Family History",
            StandardCategory::Treatment => "Treatment",
            StandardCategory::Onset => "Onset",
            StandardCategory::Quality => "Quality",
            StandardCategory::Severity => "Severity",
            StandardCategory::Provokes => "Provokes",
            StandardCategory::Palliates => "Palliates",
            StandardCategory::TimeOfDay => "TimeOfDay",
            StandardCategory::Radiation => "Radiation",
            StandardCategory::PhysicalExamination => "Physical Examination",
            StandardCategory::Narrative => "Narrative",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Lookup key of the resolver: a category plus an optional chief complaint.
///
/// A missing scope is its own bucket; it never matches scoped observations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObservationKey {
    category: String,
    scope: Option<String>,
}

impl ObservationKey {
    /// Builds a key, trimming both parts and treating a blank scope as no scope.
    pub fn new(category: &str, scope: Option<&str>) -> Self {
        Self {
            category: category.trim().to_owned(),
            scope: scope
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// A tab-field record as supplied by an upstream collaborator, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationRecord {
    pub category: Option<String>,
    pub chief_complaint: Option<String>,
    pub value: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// One recorded tab-field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    category: String,
    scope: Option<String>,
    value: String,
    recorded_at: Option<DateTime<Utc>>,
}

impl Observation {
    /// Creates an observation from validated parts.
    pub fn new(
        category: NonEmptyText,
        scope: Option<NonEmptyText>,
        value: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category: category.as_str().to_owned(),
            scope: scope.map(|s| s.as_str().to_owned()),
            value: value.into(),
            recorded_at: Some(recorded_at),
        }
    }

    fn placeholder(key: ObservationKey) -> Self {
        Self {
            category: key.category,
            scope: key.scope,
            value: String::new(),
            recorded_at: None,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the value was recorded; `None` only for the empty placeholder.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.recorded_at
    }

    /// True for the placeholder returned when nothing was recorded.
    pub fn is_placeholder(&self) -> bool {
        self.recorded_at.is_none()
    }

    pub fn key(&self) -> ObservationKey {
        ObservationKey::new(&self.category, self.scope.as_deref())
    }
}

/// Distinct chief complaints of an encounter in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeCatalog {
    scopes: Vec<String>,
}

impl ScopeCatalog {
    pub fn as_slice(&self) -> &[String] {
        &self.scopes
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }
}

/// All observations of one encounter, indexed for "most recent value" lookups.
#[derive(Clone, Debug, Default)]
pub struct ObservationSet {
    observations: Vec<Observation>,
    index: HashMap<ObservationKey, Vec<usize>>,
    custom_categories: Vec<String>,
    complaints: ScopeCatalog,
}

impl ObservationSet {
    /// Validates and indexes raw records, keeping their order.
    ///
    /// Missing values become empty strings and blank chief complaints become encounter-wide.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::MalformedObservation` for a record without a category or with a
    /// blank one.
    pub fn new(records: Vec<ObservationRecord>) -> ReportResult<Self> {
        let observations = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let category = record
                    .category
                    .ok_or_else(|| ReportError::MalformedObservation {
                        index,
                        reason: "category is missing".into(),
                    })
                    .and_then(|c| {
                        NonEmptyText::new(c).map_err(|_| ReportError::MalformedObservation {
                            index,
                            reason: "category is blank".into(),
                        })
                    })?;
                let scope = record
                    .chief_complaint
                    .and_then(|c| NonEmptyText::new(c).ok());

                Ok(Observation::new(
                    category,
                    scope,
                    record.value.unwrap_or_default(),
                    record.recorded_at,
                ))
            })
            .collect::<ReportResult<Vec<_>>>()?;

        Ok(Self::from_observations(observations))
    }

    /// Indexes already-validated observations, keeping their order.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut index: HashMap<ObservationKey, Vec<usize>> = HashMap::new();
        let mut custom_categories = Vec::new();
        let mut seen_categories = HashSet::new();
        let mut scopes = Vec::new();
        let mut seen_scopes = HashSet::new();

        for (position, observation) in observations.iter().enumerate() {
            index.entry(observation.key()).or_default().push(position);

            let category = observation.category();
            if StandardCategory::from_name(category).is_none()
                && seen_categories.insert(category.to_owned())
            {
                custom_categories.push(category.to_owned());
            }

            if let Some(scope) = observation.scope() {
                if seen_scopes.insert(scope.to_owned()) {
                    scopes.push(scope.to_owned());
                }
            }
        }

        Self {
            observations,
            index,
            custom_categories,
            complaints: ScopeCatalog { scopes },
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    /// Most recent observation for `key`, if any.
    ///
    /// The greatest timestamp wins; among equal timestamps the one inserted last wins.
    pub fn most_recent(&self, key: &ObservationKey) -> Option<&Observation> {
        self.index
            .get(key)?
            .iter()
            .map(|&position| &self.observations[position])
            .enumerate()
            // position breaks timestamp ties
            .max_by_key(|(order, observation)| (observation.recorded_at, *order))
            .map(|(_, observation)| observation)
    }

    /// Most recent observation for `(category, scope)`, or an empty-valued placeholder.
    ///
    /// Never fails: report sections render blank rather than erroring on missing data.
    pub fn most_recent_or_empty(&self, category: &str, scope: Option<&str>) -> Observation {
        let key = ObservationKey::new(category, scope);
        match self.most_recent(&key) {
            Some(observation) => observation.clone(),
            None => Observation::placeholder(key),
        }
    }

    /// Convenience wrapper over [`Self::most_recent_or_empty`] for a standard category.
    pub fn standard_value(&self, category: StandardCategory, scope: Option<&str>) -> String {
        self.most_recent_or_empty(category.name(), scope).value
    }

    /// Category names outside the standard set, in first-seen order.
    pub fn custom_categories(&self) -> &[String] {
        &self.custom_categories
    }

    /// Distinct non-empty chief complaints, in first-seen order.
    pub fn complaint_scopes(&self) -> &[String] {
        self.complaints.as_slice()
    }

    pub fn scope_catalog(&self) -> &ScopeCatalog {
        &self.complaints
    }
}
