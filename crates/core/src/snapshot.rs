//! Encounter snapshots.
//!
//! A snapshot is everything a report needs about one encounter, fetched up front from an
//! [`EncounterSource`]. Each facet is fetched independently: a facet the source has no data for
//! becomes an empty value, while a facet the source fails to fetch fails the whole snapshot.

use crate::observation::{ObservationRecord, ObservationSet};
use crate::patient::{PatientEncounterItem, PatientItem, ProblemItem};
use crate::prescription::PrescriptionItem;
use crate::vitals::{VitalMultiMap, VitalReading};
use crate::ReportResult;
use femr_types::EncounterId;

/// Upstream lookups a snapshot is built from.
///
/// `Ok(None)` or an empty collection means "no data" and is not an error. Implementations
/// report lookup failures as `ReportError::Fetch`.
pub trait EncounterSource: Send + Sync {
    fn patient(&self, encounter_id: EncounterId) -> ReportResult<Option<PatientItem>>;

    fn encounter(&self, encounter_id: EncounterId) -> ReportResult<Option<PatientEncounterItem>>;

    fn vitals(&self, encounter_id: EncounterId) -> ReportResult<Vec<VitalReading>>;

    fn tab_fields(&self, encounter_id: EncounterId) -> ReportResult<Vec<ObservationRecord>>;

    fn dispensed_prescriptions(
        &self,
        encounter_id: EncounterId,
    ) -> ReportResult<Vec<PrescriptionItem>>;

    fn problems(&self, encounter_id: EncounterId) -> ReportResult<Vec<ProblemItem>>;
}

/// Everything fetched for one encounter at report-generation time.
#[derive(Clone, Debug)]
pub struct EncounterSnapshot {
    pub encounter_id: EncounterId,
    pub patient: PatientItem,
    pub encounter: PatientEncounterItem,
    pub vitals: VitalMultiMap,
    pub observations: ObservationSet,
    pub dispensed_prescriptions: Vec<PrescriptionItem>,
    pub problems: Vec<ProblemItem>,
}

impl EncounterSnapshot {
    /// A snapshot with no data in any facet.
    pub fn empty(encounter_id: EncounterId) -> Self {
        Self {
            encounter_id,
            patient: PatientItem::default(),
            encounter: PatientEncounterItem::default(),
            vitals: VitalMultiMap::default(),
            observations: ObservationSet::default(),
            dispensed_prescriptions: Vec::new(),
            problems: Vec::new(),
        }
    }
}

/// Fetches every facet of an encounter from `source`.
///
/// # Errors
///
/// Returns the first `ReportError::Fetch` raised by the source, or
/// `ReportError::MalformedObservation` if the tab fields cannot be indexed.
pub fn fetch_snapshot(
    source: &dyn EncounterSource,
    encounter_id: EncounterId,
) -> ReportResult<EncounterSnapshot> {
    tracing::debug!(%encounter_id, "fetching encounter snapshot");

    let patient = source.patient(encounter_id)?.unwrap_or_else(|| {
        tracing::debug!(%encounter_id, "no patient found for encounter");
        PatientItem::default()
    });

    let encounter = source.encounter(encounter_id)?.unwrap_or_else(|| {
        tracing::debug!(%encounter_id, "no encounter stages found");
        PatientEncounterItem::default()
    });

    let vitals = VitalMultiMap::from_readings(source.vitals(encounter_id)?);
    let observations = ObservationSet::new(source.tab_fields(encounter_id)?)?;
    let dispensed_prescriptions = source.dispensed_prescriptions(encounter_id)?;
    let problems = source.problems(encounter_id)?;

    tracing::debug!(
        %encounter_id,
        observations = observations.len(),
        prescriptions = dispensed_prescriptions.len(),
        problems = problems.len(),
        "encounter snapshot fetched"
    );

    Ok(EncounterSnapshot {
        encounter_id,
        patient,
        encounter,
        vitals,
        observations,
        dispensed_prescriptions,
        problems,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ReportError;
    use chrono::{TimeZone, Utc};

    /// In-memory source used across the crate's tests.
    #[derive(Default)]
    pub(crate) struct FixedSource {
        pub patient: Option<PatientItem>,
        pub encounter: Option<PatientEncounterItem>,
        pub vitals: Vec<VitalReading>,
        pub tab_fields: Vec<ObservationRecord>,
        pub prescriptions: Vec<PrescriptionItem>,
        pub problems: Vec<ProblemItem>,
        pub failing_facet: Option<&'static str>,
    }

    impl FixedSource {
        fn check(&self, facet: &'static str, id: EncounterId) -> ReportResult<()> {
            if self.failing_facet == Some(facet) {
                return Err(ReportError::fetch(facet, id, "upstream unavailable"));
            }
            Ok(())
        }
    }

    impl EncounterSource for FixedSource {
        fn patient(&self, id: EncounterId) -> ReportResult<Option<PatientItem>> {
            self.check("patient", id)?;
            Ok(self.patient.clone())
        }

        fn encounter(&self, id: EncounterId) -> ReportResult<Option<PatientEncounterItem>> {
            self.check("encounter", id)?;
            Ok(self.encounter.clone())
        }

        fn vitals(&self, id: EncounterId) -> ReportResult<Vec<VitalReading>> {
            self.check("vitals", id)?;
            Ok(self.vitals.clone())
        }

        fn tab_fields(&self, id: EncounterId) -> ReportResult<Vec<ObservationRecord>> {
            self.check("tab fields", id)?;
            Ok(self.tab_fields.clone())
        }

        fn dispensed_prescriptions(&self, id: EncounterId) -> ReportResult<Vec<PrescriptionItem>> {
            self.check("prescriptions", id)?;
            Ok(self.prescriptions.clone())
        }

        fn problems(&self, id: EncounterId) -> ReportResult<Vec<ProblemItem>> {
            self.check("problems", id)?;
            Ok(self.problems.clone())
        }
    }

    pub(crate) fn encounter_id() -> EncounterId {
        EncounterId::new(7).unwrap()
    }

    #[test]
    fn missing_facets_become_empty_values() {
        let snapshot = fetch_snapshot(&FixedSource::default(), encounter_id()).unwrap();

        assert_eq!(snapshot.patient, PatientItem::default());
        assert_eq!(snapshot.encounter, PatientEncounterItem::default());
        assert!(snapshot.vitals.is_empty());
        assert!(snapshot.observations.is_empty());
        assert!(snapshot.dispensed_prescriptions.is_empty());
        assert!(snapshot.problems.is_empty());
    }

    #[test]
    fn partial_snapshot_keeps_present_facets() {
        let source = FixedSource {
            patient: Some(PatientItem {
                id: Some(4),
                ..PatientItem::default()
            }),
            problems: vec![ProblemItem::new("Hypertension")],
            ..FixedSource::default()
        };

        let snapshot = fetch_snapshot(&source, encounter_id()).unwrap();
        assert_eq!(snapshot.patient.id, Some(4));
        assert_eq!(snapshot.problems, vec![ProblemItem::new("Hypertension")]);
        assert!(snapshot.vitals.is_empty());
    }

    #[test]
    fn facet_failure_fails_the_snapshot() {
        let source = FixedSource {
            patient: Some(PatientItem::default()),
            failing_facet: Some("vitals"),
            ..FixedSource::default()
        };

        let err = fetch_snapshot(&source, encounter_id()).expect_err("vitals fail");
        assert!(err.is_fetch_failure());
        assert!(err.to_string().contains("vitals"));
    }

    #[test]
    fn malformed_tab_fields_fail_the_snapshot() {
        let source = FixedSource {
            tab_fields: vec![ObservationRecord {
                category: None,
                chief_complaint: None,
                value: Some("x".into()),
                recorded_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }],
            ..FixedSource::default()
        };

        let err = fetch_snapshot(&source, encounter_id()).expect_err("malformed");
        assert!(matches!(err, ReportError::MalformedObservation { .. }));
    }
}
