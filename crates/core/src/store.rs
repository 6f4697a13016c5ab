//! File-backed encounter source.
//!
//! Each encounter lives in its own directory under the data directory:
//!
//! ```text
//! <data_dir>/encounters/<encounter_id>/
//!     patient.yaml
//!     encounter.yaml
//!     vitals.yaml
//!     tab_fields.yaml
//!     prescriptions.yaml
//!     problems.yaml
//! ```
//!
//! Every file is optional; a missing (or empty) file means the facet has no data. Files are
//! parsed against strict wire models (`deny_unknown_fields`) and parse failures report the path
//! of the offending field.

use crate::config::CoreConfig;
use crate::constants::{
    ENCOUNTER_FILENAME, PATIENT_FILENAME, PRESCRIPTIONS_FILENAME, PROBLEMS_FILENAME,
    TAB_FIELDS_FILENAME, VITALS_FILENAME,
};
use crate::observation::ObservationRecord;
use crate::patient::{PatientEncounterItem, PatientItem, ProblemItem};
use crate::prescription::{
    ActiveIngredient, AdministrationRecord, InventoryRecord, MedicationRecord, PrescriptionItem,
    PrescriptionRecord,
};
use crate::snapshot::EncounterSource;
use crate::vitals::VitalReading;
use crate::{ReportError, ReportResult};
use chrono::{DateTime, NaiveDate, Utc};
use femr_types::EncounterId;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads encounter facets from per-encounter YAML files.
#[derive(Clone, Debug)]
pub struct YamlEncounterSource {
    encounters_dir: PathBuf,
}

impl YamlEncounterSource {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self::with_dir(cfg.encounters_dir())
    }

    /// Uses `encounters_dir` directly as the parent of the per-encounter directories.
    pub fn with_dir(encounters_dir: impl Into<PathBuf>) -> Self {
        Self {
            encounters_dir: encounters_dir.into(),
        }
    }

    pub fn encounter_dir(&self, encounter_id: EncounterId) -> PathBuf {
        self.encounters_dir.join(encounter_id.to_string())
    }

    /// Reads and parses one facet file.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the file does not exist or holds no document.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Fetch` if the file cannot be read or does not match the wire model.
    fn read_facet<W: DeserializeOwned>(
        &self,
        encounter_id: EncounterId,
        facet: &'static str,
        filename: &str,
    ) -> ReportResult<Option<W>> {
        let path = self.encounter_dir(encounter_id).join(filename);

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(%encounter_id, facet, "no {} on disk", filename);
                return Ok(None);
            }
            Err(e) => {
                return Err(ReportError::fetch(
                    facet,
                    encounter_id,
                    format!("failed to read {}: {e}", path.display()),
                ))
            }
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        parse_yaml(&contents, &path)
            .map(Some)
            .map_err(|message| ReportError::fetch(facet, encounter_id, message))
    }
}

/// Parses YAML text into a wire model, naming the failing field path on mismatch.
fn parse_yaml<W: DeserializeOwned>(yaml_text: &str, path: &Path) -> Result<W, String> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    serde_path_to_error::deserialize::<_, W>(deserializer).map_err(|err| {
        let field = err.path().to_string();
        let source = err.into_inner();
        let field = if field.is_empty() || field == "." {
            "<root>"
        } else {
            field.as_str()
        };
        format!("{} schema mismatch at {field}: {source}", path.display())
    })
}

impl EncounterSource for YamlEncounterSource {
    fn patient(&self, encounter_id: EncounterId) -> ReportResult<Option<PatientItem>> {
        let wire: Option<PatientWire> = self.read_facet(encounter_id, "patient", PATIENT_FILENAME)?;
        Ok(wire.map(PatientItem::from))
    }

    fn encounter(&self, encounter_id: EncounterId) -> ReportResult<Option<PatientEncounterItem>> {
        let wire: Option<EncounterWire> =
            self.read_facet(encounter_id, "encounter", ENCOUNTER_FILENAME)?;
        Ok(wire.map(PatientEncounterItem::from))
    }

    fn vitals(&self, encounter_id: EncounterId) -> ReportResult<Vec<VitalReading>> {
        let wire: Option<Vec<VitalWire>> =
            self.read_facet(encounter_id, "vitals", VITALS_FILENAME)?;
        Ok(wire
            .unwrap_or_default()
            .into_iter()
            .map(|v| VitalReading {
                name: v.name,
                value: v.value,
                recorded_at: v.recorded_at,
            })
            .collect())
    }

    fn tab_fields(&self, encounter_id: EncounterId) -> ReportResult<Vec<ObservationRecord>> {
        let wire: Option<Vec<TabFieldWire>> =
            self.read_facet(encounter_id, "tab fields", TAB_FIELDS_FILENAME)?;
        Ok(wire
            .unwrap_or_default()
            .into_iter()
            .map(|t| ObservationRecord {
                category: t.category,
                chief_complaint: t.chief_complaint,
                value: t.value,
                recorded_at: t.recorded_at,
            })
            .collect())
    }

    fn dispensed_prescriptions(
        &self,
        encounter_id: EncounterId,
    ) -> ReportResult<Vec<PrescriptionItem>> {
        let wire: Option<Vec<PrescriptionWire>> =
            self.read_facet(encounter_id, "prescriptions", PRESCRIPTIONS_FILENAME)?;
        Ok(wire
            .unwrap_or_default()
            .into_iter()
            .map(|p| PrescriptionItem::from_record(p.into()))
            .collect())
    }

    fn problems(&self, encounter_id: EncounterId) -> ReportResult<Vec<ProblemItem>> {
        let wire: Option<Vec<ProblemWire>> =
            self.read_facet(encounter_id, "problems", PROBLEMS_FILENAME)?;
        Ok(wire
            .unwrap_or_default()
            .into_iter()
            .map(|p| ProblemItem::new(p.name))
            .collect())
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    birth_date: Option<NaiveDate>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    height_feet: Option<u32>,
    #[serde(default)]
    height_inches: Option<u32>,
    #[serde(default)]
    weight: Option<f32>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

impl From<PatientWire> for PatientItem {
    fn from(wire: PatientWire) -> Self {
        Self {
            id: wire.id,
            first_name: wire.first_name,
            last_name: wire.last_name,
            birth_date: wire.birth_date,
            sex: wire.sex,
            height_feet: wire.height_feet,
            height_inches: wire.height_inches,
            weight: wire.weight,
            city: wire.city,
            address: wire.address,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EncounterWire {
    #[serde(default)]
    nurse: Option<String>,
    #[serde(default)]
    physician: Option<String>,
    #[serde(default)]
    pharmacist: Option<String>,
    #[serde(default)]
    triage_visit: Option<DateTime<Utc>>,
    #[serde(default)]
    medical_visit: Option<DateTime<Utc>>,
    #[serde(default)]
    pharmacy_visit: Option<DateTime<Utc>>,
}

impl From<EncounterWire> for PatientEncounterItem {
    fn from(wire: EncounterWire) -> Self {
        Self {
            nurse_full_name: wire.nurse,
            physician_full_name: wire.physician,
            pharmacist_full_name: wire.pharmacist,
            triage_visit: wire.triage_visit,
            medical_visit: wire.medical_visit,
            pharmacy_visit: wire.pharmacy_visit,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VitalWire {
    name: String,
    value: f32,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TabFieldWire {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    chief_complaint: Option<String>,
    #[serde(default)]
    value: Option<String>,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProblemWire {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrescriptionWire {
    id: u32,
    name: String,
    #[serde(default)]
    original_medication_name: Option<String>,
    #[serde(default)]
    prescriber_first_name: Option<String>,
    #[serde(default)]
    prescriber_last_name: Option<String>,
    #[serde(default)]
    administration: Option<AdministrationWire>,
    #[serde(default)]
    amount: Option<u32>,
    #[serde(default)]
    medication: Option<MedicationWire>,
    #[serde(default)]
    medication_name: Option<String>,
    #[serde(default)]
    inventory: Option<InventoryWire>,
    #[serde(default)]
    counseled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AdministrationWire {
    id: u32,
    name: String,
    #[serde(default)]
    daily_modifier: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MedicationWire {
    id: u32,
    name: String,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    active_ingredients: Vec<ActiveIngredientWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActiveIngredientWire {
    name: String,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    is_denominator: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InventoryWire {
    quantity_current: u32,
    quantity_initial: u32,
}

impl From<PrescriptionWire> for PrescriptionRecord {
    fn from(wire: PrescriptionWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            original_medication_name: wire.original_medication_name,
            prescriber_first_name: wire.prescriber_first_name,
            prescriber_last_name: wire.prescriber_last_name,
            administration: wire.administration.map(|a| AdministrationRecord {
                id: a.id,
                name: a.name,
                daily_modifier: a.daily_modifier,
            }),
            amount: wire.amount,
            medication: wire.medication.map(|m| MedicationRecord {
                id: m.id,
                name: m.name,
                form: m.form,
                active_ingredients: m
                    .active_ingredients
                    .into_iter()
                    .map(|i| ActiveIngredient {
                        name: i.name,
                        value: i.value,
                        unit: i.unit,
                        is_denominator: i.is_denominator,
                    })
                    .collect(),
            }),
            medication_name: wire.medication_name,
            inventory: wire.inventory.map(|i| InventoryRecord {
                quantity_current: i.quantity_current,
                quantity_initial: i.quantity_initial,
            }),
            counseled: wire.counseled,
        }
    }
}
