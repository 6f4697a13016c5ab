//! Snapshot to section descriptors.
//!
//! [`compose`] is pure: the same snapshot and reference date always give the same report.

use super::{Cell, DocumentInfo, Report, Section, SectionBuilder, SectionKind};
use crate::constants::{DOCUMENT_AUTHOR, DOCUMENT_TITLE, REPORT_HEADING};
use crate::format::{float_or_na, height_or_na, string_or_na, with_unit};
use crate::observation::{ObservationSet, StandardCategory};
use crate::patient::PatientEncounterItem;
use crate::snapshot::EncounterSnapshot;
use crate::vitals::VitalRow;
use chrono::NaiveDate;

/// Builds the report for `snapshot`.
///
/// `today` is the age reference used when the encounter carries no visit dates.
pub fn compose(snapshot: &EncounterSnapshot, today: NaiveDate) -> Report {
    let sections = vec![
        header(),
        patient_info(snapshot, today),
        encounter_info(&snapshot.encounter),
        vitals(snapshot),
        assessments(snapshot),
        chief_complaints(&snapshot.observations),
    ];

    Report {
        info: DocumentInfo {
            title: DOCUMENT_TITLE.to_owned(),
            author: DOCUMENT_AUTHOR.to_owned(),
        },
        sections,
    }
}

fn header() -> Section {
    let mut section = SectionBuilder::new(SectionKind::Header, 2);
    section.push(Cell::title(REPORT_HEADING).spanning(2));
    section.build()
}

fn patient_info(snapshot: &EncounterSnapshot, today: NaiveDate) -> Section {
    let patient = &snapshot.patient;
    let reference = snapshot.encounter.encounter_date().unwrap_or(today);
    let id = patient.id.map(|id| id.to_string());

    let mut section = SectionBuilder::new(SectionKind::PatientInfo, 3);
    section
        .push(Cell::field("Patient ID", string_or_na(id.as_deref())).spanning(3))
        .push(Cell::field("Name", string_or_na(patient.full_name().as_deref())))
        .push(Cell::field(
            "DOB",
            string_or_na(patient.friendly_date_of_birth().as_deref()),
        ))
        .push(Cell::field(
            "Age",
            string_or_na(patient.age_on(reference).as_deref()),
        ))
        .push(Cell::field("Sex", string_or_na(patient.sex.as_deref())))
        .push(Cell::field(
            "Height",
            height_or_na(patient.height_feet, patient.height_inches),
        ))
        .push(Cell::field(
            "Weight",
            with_unit(float_or_na(patient.weight), "lbs"),
        ))
        .push(Cell::field("City", string_or_na(patient.city.as_deref())))
        .push(Cell::field("Address", string_or_na(patient.address.as_deref())));
    section.build()
}

fn encounter_info(encounter: &PatientEncounterItem) -> Section {
    let visit = |at| string_or_na(PatientEncounterItem::friendly_visit(at).as_deref());
    let name = |n: &Option<String>| vec![string_or_na(n.as_deref())];

    let mut section =
        SectionBuilder::new(SectionKind::EncounterInfo, 3).heading("Encounter Information");
    section
        .push(Cell::stacked("Nurse", name(&encounter.nurse_full_name)))
        .push(Cell::stacked("Physician", name(&encounter.physician_full_name)))
        .push(Cell::stacked("Pharmacist", name(&encounter.pharmacist_full_name)))
        .push(Cell::stacked("Triage Visit", vec![visit(encounter.triage_visit)]))
        .push(Cell::stacked("Medical Visit", vec![visit(encounter.medical_visit)]))
        .push(Cell::stacked("Pharmacy Visit", vec![visit(encounter.pharmacy_visit)]));
    section.build()
}

fn vitals(snapshot: &EncounterSnapshot) -> Section {
    let mut section = SectionBuilder::new(SectionKind::Vitals, 3).heading("Patient Vitals");
    for row in VitalRow::ALL {
        section.push(Cell::stacked(row.label(), snapshot.vitals.row_values(row)));
    }
    section.build()
}

fn assessments(snapshot: &EncounterSnapshot) -> Section {
    let observations = &snapshot.observations;
    let mut section = SectionBuilder::new(SectionKind::Assessments, 3).heading("Assessments");

    for category in StandardCategory::ASSESSMENTS {
        let value = observations.standard_value(category, None);
        let value = string_or_na(Some(value.as_str()));
        section.push(Cell::field(category.label(), value).spanning(3));
    }

    for category in observations.custom_categories() {
        let value = observations.most_recent_or_empty(category, None);
        let value = string_or_na(Some(value.value()));
        section.push(Cell::field(category.as_str(), value).spanning(3));
    }

    section.push(Cell::bold("Dispensed Prescription(s):").spanning(3));
    if !snapshot.dispensed_prescriptions.is_empty() {
        section
            .push(Cell::bold("Original"))
            .push(Cell::bold("Replaced"))
            .complete_row();

        for prescription in &snapshot.dispensed_prescriptions {
            if prescription.was_replaced() {
                let original = prescription
                    .original_medication_name
                    .as_deref()
                    .unwrap_or_default();
                section.push(Cell::struck(original));
            }
            section
                .push(Cell::text(prescription.name.as_str()))
                .complete_row();
        }
    }

    let problems = snapshot
        .problems
        .iter()
        .map(|problem| format!(" - {}", problem.name))
        .collect();
    section.push(Cell::stacked("Problem(s)", problems).spanning(3));

    section.build()
}

fn chief_complaints(observations: &ObservationSet) -> Section {
    let mut section =
        SectionBuilder::new(SectionKind::ChiefComplaints, 2).heading("Chief Complaints");

    let scopes: Vec<Option<&str>> = if observations.complaint_scopes().is_empty() {
        vec![None]
    } else {
        observations
            .complaint_scopes()
            .iter()
            .map(|scope| Some(scope.as_str()))
            .collect()
    };

    for scope in scopes {
        section.push(Cell::field("Chief Complaint", string_or_na(scope)).spanning(2));

        for category in StandardCategory::COMPLAINT_FIELDS {
            let value = observations.standard_value(category, scope);
            let value = string_or_na(Some(value.as_str()));
            let cell = Cell::field(category.label(), value);
            match category {
                StandardCategory::PhysicalExamination | StandardCategory::Narrative => {
                    section.complete_row();
                    section.push(cell.spanning(2));
                }
                _ => {
                    section.push(cell);
                }
            }
        }
        section.complete_row();
    }

    section.build()
}
