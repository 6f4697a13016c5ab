//! Patient, encounter and problem items used by report generation.
//!
//! These are view-friendly shapes: every field is optional because any upstream record may be
//! incomplete, and the report prints "N/A" for what is missing.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Demographics of the patient seen in an encounter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatientItem {
    pub id: Option<u32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub height_feet: Option<u32>,
    pub height_inches: Option<u32>,
    /// Weight in pounds.
    pub weight: Option<f32>,
    pub city: Option<String>,
    pub address: Option<String>,
}

impl PatientItem {
    /// First and last name joined by a space, skipping blank parts.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Date of birth written out, for example "January 2, 1990".
    pub fn friendly_date_of_birth(&self) -> Option<String> {
        self.birth_date
            .map(|dob| dob.format("%B %-d, %Y").to_string())
    }

    /// Age on `reference`, in months below two years and in whole years otherwise.
    ///
    /// Returns `None` without a birth date or when the birth date is after `reference`.
    pub fn age_on(&self, reference: NaiveDate) -> Option<String> {
        let dob = self.birth_date?;

        let mut months = (reference.year() - dob.year()) * 12
            + (reference.month() as i32 - dob.month() as i32);
        if reference.day() < dob.day() {
            months -= 1;
        }

        match months {
            m if m < 0 => None,
            m if m < 24 => Some(format!("{m} months")),
            m => Some(format!("{} years", m / 12)),
        }
    }
}

/// Names and times of the three stages of an encounter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientEncounterItem {
    pub nurse_full_name: Option<String>,
    pub physician_full_name: Option<String>,
    pub pharmacist_full_name: Option<String>,
    pub triage_visit: Option<DateTime<Utc>>,
    pub medical_visit: Option<DateTime<Utc>>,
    pub pharmacy_visit: Option<DateTime<Utc>>,
}

impl PatientEncounterItem {
    /// An encounter is closed once both the medical and pharmacy stages have happened.
    pub fn is_closed(&self) -> bool {
        self.medical_visit.is_some() && self.pharmacy_visit.is_some()
    }

    /// Formats a stage time for display, for example "March 1, 2024 09:05".
    pub fn friendly_visit(visit: Option<DateTime<Utc>>) -> Option<String> {
        visit.map(|at| at.format("%B %-d, %Y %H:%M").to_string())
    }

    /// The date the encounter started, used as the reference for the patient's age.
    pub fn encounter_date(&self) -> Option<NaiveDate> {
        self.triage_visit
            .or(self.medical_visit)
            .or(self.pharmacy_visit)
            .map(|at| at.date_naive())
    }
}

/// A problem recorded on the encounter's problem list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProblemItem {
    pub name: String,
}

impl ProblemItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
