//! Vitals recorded over the course of an encounter.
//!
//! Vitals may be taken several times (at triage and again in the medical stage), so they are
//! kept per (vital name, time taken). Reports print one line per time taken, oldest first.

use crate::format::float_or_na;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// A single vital measurement as supplied by an upstream collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct VitalReading {
    pub name: String,
    pub value: f32,
    pub recorded_at: DateTime<Utc>,
}

/// Rows of the vitals section, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VitalRow {
    BloodPressure,
    Temperature,
    Glucose,
    HeartRate,
    RespiratoryRate,
    OxygenSaturation,
    WeeksPregnant,
}

impl VitalRow {
    pub const ALL: [VitalRow; 7] = [
        VitalRow::BloodPressure,
        VitalRow::Temperature,
        VitalRow::Glucose,
        VitalRow::HeartRate,
        VitalRow::RespiratoryRate,
        VitalRow::OxygenSaturation,
        VitalRow::WeeksPregnant,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VitalRow::BloodPressure => "Blood Pressure",
            VitalRow::Temperature => "Temperature",
            VitalRow::Glucose => "Glucose",
            VitalRow::HeartRate => "Heart Rate",
            VitalRow::RespiratoryRate => "Respiration Rate",
            VitalRow::OxygenSaturation => "Oxygen Saturation",
            VitalRow::WeeksPregnant => "Weeks Pregnant",
        }
    }

    /// Stored vital names backing this row.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            VitalRow::BloodPressure => &["bloodPressureSystolic", "bloodPressureDiastolic"],
            VitalRow::Temperature => &["temperature"],
            VitalRow::Glucose => &["glucose"],
            VitalRow::HeartRate => &["heartRate"],
            VitalRow::RespiratoryRate => &["respiratoryRate"],
            VitalRow::OxygenSaturation => &["oxygenSaturation"],
            VitalRow::WeeksPregnant => &["weeksPregnant"],
        }
    }
}

/// Vitals of one encounter keyed by time taken and vital name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VitalMultiMap {
    by_date: BTreeMap<DateTime<Utc>, HashMap<String, f32>>,
}

impl VitalMultiMap {
    /// Builds the map; a later reading for the same name and time replaces an earlier one.
    pub fn from_readings(readings: impl IntoIterator<Item = VitalReading>) -> Self {
        let mut by_date: BTreeMap<DateTime<Utc>, HashMap<String, f32>> = BTreeMap::new();
        for reading in readings {
            by_date
                .entry(reading.recorded_at)
                .or_default()
                .insert(reading.name, reading.value);
        }
        Self { by_date }
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Distinct times vitals were taken, oldest first.
    pub fn dates_chronological(&self) -> Vec<DateTime<Utc>> {
        self.by_date.keys().copied().collect()
    }

    pub fn get(&self, name: &str, date: DateTime<Utc>) -> Option<f32> {
        self.by_date.get(&date)?.get(name).copied()
    }

    /// Display value of a row at one time; blood pressure is `systolic/diastolic`.
    pub fn row_value(&self, row: VitalRow, date: DateTime<Utc>) -> String {
        row.keys()
            .iter()
            .map(|key| float_or_na(self.get(key, date)))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// One display value per recorded time for `row`, oldest first.
    pub fn row_values(&self, row: VitalRow) -> Vec<String> {
        self.by_date
            .keys()
            .map(|date| self.row_value(row, *date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn reading(name: &str, value: f32, hour: u32) -> VitalReading {
        VitalReading {
            name: name.into(),
            value,
            recorded_at: at(hour),
        }
    }

    #[test]
    fn dates_are_chronological_and_distinct() {
        let map = VitalMultiMap::from_readings(vec![
            reading("temperature", 37.5, 14),
            reading("heartRate", 80.0, 9),
            reading("temperature", 38.0, 9),
        ]);

        assert_eq!(map.dates_chronological(), vec![at(9), at(14)]);
    }

    #[test]
    fn blood_pressure_combines_both_sides() {
        let map = VitalMultiMap::from_readings(vec![
            reading("bloodPressureSystolic", 120.0, 9),
            reading("bloodPressureDiastolic", 80.0, 9),
            reading("bloodPressureSystolic", 135.0, 11),
        ]);

        assert_eq!(
            map.row_values(VitalRow::BloodPressure),
            vec!["120/80".to_string(), "135/N/A".to_string()]
        );
    }

    #[test]
    fn missing_vitals_show_placeholder_per_date() {
        let map = VitalMultiMap::from_readings(vec![
            reading("glucose", 90.0, 9),
            reading("temperature", 36.6, 12),
        ]);

        assert_eq!(
            map.row_values(VitalRow::Glucose),
            vec!["90".to_string(), "N/A".to_string()]
        );
        assert_eq!(map.row_value(VitalRow::Temperature, at(12)), "36.6");
    }

    #[test]
    fn heart_rate_reads_its_own_key() {
        let map = VitalMultiMap::from_readings(vec![
            reading("bloodPressureSystolic", 120.0, 9),
            reading("heartRate", 72.0, 9),
        ]);

        assert_eq!(map.row_value(VitalRow::HeartRate, at(9)), "72");
    }

    #[test]
    fn later_reading_replaces_duplicate() {
        let map = VitalMultiMap::from_readings(vec![
            reading("oxygenSaturation", 95.0, 9),
            reading("oxygenSaturation", 97.0, 9),
        ]);

        assert_eq!(map.get("oxygenSaturation", at(9)), Some(97.0));
    }

    #[test]
    fn empty_map_has_no_rows() {
        let map = VitalMultiMap::default();
        assert!(map.is_empty());
        assert!(map.row_values(VitalRow::WeeksPregnant).is_empty());
    }
}
