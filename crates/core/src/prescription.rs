//! Dispensed prescriptions.
//!
//! [`PrescriptionRecord`] mirrors how a prescription is stored (with its medication,
//! administration and inventory rows attached); [`PrescriptionItem`] is the flattened shape the
//! report works with.

/// How a medication is administered, for example "BID" with a daily modifier of 2.
#[derive(Clone, Debug, PartialEq)]
pub struct AdministrationRecord {
    pub id: u32,
    pub name: String,
    pub daily_modifier: Option<f32>,
}

/// One active ingredient of a medication, for example "ibuprofen 200 mg".
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveIngredient {
    pub name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub is_denominator: bool,
}

/// A medication known to the formulary.
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationRecord {
    pub id: u32,
    pub name: String,
    pub form: Option<String>,
    pub active_ingredients: Vec<ActiveIngredient>,
}

/// Stock of a medication at the dispensing site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryRecord {
    pub quantity_current: u32,
    pub quantity_initial: u32,
}

/// A prescription as stored, with its related rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrescriptionRecord {
    pub id: u32,
    pub name: String,
    /// Name of the medication this prescription replaced, if the pharmacist swapped it.
    pub original_medication_name: Option<String>,
    pub prescriber_first_name: Option<String>,
    pub prescriber_last_name: Option<String>,
    pub administration: Option<AdministrationRecord>,
    pub amount: Option<u32>,
    pub medication: Option<MedicationRecord>,
    /// Free-text medication name for prescriptions written without a formulary entry.
    pub medication_name: Option<String>,
    pub inventory: Option<InventoryRecord>,
    pub counseled: Option<bool>,
}

/// Flattened prescription used by reports.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrescriptionItem {
    pub id: u32,
    pub name: String,
    pub original_medication_name: Option<String>,
    pub prescriber_first_name: Option<String>,
    pub prescriber_last_name: Option<String>,
    pub administration_id: Option<u32>,
    pub administration_name: Option<String>,
    pub administration_modifier: Option<f32>,
    amount: Option<u32>,
    pub medication_id: Option<u32>,
    pub medication_name: Option<String>,
    pub medication_form: Option<String>,
    medication_remaining: Option<u32>,
    pub medication_active_drugs: Vec<ActiveIngredient>,
    pub counseled: Option<bool>,
}

impl PrescriptionItem {
    /// A prescription that carries nothing but a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Flattens a stored prescription.
    ///
    /// Blank prescriber names are dropped, administration and medication details are copied only
    /// when the related rows exist, and the remaining stock is taken from the inventory row.
    pub fn from_record(record: PrescriptionRecord) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let mut item = Self {
            id: record.id,
            name: record.name,
            original_medication_name: record.original_medication_name,
            prescriber_first_name: non_blank(record.prescriber_first_name),
            prescriber_last_name: non_blank(record.prescriber_last_name),
            amount: record.amount,
            medication_name: record.medication_name,
            counseled: record.counseled,
            ..Self::default()
        };

        if let Some(administration) = record.administration {
            item.administration_id = Some(administration.id);
            item.administration_name = Some(administration.name);
            item.administration_modifier = administration.daily_modifier;
        }

        if let Some(medication) = record.medication {
            item.medication_id = Some(medication.id);
            item.medication_form = medication.form;
            item.medication_active_drugs = medication.active_ingredients;
            item.medication_remaining = record.inventory.map(|inv| inv.quantity_current);
        }

        item
    }

    /// Amount prescribed, zero when unknown.
    pub fn amount(&self) -> u32 {
        self.amount.unwrap_or(0)
    }

    /// Stock left after dispensing, zero when unknown.
    pub fn medication_remaining(&self) -> u32 {
        self.medication_remaining.unwrap_or(0)
    }

    /// True when the pharmacist replaced the originally prescribed medication.
    pub fn was_replaced(&self) -> bool {
        self.original_medication_name.is_some()
    }

    pub fn prescriber_full_name(&self) -> Option<String> {
        match (&self.prescriber_first_name, &self.prescriber_last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ibuprofen() -> MedicationRecord {
        MedicationRecord {
            id: 12,
            name: "Ibuprofen".into(),
            form: Some("tablet".into()),
            active_ingredients: vec![ActiveIngredient {
                name: "ibuprofen".into(),
                value: Some(200.0),
                unit: Some("mg".into()),
                is_denominator: false,
            }],
        }
    }

    #[test]
    fn named_item_defaults_counts_to_zero() {
        let item = PrescriptionItem::named("Amoxicillin");
        assert_eq!(item.name, "Amoxicillin");
        assert_eq!(item.amount(), 0);
        assert_eq!(item.medication_remaining(), 0);
        assert!(!item.was_replaced());
    }

    #[test]
    fn from_record_copies_related_rows() {
        let item = PrescriptionItem::from_record(PrescriptionRecord {
            id: 3,
            name: "Ibuprofen".into(),
            prescriber_first_name: Some("Ana".into()),
            prescriber_last_name: Some("Diaz".into()),
            administration: Some(AdministrationRecord {
                id: 2,
                name: "BID".into(),
                daily_modifier: Some(2.0),
            }),
            amount: Some(30),
            medication: Some(ibuprofen()),
            inventory: Some(InventoryRecord {
                quantity_current: 70,
                quantity_initial: 100,
            }),
            counseled: Some(true),
            ..PrescriptionRecord::default()
        });

        assert_eq!(item.id, 3);
        assert_eq!(item.administration_name.as_deref(), Some("BID"));
        assert_eq!(item.administration_modifier, Some(2.0));
        assert_eq!(item.amount(), 30);
        assert_eq!(item.medication_id, Some(12));
        assert_eq!(item.medication_form.as_deref(), Some("tablet"));
        assert_eq!(item.medication_remaining(), 70);
        assert_eq!(item.medication_active_drugs.len(), 1);
        assert_eq!(item.counseled, Some(true));
        assert_eq!(item.prescriber_full_name().as_deref(), Some("Ana Diaz"));
    }

    #[test]
    fn blank_prescriber_names_are_dropped() {
        let item = PrescriptionItem::from_record(PrescriptionRecord {
            name: "Paracetamol".into(),
            prescriber_first_name: Some("   ".into()),
            prescriber_last_name: Some("Diaz".into()),
            ..PrescriptionRecord::default()
        });

        assert_eq!(item.prescriber_first_name, None);
        assert_eq!(item.prescriber_full_name().as_deref(), Some("Diaz"));
    }

    #[test]
    fn inventory_without_medication_is_ignored() {
        let item = PrescriptionItem::from_record(PrescriptionRecord {
            name: "Custom syrup".into(),
            medication_name: Some("Custom syrup".into()),
            inventory: Some(InventoryRecord {
                quantity_current: 5,
                quantity_initial: 5,
            }),
            ..PrescriptionRecord::default()
        });

        assert_eq!(item.medication_id, None);
        assert_eq!(item.medication_remaining(), 0);
        assert_eq!(item.medication_name.as_deref(), Some("Custom syrup"));
    }

    #[test]
    fn replacement_keeps_original_name() {
        let item = PrescriptionItem::from_record(PrescriptionRecord {
            name: "Naproxen".into(),
            original_medication_name: Some("Ibuprofen".into()),
            ..PrescriptionRecord::default()
        });

        assert!(item.was_replaced());
        assert_eq!(item.original_medication_name.as_deref(), Some("Ibuprofen"));
    }
}
