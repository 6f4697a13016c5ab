//! Placeholder-aware formatting for report values.
//!
//! Missing or blank scalars are shown as "N/A" so that partially recorded encounters still
//! produce a complete report.

use crate::constants::NOT_AVAILABLE;

/// Returns the value, or "N/A" when it is absent or blank.
pub fn string_or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => NOT_AVAILABLE.to_owned(),
    }
}

/// Formats a height as `5' 10"`, or "N/A" when the feet are unknown.
///
/// Unknown inches with known feet are shown as zero inches.
pub fn height_or_na(feet: Option<u32>, inches: Option<u32>) -> String {
    match feet {
        Some(feet) => format!("{feet}' {}\"", inches.unwrap_or(0)),
        None => NOT_AVAILABLE.to_owned(),
    }
}

/// Formats a number without trailing zeros, or "N/A" when it is absent.
pub fn float_or_na(value: Option<f32>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v}"),
        _ => NOT_AVAILABLE.to_owned(),
    }
}

/// Appends a unit to a present value, leaving the placeholder untouched.
pub fn with_unit(value: String, unit: &str) -> String {
    if value == NOT_AVAILABLE {
        value
    } else {
        format!("{value} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_or_na_handles_blank_and_absent() {
        assert_eq!(string_or_na(None), "N/A");
        assert_eq!(string_or_na(Some("   ")), "N/A");
        assert_eq!(string_or_na(Some(" Leon ")), "Leon");
    }

    #[test]
    fn height_formats_feet_and_inches() {
        assert_eq!(height_or_na(Some(5), Some(10)), "5' 10\"");
        assert_eq!(height_or_na(Some(6), None), "6' 0\"");
        assert_eq!(height_or_na(None, Some(4)), "N/A");
    }

    #[test]
    fn floats_drop_trailing_zeros() {
        assert_eq!(float_or_na(Some(150.0)), "150");
        assert_eq!(float_or_na(Some(98.6)), "98.6");
        assert_eq!(float_or_na(None), "N/A");
        assert_eq!(float_or_na(Some(f32::NAN)), "N/A");
    }

    #[test]
    fn units_are_not_appended_to_placeholders() {
        assert_eq!(with_unit(float_or_na(Some(120.5)), "lbs"), "120.5 lbs");
        assert_eq!(with_unit(float_or_na(None), "lbs"), "N/A");
    }
}
