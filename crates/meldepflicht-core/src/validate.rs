//! Validation and completeness scoring of a generated accident report.
//!
//! Errors block submission (`is_valid = false`); warnings never do. Both are
//! plain messages prefixed with the `section.field` path they concern.

use serde::{Deserialize, Serialize};

use crate::dates;
use crate::form::{FieldValue, FormSections};
use crate::schema::{FORM_SCHEMA, FieldSpec, FieldType, SectionId, SectionSchema};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Share of schema-declared fields that are filled, `0..=100`.
    pub completeness_percent: u8,
}

/// Validate against the built-in accident report schema.
pub fn validate(sections: &FormSections) -> ValidationResult {
    validate_sections(sections, FORM_SCHEMA)
}

/// Validate against an explicit schema. Keys the schema does not declare are
/// ignored, including for the completeness score.
pub fn validate_sections(sections: &FormSections, schema: &[SectionSchema]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut total = 0usize;
    let mut filled = 0usize;

    for section in schema {
        for spec in section.fields {
            total += 1;
            let path = format!("{}.{}", section.id, spec.key);
            let value = sections.get(section.id, spec.key).filter(|v| v.is_filled());
            match value {
                Some(value) => {
                    filled += 1;
                    check_value(&path, spec, value, &mut errors);
                }
                None if spec.required => errors.push(format!("{path}: Pflichtfeld ist leer")),
                None => {}
            }
        }
    }

    let incapacity_claimed =
        sections.get(SectionId::Injury, "work_incapacity") == Some(&FieldValue::Bool(true));
    let days_missing = !sections
        .get(SectionId::Injury, "incapacity_days")
        .is_some_and(FieldValue::is_filled);
    if incapacity_claimed && days_missing {
        warnings.push(
            "injury.incapacity_days: Arbeitsunfähigkeit angegeben, aber keine Ausfalltage eingetragen"
                .to_string(),
        );
    }

    let completeness_percent = if total == 0 {
        0
    } else {
        (filled as f64 * 100.0 / total as f64).round() as u8
    };

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        completeness_percent,
    }
}

fn check_value(path: &str, spec: &FieldSpec, value: &FieldValue, errors: &mut Vec<String>) {
    if !value.fits(spec.field_type) {
        errors.push(format!("{path}: Wert vom Typ {} erwartet", spec.field_type.as_str()));
        return;
    }
    let Some(text) = value.as_text() else {
        return;
    };

    if let Some(max) = spec.max_length
        && text.chars().count() > max
    {
        errors.push(format!("{path}: länger als {max} Zeichen"));
    }

    if let Some(allowed) = spec.allowed_values
        && !allowed.contains(&text)
    {
        errors.push(format!(
            "{path}: unzulässiger Wert \"{text}\" (erlaubt: {})",
            allowed.join(", ")
        ));
    }

    if spec.field_type == FieldType::Date {
        if !dates::is_form_date_pattern(text) {
            errors.push(format!(
                "{path}: ungültiges Datumsformat \"{text}\" (erwartet TT.MM.JJJJ)"
            ));
        } else if dates::parse_form_date(text).is_none() {
            errors.push(format!("{path}: ungültiges Kalenderdatum \"{text}\""));
        }
    }
}
