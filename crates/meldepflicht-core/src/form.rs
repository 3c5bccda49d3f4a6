//! Mapping of incident and organization records onto the accident report.
//!
//! [`FormMapper::generate`] never fails. Missing input data becomes empty
//! fields (or a documented default), validation problems are reported in the
//! attached [`ValidationResult`], and internal faults produce an error-flagged
//! form with empty sections.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::carrier::{CARRIERS, Carrier, identify_in};
use crate::dates::to_form_date;
use crate::error::FormError;
use crate::evaluator::Determination;
use crate::incident::{IncidentRecord, Organization};
use crate::schema::{self, FORM_SEVERITY_LEVELS, FieldType, SectionId};
use crate::validate::{ValidationResult, validate};

/// A leaf value of the report. Never nested, so renderers can treat every
/// field uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl FieldValue {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// A text value is filled when its trimmed form is non-empty; booleans and
    /// numbers are always filled.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value may be stored in a field of the given type. An empty
    /// text is accepted everywhere and stands for "not filled in".
    pub fn fits(&self, field_type: FieldType) -> bool {
        match (self, field_type) {
            (Self::Text(s), _) if s.trim().is_empty() => true,
            (Self::Text(_), FieldType::String | FieldType::Date) => true,
            (Self::Bool(_), FieldType::Boolean) => true,
            (Self::Number(_), FieldType::Number) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("ja"),
            Self::Bool(false) => f.write_str("nein"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Option<u32>> for FieldValue {
    fn from(value: Option<u32>) -> Self {
        value.map_or_else(Self::empty, Self::from)
    }
}

pub type Section = BTreeMap<String, FieldValue>;

/// Section name → field key → value, in form order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSections(BTreeMap<SectionId, Section>);

impl FormSections {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.0.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.0.iter().map(|(id, section)| (*id, section))
    }

    pub fn get(&self, section: SectionId, key: &str) -> Option<&FieldValue> {
        self.0.get(&section)?.get(key)
    }

    /// Text content of a field, or `""` when absent or not text.
    pub fn text(&self, section: SectionId, key: &str) -> &str {
        self.get(section, key)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
    }

    /// Store a value in a schema-declared field.
    pub fn set(
        &mut self,
        section: SectionId,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        let spec = schema::field_spec(section, key).ok_or_else(|| FormError::UnknownField {
            section,
            key: key.to_string(),
        })?;
        let value = value.into();
        if !value.fits(spec.field_type) {
            return Err(FormError::TypeMismatch {
                section,
                key: key.to_string(),
                expected: spec.field_type.as_str(),
            });
        }
        self.0
            .entry(section)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Append a line to a text field, creating it if needed.
    pub fn append_text(&mut self, section: SectionId, key: &str, line: &str) -> Result<(), FormError> {
        let current = self.text(section, key);
        let combined = if current.trim().is_empty() {
            line.to_string()
        } else {
            format!("{current}\n{line}")
        };
        self.set(section, key, combined)
    }
}

/// Form configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormOptions {
    pub form_type: String,
    pub version: String,
    /// WZ 2008 code used when the organization record carries none.
    pub default_industry_code: String,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            form_type: "Unfallanzeige".to_string(),
            version: "2024.1".to_string(),
            default_industry_code: "96.09".to_string(),
        }
    }
}

impl FormOptions {
    pub fn from_json(json: &str) -> Result<Self, FormError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormHeader {
    pub form_type: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl FormHeader {
    fn new(options: &FormOptions, reference: Option<String>) -> Self {
        Self {
            form_type: options.form_type.clone(),
            version: options.version.clone(),
            generated_at: Utc::now(),
            reference,
        }
    }
}

/// A fully built accident report, or an error-flagged empty one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedForm {
    pub header: FormHeader,
    pub sections: FormSections,
    pub carrier: Option<&'static Carrier>,
    pub validation: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Determination>,
    /// Set when generation hit an internal fault; `sections` is then empty.
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GeneratedForm {
    fn failed(options: &FormOptions, message: String) -> Self {
        Self {
            header: FormHeader::new(options, None),
            sections: FormSections::default(),
            carrier: None,
            validation: ValidationResult {
                is_valid: false,
                errors: vec![message.clone()],
                warnings: Vec::new(),
                completeness_percent: 0,
            },
            compliance: None,
            error: true,
            message: Some(message),
        }
    }
}

/// Internal severity → form severity. Unlisted values map to the lowest level.
pub const SEVERITY_MAP: &[(&str, &str)] = &[
    ("minimal", "leicht"),
    ("low", "leicht"),
    ("medium", "mittel"),
    ("high", "schwer"),
    ("critical", "schwer"),
];

/// Internal incident type code → form label.
pub const INCIDENT_TYPE_MAP: &[(&str, &str)] = &[
    ("accident", "Arbeitsunfall"),
    ("work_accident", "Arbeitsunfall"),
    ("commuting_accident", "Wegeunfall"),
    ("occupational_disease", "Berufskrankheit"),
    ("near_miss", "Beinaheunfall"),
    ("environmental", "Umweltereignis"),
    ("property_damage", "Sachschaden"),
];

pub fn map_severity(internal: Option<&str>) -> &'static str {
    let internal = internal.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    SEVERITY_MAP
        .iter()
        .find(|(from, _)| *from == internal)
        .map(|(_, to)| *to)
        .unwrap_or(FORM_SEVERITY_LEVELS[0])
}

/// Known codes become form labels; anything else is kept verbatim for
/// validation to report.
pub fn map_incident_type(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let code = raw.trim().to_lowercase();
    INCIDENT_TYPE_MAP
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Best-effort split of a single free-text name into `(first, last)`.
///
/// The last whitespace-delimited token is the last name and everything before
/// it the first name. Approximate: multi-part surnames such as "van der Berg"
/// keep only "Berg" as last name.
pub fn split_reporter_name(name: &str) -> (String, String) {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    match tokens.pop() {
        Some(last) => (tokens.join(" "), last.to_string()),
        None => (String::new(), String::new()),
    }
}

fn text(value: &Option<String>) -> FieldValue {
    FieldValue::Text(value.clone().unwrap_or_default())
}

fn date(value: &Option<String>) -> FieldValue {
    FieldValue::Text(value.as_deref().map(to_form_date).unwrap_or_default())
}

/// Builds accident reports from incident and organization records.
#[derive(Debug, Clone)]
pub struct FormMapper {
    options: FormOptions,
    carriers: &'static [Carrier],
}

impl Default for FormMapper {
    fn default() -> Self {
        Self::new(FormOptions::default())
    }
}

impl FormMapper {
    pub fn new(options: FormOptions) -> Self {
        Self {
            options,
            carriers: CARRIERS,
        }
    }

    pub fn with_carriers(mut self, carriers: &'static [Carrier]) -> Self {
        self.carriers = carriers;
        self
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Build, amend and validate a report. Internal faults become an
    /// error-flagged form; check [`GeneratedForm::error`] before `validation`.
    pub fn generate(&self, incident: &IncidentRecord, organization: &Organization) -> GeneratedForm {
        match self.try_generate(incident, organization) {
            Ok(form) => {
                info!(
                    reference = form.header.reference.as_deref().unwrap_or("-"),
                    carrier = form.carrier.map_or("-", |c| c.code),
                    valid = form.validation.is_valid,
                    completeness = form.validation.completeness_percent,
                    "accident report generated"
                );
                form
            }
            Err(err) => {
                error!(error = %err, "accident report generation failed");
                GeneratedForm::failed(&self.options, err.to_string())
            }
        }
    }

    /// Like [`generate`](Self::generate), with a compliance determination attached.
    pub fn generate_with_compliance(
        &self,
        incident: &IncidentRecord,
        organization: &Organization,
        determination: Determination,
    ) -> GeneratedForm {
        let mut form = self.generate(incident, organization);
        if !form.error {
            form.compliance = Some(determination);
        }
        form
    }

    pub fn try_generate(
        &self,
        incident: &IncidentRecord,
        organization: &Organization,
    ) -> Result<GeneratedForm, FormError> {
        let mut sections = FormSections::default();
        self.map_organization(&mut sections, organization)?;
        map_affected_person(&mut sections, incident)?;
        map_incident(&mut sections, incident)?;
        map_injury(&mut sections, incident)?;
        map_reporting(&mut sections, incident)?;

        let carrier = organization
            .membership_number
            .as_deref()
            .and_then(|id| identify_in(self.carriers, id));
        if let Some(carrier) = carrier {
            carrier.apply_amendments(&mut sections)?;
        }

        let validation = validate(&sections);
        Ok(GeneratedForm {
            header: FormHeader::new(&self.options, incident.id.clone()),
            sections,
            carrier,
            validation,
            compliance: None,
            error: false,
            message: None,
        })
    }

    fn map_organization(&self, s: &mut FormSections, org: &Organization) -> Result<(), FormError> {
        use SectionId::Organization as O;
        let industry_code = org
            .industry_code
            .clone()
            .unwrap_or_else(|| self.options.default_industry_code.clone());

        s.set(O, "name", text(&org.name))?;
        s.set(O, "street", text(&org.street))?;
        s.set(O, "postal_code", text(&org.postal_code))?;
        s.set(O, "city", text(&org.city))?;
        s.set(O, "membership_number", text(&org.membership_number))?;
        s.set(O, "industry_code", industry_code)?;
        s.set(O, "employee_count", org.employee_count)?;
        s.set(O, "contact_person", text(&org.contact_person))?;
        s.set(O, "phone", text(&org.phone))?;
        Ok(())
    }
}

fn map_affected_person(s: &mut FormSections, incident: &IncidentRecord) -> Result<(), FormError> {
    use SectionId::AffectedPerson as P;
    let Some(person) = &incident.affected_person else {
        let (first, last) = split_reporter_name(incident.reporter_name.as_deref().unwrap_or_default());
        s.set(P, "last_name", last)?;
        s.set(P, "first_name", first)?;
        for key in [
            "birth_date",
            "gender",
            "nationality",
            "street",
            "postal_code",
            "city",
            "job_title",
            "employed_since",
            "employment_type",
        ] {
            s.set(P, key, FieldValue::empty())?;
        }
        s.set(P, "temporary_worker", false)?;
        return Ok(());
    };

    s.set(P, "last_name", text(&person.last_name))?;
    s.set(P, "first_name", text(&person.first_name))?;
    s.set(P, "birth_date", date(&person.birth_date))?;
    s.set(P, "gender", text(&person.gender))?;
    s.set(P, "nationality", text(&person.nationality))?;
    s.set(P, "street", text(&person.street))?;
    s.set(P, "postal_code", text(&person.postal_code))?;
    s.set(P, "city", text(&person.city))?;
    s.set(P, "job_title", text(&person.job_title))?;
    s.set(P, "employed_since", date(&person.employed_since))?;
    s.set(P, "employment_type", text(&person.employment_type))?;
    s.set(P, "temporary_worker", person.temporary_worker)?;
    Ok(())
}

fn map_incident(s: &mut FormSections, incident: &IncidentRecord) -> Result<(), FormError> {
    use SectionId::Incident as I;
    let description = incident.description.as_ref().or(incident.title.as_ref());

    s.set(I, "date", date(&incident.date))?;
    s.set(I, "time", text(&incident.time))?;
    s.set(I, "location", text(&incident.location))?;
    s.set(I, "description", text(&description.cloned()))?;
    s.set(I, "incident_type", map_incident_type(incident.incident_type.as_deref()))?;
    s.set(I, "department", text(&incident.department))?;
    s.set(I, "equipment", text(&incident.equipment))?;
    s.set(I, "witnesses", incident.witnesses.join(", "))?;
    s.set(I, "affected_persons", incident.affected_persons_count)?;
    s.set(I, "hazardous_substance", text(&incident.hazardous_substance))?;
    s.set(I, "fatal", incident.fatality)?;
    Ok(())
}

fn map_injury(s: &mut FormSections, incident: &IncidentRecord) -> Result<(), FormError> {
    use SectionId::Injury as J;
    s.set(J, "body_part", text(&incident.body_part))?;
    s.set(J, "injury_type", text(&incident.injury_type))?;
    s.set(J, "severity", map_severity(incident.severity.as_deref()))?;
    s.set(J, "work_incapacity", incident.work_incapacity)?;
    s.set(J, "incapacity_days", incident.workdays_lost)?;
    s.set(J, "hospital_treatment", incident.hospital_treatment)?;
    s.set(J, "first_aid", incident.first_aid_provided)?;
    s.set(J, "treating_physician", text(&incident.treating_physician))?;
    Ok(())
}

fn map_reporting(s: &mut FormSections, incident: &IncidentRecord) -> Result<(), FormError> {
    use SectionId::Reporting as R;
    s.set(R, "report_date", date(&incident.reported_at))?;
    s.set(R, "reporter_name", text(&incident.reporter_name))?;
    s.set(R, "reporter_role", text(&incident.reporter_role))?;
    s.set(R, "reporter_phone", text(&incident.reporter_phone))?;
    s.set(R, "reporter_email", text(&incident.reporter_email))?;
    s.set(R, "reference_number", text(&incident.id))?;
    s.set(R, "remarks", FieldValue::empty())?;
    Ok(())
}
