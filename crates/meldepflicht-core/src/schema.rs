//! Field schema of the DGUV accident report ("Unfallanzeige").
//!
//! Five sections in fixed order, each a list of leaf fields. The schema is the
//! single source for required-field checks, format checks, allowed values and
//! the completeness score.

use serde::{Deserialize, Serialize};

/// Sections of the accident report, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Organization,
    AffectedPerson,
    Incident,
    Injury,
    Reporting,
}

impl SectionId {
    pub const ALL: [SectionId; 5] = [
        Self::Organization,
        Self::AffectedPerson,
        Self::Incident,
        Self::Injury,
        Self::Reporting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::AffectedPerson => "affected_person",
            Self::Incident => "incident",
            Self::Injury => "injury",
            Self::Reporting => "reporting",
        }
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Boolean,
    Number,
    /// Text constrained to `DD.MM.YYYY`.
    Date,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub key: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<&'static [&'static str]>,
}

impl FieldSpec {
    const fn new(key: &'static str, field_type: FieldType) -> Self {
        Self {
            key,
            required: false,
            max_length: None,
            field_type,
            allowed_values: None,
        }
    }

    const fn text(key: &'static str, max_length: usize) -> Self {
        Self::new(key, FieldType::String).max(max_length)
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn max(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = Some(values);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectionSchema {
    pub id: SectionId,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SectionSchema {
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Form-level severity vocabulary, lowest first.
pub const FORM_SEVERITY_LEVELS: &[&str] = &["leicht", "mittel", "schwer"];

pub const INCIDENT_TYPE_LABELS: &[&str] = &[
    "Arbeitsunfall",
    "Wegeunfall",
    "Berufskrankheit",
    "Beinaheunfall",
    "Umweltereignis",
    "Sachschaden",
];

const GENDERS: &[&str] = &["männlich", "weiblich", "divers"];

const EMPLOYMENT_TYPES: &[&str] = &[
    "Vollzeit",
    "Teilzeit",
    "Auszubildende(r)",
    "Leiharbeit",
    "Geringfügig beschäftigt",
];

use FieldType::{Boolean, Date, Number};

const ORGANIZATION: &[FieldSpec] = &[
    FieldSpec::text("name", 100).required(),
    FieldSpec::text("street", 100).required(),
    FieldSpec::text("postal_code", 10).required(),
    FieldSpec::text("city", 60).required(),
    FieldSpec::text("membership_number", 20).required(),
    FieldSpec::text("industry_code", 10).required(),
    FieldSpec::new("employee_count", Number),
    FieldSpec::text("contact_person", 100),
    FieldSpec::text("phone", 30),
];

const AFFECTED_PERSON: &[FieldSpec] = &[
    FieldSpec::text("last_name", 60).required(),
    FieldSpec::text("first_name", 60).required(),
    FieldSpec::new("birth_date", Date).required(),
    FieldSpec::new("gender", FieldType::String).one_of(GENDERS),
    FieldSpec::text("nationality", 60),
    FieldSpec::text("street", 100),
    FieldSpec::text("postal_code", 10),
    FieldSpec::text("city", 60),
    FieldSpec::text("job_title", 100),
    FieldSpec::new("employed_since", Date),
    FieldSpec::new("employment_type", FieldType::String).one_of(EMPLOYMENT_TYPES),
    FieldSpec::new("temporary_worker", Boolean),
];

const INCIDENT: &[FieldSpec] = &[
    FieldSpec::new("date", Date).required(),
    FieldSpec::text("time", 5).required(),
    FieldSpec::text("location", 200).required(),
    FieldSpec::text("description", 2000).required(),
    FieldSpec::new("incident_type", FieldType::String).one_of(INCIDENT_TYPE_LABELS),
    FieldSpec::text("department", 100),
    FieldSpec::text("equipment", 200),
    FieldSpec::text("witnesses", 500),
    FieldSpec::new("affected_persons", Number),
    FieldSpec::text("hazardous_substance", 200),
    FieldSpec::new("fatal", Boolean),
];

const INJURY: &[FieldSpec] = &[
    FieldSpec::text("body_part", 200).required(),
    FieldSpec::text("injury_type", 200).required(),
    FieldSpec::new("severity", FieldType::String).one_of(FORM_SEVERITY_LEVELS),
    FieldSpec::new("work_incapacity", Boolean),
    FieldSpec::new("incapacity_days", Number),
    FieldSpec::new("hospital_treatment", Boolean),
    FieldSpec::new("first_aid", Boolean),
    FieldSpec::text("treating_physician", 200),
];

const REPORTING: &[FieldSpec] = &[
    FieldSpec::new("report_date", Date).required(),
    FieldSpec::text("reporter_name", 100).required(),
    FieldSpec::text("reporter_role", 100),
    FieldSpec::text("reporter_phone", 30),
    FieldSpec::text("reporter_email", 100),
    FieldSpec::text("reference_number", 50),
    FieldSpec::text("remarks", 1000),
];

/// The accident report schema, in section order.
pub static FORM_SCHEMA: &[SectionSchema] = &[
    SectionSchema {
        id: SectionId::Organization,
        title: "Unternehmen",
        fields: ORGANIZATION,
    },
    SectionSchema {
        id: SectionId::AffectedPerson,
        title: "Versicherte Person",
        fields: AFFECTED_PERSON,
    },
    SectionSchema {
        id: SectionId::Incident,
        title: "Unfall",
        fields: INCIDENT,
    },
    SectionSchema {
        id: SectionId::Injury,
        title: "Verletzung",
        fields: INJURY,
    },
    SectionSchema {
        id: SectionId::Reporting,
        title: "Meldung",
        fields: REPORTING,
    },
];

pub fn section_schema(id: SectionId) -> Option<&'static SectionSchema> {
    FORM_SCHEMA.iter().find(|s| s.id == id)
}

pub fn field_spec(section: SectionId, key: &str) -> Option<&'static FieldSpec> {
    section_schema(section)?.field(key)
}

/// Every required field as `(section, spec)`, in form order.
pub fn required_fields() -> impl Iterator<Item = (SectionId, &'static FieldSpec)> {
    FORM_SCHEMA
        .iter()
        .flat_map(|s| s.fields.iter().map(move |f| (s.id, f)))
        .filter(|(_, f)| f.required)
}
