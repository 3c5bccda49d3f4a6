//! Authorities that must be notified after a workplace incident, and the
//! criteria that trigger each notification duty.
//!
//! Criteria are table rows, not control flow: a new legal trigger is a new
//! [`Criterion`] entry with its own predicate. Every predicate is a plain
//! function over an [`IncidentRecord`] whose fields are already defaulted, so
//! a missing attribute simply evaluates to `false`.

use serde::{Deserialize, Serialize};

use crate::incident::IncidentRecord;

/// Lost workdays strictly above this make an accident reportable (§ 193 Abs. 1 SGB VII).
pub const WORKDAYS_LOST_THRESHOLD: u32 = 3;

/// Affected persons at or above this count make an accident a mass accident.
pub const MASS_ACCIDENT_THRESHOLD: u32 = 5;

/// Pure, total test over an incident record.
pub type Predicate = fn(&IncidentRecord) -> bool;

/// A single testable condition that triggers a notification duty.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: &'static str,
    pub description: &'static str,
    pub legal_basis: &'static str,
    pub mandatory: bool,
    /// Requires notification without delay, regardless of the authority's deadline.
    pub immediate: bool,
    #[serde(skip)]
    pub predicate: Predicate,
}

impl Criterion {
    pub fn applies_to(&self, incident: &IncidentRecord) -> bool {
        (self.predicate)(incident)
    }
}

/// Normalized notification deadline of an authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadlineSpec {
    #[serde(rename = "immediate")]
    Immediate,
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "72h")]
    Hours72,
    #[serde(rename = "1week")]
    OneWeek,
}

impl DeadlineSpec {
    /// Hours allotted after the incident, if the deadline has a fixed duration.
    ///
    /// `Immediate` has none: the one-hour tolerance applies only when an
    /// immediate criterion actually matched.
    pub fn hours(self) -> Option<u32> {
        match self {
            Self::Immediate => None,
            Self::Hours24 => Some(24),
            Self::Hours72 => Some(72),
            Self::OneWeek => Some(168),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Immediate => "unverzüglich",
            Self::Hours24 => "innerhalb von 24 Stunden",
            Self::Hours72 => "innerhalb von 3 Tagen",
            Self::OneWeek => "innerhalb einer Woche",
        }
    }
}

/// A regulatory or insurance body with notification requirements.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authority {
    pub id: &'static str,
    pub name: &'static str,
    pub display_label: &'static str,
    pub deadline: DeadlineSpec,
    #[serde(skip)]
    pub criteria: &'static [Criterion],
}

// ── Predicates ──

fn is_fatal(incident: &IncidentRecord) -> bool {
    incident.fatality
}

fn is_mass_accident(incident: &IncidentRecord) -> bool {
    incident
        .affected_persons_count
        .is_some_and(|n| n >= MASS_ACCIDENT_THRESHOLD)
}

fn exceeds_workdays_threshold(incident: &IncidentRecord) -> bool {
    incident
        .workdays_lost
        .is_some_and(|days| days > WORKDAYS_LOST_THRESHOLD)
}

fn suspects_occupational_disease(incident: &IncidentRecord) -> bool {
    incident.occupational_disease_suspected
        || incident.incident_type_code().as_deref() == Some("occupational_disease")
}

fn needs_hospital_treatment(incident: &IncidentRecord) -> bool {
    incident.hospital_treatment
}

fn released_hazardous_substance(incident: &IncidentRecord) -> bool {
    incident.hazardous_substance_released
}

fn damaged_environment(incident: &IncidentRecord) -> bool {
    incident.environmental_impact
}

// ── Configuration tables ──

const FATALITY: &str = "Tödlicher Arbeitsunfall";
const MASS_ACCIDENT: &str = "Massenunfall (mindestens fünf Verletzte)";
const OCCUPATIONAL_DISEASE: &str = "Verdacht auf Berufskrankheit";

const INSURANCE_CARRIER_CRITERIA: &[Criterion] = &[
    Criterion {
        id: "uv_fatality",
        description: FATALITY,
        legal_basis: "§ 193 Abs. 4 SGB VII",
        mandatory: true,
        immediate: true,
        predicate: is_fatal,
    },
    Criterion {
        id: "uv_mass_accident",
        description: MASS_ACCIDENT,
        legal_basis: "§ 193 Abs. 4 SGB VII",
        mandatory: true,
        immediate: true,
        predicate: is_mass_accident,
    },
    Criterion {
        id: "uv_workdays_lost",
        description: "Arbeitsunfähigkeit von mehr als drei Kalendertagen",
        legal_basis: "§ 193 Abs. 1 SGB VII",
        mandatory: true,
        immediate: false,
        predicate: exceeds_workdays_threshold,
    },
    Criterion {
        id: "uv_occupational_disease",
        description: OCCUPATIONAL_DISEASE,
        legal_basis: "§ 193 Abs. 2 SGB VII",
        mandatory: true,
        immediate: false,
        predicate: suspects_occupational_disease,
    },
];

const LABOR_INSPECTION_CRITERIA: &[Criterion] = &[
    Criterion {
        id: "as_fatality",
        description: FATALITY,
        legal_basis: "§ 193 Abs. 7 SGB VII",
        mandatory: true,
        immediate: true,
        predicate: is_fatal,
    },
    Criterion {
        id: "as_mass_accident",
        description: MASS_ACCIDENT,
        legal_basis: "§ 193 Abs. 7 SGB VII",
        mandatory: true,
        immediate: true,
        predicate: is_mass_accident,
    },
    Criterion {
        id: "as_hospital_treatment",
        description: "Stationäre Krankenhausbehandlung",
        legal_basis: "§ 193 Abs. 7 SGB VII",
        mandatory: true,
        immediate: false,
        predicate: needs_hospital_treatment,
    },
    Criterion {
        id: "as_hazardous_substance",
        description: "Unfall mit Gefahrstofffreisetzung",
        legal_basis: "§ 18 Abs. 1 GefStoffV",
        mandatory: true,
        immediate: false,
        predicate: released_hazardous_substance,
    },
];

const ENVIRONMENTAL_CRITERIA: &[Criterion] = &[
    Criterion {
        id: "ub_hazardous_release",
        description: "Freisetzung gefährlicher Stoffe",
        legal_basis: "§ 19 Abs. 1 StörfallV",
        mandatory: true,
        immediate: true,
        predicate: released_hazardous_substance,
    },
    Criterion {
        id: "ub_environmental_damage",
        description: "Umweltschaden an Boden, Wasser oder Luft",
        legal_basis: "§ 4 USchadG",
        mandatory: true,
        immediate: false,
        predicate: damaged_environment,
    },
];

const OCCUPATIONAL_PHYSICIAN_CRITERIA: &[Criterion] = &[Criterion {
    id: "ga_occupational_disease",
    description: OCCUPATIONAL_DISEASE,
    legal_basis: "§ 202 SGB VII",
    mandatory: true,
    immediate: false,
    predicate: suspects_occupational_disease,
}];

/// Identifier of the insurance-carrier authority (the responsible Berufsgenossenschaft).
pub const INSURANCE_CARRIER: &str = "unfallversicherung";

/// Identifier of the labor-inspection authority.
pub const LABOR_INSPECTION: &str = "arbeitsschutz";

/// Every authority the evaluator checks, in evaluation order.
pub static AUTHORITIES: &[Authority] = &[
    Authority {
        id: INSURANCE_CARRIER,
        name: "Unfallversicherungsträger",
        display_label: "Zuständige Berufsgenossenschaft / Unfallkasse",
        deadline: DeadlineSpec::Hours72,
        criteria: INSURANCE_CARRIER_CRITERIA,
    },
    Authority {
        id: LABOR_INSPECTION,
        name: "Arbeitsschutzbehörde",
        display_label: "Staatliche Arbeitsschutzbehörde (Gewerbeaufsicht)",
        deadline: DeadlineSpec::Hours24,
        criteria: LABOR_INSPECTION_CRITERIA,
    },
    Authority {
        id: "umweltbehoerde",
        name: "Umweltbehörde",
        display_label: "Untere Immissionsschutz- und Wasserbehörde",
        deadline: DeadlineSpec::Immediate,
        criteria: ENVIRONMENTAL_CRITERIA,
    },
    Authority {
        id: "gewerbearzt",
        name: "Gewerbeärztlicher Dienst",
        display_label: "Landesgewerbearzt",
        deadline: DeadlineSpec::OneWeek,
        criteria: OCCUPATIONAL_PHYSICIAN_CRITERIA,
    },
];
