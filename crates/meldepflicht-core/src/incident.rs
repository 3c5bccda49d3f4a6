//! Incident and organization records as handed over by the record store.
//!
//! Both records are loosely structured. Every attribute is optional, unknown
//! keys are kept in `extra`, and values of an unexpected shape decode to
//! `false` / `None` instead of failing. Neither record is ever mutated by the
//! evaluator or the form mapper.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates;
use crate::lenient;

/// A workplace incident: what happened, who was affected, and the consequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncidentRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
    /// Internal type code (`accident`, `commuting_accident`, ...) or a form label.
    #[serde(deserialize_with = "lenient::text")]
    pub incident_type: Option<String>,
    /// Internal five-level severity (`minimal` .. `critical`).
    #[serde(deserialize_with = "lenient::text")]
    pub severity: Option<String>,
    /// `DD.MM.YYYY` or ISO `YYYY-MM-DD`.
    #[serde(deserialize_with = "lenient::text")]
    pub date: Option<String>,
    /// `HH:MM`, local time.
    #[serde(deserialize_with = "lenient::text")]
    pub time: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub department: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub reporter_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub reporter_role: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub reporter_phone: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub reporter_email: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub reported_at: Option<String>,

    #[serde(deserialize_with = "lenient::record")]
    pub affected_person: Option<AffectedPerson>,
    #[serde(deserialize_with = "lenient::count")]
    pub affected_persons_count: Option<u32>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub witnesses: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub equipment: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub hazardous_substance: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub hazardous_substance_released: bool,

    #[serde(deserialize_with = "lenient::flag")]
    pub fatality: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub hospital_treatment: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub work_incapacity: bool,
    #[serde(deserialize_with = "lenient::count")]
    pub workdays_lost: Option<u32>,
    #[serde(deserialize_with = "lenient::flag")]
    pub environmental_impact: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub occupational_disease_suspected: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub first_aid_provided: bool,

    #[serde(deserialize_with = "lenient::text")]
    pub body_part: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub injury_type: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub treating_physician: Option<String>,

    /// Attributes this crate does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Structured record of the injured person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AffectedPerson {
    #[serde(deserialize_with = "lenient::text")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub birth_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub nationality: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub street: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub job_title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub employed_since: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub employment_type: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub temporary_worker: bool,
}

/// The employing organization filing the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub street: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub city: Option<String>,
    /// Membership identifier issued by the carrier, e.g. `BG01123456`.
    #[serde(deserialize_with = "lenient::text")]
    pub membership_number: Option<String>,
    /// WZ 2008 economic activity code.
    #[serde(deserialize_with = "lenient::text")]
    pub industry_code: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub employee_count: Option<u32>,
    #[serde(deserialize_with = "lenient::text")]
    pub contact_person: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub phone: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl IncidentRecord {
    /// Incident type code, trimmed and lowercased.
    pub fn incident_type_code(&self) -> Option<String> {
        self.incident_type
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
    }

    /// Combine `date` and `time` into a naive local timestamp.
    ///
    /// A missing or unparseable time counts as midnight; an unparseable date
    /// yields `None`.
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        let date = dates::parse_form_date(&dates::to_form_date(self.date.as_deref()?))?;
        let time = self
            .time
            .as_deref()
            .and_then(dates::parse_time)
            .unwrap_or_default();
        Some(date.and_time(time))
    }

    /// [`occurred_at`](Self::occurred_at) read as wall-clock time in `tz`.
    ///
    /// Of two readings across a DST fall-back the earlier wins; a time skipped
    /// by the spring-forward gap resolves one hour later.
    pub fn occurred_at_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        let naive = self.occurred_at()?;
        naive
            .and_local_timezone(tz.clone())
            .earliest()
            .or_else(|| (naive + Duration::hours(1)).and_local_timezone(tz.clone()).earliest())
            .map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_decodes_to_defaults() {
        let incident: IncidentRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(incident, IncidentRecord::default());
    }

    #[test]
    fn flags_accept_common_spellings() {
        let incident: IncidentRecord = serde_json::from_value(json!({
            "fatality": "ja",
            "hospitalTreatment": 1,
            "workIncapacity": "TRUE",
            "environmentalImpact": "nein",
            "firstAidProvided": null,
        }))
        .unwrap();
        assert!(incident.fatality);
        assert!(incident.hospital_treatment);
        assert!(incident.work_incapacity);
        assert!(!incident.environmental_impact);
        assert!(!incident.first_aid_provided);
    }

    #[test]
    fn malformed_counts_degrade_to_absent() {
        let incident: IncidentRecord = serde_json::from_value(json!({
            "workdaysLost": "five",
            "affectedPersonsCount": -2,
        }))
        .unwrap();
        assert_eq!(incident.workdays_lost, None);
        assert_eq!(incident.affected_persons_count, None);

        let incident: IncidentRecord =
            serde_json::from_value(json!({ "workdaysLost": " 5 " })).unwrap();
        assert_eq!(incident.workdays_lost, Some(5));

        let incident: IncidentRecord =
            serde_json::from_value(json!({ "workdaysLost": 4.0 })).unwrap();
        assert_eq!(incident.workdays_lost, Some(4));
    }

    #[test]
    fn oversized_counts_saturate() {
        let incident: IncidentRecord = serde_json::from_value(json!({
            "workdaysLost": 4_294_967_296u64,
            "affectedPersonsCount": "99999999999",
        }))
        .unwrap();
        assert_eq!(incident.workdays_lost, Some(u32::MAX));
        assert_eq!(incident.affected_persons_count, Some(u32::MAX));

        let incident: IncidentRecord =
            serde_json::from_value(json!({ "workdaysLost": 1e12 })).unwrap();
        assert_eq!(incident.workdays_lost, Some(u32::MAX));
        assert!(crate::evaluate(&incident).is_mandatory);
    }

    #[test]
    fn witnesses_accept_comma_separated_string() {
        let incident: IncidentRecord =
            serde_json::from_value(json!({ "witnesses": "Anna Schulz, , Jens Ott" })).unwrap();
        assert_eq!(incident.witnesses, vec!["Anna Schulz", "Jens Ott"]);
    }

    #[test]
    fn numeric_text_fields_are_stringified() {
        let org: Organization = serde_json::from_value(json!({
            "postalCode": 69115,
            "membershipNumber": "BG01123456",
        }))
        .unwrap();
        assert_eq!(org.postal_code.as_deref(), Some("69115"));
        assert_eq!(org.membership_number.as_deref(), Some("BG01123456"));
    }

    #[test]
    fn malformed_person_record_is_absent() {
        let incident: IncidentRecord =
            serde_json::from_value(json!({ "affectedPerson": "Max Mustermann" })).unwrap();
        assert!(incident.affected_person.is_none());
    }

    #[test]
    fn unknown_keys_are_retained() {
        let incident: IncidentRecord =
            serde_json::from_value(json!({ "shift": "night", "fatality": false })).unwrap();
        assert_eq!(incident.extra.get("shift"), Some(&json!("night")));
        assert!(!incident.extra.contains_key("fatality"));
    }

    #[test]
    fn non_object_input_is_rejected() {
        assert!(serde_json::from_value::<IncidentRecord>(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn occurred_at_combines_date_and_time() {
        let incident = IncidentRecord {
            date: Some("2024-03-15".into()),
            time: Some("08:30".into()),
            ..Default::default()
        };
        let at = incident.occurred_at().unwrap();
        assert_eq!(at.to_string(), "2024-03-15 08:30:00");

        let incident = IncidentRecord {
            date: Some("15.03.2024".into()),
            ..Default::default()
        };
        assert_eq!(incident.occurred_at().unwrap().to_string(), "2024-03-15 00:00:00");

        let incident = IncidentRecord {
            date: Some("gestern".into()),
            ..Default::default()
        };
        assert!(incident.occurred_at().is_none());
    }

    #[test]
    fn occurred_at_in_applies_the_wall_clock_offset() {
        let incident = IncidentRecord {
            date: Some("2024-03-15".into()),
            time: Some("08:30".into()),
            ..Default::default()
        };
        let cet = chrono::FixedOffset::east_opt(3600).unwrap();
        let at = incident.occurred_at_in(&cet).unwrap();
        assert_eq!(at.to_rfc3339(), "2024-03-15T07:30:00+00:00");

        let cest = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            incident.occurred_at_in(&cest).unwrap().to_rfc3339(),
            "2024-03-15T06:30:00+00:00"
        );
        assert_eq!(
            incident.occurred_at_in(&Utc).unwrap().to_rfc3339(),
            "2024-03-15T08:30:00+00:00"
        );
    }

    #[test]
    fn occurred_at_in_without_date_is_none() {
        let cet = chrono::FixedOffset::east_opt(3600).unwrap();
        assert!(IncidentRecord::default().occurred_at_in(&cet).is_none());
    }
}
