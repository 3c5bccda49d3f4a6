//! Mandatory-reporting evaluation: which authorities must be notified, on
//! which grounds, and by when.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::authority::{AUTHORITIES, Authority};
use crate::incident::IncidentRecord;

/// Hours granted for an "immediate" notification.
///
/// This is an operational tolerance for contacting the authority, not a
/// statutory figure: the law says "unverzüglich" (without undue delay).
pub const IMMEDIATE_TOLERANCE_HOURS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedCriterion {
    pub id: &'static str,
    pub description: &'static str,
    pub legal_basis: &'static str,
    pub immediate: bool,
}

/// An authority with at least one matched criterion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityMatch {
    pub authority: &'static Authority,
    pub matched_criteria: Vec<MatchedCriterion>,
    pub immediate_required: bool,
}

/// Outcome of one evaluation. Unmatched authorities are not listed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Determination {
    pub is_mandatory: bool,
    pub immediate_notification_required: bool,
    pub authority_results: Vec<AuthorityMatch>,
    pub distinct_criteria_descriptions: Vec<&'static str>,
    pub distinct_legal_bases: Vec<&'static str>,
}

impl Determination {
    pub fn authority(&self, id: &str) -> Option<&AuthorityMatch> {
        self.authority_results.iter().find(|r| r.authority.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineKind {
    Immediate,
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadline {
    pub authority_name: &'static str,
    pub kind: DeadlineKind,
    /// `None` when the authority's deadline has no fixed duration; the caller
    /// must schedule the notification manually.
    pub due_at: Option<DateTime<Utc>>,
    pub hours_allotted: Option<u32>,
}

impl Deadline {
    pub fn is_computed(&self) -> bool {
        self.due_at.is_some()
    }
}

/// Evaluates incidents against a table of authorities.
#[derive(Debug, Clone, Copy)]
pub struct MandatoryReportingEvaluator {
    authorities: &'static [Authority],
}

impl Default for MandatoryReportingEvaluator {
    fn default() -> Self {
        Self::new(AUTHORITIES)
    }
}

impl MandatoryReportingEvaluator {
    pub fn new(authorities: &'static [Authority]) -> Self {
        Self { authorities }
    }

    /// Apply every criterion of every authority, in table order.
    pub fn evaluate(&self, incident: &IncidentRecord) -> Determination {
        let mut determination = Determination::default();

        for authority in self.authorities {
            let matched_criteria: Vec<MatchedCriterion> = authority
                .criteria
                .iter()
                .filter(|c| c.applies_to(incident))
                .map(|c| MatchedCriterion {
                    id: c.id,
                    description: c.description,
                    legal_basis: c.legal_basis,
                    immediate: c.immediate,
                })
                .collect();
            if matched_criteria.is_empty() {
                continue;
            }

            let immediate_required = matched_criteria.iter().any(|c| c.immediate);
            debug!(
                authority = authority.id,
                matched = matched_criteria.len(),
                immediate_required,
                "authority notification required"
            );

            for criterion in &matched_criteria {
                push_unique(
                    &mut determination.distinct_criteria_descriptions,
                    criterion.description,
                );
                push_unique(&mut determination.distinct_legal_bases, criterion.legal_basis);
            }
            determination.immediate_notification_required |= immediate_required;
            determination.authority_results.push(AuthorityMatch {
                authority,
                matched_criteria,
                immediate_required,
            });
        }

        determination.is_mandatory = !determination.authority_results.is_empty();
        debug!(
            incident = incident.id.as_deref().unwrap_or("-"),
            mandatory = determination.is_mandatory,
            immediate = determination.immediate_notification_required,
            authorities = determination.authority_results.len(),
            "incident evaluated"
        );
        determination
    }
}

/// Evaluate against the built-in authority table.
pub fn evaluate(incident: &IncidentRecord) -> Determination {
    MandatoryReportingEvaluator::default().evaluate(incident)
}

/// Concrete deadlines for every matched authority, in determination order.
///
/// An immediate obligation is due [`IMMEDIATE_TOLERANCE_HOURS`] after the
/// incident, whatever the authority's nominal deadline.
pub fn calculate_deadlines(
    determination: &Determination,
    incident_at: DateTime<Utc>,
) -> Vec<Deadline> {
    determination
        .authority_results
        .iter()
        .map(|result| {
            let (kind, hours) = if result.immediate_required {
                (DeadlineKind::Immediate, Some(IMMEDIATE_TOLERANCE_HOURS))
            } else {
                (DeadlineKind::Scheduled, result.authority.deadline.hours())
            };
            Deadline {
                authority_name: result.authority.name,
                kind,
                due_at: hours.map(|h| incident_at + Duration::hours(i64::from(h))),
                hours_allotted: hours,
            }
        })
        .collect()
}

fn push_unique(list: &mut Vec<&'static str>, value: &'static str) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{Criterion, DeadlineSpec, INSURANCE_CARRIER, LABOR_INSPECTION};
    use chrono::TimeZone;

    fn incident_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap()
    }

    fn fatal() -> IncidentRecord {
        IncidentRecord {
            fatality: true,
            ..Default::default()
        }
    }

    #[test]
    fn fatality_requires_immediate_notification_of_carrier_and_inspection() {
        let det = evaluate(&fatal());
        assert!(det.is_mandatory);
        assert!(det.immediate_notification_required);
        assert!(det.authority(INSURANCE_CARRIER).is_some());
        assert!(det.authority(LABOR_INSPECTION).is_some());
        assert!(det.authority_results.iter().all(|r| r.immediate_required));
    }

    #[test]
    fn five_lost_workdays_match_carrier_only() {
        let incident = IncidentRecord {
            workdays_lost: Some(5),
            hospital_treatment: false,
            fatality: false,
            ..Default::default()
        };
        let det = evaluate(&incident);
        assert!(det.is_mandatory);
        assert!(!det.immediate_notification_required);
        assert_eq!(det.authority_results.len(), 1);

        let carrier = det.authority(INSURANCE_CARRIER).unwrap();
        assert!(!carrier.immediate_required);
        let ids: Vec<_> = carrier.matched_criteria.iter().map(|c| c.id).collect();
        assert_eq!(ids, ["uv_workdays_lost"]);
    }

    #[test]
    fn two_lost_workdays_are_not_reportable() {
        let incident = IncidentRecord {
            workdays_lost: Some(2),
            ..Default::default()
        };
        let det = evaluate(&incident);
        assert!(!det.is_mandatory);
        assert!(!det.immediate_notification_required);
        assert!(det.authority_results.is_empty());
        assert!(det.distinct_criteria_descriptions.is_empty());
        assert!(det.distinct_legal_bases.is_empty());
    }

    #[test]
    fn empty_record_matches_nothing() {
        let det = evaluate(&IncidentRecord::default());
        assert!(!det.is_mandatory);
        assert!(det.authority_results.is_empty());
    }

    #[test]
    fn shared_descriptions_are_deduplicated_but_attributed_per_authority() {
        let det = evaluate(&fatal());
        let fatality_count = det
            .distinct_criteria_descriptions
            .iter()
            .filter(|d| **d == "Tödlicher Arbeitsunfall")
            .count();
        assert_eq!(fatality_count, 1);
        assert_eq!(
            det.distinct_legal_bases,
            ["§ 193 Abs. 4 SGB VII", "§ 193 Abs. 7 SGB VII"]
        );
        for id in [INSURANCE_CARRIER, LABOR_INSPECTION] {
            let result = det.authority(id).unwrap();
            assert_eq!(result.matched_criteria[0].description, "Tödlicher Arbeitsunfall");
        }
    }

    #[test]
    fn mass_accident_legal_basis_appears_once() {
        let incident = IncidentRecord {
            fatality: true,
            affected_persons_count: Some(6),
            ..Default::default()
        };
        let det = evaluate(&incident);
        let carrier = det.authority(INSURANCE_CARRIER).unwrap();
        assert_eq!(carrier.matched_criteria.len(), 2);
        let abs4 = det
            .distinct_legal_bases
            .iter()
            .filter(|b| **b == "§ 193 Abs. 4 SGB VII")
            .count();
        assert_eq!(abs4, 1);
    }

    #[test]
    fn immediate_flag_is_union_over_all_matches() {
        let incident = IncidentRecord {
            hospital_treatment: true,
            environmental_impact: true,
            hazardous_substance_released: true,
            ..Default::default()
        };
        let det = evaluate(&incident);
        assert!(det.immediate_notification_required);
        assert!(!det.authority(LABOR_INSPECTION).unwrap().immediate_required);
        assert!(det.authority("umweltbehoerde").unwrap().immediate_required);
    }

    #[test]
    fn results_follow_table_order() {
        let incident = IncidentRecord {
            fatality: true,
            environmental_impact: true,
            occupational_disease_suspected: true,
            ..Default::default()
        };
        let det = evaluate(&incident);
        let ids: Vec<_> = det.authority_results.iter().map(|r| r.authority.id).collect();
        assert_eq!(
            ids,
            [INSURANCE_CARRIER, LABOR_INSPECTION, "umweltbehoerde", "gewerbearzt"]
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let incident = IncidentRecord {
            fatality: true,
            workdays_lost: Some(10),
            ..Default::default()
        };
        let a = serde_json::to_value(evaluate(&incident)).unwrap();
        let b = serde_json::to_value(evaluate(&incident)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn immediate_deadline_is_one_hour_after_incident() {
        let det = evaluate(&fatal());
        let deadlines = calculate_deadlines(&det, incident_at());
        assert_eq!(deadlines.len(), det.authority_results.len());
        for deadline in deadlines {
            assert_eq!(deadline.kind, DeadlineKind::Immediate);
            assert_eq!(deadline.due_at, Some(incident_at() + Duration::hours(1)));
            assert_eq!(deadline.hours_allotted, Some(1));
        }
    }

    #[test]
    fn scheduled_deadlines_use_normalized_spec() {
        let incident = IncidentRecord {
            workdays_lost: Some(5),
            hospital_treatment: true,
            occupational_disease_suspected: true,
            ..Default::default()
        };
        let det = evaluate(&incident);
        let deadlines = calculate_deadlines(&det, incident_at());
        let hours: Vec<_> = deadlines.iter().map(|d| d.hours_allotted).collect();
        assert_eq!(hours, [Some(72), Some(24), Some(168)]);
        assert!(deadlines.iter().all(|d| d.kind == DeadlineKind::Scheduled));
        assert_eq!(deadlines[0].due_at, Some(incident_at() + Duration::hours(72)));
    }

    #[test]
    fn immediate_spec_without_immediate_match_has_no_computed_deadline() {
        let incident = IncidentRecord {
            environmental_impact: true,
            ..Default::default()
        };
        let det = evaluate(&incident);
        let deadlines = calculate_deadlines(&det, incident_at());
        assert_eq!(deadlines.len(), 1);
        assert_eq!(deadlines[0].authority_name, "Umweltbehörde");
        assert_eq!(deadlines[0].kind, DeadlineKind::Scheduled);
        assert!(!deadlines[0].is_computed());
        assert_eq!(deadlines[0].hours_allotted, None);
    }

    fn always(_: &IncidentRecord) -> bool {
        true
    }

    static CUSTOM: &[Authority] = &[Authority {
        id: "custom",
        name: "Testbehörde",
        display_label: "Testbehörde",
        deadline: DeadlineSpec::Hours24,
        criteria: &[
            Criterion {
                id: "first",
                description: "Gleich",
                legal_basis: "§ 1",
                mandatory: true,
                immediate: false,
                predicate: always,
            },
            Criterion {
                id: "second",
                description: "Gleich",
                legal_basis: "§ 1",
                mandatory: true,
                immediate: false,
                predicate: always,
            },
        ],
    }];

    #[test]
    fn custom_table_and_duplicate_descriptions_within_one_authority() {
        let det = MandatoryReportingEvaluator::new(CUSTOM).evaluate(&IncidentRecord::default());
        assert_eq!(det.authority_results[0].matched_criteria.len(), 2);
        assert_eq!(det.distinct_criteria_descriptions, ["Gleich"]);
        assert_eq!(det.distinct_legal_bases, ["§ 1"]);
    }
}
