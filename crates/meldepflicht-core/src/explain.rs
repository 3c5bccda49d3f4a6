//! Human-readable summary of a [`Determination`], for warning banners ahead of
//! submission.

use std::fmt;

use serde::Serialize;

use crate::evaluator::{Determination, IMMEDIATE_TOLERANCE_HOURS};

/// Deadline text for an obligation without a fixed duration that matched no
/// immediate criterion; it has to be scheduled by hand.
pub const NO_COMPUTED_DEADLINE: &str = "keine automatische Frist berechnet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    /// At least one obligation requires immediate notification.
    Critical,
    /// Notification is mandatory within a deadline.
    Warning,
    /// No mandatory reporting.
    Info,
}

impl NoticeSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityNotice {
    pub authority: &'static str,
    pub label: &'static str,
    pub criteria: Vec<&'static str>,
    pub legal_bases: Vec<&'static str>,
    pub deadline: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingSummary {
    pub severity: NoticeSeverity,
    pub headline: &'static str,
    pub authorities: Vec<AuthorityNotice>,
}

pub fn explain(determination: &Determination) -> ReportingSummary {
    let (severity, headline) = if determination.immediate_notification_required {
        (NoticeSeverity::Critical, "Sofortige Meldung erforderlich")
    } else if determination.is_mandatory {
        (NoticeSeverity::Warning, "Meldepflichtiges Ereignis")
    } else {
        (NoticeSeverity::Info, "Keine Meldepflicht festgestellt")
    };

    let authorities = determination
        .authority_results
        .iter()
        .map(|result| {
            let mut legal_bases: Vec<&'static str> = Vec::new();
            for c in &result.matched_criteria {
                if !legal_bases.contains(&c.legal_basis) {
                    legal_bases.push(c.legal_basis);
                }
            }
            let deadline = if result.immediate_required {
                format!("sofort (Toleranz {IMMEDIATE_TOLERANCE_HOURS} Stunde)")
            } else if result.authority.deadline.hours().is_none() {
                NO_COMPUTED_DEADLINE.to_string()
            } else {
                result.authority.deadline.label().to_string()
            };
            AuthorityNotice {
                authority: result.authority.name,
                label: result.authority.display_label,
                criteria: result.matched_criteria.iter().map(|c| c.description).collect(),
                legal_bases,
                deadline,
            }
        })
        .collect();

    ReportingSummary {
        severity,
        headline,
        authorities,
    }
}

impl fmt::Display for ReportingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.severity.as_str().to_uppercase(), self.headline)?;
        for notice in &self.authorities {
            writeln!(f)?;
            writeln!(f, "{} ({})", notice.authority, notice.label)?;
            writeln!(f, "  Frist:        {}", notice.deadline)?;
            for criterion in &notice.criteria {
                writeln!(f, "  Kriterium:    {criterion}")?;
            }
            writeln!(f, "  Rechtsgrund:  {}", notice.legal_bases.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::incident::IncidentRecord;

    #[test]
    fn fatality_is_critical() {
        let incident = IncidentRecord {
            fatality: true,
            ..Default::default()
        };
        let summary = explain(&evaluate(&incident));
        assert_eq!(summary.severity, NoticeSeverity::Critical);
        assert_eq!(summary.authorities.len(), 2);
        assert!(summary.authorities[0].deadline.starts_with("sofort"));
    }

    #[test]
    fn scheduled_obligation_is_warning_with_deadline_label() {
        let incident = IncidentRecord {
            workdays_lost: Some(5),
            ..Default::default()
        };
        let summary = explain(&evaluate(&incident));
        assert_eq!(summary.severity, NoticeSeverity::Warning);
        assert_eq!(summary.authorities[0].deadline, "innerhalb von 3 Tagen");
        assert_eq!(summary.authorities[0].legal_bases, ["§ 193 Abs. 1 SGB VII"]);
    }

    #[test]
    fn environmental_damage_alone_has_no_computed_deadline() {
        let incident = IncidentRecord {
            environmental_impact: true,
            ..Default::default()
        };
        let summary = explain(&evaluate(&incident));
        assert_eq!(summary.severity, NoticeSeverity::Warning);
        let notice = summary
            .authorities
            .iter()
            .find(|n| n.authority == "Umweltbehörde")
            .unwrap();
        assert_eq!(notice.deadline, NO_COMPUTED_DEADLINE);
        assert!(summary.to_string().contains("Frist:        keine automatische Frist berechnet"));
    }

    #[test]
    fn nothing_matched_is_info() {
        let summary = explain(&evaluate(&IncidentRecord::default()));
        assert_eq!(summary.severity, NoticeSeverity::Info);
        assert!(summary.authorities.is_empty());
        assert_eq!(summary.to_string().trim(), "[INFO] Keine Meldepflicht festgestellt");
    }

    #[test]
    fn display_lists_each_authority() {
        let incident = IncidentRecord {
            fatality: true,
            ..Default::default()
        };
        let text = explain(&evaluate(&incident)).to_string();
        assert!(text.starts_with("[CRITICAL]"));
        assert!(text.contains("Unfallversicherungsträger"));
        assert!(text.contains("Arbeitsschutzbehörde"));
        assert!(text.contains("§ 193 Abs. 7 SGB VII"));
    }
}
