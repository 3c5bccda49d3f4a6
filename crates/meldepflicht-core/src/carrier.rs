//! Statutory accident insurance carriers (Berufsgenossenschaften) and their
//! membership-number patterns.
//!
//! Carrier-specific adjustments to the report live on the carrier row as a
//! plain function, so adding a carrier never touches the mapper.

use serde::Serialize;

use crate::error::FormError;
use crate::form::FormSections;
use crate::schema::SectionId;

/// Fixed prefix followed by a fixed number of ASCII digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipPattern {
    pub prefix: &'static str,
    pub digits: usize,
}

impl MembershipPattern {
    pub const fn new(prefix: &'static str, digits: usize) -> Self {
        Self { prefix, digits }
    }

    /// Surrounding whitespace is ignored; everything else must match exactly.
    pub fn matches(&self, membership_id: &str) -> bool {
        membership_id
            .trim()
            .strip_prefix(self.prefix)
            .is_some_and(|rest| rest.len() == self.digits && rest.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Rewrites applied to a generated report once its carrier is known.
pub type SectionAmendment = fn(&mut FormSections) -> Result<(), FormError>;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    pub display_name: &'static str,
    pub code: &'static str,
    pub address: &'static str,
    #[serde(skip)]
    pub membership: MembershipPattern,
    #[serde(skip)]
    pub amend: Option<SectionAmendment>,
}

impl Carrier {
    pub fn apply_amendments(&self, sections: &mut FormSections) -> Result<(), FormError> {
        match self.amend {
            Some(amend) => amend(sections),
            None => Ok(()),
        }
    }
}

const MEMBERSHIP_DIGITS: usize = 6;

fn remark(sections: &mut FormSections, text: &str) -> Result<(), FormError> {
    sections.append_text(SectionId::Reporting, "remarks", text)
}

fn amend_bg_rci(sections: &mut FormSections) -> Result<(), FormError> {
    remark(
        sections,
        "Hinweis BG RCI: Beteiligte Gefahrstoffe mit Sicherheitsdatenblatt benennen.",
    )
}

fn amend_bg_bau(sections: &mut FormSections) -> Result<(), FormError> {
    remark(
        sections,
        "Hinweis BG BAU: Baustellenanschrift und Bauherr angeben.",
    )
}

fn amend_bg_verkehr(sections: &mut FormSections) -> Result<(), FormError> {
    remark(
        sections,
        "Hinweis BG Verkehr: Bei Wegeunfällen Fahrtstrecke und amtliches Kennzeichen angeben.",
    )
}

fn amend_bgw(sections: &mut FormSections) -> Result<(), FormError> {
    remark(
        sections,
        "Hinweis BGW: Bei Nadelstichverletzungen den Durchgangsarztbericht beifügen.",
    )
}

/// Configured carriers, tested in order. Prefixes are distinct and of equal
/// length, so at most one pattern can match a given identifier.
pub static CARRIERS: &[Carrier] = &[
    Carrier {
        display_name: "BG Rohstoffe und chemische Industrie (BG RCI)",
        code: "BG01",
        address: "Kurfürsten-Anlage 62, 69115 Heidelberg",
        membership: MembershipPattern::new("BG01", MEMBERSHIP_DIGITS),
        amend: Some(amend_bg_rci),
    },
    Carrier {
        display_name: "BG Holz und Metall (BGHM)",
        code: "BG02",
        address: "Isaac-Fulda-Allee 18, 55124 Mainz",
        membership: MembershipPattern::new("BG02", MEMBERSHIP_DIGITS),
        amend: None,
    },
    Carrier {
        display_name: "BG Energie Textil Elektro Medienerzeugnisse (BG ETEM)",
        code: "BG03",
        address: "Gustav-Heinemann-Ufer 130, 50968 Köln",
        membership: MembershipPattern::new("BG03", MEMBERSHIP_DIGITS),
        amend: None,
    },
    Carrier {
        display_name: "BG der Bauwirtschaft (BG BAU)",
        code: "BG04",
        address: "Hildegardstraße 29/30, 10715 Berlin",
        membership: MembershipPattern::new("BG04", MEMBERSHIP_DIGITS),
        amend: Some(amend_bg_bau),
    },
    Carrier {
        display_name: "BG Nahrungsmittel und Gastgewerbe (BGN)",
        code: "BG05",
        address: "Dynamostraße 7-11, 68165 Mannheim",
        membership: MembershipPattern::new("BG05", MEMBERSHIP_DIGITS),
        amend: None,
    },
    Carrier {
        display_name: "BG Handel und Warenlogistik (BGHW)",
        code: "BG06",
        address: "M 5, 7, 68161 Mannheim",
        membership: MembershipPattern::new("BG06", MEMBERSHIP_DIGITS),
        amend: None,
    },
    Carrier {
        display_name: "BG Verkehrswirtschaft Post-Logistik Telekommunikation (BG Verkehr)",
        code: "BG07",
        address: "Ottenser Hauptstraße 54, 22765 Hamburg",
        membership: MembershipPattern::new("BG07", MEMBERSHIP_DIGITS),
        amend: Some(amend_bg_verkehr),
    },
    Carrier {
        display_name: "Verwaltungs-Berufsgenossenschaft (VBG)",
        code: "BG08",
        address: "Massaquoipassage 1, 22305 Hamburg",
        membership: MembershipPattern::new("BG08", MEMBERSHIP_DIGITS),
        amend: None,
    },
    Carrier {
        display_name: "BG für Gesundheitsdienst und Wohlfahrtspflege (BGW)",
        code: "BG09",
        address: "Pappelallee 33/35/37, 22089 Hamburg",
        membership: MembershipPattern::new("BG09", MEMBERSHIP_DIGITS),
        amend: Some(amend_bgw),
    },
];

/// First carrier in `carriers` whose pattern matches, if any.
pub fn identify_in(carriers: &'static [Carrier], membership_id: &str) -> Option<&'static Carrier> {
    carriers.iter().find(|c| c.membership.matches(membership_id))
}

/// Identify the responsible carrier from the built-in table.
pub fn identify_carrier(membership_id: &str) -> Option<&'static Carrier> {
    identify_in(CARRIERS, membership_id)
}

pub fn carrier_by_code(code: &str) -> Option<&'static Carrier> {
    CARRIERS.iter().find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldValue;

    #[test]
    fn resolves_by_prefix_and_length() {
        assert_eq!(identify_carrier("BG01123456").map(|c| c.code), Some("BG01"));
        assert_eq!(identify_carrier(" BG09000001 ").map(|c| c.code), Some("BG09"));
    }

    #[test]
    fn wrong_length_matches_nothing() {
        assert!(identify_carrier("BG01123").is_none());
        assert!(identify_carrier("BG011234567").is_none());
    }

    #[test]
    fn unknown_prefix_matches_nothing() {
        assert!(identify_carrier("XX01123456").is_none());
        assert!(identify_carrier("bg01123456").is_none());
        assert!(identify_carrier("").is_none());
    }

    #[test]
    fn non_numeric_suffix_matches_nothing() {
        assert!(identify_carrier("BG0112345A").is_none());
        assert!(identify_carrier("BG01 12345").is_none());
    }

    #[test]
    fn patterns_are_mutually_exclusive() {
        for carrier in CARRIERS {
            let id = format!("{}{}", carrier.code, "0".repeat(MEMBERSHIP_DIGITS));
            let matches = CARRIERS.iter().filter(|c| c.membership.matches(&id)).count();
            assert_eq!(matches, 1, "{id} matched {matches} carriers");
        }
    }

    #[test]
    fn amendment_appends_to_remarks() {
        let carrier = carrier_by_code("bg04").unwrap();
        let mut sections = FormSections::default();
        sections
            .set(SectionId::Reporting, "remarks", "Gerüst eingestürzt.")
            .unwrap();
        carrier.apply_amendments(&mut sections).unwrap();
        let remarks = sections.text(SectionId::Reporting, "remarks");
        assert!(remarks.starts_with("Gerüst eingestürzt.\n"));
        assert!(remarks.ends_with("Baustellenanschrift und Bauherr angeben."));
    }

    #[test]
    fn carrier_without_amendment_leaves_sections_untouched() {
        let carrier = carrier_by_code("BG02").unwrap();
        let mut sections = FormSections::default();
        sections.set(SectionId::Reporting, "remarks", "").unwrap();
        let before = sections.clone();
        carrier.apply_amendments(&mut sections).unwrap();
        assert_eq!(sections, before);
        assert_eq!(
            sections.get(SectionId::Reporting, "remarks"),
            Some(&FieldValue::Text(String::new()))
        );
    }
}
