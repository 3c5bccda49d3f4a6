//! Core decision logic for workplace incident reporting: which authorities must
//! be notified and by when, and the DGUV accident report ("Unfallanzeige") that
//! accompanies the notification.
//!
//! Everything here is pure and synchronous. The configuration tables
//! ([`AUTHORITIES`], [`CARRIERS`], [`FORM_SCHEMA`]) are `static` data and are
//! never mutated, so every operation may be called concurrently.

pub mod authority;
pub mod carrier;
pub mod dates;
pub mod error;
pub mod evaluator;
pub mod explain;
pub mod form;
pub mod incident;
mod lenient;
pub mod schema;
pub mod validate;

pub use authority::{AUTHORITIES, Authority, Criterion, DeadlineSpec};
pub use carrier::{CARRIERS, Carrier, MembershipPattern, identify_carrier};
pub use error::FormError;
pub use evaluator::{
    AuthorityMatch, Deadline, DeadlineKind, Determination, IMMEDIATE_TOLERANCE_HOURS,
    MandatoryReportingEvaluator, MatchedCriterion, calculate_deadlines, evaluate,
};
pub use explain::{
    AuthorityNotice, NO_COMPUTED_DEADLINE, NoticeSeverity, ReportingSummary, explain,
};
pub use form::{FieldValue, FormHeader, FormMapper, FormOptions, FormSections, GeneratedForm};
pub use incident::{AffectedPerson, IncidentRecord, Organization};
pub use schema::{FORM_SCHEMA, FieldSpec, FieldType, SectionId, SectionSchema};
pub use validate::{ValidationResult, validate, validate_sections};
