use thiserror::Error;

use crate::schema::SectionId;

/// Internal faults of the form mapper.
///
/// These never reach a caller of [`FormMapper::generate`](crate::FormMapper::generate);
/// they are converted into an error-flagged [`GeneratedForm`](crate::GeneratedForm).
#[derive(Debug, Error)]
pub enum FormError {
    #[error("field {section}.{key} is not declared in the form schema")]
    UnknownField { section: SectionId, key: String },

    #[error("field {section}.{key} expects a {expected} value")]
    TypeMismatch {
        section: SectionId,
        key: String,
        expected: &'static str,
    },

    #[error("invalid form options: {0}")]
    Options(#[from] serde_json::Error),
}
