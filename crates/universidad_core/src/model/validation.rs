//! Field-level validation errors shared by the record model.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason a record failed its write-time invariants.
///
/// Field names use the external wire names (`nombre`, `email`, ...) so
/// callers can point at the offending input directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory field was not provided.
    MissingField(&'static str),
    /// A mandatory text field is empty after trim.
    BlankField(&'static str),
    /// A text field exceeds its column length.
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Email value does not have a `local@domain` shape.
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing mandatory field `{field}`"),
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "field `{field}` is too long: {actual_chars} chars (max {max_chars})"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ValidationError {}

/// Checks a mandatory text field for blankness and maximum length.
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: Option<usize>,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }

    if let Some(max_chars) = max_chars {
        let actual_chars = value.chars().count();
        if actual_chars > max_chars {
            return Err(ValidationError::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            });
        }
    }

    Ok(())
}
