//! Person base record.
//!
//! # Responsibility
//! - Hold identity and contact fields shared by every university person.
//! - Enforce mandatory-field and shape invariants before persistence.
//!
//! # Invariants
//! - `id` is assigned by the store on first insert and never changes.
//! - `first_name`, `last_name`, `email`, `birth_date` are always present.
//! - Email uniqueness is enforced by the store, not here.

use crate::model::validation::{require_text, ValidationError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Stable identifier of a persisted person.
pub type PersonId = Uuid;

/// Column length of `persona.nombre` / `persona.apellido`.
pub const NAME_MAX_CHARS: usize = 50;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Identity and contact data embedded in every person-like record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// `None` until the store assigns an id.
    pub id: Option<PersonId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
}

impl Person {
    /// Creates a not-yet-persisted person.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            birth_date,
        }
    }

    /// Validates mandatory fields and email shape.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("nombre", &self.first_name, Some(NAME_MAX_CHARS))?;
        require_text("apellido", &self.last_name, Some(NAME_MAX_CHARS))?;
        require_text("email", &self.email, None)?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}
