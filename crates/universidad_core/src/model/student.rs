//! Student record.
//!
//! # Responsibility
//! - Extend [`Person`] with enrollment, status, audit and course data.
//! - Provide the in-place mutations used by update and soft delete.
//!
//! # Invariants
//! - Deletion is a status flip to `inactivo`; rows are never removed.
//! - Status comparisons ignore ASCII case.
//! - `courses` holds at most one entry per course code.

use crate::model::course::Course;
use crate::model::person::{Person, PersonId};
use crate::model::validation::{require_text, ValidationError};
use chrono::NaiveDate;

pub const STATUS_ACTIVE: &str = "activo";
pub const STATUS_INACTIVE: &str = "inactivo";

/// Audit stamps for creation (alta), modification and deactivation (baja).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentAudit {
    pub created_by: Option<String>,
    pub created_at: Option<NaiveDate>,
    pub modified_by: Option<String>,
    pub modified_at: Option<NaiveDate>,
    pub deactivated_by: Option<String>,
    pub deactivated_at: Option<NaiveDate>,
    pub deactivation_reason: Option<String>,
}

/// Person-level fields replaced wholesale by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub enrollment_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub person: Person,
    pub enrollment_number: String,
    /// Free-text state, usually `activo` or `inactivo`.
    pub status: Option<String>,
    pub audit: StudentAudit,
    /// Ordered course references; order carries no meaning.
    pub courses: Vec<Course>,
}

impl Student {
    /// Creates a not-yet-persisted student without status or audit data.
    pub fn new(person: Person, enrollment_number: impl Into<String>) -> Self {
        Self {
            person,
            enrollment_number: enrollment_number.into(),
            status: None,
            audit: StudentAudit::default(),
            courses: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<PersonId> {
        self.person.id
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.person.validate()?;
        require_text("numeroInscripcion", &self.enrollment_number, None)?;
        for course in &self.courses {
            course.validate()?;
        }
        Ok(())
    }

    /// Returns whether `status` equals `expected`, ignoring ASCII case.
    pub fn has_status(&self, expected: &str) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case(expected))
    }

    pub fn is_active(&self) -> bool {
        self.has_status(STATUS_ACTIVE)
    }

    pub fn has_course(&self, code: &str) -> bool {
        self.courses.iter().any(|course| course.has_code(code))
    }

    /// Adds a course reference unless one with the same code is present.
    ///
    /// Returns `true` when the collection changed.
    pub fn add_course(&mut self, course: Course) -> bool {
        if self.has_course(&course.code) {
            return false;
        }
        self.courses.push(course);
        true
    }

    /// Overwrites person data and enrollment number, stamping modification.
    ///
    /// Status, alta and baja fields are left untouched.
    pub fn apply_update(&mut self, update: StudentUpdate, actor: &str, today: NaiveDate) {
        self.person.first_name = update.first_name;
        self.person.last_name = update.last_name;
        self.person.email = update.email;
        self.person.birth_date = update.birth_date;
        self.enrollment_number = update.enrollment_number;
        self.touch(actor, today);
    }

    /// Stamps modification audit fields.
    pub fn touch(&mut self, actor: &str, today: NaiveDate) {
        self.audit.modified_by = Some(actor.to_string());
        self.audit.modified_at = Some(today);
    }

    /// Soft-deletes: sets status `inactivo` and restamps the baja fields.
    pub fn deactivate(&mut self, reason: Option<String>, actor: &str, today: NaiveDate) {
        self.status = Some(STATUS_INACTIVE.to_string());
        self.audit.deactivated_by = Some(actor.to_string());
        self.audit.deactivated_at = Some(today);
        self.audit.deactivation_reason = reason;
    }
}
