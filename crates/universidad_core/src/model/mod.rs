//! Domain model for university records.
//!
//! # Responsibility
//! - Define the person/student/course records used by core business logic.
//! - Own field-level validation that runs before every persistence write.
//!
//! # Invariants
//! - Every persisted person is identified by a stable `PersonId`.
//! - Deletion is represented by status `inactivo`, never by row removal.

pub mod course;
pub mod person;
pub mod student;
pub mod validation;
