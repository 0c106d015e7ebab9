//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record store contracts the service layer depends on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must pass model validation before persistence.
//! - Repository APIs return semantic errors (`ConstraintViolation`) in
//!   addition to DB transport errors.
//! - Lookups return `Option`/`Vec`; deciding that absence is an error belongs
//!   to the service layer.

pub mod course_repo;
mod schema_guard;
pub mod student_repo;
