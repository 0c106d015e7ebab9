//! Core domain logic for university student records.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod dto;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use dto::student_dto::StudentDto;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::course::Course;
pub use model::person::{Person, PersonId};
pub use model::student::{Student, StudentAudit, StudentUpdate, STATUS_ACTIVE, STATUS_INACTIVE};
pub use model::validation::ValidationError;
pub use repo::course_repo::{CourseRepository, SqliteCourseRepository};
pub use repo::student_repo::{RepoError, RepoResult, SqliteStudentRepository, StudentRepository};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::student_service::{
    ErrorKind, ServiceResult, StudentService, StudentServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
