//! Transfer representations exposed at the service boundary.
//!
//! # Responsibility
//! - Map persisted entities to flat, serializable projections and back.
//! - Keep wire field names (`nombre`, `numeroInscripcion`, ...) out of the
//!   domain model.

pub mod student_dto;
