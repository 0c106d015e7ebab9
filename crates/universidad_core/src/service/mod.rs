//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (CLI, a future HTTP layer) decoupled from storage details.

pub mod clock;
pub mod student_service;
