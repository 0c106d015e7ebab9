//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `universidad_core` linkage.
//! - Optionally print a summary of a records database:
//!   `universidad [DB_PATH]`.
//! - Logging is enabled when `UNIVERSIDAD_LOG_DIR` is set.

use std::process::ExitCode;
use universidad_core::db::open_db;
use universidad_core::logging::init_logging_from_env;
use universidad_core::{
    CourseRepository, SqliteCourseRepository, SqliteStudentRepository, StudentService,
};

fn main() -> ExitCode {
    println!("universidad_core ping={}", universidad_core::ping());
    println!("universidad_core version={}", universidad_core::core_version());

    if let Err(err) = init_logging_from_env() {
        eprintln!("logging disabled: {err}");
    }

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match print_summary(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let courses = SqliteCourseRepository::try_new(&conn)?;
    let catalog = courses.list_courses()?;
    let service = StudentService::new(SqliteStudentRepository::try_new(&conn)?, courses);

    let students = service.list_all()?;
    let active = service.list_active()?;
    println!("students total={} active={}", students.len(), active.len());

    for course in &catalog {
        let enrolled = service.list_by_course(&course.code)?;
        println!("course code={} enrolled={}", course.code, enrolled.len());
    }

    Ok(())
}
