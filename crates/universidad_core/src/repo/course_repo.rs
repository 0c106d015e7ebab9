//! Course catalog repository.
//!
//! # Invariants
//! - Course codes are unique ignoring ASCII case; `save_course` upserts by
//!   code and keeps the casing of the first insert.

use crate::model::course::Course;
use crate::repo::schema_guard::{ensure_connection_ready, RequiredTable};
use crate::repo::student_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const REQUIRED_TABLES: &[RequiredTable] =
    &[("materia", &["codigo_unico", "nombre_materia", "creditos"])];

/// Repository interface for the course catalog.
pub trait CourseRepository {
    /// Inserts a course or updates name/credits of the one with the same code.
    fn save_course(&self, course: &Course) -> RepoResult<Course>;
    fn find_course_by_code(&self, code: &str) -> RepoResult<Option<Course>>;
    /// Lists all courses sorted by code.
    fn list_courses(&self) -> RepoResult<Vec<Course>>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn save_course(&self, course: &Course) -> RepoResult<Course> {
        course.validate()?;

        self.conn.execute(
            "INSERT INTO materia (codigo_unico, nombre_materia, creditos)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (codigo_unico) DO UPDATE SET
                nombre_materia = excluded.nombre_materia,
                creditos = excluded.creditos;",
            params![
                course.code.as_str(),
                course.name.as_str(),
                i64::from(course.credits)
            ],
        )?;

        self.find_course_by_code(&course.code)?.ok_or_else(|| {
            RepoError::InvalidData(format!("course `{}` not readable after save", course.code))
        })
    }

    fn find_course_by_code(&self, code: &str) -> RepoResult<Option<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT codigo_unico, nombre_materia, creditos
             FROM materia
             WHERE codigo_unico = ?1;",
        )?;
        let mut rows = stmt.query([code])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_course_row(row)?));
        }
        Ok(None)
    }

    fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT codigo_unico, nombre_materia, creditos
             FROM materia
             ORDER BY codigo_unico ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(parse_course_row(row)?);
        }
        Ok(courses)
    }
}

pub(crate) fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    let credits_value: i64 = row.get("creditos")?;
    let credits = u32::try_from(credits_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid credits value `{credits_value}` in materia.creditos"
        ))
    })?;

    Ok(Course {
        code: row.get("codigo_unico")?,
        name: row.get("nombre_materia")?,
        credits,
    })
}
