//! Student repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide upsert and lookup APIs over the joined `persona`/`estudiante`
//!   tables, including course membership links.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Student::validate()` before any SQL mutation.
//! - Email is unique across persons (case-insensitive); violations surface as
//!   `RepoError::ConstraintViolation`.
//! - `save` is atomic: person row, student row and course links commit
//!   together or not at all. The write lock is taken when the transaction
//!   begins.
//! - List reads return rows in insertion order.

use crate::db::DbError;
use crate::model::course::Course;
use crate::model::person::{Person, PersonId};
use crate::model::student::{Student, StudentAudit};
use crate::model::validation::ValidationError;
use crate::repo::course_repo::parse_course_row;
use crate::repo::schema_guard::{ensure_connection_ready, RequiredTable};
use chrono::NaiveDate;
use log::debug;
use rusqlite::{
    params, Connection, OptionalExtension, Params, Row, Transaction, TransactionBehavior,
};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const STUDENT_SELECT_SQL: &str = "SELECT
    p.id_persona AS id_persona,
    p.nombre AS nombre,
    p.apellido AS apellido,
    p.email AS email,
    p.fecha_nacimiento AS fecha_nacimiento,
    e.numero_inscripcion AS numero_inscripcion,
    e.estado AS estado,
    e.usuario_alta AS usuario_alta,
    e.fecha_alta AS fecha_alta,
    e.usuario_modificacion AS usuario_modificacion,
    e.fecha_modificacion AS fecha_modificacion,
    e.usuario_baja AS usuario_baja,
    e.fecha_baja AS fecha_baja,
    e.motivo_baja AS motivo_baja
FROM persona p
INNER JOIN estudiante e ON e.id_persona = p.id_persona";

const DATE_FORMAT: &str = "%Y-%m-%d";

const REQUIRED_TABLES: &[RequiredTable] = &[
    (
        "persona",
        &["id_persona", "nombre", "apellido", "email", "fecha_nacimiento"],
    ),
    (
        "estudiante",
        &[
            "id_persona",
            "numero_inscripcion",
            "estado",
            "usuario_alta",
            "fecha_alta",
            "usuario_modificacion",
            "fecha_modificacion",
            "usuario_baja",
            "fecha_baja",
            "motivo_baja",
        ],
    ),
    (
        "estudiante_materia",
        &["id_estudiante", "codigo_materia", "posicion"],
    ),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed field-level validation before writing.
    Validation(ValidationError),
    /// Write rejected by a uniqueness or referential rule.
    ConstraintViolation(String),
    Db(DbError),
    /// Persisted row cannot be decoded into a record.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_constraint_violation() {
            return Self::ConstraintViolation(value.to_string());
        }
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

/// Record store contract for students.
pub trait StudentRepository {
    /// Inserts or updates a student and returns it as persisted.
    ///
    /// Assigns a fresh id when `student.person.id` is `None`. The stored
    /// course links are replaced by `student.courses`.
    fn save(&self, student: &Student) -> RepoResult<Student>;
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Student>>;
    /// Lists every student in insertion order.
    fn find_all(&self) -> RepoResult<Vec<Student>>;
    /// Returns the first student (insertion order) with this enrollment number.
    fn find_by_enrollment_number(&self, enrollment_number: &str) -> RepoResult<Option<Student>>;
    /// Returns all students whose status matches, ignoring ASCII case.
    fn find_by_status(&self, status: &str) -> RepoResult<Vec<Student>>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn query_students<P: Params>(&self, clause: &str, params: P) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!("{STUDENT_SELECT_SQL} {clause};"))?;
        let mut rows = stmt.query(params)?;
        let mut students = Vec::new();

        while let Some(row) = rows.next()? {
            let (id, mut student) = parse_student_row(row)?;
            student.courses = load_courses_for_student(self.conn, id)?;
            students.push(student);
        }

        Ok(students)
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn save(&self, student: &Student) -> RepoResult<Student> {
        student.validate()?;

        let id = student.id().unwrap_or_else(Uuid::new_v4);
        let id_text = id.to_string();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_email_available(&tx, &student.person.email, &id_text)?;
        upsert_person(&tx, &id_text, &student.person)?;
        upsert_student(&tx, &id_text, student)?;
        replace_course_links(&tx, &id_text, &student.courses)?;
        tx.commit()?;

        debug!(
            "event=student_save module=repo status=ok student_id={id} courses={}",
            student.courses.len()
        );

        self.find_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("student {id} not readable after save"))
        })
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Student>> {
        let mut students = self.query_students("WHERE p.id_persona = ?1", [id.to_string()])?;
        Ok(students.pop())
    }

    fn find_all(&self) -> RepoResult<Vec<Student>> {
        self.query_students("ORDER BY p.rowid ASC", [])
    }

    fn find_by_enrollment_number(&self, enrollment_number: &str) -> RepoResult<Option<Student>> {
        let mut students = self.query_students(
            "WHERE e.numero_inscripcion = ?1 ORDER BY p.rowid ASC LIMIT 1",
            [enrollment_number],
        )?;
        Ok(students.pop())
    }

    fn find_by_status(&self, status: &str) -> RepoResult<Vec<Student>> {
        self.query_students(
            "WHERE e.estado = ?1 COLLATE NOCASE ORDER BY p.rowid ASC",
            [status],
        )
    }
}

fn ensure_email_available(tx: &Transaction<'_>, email: &str, id_text: &str) -> RepoResult<()> {
    let owner: Option<String> = tx
        .query_row(
            "SELECT id_persona
             FROM persona
             WHERE email = ?1
               AND id_persona <> ?2
             LIMIT 1;",
            params![email, id_text],
            |row| row.get(0),
        )
        .optional()?;

    if owner.is_some() {
        return Err(RepoError::ConstraintViolation(format!(
            "email `{email}` is already registered"
        )));
    }
    Ok(())
}

fn upsert_person(tx: &Transaction<'_>, id_text: &str, person: &Person) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO persona (
            id_persona,
            nombre,
            apellido,
            email,
            fecha_nacimiento
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (id_persona) DO UPDATE SET
            nombre = excluded.nombre,
            apellido = excluded.apellido,
            email = excluded.email,
            fecha_nacimiento = excluded.fecha_nacimiento;",
        params![
            id_text,
            person.first_name.as_str(),
            person.last_name.as_str(),
            person.email.as_str(),
            date_to_db(person.birth_date),
        ],
    )?;
    Ok(())
}

fn upsert_student(tx: &Transaction<'_>, id_text: &str, student: &Student) -> RepoResult<()> {
    let audit = &student.audit;
    tx.execute(
        "INSERT INTO estudiante (
            id_persona,
            numero_inscripcion,
            estado,
            usuario_alta,
            fecha_alta,
            usuario_modificacion,
            fecha_modificacion,
            usuario_baja,
            fecha_baja,
            motivo_baja
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT (id_persona) DO UPDATE SET
            numero_inscripcion = excluded.numero_inscripcion,
            estado = excluded.estado,
            usuario_alta = excluded.usuario_alta,
            fecha_alta = excluded.fecha_alta,
            usuario_modificacion = excluded.usuario_modificacion,
            fecha_modificacion = excluded.fecha_modificacion,
            usuario_baja = excluded.usuario_baja,
            fecha_baja = excluded.fecha_baja,
            motivo_baja = excluded.motivo_baja;",
        params![
            id_text,
            student.enrollment_number.as_str(),
            student.status.as_deref(),
            audit.created_by.as_deref(),
            audit.created_at.map(date_to_db),
            audit.modified_by.as_deref(),
            audit.modified_at.map(date_to_db),
            audit.deactivated_by.as_deref(),
            audit.deactivated_at.map(date_to_db),
            audit.deactivation_reason.as_deref(),
        ],
    )?;
    Ok(())
}

fn replace_course_links(tx: &Transaction<'_>, id_text: &str, courses: &[Course]) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM estudiante_materia WHERE id_estudiante = ?1;",
        [id_text],
    )?;

    let mut linked_codes = HashSet::new();
    for (position, course) in courses.iter().enumerate() {
        if !linked_codes.insert(course.code.to_ascii_lowercase()) {
            continue;
        }

        let linked = tx.execute(
            "INSERT INTO estudiante_materia (id_estudiante, codigo_materia, posicion)
             SELECT ?1, codigo_unico, ?2
             FROM materia
             WHERE codigo_unico = ?3;",
            params![id_text, position as i64, course.code.as_str()],
        )?;
        if linked == 0 {
            return Err(RepoError::ConstraintViolation(format!(
                "course `{}` is not registered",
                course.code
            )));
        }
    }

    Ok(())
}

fn load_courses_for_student(conn: &Connection, id: PersonId) -> RepoResult<Vec<Course>> {
    let mut stmt = conn.prepare(
        "SELECT
            m.codigo_unico AS codigo_unico,
            m.nombre_materia AS nombre_materia,
            m.creditos AS creditos
         FROM estudiante_materia em
         INNER JOIN materia m ON m.codigo_unico = em.codigo_materia
         WHERE em.id_estudiante = ?1
         ORDER BY em.posicion ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut courses = Vec::new();
    while let Some(row) = rows.next()? {
        courses.push(parse_course_row(row)?);
    }
    Ok(courses)
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<(PersonId, Student)> {
    let id_text: String = row.get("id_persona")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in persona.id_persona"))
    })?;

    let person = Person {
        id: Some(id),
        first_name: row.get("nombre")?,
        last_name: row.get("apellido")?,
        email: row.get("email")?,
        birth_date: parse_date(&row.get::<_, String>("fecha_nacimiento")?, "persona.fecha_nacimiento")?,
    };

    let audit = StudentAudit {
        created_by: row.get("usuario_alta")?,
        created_at: parse_optional_date(row.get("fecha_alta")?, "estudiante.fecha_alta")?,
        modified_by: row.get("usuario_modificacion")?,
        modified_at: parse_optional_date(
            row.get("fecha_modificacion")?,
            "estudiante.fecha_modificacion",
        )?,
        deactivated_by: row.get("usuario_baja")?,
        deactivated_at: parse_optional_date(row.get("fecha_baja")?, "estudiante.fecha_baja")?,
        deactivation_reason: row.get("motivo_baja")?,
    };

    let student = Student {
        person,
        enrollment_number: row.get("numero_inscripcion")?,
        status: row.get("estado")?,
        audit,
        courses: Vec::new(),
    };
    Ok((id, student))
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn parse_optional_date(value: Option<String>, column: &str) -> RepoResult<Option<NaiveDate>> {
    value.map(|text| parse_date(&text, column)).transpose()
}
