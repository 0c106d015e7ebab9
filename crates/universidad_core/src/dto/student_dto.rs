//! Boundary projection of [`Student`].
//!
//! # Invariants
//! - The course collection is never part of the projection.
//! - Entity → DTO is total; DTO → entity fails only on missing mandatory
//!   fields.

use crate::model::person::{Person, PersonId};
use crate::model::student::{Student, StudentAudit, StudentUpdate};
use crate::model::validation::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Flat, serde-ready view of a student.
///
/// All fields are optional: callers may leave server-decided fields unset,
/// and unset fields are omitted on output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PersonId>,
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "apellido", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "fechaNacimiento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "numeroInscripcion", skip_serializing_if = "Option::is_none")]
    pub enrollment_number: Option<String>,
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "usuarioAlta", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(rename = "fechaAlta", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDate>,
    #[serde(rename = "usuarioModificacion", skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(rename = "fechaModificacion", skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<NaiveDate>,
    #[serde(rename = "usuarioBaja", skip_serializing_if = "Option::is_none")]
    pub deactivated_by: Option<String>,
    #[serde(rename = "fechaBaja", skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<NaiveDate>,
    #[serde(rename = "motivoBaja", skip_serializing_if = "Option::is_none")]
    pub deactivation_reason: Option<String>,
}

impl From<&Student> for StudentDto {
    fn from(student: &Student) -> Self {
        let audit = &student.audit;
        Self {
            id: student.person.id,
            first_name: Some(student.person.first_name.clone()),
            last_name: Some(student.person.last_name.clone()),
            email: Some(student.person.email.clone()),
            birth_date: Some(student.person.birth_date),
            enrollment_number: Some(student.enrollment_number.clone()),
            status: student.status.clone(),
            created_by: audit.created_by.clone(),
            created_at: audit.created_at,
            modified_by: audit.modified_by.clone(),
            modified_at: audit.modified_at,
            deactivated_by: audit.deactivated_by.clone(),
            deactivated_at: audit.deactivated_at,
            deactivation_reason: audit.deactivation_reason.clone(),
        }
    }
}

impl From<Student> for StudentDto {
    fn from(student: Student) -> Self {
        Self::from(&student)
    }
}

impl TryFrom<StudentDto> for Student {
    type Error = ValidationError;

    /// Builds an entity from submitted data. The id is kept when present;
    /// the course collection starts empty.
    fn try_from(dto: StudentDto) -> Result<Self, Self::Error> {
        let mut person = Person::new(
            required(dto.first_name, "nombre")?,
            required(dto.last_name, "apellido")?,
            required(dto.email, "email")?,
            required(dto.birth_date, "fechaNacimiento")?,
        );
        person.id = dto.id;

        let mut student = Student::new(
            person,
            required(dto.enrollment_number, "numeroInscripcion")?,
        );
        student.status = dto.status;
        student.audit = StudentAudit {
            created_by: dto.created_by,
            created_at: dto.created_at,
            modified_by: dto.modified_by,
            modified_at: dto.modified_at,
            deactivated_by: dto.deactivated_by,
            deactivated_at: dto.deactivated_at,
            deactivation_reason: dto.deactivation_reason,
        };
        Ok(student)
    }
}

impl TryFrom<&StudentDto> for StudentUpdate {
    type Error = ValidationError;

    fn try_from(dto: &StudentDto) -> Result<Self, Self::Error> {
        Ok(Self {
            first_name: required(dto.first_name.clone(), "nombre")?,
            last_name: required(dto.last_name.clone(), "apellido")?,
            email: required(dto.email.clone(), "email")?,
            birth_date: required(dto.birth_date, "fechaNacimiento")?,
            enrollment_number: required(dto.enrollment_number.clone(), "numeroInscripcion")?,
        })
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}
