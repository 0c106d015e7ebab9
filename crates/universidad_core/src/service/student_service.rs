//! Student use-case service.
//!
//! # Responsibility
//! - Orchestrate record store calls into list/lookup/create/update/soft-delete
//!   use cases.
//! - Map entities to `StudentDto` at the boundary.
//! - Turn absent records into typed not-found errors.
//!
//! # Invariants
//! - Entities are never cached across calls; every operation reads the store.
//! - Update touches only person data, enrollment number and modification
//!   stamps.
//! - Soft delete flips status to `inactivo` and restamps baja fields; rows are
//!   never removed.
//! - Audit stamps use the caller-supplied actor and the service clock.

use crate::dto::student_dto::StudentDto;
use crate::model::course::Course;
use crate::model::person::PersonId;
use crate::model::student::{Student, StudentUpdate};
use crate::model::validation::ValidationError;
use crate::repo::course_repo::CourseRepository;
use crate::repo::student_repo::{RepoError, StudentRepository};
use crate::service::clock::{Clock, SystemClock};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, StudentServiceError>;

/// Coarse error category, stable enough for a transport layer to map onto
/// status codes (404 / 409 / 422 / 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ConstraintViolation,
    BusinessRule,
    Internal,
}

/// Errors from student service operations.
#[derive(Debug)]
pub enum StudentServiceError {
    /// No student with this id.
    StudentNotFound(PersonId),
    /// No student with this enrollment number.
    EnrollmentNotFound(String),
    /// No catalog course with this code.
    CourseNotFound(String),
    /// Missing/invalid field, duplicate email or id, unknown course link.
    ConstraintViolation(String),
    /// Student exists but has no course assigned.
    NoCoursesAssigned(PersonId),
    /// Storage failure.
    Repo(RepoError),
}

impl StudentServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StudentNotFound(_) | Self::EnrollmentNotFound(_) | Self::CourseNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Self::NoCoursesAssigned(_) => ErrorKind::BusinessRule,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }

    fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "not_found",
            ErrorKind::ConstraintViolation => "constraint_violation",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Display for StudentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::EnrollmentNotFound(number) => {
                write!(f, "student not found for enrollment number `{number}`")
            }
            Self::CourseNotFound(code) => write!(f, "course not found: `{code}`"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::NoCoursesAssigned(id) => write!(f, "student {id} has no courses assigned"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StudentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StudentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::ConstraintViolation(err.to_string()),
            RepoError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for StudentServiceError {
    fn from(value: ValidationError) -> Self {
        Self::ConstraintViolation(value.to_string())
    }
}

/// Student service facade over record store implementations.
pub struct StudentService<S: StudentRepository, C: CourseRepository> {
    students: S,
    courses: C,
    clock: Box<dyn Clock>,
}

impl<S: StudentRepository, C: CourseRepository> StudentService<S, C> {
    /// Creates a service stamping audit dates from the system clock.
    pub fn new(students: S, courses: C) -> Self {
        Self {
            students,
            courses,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the date source used for audit stamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Lists all students in store order.
    pub fn list_all(&self) -> ServiceResult<Vec<StudentDto>> {
        let students = self.students.find_all()?;
        Ok(students.iter().map(StudentDto::from).collect())
    }

    pub fn find_by_id(&self, id: PersonId) -> ServiceResult<StudentDto> {
        self.require_student(id).map(StudentDto::from)
    }

    /// Looks up one student by enrollment number.
    ///
    /// # Errors
    /// - `EnrollmentNotFound` when no student carries the number.
    pub fn find_by_enrollment(&self, enrollment_number: &str) -> ServiceResult<StudentDto> {
        self.students
            .find_by_enrollment_number(enrollment_number)?
            .map(StudentDto::from)
            .ok_or_else(|| StudentServiceError::EnrollmentNotFound(enrollment_number.to_string()))
    }

    /// Lists students whose status is `activo` (any case), in store order.
    pub fn list_active(&self) -> ServiceResult<Vec<StudentDto>> {
        let students = self.students.find_all()?;
        Ok(students
            .iter()
            .filter(|student| student.is_active())
            .map(StudentDto::from)
            .collect())
    }

    /// Lists students with the given status (any case), in store order.
    pub fn list_by_status(&self, status: &str) -> ServiceResult<Vec<StudentDto>> {
        let students = self.students.find_by_status(status)?;
        Ok(students.iter().map(StudentDto::from).collect())
    }

    /// Returns the courses a student is enrolled in.
    ///
    /// # Errors
    /// - `StudentNotFound` when the id is unknown.
    /// - `NoCoursesAssigned` when the student has no course.
    pub fn courses_of(&self, student_id: PersonId) -> ServiceResult<Vec<Course>> {
        let student = self.require_student(student_id)?;
        if student.courses.is_empty() {
            return Err(StudentServiceError::NoCoursesAssigned(student_id));
        }
        Ok(student.courses)
    }

    /// Lists students enrolled in the course with `course_code` (any case).
    pub fn list_by_course(&self, course_code: &str) -> ServiceResult<Vec<StudentDto>> {
        let students = self.students.find_all()?;
        Ok(students
            .iter()
            .filter(|student| student.has_course(course_code))
            .map(StudentDto::from)
            .collect())
    }

    /// Persists a new student from submitted data.
    ///
    /// Status and audit fields are stored as submitted. A submitted id is
    /// kept, but must not belong to an existing student.
    pub fn create(&self, dto: StudentDto) -> ServiceResult<StudentDto> {
        let student = Student::try_from(dto)?;
        if let Some(id) = student.id() {
            if self.students.find_by_id(id)?.is_some() {
                return Err(self.reject(
                    "student_create",
                    StudentServiceError::ConstraintViolation(format!(
                        "student {id} already exists"
                    )),
                ));
            }
        }

        let saved = self
            .students
            .save(&student)
            .map_err(|err| self.reject("student_create", err.into()))?;
        info!(
            "event=student_create module=service status=ok student_id={}",
            display_id(&saved)
        );
        Ok(StudentDto::from(&saved))
    }

    /// Overwrites person data and enrollment number of an existing student.
    ///
    /// # Errors
    /// - `StudentNotFound` when the id is unknown.
    /// - `ConstraintViolation` for blank actor, missing/invalid fields or a
    ///   duplicate email.
    pub fn update(&self, id: PersonId, dto: &StudentDto, actor: &str) -> ServiceResult<StudentDto> {
        let actor = normalize_actor(actor)?;
        let mut student = self.require_student(id)?;
        let update = StudentUpdate::try_from(dto)?;

        student.apply_update(update, actor, self.clock.today());
        let saved = self
            .students
            .save(&student)
            .map_err(|err| self.reject("student_update", err.into()))?;
        info!("event=student_update module=service status=ok student_id={id}");
        Ok(StudentDto::from(&saved))
    }

    /// Marks a student `inactivo`, recording who, when and why.
    ///
    /// Only `dto.deactivation_reason` is read from the submitted data.
    pub fn soft_delete(
        &self,
        id: PersonId,
        dto: &StudentDto,
        actor: &str,
    ) -> ServiceResult<StudentDto> {
        let actor = normalize_actor(actor)?;
        let mut student = self.require_student(id)?;

        student.deactivate(dto.deactivation_reason.clone(), actor, self.clock.today());
        let saved = self
            .students
            .save(&student)
            .map_err(|err| self.reject("student_soft_delete", err.into()))?;
        info!("event=student_soft_delete module=service status=ok student_id={id}");
        Ok(StudentDto::from(&saved))
    }

    /// Links a catalog course to a student. Linking twice is a no-op.
    ///
    /// Returns the student's courses after the change.
    pub fn assign_course(
        &self,
        student_id: PersonId,
        course_code: &str,
        actor: &str,
    ) -> ServiceResult<Vec<Course>> {
        let actor = normalize_actor(actor)?;
        let mut student = self.require_student(student_id)?;
        let course = self
            .courses
            .find_course_by_code(course_code)?
            .ok_or_else(|| StudentServiceError::CourseNotFound(course_code.to_string()))?;

        if !student.add_course(course) {
            return Ok(student.courses);
        }

        student.touch(actor, self.clock.today());
        let saved = self
            .students
            .save(&student)
            .map_err(|err| self.reject("student_assign_course", err.into()))?;
        info!(
            "event=student_assign_course module=service status=ok student_id={student_id} courses={}",
            saved.courses.len()
        );
        Ok(saved.courses)
    }

    fn require_student(&self, id: PersonId) -> ServiceResult<Student> {
        self.students
            .find_by_id(id)?
            .ok_or(StudentServiceError::StudentNotFound(id))
    }

    fn reject(&self, event: &str, err: StudentServiceError) -> StudentServiceError {
        warn!(
            "event={event} module=service status=error error_code={}",
            err.code()
        );
        err
    }
}

fn normalize_actor(actor: &str) -> ServiceResult<&str> {
    let trimmed = actor.trim();
    if trimmed.is_empty() {
        return Err(StudentServiceError::ConstraintViolation(
            "audit actor must not be blank".to_string(),
        ));
    }
    Ok(trimmed)
}

fn display_id(student: &Student) -> String {
    student
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string())
}
