use chrono::NaiveDate;
use rusqlite::Connection;
use universidad_core::db::open_db_in_memory;
use universidad_core::{
    Course, CourseRepository, ErrorKind, FixedClock, SqliteCourseRepository,
    SqliteStudentRepository, StudentDto, StudentService, StudentServiceError, STATUS_INACTIVE,
};
use uuid::Uuid;

type Service<'conn> = StudentService<SqliteStudentRepository<'conn>, SqliteCourseRepository<'conn>>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 5, 10)
}

fn service(conn: &Connection) -> Service<'_> {
    StudentService::new(
        SqliteStudentRepository::try_new(conn).unwrap(),
        SqliteCourseRepository::try_new(conn).unwrap(),
    )
    .with_clock(FixedClock(today()))
}

fn dto(first_name: &str, email: &str, enrollment: &str, status: Option<&str>) -> StudentDto {
    StudentDto {
        first_name: Some(first_name.to_string()),
        last_name: Some("Diaz".to_string()),
        email: Some(email.to_string()),
        birth_date: Some(date(2001, 3, 14)),
        enrollment_number: Some(enrollment.to_string()),
        status: status.map(str::to_string),
        created_by: Some("registrar".to_string()),
        created_at: Some(date(2024, 2, 1)),
        ..StudentDto::default()
    }
}

fn register_course(conn: &Connection, code: &str) {
    SqliteCourseRepository::try_new(conn)
        .unwrap()
        .save_course(&Course::new(code, format!("Materia {code}"), 6))
        .unwrap();
}

#[test]
fn create_assigns_id_and_keeps_submitted_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let submitted = dto("Ana", "ana@x.com", "A100", None);
    let created = service.create(submitted.clone()).unwrap();

    let id = created.id.expect("created student has an id");
    let loaded = service.find_by_id(id).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        StudentDto {
            id: None,
            ..loaded
        },
        submitted
    );
    assert!(created.status.is_none());
}

#[test]
fn create_then_list_by_course_without_links_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service
        .create(dto("Ana", "ana@x.com", "A100", Some("activo")))
        .unwrap();
    assert!(created.id.is_some());
    assert_eq!(created.status.as_deref(), Some("activo"));

    assert!(service.list_by_course("MAT101").unwrap().is_empty());
}

#[test]
fn create_rejects_missing_fields_duplicate_email_and_existing_id() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let missing = StudentDto {
        birth_date: None,
        ..dto("Ana", "ana@x.com", "A100", None)
    };
    let err = service.create(missing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert!(err.to_string().contains("fechaNacimiento"));

    let created = service
        .create(dto("Ana", "ana@x.com", "A100", None))
        .unwrap();

    let err = service
        .create(dto("Otra", "ana@x.com", "A101", None))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

    let reused_id = StudentDto {
        id: created.id,
        ..dto("Beto", "beto@x.com", "A102", None)
    };
    let err = service.create(reused_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert_eq!(service.list_all().unwrap().len(), 1);
}

#[test]
fn find_by_enrollment_returns_match_or_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .create(dto("Ana", "ana@x.com", "A100", None))
        .unwrap();
    service
        .create(dto("Beto", "beto@x.com", "A200", None))
        .unwrap();

    let found = service.find_by_enrollment("A200").unwrap();
    assert_eq!(found.first_name.as_deref(), Some("Beto"));

    let err = service.find_by_enrollment("Z999").unwrap_err();
    assert!(matches!(err, StudentServiceError::EnrollmentNotFound(ref number) if number == "Z999"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn find_by_enrollment_with_duplicates_returns_first_created() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let first = service
        .create(dto("Ana", "ana@x.com", "DUP", None))
        .unwrap();
    service
        .create(dto("Beto", "beto@x.com", "DUP", None))
        .unwrap();
    service
        .update(first.id.unwrap(), &dto("Ana2", "ana@x.com", "DUP", None), "admin")
        .unwrap();

    let found = service.find_by_enrollment("DUP").unwrap();
    assert_eq!(found.id, first.id);
    assert_eq!(found.first_name.as_deref(), Some("Ana2"));
}

#[test]
fn list_active_is_stable_subsequence_of_list_all() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let statuses = [
        ("Ana", Some("activo")),
        ("Beto", Some("inactivo")),
        ("Carla", Some("ACTIVO")),
        ("Dani", None),
        ("Eva", Some("Activo")),
    ];
    for (index, (name, status)) in statuses.iter().enumerate() {
        service
            .create(dto(name, &format!("{name}@x.com"), &format!("A{index}"), *status))
            .unwrap();
    }

    let all = service.list_all().unwrap();
    let expected: Vec<StudentDto> = all
        .iter()
        .filter(|student| {
            student
                .status
                .as_deref()
                .is_some_and(|status| status.eq_ignore_ascii_case("activo"))
        })
        .cloned()
        .collect();
    let active = service.list_active().unwrap();

    assert_eq!(active, expected);
    let names: Vec<&str> = active
        .iter()
        .filter_map(|student| student.first_name.as_deref())
        .collect();
    assert_eq!(names, vec!["Ana", "Carla", "Eva"]);

    assert_eq!(service.list_by_status("activo").unwrap(), expected);
}

#[test]
fn update_changes_only_person_fields_and_modification_stamp() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create(dto("Ana", "ana@x.com", "A100", Some("activo")))
        .unwrap();
    let id = created.id.unwrap();

    let changes = StudentDto {
        status: Some("inactivo".to_string()),
        created_by: Some("intruso".to_string()),
        ..dto("Ana Maria", "anamaria@x.com", "A900", None)
    };
    let changes = StudentDto {
        birth_date: Some(date(2000, 1, 2)),
        ..changes
    };
    let updated = service.update(id, &changes, "secretaria").unwrap();

    let expected = StudentDto {
        first_name: Some("Ana Maria".to_string()),
        email: Some("anamaria@x.com".to_string()),
        birth_date: Some(date(2000, 1, 2)),
        enrollment_number: Some("A900".to_string()),
        modified_by: Some("secretaria".to_string()),
        modified_at: Some(today()),
        ..created
    };
    assert_eq!(updated, expected);
    assert_eq!(service.find_by_id(id).unwrap(), expected);
}

#[test]
fn update_after_soft_delete_keeps_status_and_baja_fields() {
    let conn = open_db_in_memory().unwrap();
    let id = {
        let earlier = StudentService::new(
            SqliteStudentRepository::try_new(&conn).unwrap(),
            SqliteCourseRepository::try_new(&conn).unwrap(),
        )
        .with_clock(FixedClock(date(2024, 1, 1)));
        let created = earlier
            .create(dto("Ana", "ana@x.com", "A100", Some("activo")))
            .unwrap();
        let id = created.id.unwrap();
        let request = StudentDto {
            deactivation_reason: Some("r".to_string()),
            ..StudentDto::default()
        };
        earlier.soft_delete(id, &request, "rector").unwrap();
        id
    };

    let service = service(&conn);
    let deleted = service.find_by_id(id).unwrap();
    let updated = service
        .update(id, &dto("Ana Maria", "ana@x.com", "A100", None), "sec")
        .unwrap();

    assert_eq!(updated.status.as_deref(), Some(STATUS_INACTIVE));
    assert_eq!(updated.deactivated_by.as_deref(), Some("rector"));
    assert_eq!(updated.deactivated_at, Some(date(2024, 1, 1)));
    assert_eq!(updated.deactivation_reason.as_deref(), Some("r"));
    assert_eq!(
        updated,
        StudentDto {
            first_name: Some("Ana Maria".to_string()),
            modified_by: Some("sec".to_string()),
            modified_at: Some(today()),
            ..deleted
        }
    );
}

#[test]
fn update_reports_not_found_and_blank_actor() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let missing = Uuid::new_v4();

    let err = service
        .update(missing, &dto("Ana", "ana@x.com", "A100", None), "admin")
        .unwrap_err();
    assert!(matches!(err, StudentServiceError::StudentNotFound(id) if id == missing));

    let created = service
        .create(dto("Ana", "ana@x.com", "A100", None))
        .unwrap();
    let err = service
        .update(created.id.unwrap(), &dto("Ana", "ana@x.com", "A100", None), "  ")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
}

#[test]
fn update_to_taken_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .create(dto("Ana", "ana@x.com", "A100", None))
        .unwrap();
    let beto = service
        .create(dto("Beto", "beto@x.com", "A200", None))
        .unwrap();

    let err = service
        .update(beto.id.unwrap(), &dto("Beto", "ana@x.com", "A200", None), "admin")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert_eq!(
        service.find_by_id(beto.id.unwrap()).unwrap().email.as_deref(),
        Some("beto@x.com")
    );
}

#[test]
fn soft_delete_sets_inactive_and_baja_fields_only() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create(dto("Ana", "ana@x.com", "A100", Some("activo")))
        .unwrap();
    let id = created.id.unwrap();

    let request = StudentDto {
        deactivation_reason: Some("traslado".to_string()),
        first_name: Some("ignored".to_string()),
        ..StudentDto::default()
    };
    let deleted = service.soft_delete(id, &request, "rector").unwrap();

    let expected = StudentDto {
        status: Some(STATUS_INACTIVE.to_string()),
        deactivated_by: Some("rector".to_string()),
        deactivated_at: Some(today()),
        deactivation_reason: Some("traslado".to_string()),
        ..created
    };
    assert_eq!(deleted, expected);
    assert_eq!(service.list_all().unwrap().len(), 1);
    assert!(service.list_active().unwrap().is_empty());
}

#[test]
fn repeated_soft_delete_restamps_baja_fields() {
    let conn = open_db_in_memory().unwrap();
    let id = {
        let service = service(&conn);
        let created = service
            .create(dto("Ana", "ana@x.com", "A100", Some("activo")))
            .unwrap();
        let id = created.id.unwrap();
        let first = StudentDto {
            deactivation_reason: Some("traslado".to_string()),
            ..StudentDto::default()
        };
        service.soft_delete(id, &first, "admin").unwrap();
        id
    };

    let later = StudentService::new(
        SqliteStudentRepository::try_new(&conn).unwrap(),
        SqliteCourseRepository::try_new(&conn).unwrap(),
    )
    .with_clock(FixedClock(date(2024, 6, 1)));
    let second = StudentDto {
        deactivation_reason: Some("abandono".to_string()),
        ..StudentDto::default()
    };
    let deleted = later.soft_delete(id, &second, "rector").unwrap();

    assert_eq!(deleted.status.as_deref(), Some(STATUS_INACTIVE));
    assert_eq!(deleted.deactivated_by.as_deref(), Some("rector"));
    assert_eq!(deleted.deactivated_at, Some(date(2024, 6, 1)));
    assert_eq!(deleted.deactivation_reason.as_deref(), Some("abandono"));
}

#[test]
fn soft_delete_unknown_student_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .soft_delete(Uuid::new_v4(), &StudentDto::default(), "admin")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn courses_of_distinguishes_missing_student_and_empty_courses() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.courses_of(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let created = service
        .create(dto("Ana", "ana@x.com", "A100", None))
        .unwrap();
    let id = created.id.unwrap();
    let err = service.courses_of(id).unwrap_err();
    assert!(matches!(err, StudentServiceError::NoCoursesAssigned(student) if student == id));
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
}

#[test]
fn assign_course_links_catalog_courses_idempotently() {
    let conn = open_db_in_memory().unwrap();
    register_course(&conn, "MAT101");
    register_course(&conn, "FIS200");
    let service = service(&conn);

    let ana = service
        .create(dto("Ana", "ana@x.com", "A100", Some("activo")))
        .unwrap();
    let beto = service
        .create(dto("Beto", "beto@x.com", "A200", Some("activo")))
        .unwrap();
    let ana_id = ana.id.unwrap();

    service.assign_course(ana_id, "MAT101", "admin").unwrap();
    let courses = service.assign_course(ana_id, "fis200", "admin").unwrap();
    let again = service.assign_course(ana_id, "mat101", "admin").unwrap();
    assert_eq!(courses, again);

    let codes: Vec<&str> = courses.iter().map(|course| course.code.as_str()).collect();
    assert_eq!(codes, vec!["MAT101", "FIS200"]);
    assert_eq!(service.courses_of(ana_id).unwrap(), courses);

    service
        .assign_course(beto.id.unwrap(), "FIS200", "admin")
        .unwrap();

    let mat: Vec<Option<String>> = service
        .list_by_course("mat101")
        .unwrap()
        .into_iter()
        .map(|student| student.first_name)
        .collect();
    assert_eq!(mat, vec![Some("Ana".to_string())]);
    assert_eq!(service.list_by_course("FIS200").unwrap().len(), 2);

    let touched = service.find_by_id(ana_id).unwrap();
    assert_eq!(touched.modified_by.as_deref(), Some("admin"));
    assert_eq!(touched.modified_at, Some(today()));
}

#[test]
fn assign_unknown_course_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create(dto("Ana", "ana@x.com", "A100", None))
        .unwrap();

    let err = service
        .assign_course(created.id.unwrap(), "QUI300", "admin")
        .unwrap_err();
    assert!(matches!(err, StudentServiceError::CourseNotFound(ref code) if code == "QUI300"));
}

#[test]
fn save_failures_in_soft_delete_and_assign_course_surface_as_constraint_violations() {
    let conn = open_db_in_memory().unwrap();
    register_course(&conn, "MAT101");
    let service = service(&conn);
    let created = service
        .create(dto("Ana", "ana@x.com", "A100", Some("activo")))
        .unwrap();
    let id = created.id.unwrap();
    conn.execute(
        "UPDATE persona SET email = 'sin-arroba' WHERE id_persona = ?1;",
        [id.to_string()],
    )
    .unwrap();

    let err = service
        .soft_delete(id, &StudentDto::default(), "rector")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

    let err = service.assign_course(id, "MAT101", "rector").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

    let stored = service.find_by_id(id).unwrap();
    assert_eq!(stored.status.as_deref(), Some("activo"));
    assert!(service.list_by_course("MAT101").unwrap().is_empty());
}
