use coursepath_core::db::{now_epoch_ms, open_db_in_memory};
use coursepath_core::{
    parse_seed_json, CatalogService, ClassifyError, EnrollmentRepository, EnrollmentService,
    EnrollmentServiceError, ErrorKind, RepoError, SqliteCatalogRepository,
    SqliteEnrollmentRepository, SqliteUserRepository, User, UserId, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

const CATALOG_JSON: &str = include_str!("fixtures/catalog.json");

fn seeded_conn() -> Connection {
    let conn = open_db_in_memory().unwrap();
    CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap())
        .seed_catalog(parse_seed_json(CATALOG_JSON).unwrap())
        .unwrap();
    conn
}

fn create_user(conn: &Connection, email: &str) -> UserId {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: "$2b$04$placeholder".to_string(),
        created_at: now_epoch_ms(),
    };
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&user)
        .unwrap();
    user.id
}

fn enrollments(conn: &Connection) -> EnrollmentService<SqliteEnrollmentRepository<'_>> {
    EnrollmentService::new(SqliteEnrollmentRepository::try_new(conn).unwrap())
}

#[test]
fn enroll_opens_the_gate_for_that_course_only() {
    let conn = seeded_conn();
    let user_id = create_user(&conn, "ada@example.com");
    let service = enrollments(&conn);

    assert!(!service.is_enrolled(user_id, "physics-101").unwrap());
    let enrollment = service.enroll(user_id, "physics-101").unwrap();

    assert_eq!(enrollment.user_id, user_id);
    assert_eq!(enrollment.course_id, "physics-101");
    assert_eq!(enrollment.course_title, "Introduction to Physics");
    assert!(service.is_enrolled(user_id, "physics-101").unwrap());
    assert!(!service.is_enrolled(user_id, "chemistry-101").unwrap());
}

#[test]
fn re_enrolling_is_conflict_and_keeps_original() {
    let conn = seeded_conn();
    let user_id = create_user(&conn, "ada@example.com");
    let service = enrollments(&conn);

    let original = service.enroll(user_id, "physics-101").unwrap();
    let err = service.enroll(user_id, "physics-101").unwrap_err();
    assert!(matches!(err, EnrollmentServiceError::AlreadyEnrolled { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let listed = service.list_enrollments(user_id).unwrap();
    assert_eq!(listed, vec![original]);
}

#[test]
fn storage_rejects_duplicate_pairs_that_skip_the_precheck() {
    let conn = seeded_conn();
    let user_id = create_user(&conn, "ada@example.com");
    enrollments(&conn).enroll(user_id, "physics-101").unwrap();

    let result = conn.execute(
        "INSERT INTO enrollments (id, user_id, course_id, enrolled_at) VALUES (?1, ?2, ?3, ?4);",
        rusqlite::params![
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            "physics-101",
            now_epoch_ms()
        ],
    );
    assert!(result.is_err());
}

#[test]
fn unknown_user_or_course_is_not_found() {
    let conn = seeded_conn();
    let user_id = create_user(&conn, "ada@example.com");
    let service = enrollments(&conn);

    let missing_course = service.enroll(user_id, "biology-101").unwrap_err();
    assert!(matches!(missing_course, EnrollmentServiceError::CourseNotFound(_)));
    assert_eq!(missing_course.kind(), ErrorKind::NotFound);

    let missing_user = service.enroll(Uuid::new_v4(), "physics-101").unwrap_err();
    assert!(matches!(missing_user, EnrollmentServiceError::UserNotFound(_)));
    assert_eq!(missing_user.kind(), ErrorKind::NotFound);
}

#[test]
fn list_enrollments_is_newest_first_and_per_user() {
    let conn = seeded_conn();
    let ada = create_user(&conn, "ada@example.com");
    let bob = create_user(&conn, "bob@example.com");
    let service = enrollments(&conn);

    service.enroll(ada, "physics-101").unwrap();
    service.enroll(ada, "chemistry-101").unwrap();
    service.enroll(bob, "empty-101").unwrap();

    let courses: Vec<String> = service
        .list_enrollments(ada)
        .unwrap()
        .into_iter()
        .map(|enrollment| enrollment.course_id)
        .collect();
    assert_eq!(courses, vec!["chemistry-101", "physics-101"]);
    assert_eq!(service.list_enrollments(bob).unwrap().len(), 1);
}

#[test]
fn repository_reports_duplicate_pair_as_conflict() {
    let conn = seeded_conn();
    let user_id = create_user(&conn, "ada@example.com");
    let repo = SqliteEnrollmentRepository::try_new(&conn).unwrap();

    let first = repo
        .create_enrollment(Uuid::new_v4(), user_id, "physics-101", now_epoch_ms())
        .unwrap();
    let err = repo
        .create_enrollment(Uuid::new_v4(), user_id, "physics-101", now_epoch_ms())
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
    assert_eq!(repo.list_enrollments(user_id).unwrap(), vec![first]);
}

#[test]
fn unknown_user_has_no_enrollments() {
    let conn = seeded_conn();

    let listed = enrollments(&conn).list_enrollments(Uuid::new_v4()).unwrap();
    assert!(listed.is_empty());
}
