use coursepath_core::db::open_db_in_memory;
use coursepath_core::{
    parse_seed_json, CatalogService, CatalogServiceError, ClassifyError, ErrorKind,
    SqliteCatalogRepository,
};
use rusqlite::Connection;

const CATALOG_JSON: &str = include_str!("fixtures/catalog.json");

fn seeded(conn: &Connection) -> CatalogService<SqliteCatalogRepository<'_>> {
    let service = CatalogService::new(SqliteCatalogRepository::try_new(conn).unwrap());
    service
        .seed_catalog(parse_seed_json(CATALOG_JSON).unwrap())
        .unwrap();
    service
}

#[test]
fn seeding_reports_counts() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());

    let report = service
        .seed_catalog(parse_seed_json(CATALOG_JSON).unwrap())
        .unwrap();
    assert!(!report.skipped);
    assert_eq!(report.courses, 3);
    assert_eq!(report.topics, 3);
    assert_eq!(report.subtopics, 5);
}

#[test]
fn seeding_twice_does_not_duplicate_catalog() {
    let conn = open_db_in_memory().unwrap();
    let service = seeded(&conn);

    let second = service
        .seed_catalog(parse_seed_json(CATALOG_JSON).unwrap())
        .unwrap();
    assert!(second.skipped);
    assert_eq!(second.courses, 0);
    assert_eq!(service.list_courses().unwrap().len(), 3);
}

#[test]
fn list_courses_keeps_catalog_order_and_counts() {
    let conn = open_db_in_memory().unwrap();
    let service = seeded(&conn);

    let courses = service.list_courses().unwrap();
    let ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["physics-101", "chemistry-101", "empty-101"]);
    assert_eq!(courses[0].topic_count, 2);
    assert_eq!(courses[0].subtopic_count, 4);
    assert_eq!(courses[2].topic_count, 0);
    assert_eq!(courses[2].description, None);
}

#[test]
fn get_course_returns_ordered_tree() {
    let conn = open_db_in_memory().unwrap();
    let service = seeded(&conn);

    let course = service.get_course("physics-101").unwrap();
    let topics: Vec<&str> = course.topics.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(topics, vec!["Kinematics", "Dynamics"]);

    let kinematics = &course.topics[0];
    assert_eq!(kinematics.course_id, "physics-101");
    let subtopics: Vec<(&str, i64)> = kinematics
        .subtopics
        .iter()
        .map(|s| (s.id.as_str(), s.order_index))
        .collect();
    assert_eq!(subtopics, vec![("velocity", 0), ("acceleration", 1)]);
    assert_eq!(kinematics.subtopics[0].topic_id, "kinematics");
}

#[test]
fn get_unknown_course_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = seeded(&conn);

    let err = service.get_course("biology-101").unwrap_err();
    assert!(matches!(err, CatalogServiceError::CourseNotFound(ref id) if id == "biology-101"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn invalid_seed_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteCatalogRepository::try_new(&conn).unwrap());
    let seed = parse_seed_json(
        r#"{"courses":[
            {"id":"a","title":"A"},
            {"id":"a","title":"A again"}
        ]}"#,
    )
    .unwrap();

    let err = service.seed_catalog(seed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(service.list_courses().unwrap().is_empty());
}

#[test]
fn course_serializes_with_nested_topics() {
    let conn = open_db_in_memory().unwrap();
    let service = seeded(&conn);

    let json = serde_json::to_value(service.get_course("chemistry-101").unwrap()).unwrap();
    assert_eq!(json["topics"][0]["title"], "Atomic Structure");
    assert_eq!(json["topics"][0]["subtopics"][0]["id"], "nucleus");
}
