mod support;

use std::fs;

use chrono::NaiveTime;
use support::{catalog_with, lesson, monday, snapshot, t};
use tempfile::NamedTempFile;
use timetable::persistence::{
    InMemoryCatalog, LessonSource, PersistenceError, load_catalog_from_json, load_lessons_from_csv,
    save_catalog_to_json, save_lessons_to_csv,
};
use timetable::{
    ConflictQuery, ConflictType, EngineConfig, LessonFilter, LessonRecord, LessonType,
    TimetableEngine,
};

fn sample_lessons() -> Vec<LessonRecord> {
    let mut online = lesson(2, 1, 2, 2, None, t(10, 0), t(11, 30));
    online.is_online = true;
    online.lesson_type = LessonType::Seminar;
    vec![lesson(1, 1, 1, 1, Some(1), t(9, 0), t(10, 30)), online]
}

#[test]
fn json_snapshot_round_trip() {
    let file = NamedTempFile::new().unwrap();
    let mut original = snapshot();
    original.lessons = sample_lessons();

    save_catalog_to_json(&original, file.path()).unwrap();
    let loaded = load_catalog_from_json(file.path()).unwrap();

    assert_eq!(loaded, original);
}

#[test]
fn json_tables_default_to_empty() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), r#"{ "rooms": [ { "id": 1, "number": "A100" } ] }"#).unwrap();

    let loaded = load_catalog_from_json(file.path()).unwrap();

    assert_eq!(loaded.rooms.len(), 1);
    assert!(loaded.lessons.is_empty());
    assert!(loaded.contracts.is_empty());
}

#[test]
fn json_with_duplicate_ids_is_rejected() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        r#"{ "groups": [ { "id": 1, "name": "A" }, { "id": 1, "name": "B" } ] }"#,
    )
    .unwrap();

    let err = load_catalog_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)), "{err}");
}

#[test]
fn csv_lessons_round_trip_and_resolve() {
    let file = NamedTempFile::new().unwrap();
    let lessons = sample_lessons();

    save_lessons_to_csv(&lessons, file.path()).unwrap();
    let loaded = load_lessons_from_csv(file.path()).unwrap();
    assert_eq!(loaded, lessons);

    let mut catalog = catalog_with(Vec::new());
    for record in loaded {
        catalog.upsert_lesson(record);
    }
    let resolved = catalog.lessons(&LessonFilter::for_schedule(1)).unwrap();
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].room.as_ref().map(|r| r.number.as_str()), Some("A100"));
    assert!(resolved[1].is_online);
    assert!(resolved[1].room.is_none());
    assert_eq!(
        resolved[1].instructor.as_ref().map(|i| i.name.as_str()),
        Some("Alan Turing")
    );
}

#[test]
fn csv_with_a_bad_time_is_rejected() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        "id,schedule_id,group_id,subject_assignment_id,room_id,is_online,date,start_time,end_time,lesson_type\n\
         1,1,1,1,1,false,2025-10-06,9am,10:30,lecture\n",
    )
    .unwrap();

    let err = load_lessons_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)), "{err}");
}

#[test]
fn csv_keeps_seconds_in_lesson_times() {
    let file = NamedTempFile::new().unwrap();
    let mut record = lesson(1, 1, 1, 1, Some(1), t(9, 0), t(10, 30));
    record.start_time = NaiveTime::from_hms_opt(9, 0, 30).unwrap();
    record.end_time = NaiveTime::from_hms_opt(10, 29, 45).unwrap();

    save_lessons_to_csv(std::slice::from_ref(&record), file.path()).unwrap();
    let written = fs::read_to_string(file.path()).unwrap();
    assert!(written.contains("09:00:30,10:29:45"), "{written}");

    let loaded = load_lessons_from_csv(file.path()).unwrap();
    assert_eq!(loaded, vec![record]);
}

#[test]
fn csv_accepts_times_without_seconds() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        "id,schedule_id,group_id,subject_assignment_id,room_id,is_online,date,start_time,end_time,lesson_type\n\
         1,1,1,1,1,false,2025-10-06,09:00,10:30,lecture\n",
    )
    .unwrap();

    let loaded = load_lessons_from_csv(file.path()).unwrap();
    assert_eq!(loaded, vec![lesson(1, 1, 1, 1, Some(1), t(9, 0), t(10, 30))]);
}

#[test]
fn lessons_with_unknown_groups_still_clash_on_rooms() {
    let mut data = snapshot();
    data.lessons = vec![
        lesson(1, 1, 99, 1, Some(1), t(9, 0), t(10, 30)),
        lesson(2, 1, 2, 2, Some(1), t(9, 0), t(10, 30)),
    ];
    let catalog = InMemoryCatalog::from_snapshot(data).unwrap();

    let resolved = catalog.lessons(&LessonFilter::default()).unwrap();
    assert_eq!(resolved.len(), 2);
    assert!(resolved[0].group.is_none());
    assert_eq!(
        resolved[0].instructor.as_ref().map(|i| i.name.as_str()),
        Some("Ada Lovelace")
    );

    let engine = TimetableEngine::new(catalog, EngineConfig::default());
    let summary = engine
        .detect_conflicts(&ConflictQuery {
            conflict_types: Some(vec![ConflictType::Room]),
            ..ConflictQuery::on(monday())
        })
        .unwrap();
    assert_eq!(summary.total_conflicts, 1);
    assert_eq!(summary.single[0].conflict_type, ConflictType::Room);
    assert_eq!(summary.single[0].conflicts[0].lesson_ids(), vec![1, 2]);

    // The group pass has nothing to key the orphan on.
    let groups_only = engine
        .detect_conflicts(&ConflictQuery {
            conflict_types: Some(vec![ConflictType::Group]),
            ..ConflictQuery::on(monday())
        })
        .unwrap();
    assert!(groups_only.is_empty());
}
