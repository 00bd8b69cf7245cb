#![cfg(feature = "sqlite")]

mod support;

use support::{lesson, monday, snapshot, t};
use tempfile::NamedTempFile;
use timetable::persistence::sqlite::SqliteCatalog;
use timetable::persistence::{LessonSource, LoadLedger};
use timetable::{
    BudgetError, ConflictQuery, ConflictType, EngineConfig, EngineError, LessonFilter,
    ScheduleDraft, StudyForm, TimetableEngine, WorkloadDraft,
};

fn seeded(file: &NamedTempFile) -> SqliteCatalog {
    let catalog = SqliteCatalog::new(file.path()).unwrap();
    let mut data = snapshot();
    data.lessons = vec![
        lesson(1, 1, 1, 1, Some(1), t(9, 0), t(10, 30)),
        lesson(2, 2, 2, 2, Some(1), t(10, 0), t(11, 30)),
    ];
    catalog.import_snapshot(&data).unwrap();
    catalog
}

#[test]
fn snapshot_survives_a_reopen() {
    let file = NamedTempFile::new().unwrap();
    let mut expected = snapshot();
    expected.lessons = vec![
        lesson(1, 1, 1, 1, Some(1), t(9, 0), t(10, 30)),
        lesson(2, 2, 2, 2, Some(1), t(10, 0), t(11, 30)),
    ];
    drop(seeded(&file));

    let reopened = SqliteCatalog::new(file.path()).unwrap();
    let exported = reopened.export_snapshot().unwrap();

    assert_eq!(exported, expected);
}

#[test]
fn lessons_are_joined_through_the_assignment_chain() {
    let file = NamedTempFile::new().unwrap();
    let catalog = seeded(&file);

    let lessons = catalog.lessons(&LessonFilter::for_schedule(1)).unwrap();

    assert_eq!(lessons.len(), 1);
    let only = &lessons[0];
    assert_eq!(only.group.as_ref().map(|g| g.name.as_str()), Some("CS-101"));
    assert_eq!(only.room.as_ref().map(|r| r.number.as_str()), Some("A100"));
    assert_eq!(only.subject.as_ref().map(|s| s.name.as_str()), Some("Algorithms"));
    assert_eq!(only.instructor.as_ref().map(|i| i.name.as_str()), Some("Ada Lovelace"));
}

#[test]
fn shared_room_conflict_is_found_through_sqlite() {
    let file = NamedTempFile::new().unwrap();
    let engine = TimetableEngine::new(seeded(&file), EngineConfig::default());

    let summary = engine.detect_conflicts(&ConflictQuery::on(monday())).unwrap();

    assert_eq!(summary.total_shared, 1);
    assert_eq!(summary.shared[0].conflict_type, ConflictType::Room);
}

#[test]
fn budget_writes_are_validated_and_persisted() {
    let file = NamedTempFile::new().unwrap();
    let mut engine = TimetableEngine::new(seeded(&file), EngineConfig::default());

    // Contract 1 already holds a 100h full-time workload.
    let created = engine
        .create_workload(WorkloadDraft {
            contract_id: 1,
            study_form: StudyForm::PartTime,
            assigned_hours: 200.0,
        })
        .unwrap();
    assert_eq!(engine.store().workload(created.id).unwrap(), Some(created.clone()));

    let err = engine
        .update_workload(
            created.id,
            WorkloadDraft {
                contract_id: 1,
                study_form: StudyForm::PartTime,
                assigned_hours: 201.0,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Budget(BudgetError::BudgetExceeded { .. })
    ));
    assert_eq!(
        engine.store().workload(created.id).unwrap().map(|w| w.assigned_hours),
        Some(200.0)
    );

    let err = engine
        .create_schedule(ScheduleDraft {
            name: "Another CS".into(),
            semester_id: 1,
            direction_id: 1,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Budget(BudgetError::DuplicateBinding { .. })
    ));
}
