#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use timetable::persistence::{CatalogSnapshot, InMemoryCatalog};
use timetable::{
    Contract, EngineConfig, Group, LessonRecord, LessonType, Professor, Room, Schedule,
    StudyForm, Subject, SubjectAssignment, TimetableEngine, Workload,
};

pub const MONDAY: (i32, u32, u32) = (2025, 10, 6);

pub fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn monday() -> NaiveDate {
    d(MONDAY.0, MONDAY.1, MONDAY.2)
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Rooms A100 and B200, groups CS-101 and CS-102, two professors with one
/// full-time workload each.
///
/// Assignments: 1 and 3 are taught by Ada Lovelace, 2 by Alan Turing. Each
/// allows 10 hours. Schedules 1 and 2 share a semester.
pub fn snapshot() -> CatalogSnapshot {
    CatalogSnapshot {
        rooms: vec![
            Room {
                id: 1,
                number: "A100".into(),
                capacity: Some(40),
            },
            Room {
                id: 2,
                number: "B200".into(),
                capacity: None,
            },
        ],
        groups: vec![
            Group {
                id: 1,
                name: "CS-101".into(),
            },
            Group {
                id: 2,
                name: "CS-102".into(),
            },
        ],
        subjects: vec![
            Subject {
                id: 1,
                name: "Algorithms".into(),
                code: None,
            },
            Subject {
                id: 2,
                name: "Databases".into(),
                code: Some("DB1".into()),
            },
            Subject {
                id: 3,
                name: "Networks".into(),
                code: None,
            },
        ],
        professors: vec![
            Professor::new(1, "Ada", "Lovelace"),
            Professor::new(2, "Alan", "Turing"),
        ],
        schedules: vec![
            Schedule {
                id: 1,
                name: "Fall CS".into(),
                semester_id: 1,
                direction_id: 1,
            },
            Schedule {
                id: 2,
                name: "Fall Math".into(),
                semester_id: 1,
                direction_id: 2,
            },
        ],
        contracts: vec![
            Contract {
                id: 1,
                professor_id: 1,
                semester_id: 1,
                total_hours: 300.0,
            },
            Contract {
                id: 2,
                professor_id: 2,
                semester_id: 1,
                total_hours: 300.0,
            },
        ],
        workloads: vec![
            Workload {
                id: 1,
                contract_id: 1,
                study_form: StudyForm::FullTime,
                assigned_hours: 100.0,
            },
            Workload {
                id: 2,
                contract_id: 2,
                study_form: StudyForm::FullTime,
                assigned_hours: 100.0,
            },
        ],
        assignments: vec![
            SubjectAssignment {
                id: 1,
                workload_id: 1,
                subject_id: 1,
                hours_per_subject: 10.0,
            },
            SubjectAssignment {
                id: 2,
                workload_id: 2,
                subject_id: 2,
                hours_per_subject: 10.0,
            },
            SubjectAssignment {
                id: 3,
                workload_id: 1,
                subject_id: 3,
                hours_per_subject: 10.0,
            },
        ],
        lessons: Vec::new(),
    }
}

/// An in-room lecture on [`monday`].
pub fn lesson(
    id: i32,
    schedule_id: i32,
    group_id: i32,
    assignment_id: i32,
    room_id: Option<i32>,
    start: NaiveTime,
    end: NaiveTime,
) -> LessonRecord {
    LessonRecord {
        id,
        schedule_id,
        group_id,
        subject_assignment_id: assignment_id,
        room_id,
        is_online: false,
        date: monday(),
        start_time: start,
        end_time: end,
        lesson_type: LessonType::Lecture,
    }
}

pub fn catalog_with(lessons: Vec<LessonRecord>) -> InMemoryCatalog {
    let mut snapshot = snapshot();
    snapshot.lessons = lessons;
    InMemoryCatalog::from_snapshot(snapshot).unwrap()
}

pub fn engine_with(lessons: Vec<LessonRecord>) -> TimetableEngine<InMemoryCatalog> {
    let config = EngineConfig {
        parallel_days: false,
        ..EngineConfig::default()
    };
    TimetableEngine::new(catalog_with(lessons), config)
}
