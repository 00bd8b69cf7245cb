use super::{PersistenceError, PersistenceResult, validate_unique_ids};
use crate::lesson::{LessonRecord, LessonType};
use crate::resource::{Group, Professor, Room, Schedule, Subject};
use crate::teaching_load::{Contract, SubjectAssignment, Workload};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Normalized catalog tables as written to a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub professors: Vec<Professor>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub workloads: Vec<Workload>,
    #[serde(default)]
    pub assignments: Vec<SubjectAssignment>,
    #[serde(default)]
    pub lessons: Vec<LessonRecord>,
}

impl CatalogSnapshot {
    /// Id uniqueness per table. Foreign keys are not checked here; a
    /// dangling reference only drops the lesson out of the passes that need it.
    pub fn validate(&self) -> PersistenceResult<()> {
        validate_unique_ids("room", self.rooms.iter().map(|r| r.id))?;
        validate_unique_ids("group", self.groups.iter().map(|g| g.id))?;
        validate_unique_ids("subject", self.subjects.iter().map(|s| s.id))?;
        validate_unique_ids("professor", self.professors.iter().map(|p| p.id))?;
        validate_unique_ids("schedule", self.schedules.iter().map(|s| s.id))?;
        validate_unique_ids("contract", self.contracts.iter().map(|c| c.id))?;
        validate_unique_ids("workload", self.workloads.iter().map(|w| w.id))?;
        validate_unique_ids("subject assignment", self.assignments.iter().map(|a| a.id))?;
        validate_unique_ids("lesson", self.lessons.iter().map(|l| l.id))?;
        Ok(())
    }
}

pub fn save_catalog_to_json<P: AsRef<Path>>(
    snapshot: &CatalogSnapshot,
    path: P,
) -> PersistenceResult<()> {
    snapshot.validate()?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_catalog_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<CatalogSnapshot> {
    let file = File::open(path)?;
    let snapshot: CatalogSnapshot = serde_json::from_reader(file)?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[derive(Default, Serialize, Deserialize)]
struct LessonCsvRecord {
    id: i32,
    schedule_id: i32,
    group_id: i32,
    subject_assignment_id: i32,
    room_id: String,
    is_online: String,
    date: String,
    start_time: String,
    end_time: String,
    lesson_type: String,
}

impl From<&LessonRecord> for LessonCsvRecord {
    fn from(lesson: &LessonRecord) -> Self {
        Self {
            id: lesson.id,
            schedule_id: lesson.schedule_id,
            group_id: lesson.group_id,
            subject_assignment_id: lesson.subject_assignment_id,
            room_id: lesson.room_id.map(|id| id.to_string()).unwrap_or_default(),
            is_online: lesson.is_online.to_string(),
            date: lesson.date.format("%Y-%m-%d").to_string(),
            start_time: lesson.start_time.format("%H:%M:%S").to_string(),
            end_time: lesson.end_time.format("%H:%M:%S").to_string(),
            lesson_type: lesson.lesson_type.as_str().to_string(),
        }
    }
}

impl LessonCsvRecord {
    fn into_lesson(self) -> PersistenceResult<LessonRecord> {
        let lesson_type = self
            .lesson_type
            .parse::<LessonType>()
            .map_err(PersistenceError::InvalidData)?;
        Ok(LessonRecord {
            id: self.id,
            schedule_id: self.schedule_id,
            group_id: self.group_id,
            subject_assignment_id: self.subject_assignment_id,
            room_id: parse_i32(&self.room_id)?,
            is_online: parse_bool(&self.is_online)?.unwrap_or(false),
            date: parse_date(&self.date)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            lesson_type,
        })
    }
}

pub fn save_lessons_to_csv<P: AsRef<Path>>(
    lessons: &[LessonRecord],
    path: P,
) -> PersistenceResult<()> {
    validate_unique_ids("lesson", lessons.iter().map(|l| l.id))?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for lesson in lessons {
        writer.serialize(LessonCsvRecord::from(lesson))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_lessons_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<LessonRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut lessons = Vec::new();
    for record in reader.deserialize::<LessonCsvRecord>() {
        lessons.push(record?.into_lesson()?);
    }
    validate_unique_ids("lesson", lessons.iter().map(|l| l.id))?;
    Ok(lessons)
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_time(input: &str) -> PersistenceResult<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|e| PersistenceError::InvalidData(format!("invalid time '{input}': {e}")))
}

fn parse_i32(input: &str) -> PersistenceResult<Option<i32>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i32>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}

fn parse_bool(input: &str) -> PersistenceResult<Option<bool>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}
