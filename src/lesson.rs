use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hours;
use crate::resource::{GroupId, ProfessorId, RoomId, ScheduleId, SubjectId};
use crate::teaching_load::AssignmentId;

pub type LessonId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    Lecture,
    Seminar,
    Lab,
    Practice,
}

impl LessonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonType::Lecture => "lecture",
            LessonType::Seminar => "seminar",
            LessonType::Lab => "lab",
            LessonType::Practice => "practice",
        }
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lecture" => Ok(LessonType::Lecture),
            "seminar" => Ok(LessonType::Seminar),
            "lab" => Ok(LessonType::Lab),
            "practice" => Ok(LessonType::Practice),
            other => Err(format!("unknown lesson type '{other}'")),
        }
    }
}

/// A lesson as stored: foreign keys only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub id: LessonId,
    pub schedule_id: ScheduleId,
    pub group_id: GroupId,
    pub subject_assignment_id: AssignmentId,
    /// `None` for online lessons or a room still to be announced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub is_online: bool,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lesson_type: LessonType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRef {
    pub id: RoomId,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: GroupId,
    pub name: String,
}

impl GroupRef {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRef {
    pub id: SubjectId,
    pub name: String,
}

/// The professor a lesson resolves to through its assignment chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorRef {
    pub id: ProfessorId,
    pub name: String,
}

/// Read-only projection of a lesson with its references joined.
///
/// `group`, `room`, `subject` and `instructor` are `None` whenever the
/// underlying reference is missing or the chain to it is broken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub schedule_id: ScheduleId,
    #[serde(default)]
    pub group: Option<GroupRef>,
    pub subject_assignment_id: AssignmentId,
    #[serde(default)]
    pub subject: Option<SubjectRef>,
    #[serde(default)]
    pub instructor: Option<InstructorRef>,
    #[serde(default)]
    pub room: Option<RoomRef>,
    #[serde(default)]
    pub is_online: bool,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lesson_type: LessonType,
}

impl Lesson {
    /// A lecture with no room, subject or instructor resolved yet.
    pub fn new(
        id: LessonId,
        schedule_id: ScheduleId,
        group: GroupRef,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id,
            schedule_id,
            group: Some(group),
            subject_assignment_id: 0,
            subject: None,
            instructor: None,
            room: None,
            is_online: false,
            date,
            start_time,
            end_time,
            lesson_type: LessonType::Lecture,
        }
    }

    pub fn with_room(mut self, id: RoomId, number: impl Into<String>) -> Self {
        self.room = Some(RoomRef {
            id,
            number: number.into(),
        });
        self
    }

    pub fn with_instructor(mut self, id: ProfessorId, name: impl Into<String>) -> Self {
        self.instructor = Some(InstructorRef {
            id,
            name: name.into(),
        });
        self
    }

    pub fn with_assignment(mut self, assignment_id: AssignmentId) -> Self {
        self.subject_assignment_id = assignment_id;
        self
    }

    pub fn online(mut self) -> Self {
        self.is_online = true;
        self
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.room.as_ref().map(|room| room.id)
    }

    pub fn instructor_id(&self) -> Option<ProfessorId> {
        self.instructor.as_ref().map(|instructor| instructor.id)
    }

    /// Present in a physical room: has a room and is not flagged online.
    pub fn in_room(&self) -> Option<RoomId> {
        if self.is_online { None } else { self.room_id() }
    }

    pub fn duration_minutes(&self) -> i64 {
        hours::span(self.start_time, self.end_time).num_minutes()
    }
}

/// Fetch window for lesson projections. Dates are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonFilter {
    #[serde(default)]
    pub schedule_id: Option<ScheduleId>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl LessonFilter {
    pub fn for_schedule(schedule_id: ScheduleId) -> Self {
        Self {
            schedule_id: Some(schedule_id),
            ..Self::default()
        }
    }

    pub fn between(date_from: Option<NaiveDate>, date_to: Option<NaiveDate>) -> Self {
        Self {
            schedule_id: None,
            date_from,
            date_to,
        }
    }

    pub fn matches(&self, record: &LessonRecord) -> bool {
        if self.schedule_id.is_some_and(|id| id != record.schedule_id) {
            return false;
        }
        if self.date_from.is_some_and(|from| record.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| record.date > to) {
            return false;
        }
        true
    }
}
