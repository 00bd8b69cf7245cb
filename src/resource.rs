use serde::{Deserialize, Serialize};

pub type RoomId = i32;
pub type GroupId = i32;
pub type SubjectId = i32;
pub type ProfessorId = i32;
pub type ScheduleId = i32;
pub type SemesterId = i32;
pub type DirectionId = i32;

/// A physical room lessons can be held in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Room number as printed on the door, e.g. `A100`.
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// A student group attending lessons together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A professor profile. Contracts point at it; lessons reach it through
/// assignment, workload and contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    pub id: ProfessorId,
    pub name: String,
    pub surname: String,
}

impl Professor {
    pub fn new(id: ProfessorId, name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            surname: surname.into(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

/// A named container of lessons for one (semester, direction) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub semester_id: SemesterId,
    pub direction_id: DirectionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub name: String,
    pub semester_id: SemesterId,
    pub direction_id: DirectionId,
}

impl ScheduleDraft {
    pub fn into_schedule(self, id: ScheduleId) -> Schedule {
        Schedule {
            id,
            name: self.name,
            semester_id: self.semester_id,
            direction_id: self.direction_id,
        }
    }
}
