pub mod budget_validation;
pub mod config;
pub mod conflicts;
pub mod engine;
pub mod hours;
pub mod interval;
pub mod lesson;
pub mod persistence;
pub mod resource;
pub mod teaching_load;
pub mod warnings;

#[cfg(feature = "http_api")]
pub mod http_api;
#[cfg(any(feature = "cli", feature = "http_api"))]
pub mod telemetry;

pub use budget_validation::{BudgetError, BudgetLevel, Binding};
pub use config::{ConfigError, EngineConfig};
pub use conflicts::{
    ClusterStrategy, Conflict, ConflictGroup, ConflictScope, ConflictSummary, ConflictType,
    Severity,
};
pub use engine::{ConflictQuery, EngineError, EngineResult, TimetableEngine};
pub use lesson::{GroupRef, Lesson, LessonFilter, LessonRecord, LessonType};
pub use resource::{Group, Professor, Room, Schedule, ScheduleDraft, Subject};
pub use teaching_load::{
    AssignmentDraft, BudgetUsage, Contract, StudyForm, SubjectAssignment, Workload, WorkloadDraft,
};
pub use warnings::{WorkloadWarning, WorkloadWarningReport};
