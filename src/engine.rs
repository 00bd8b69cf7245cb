//! The operations exposed to front ends, wired over one store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info};

use crate::budget_validation::{self, BudgetError};
use crate::config::EngineConfig;
use crate::conflicts::{self, ClusterStrategy, ConflictSummary, ConflictType, Severity};
use crate::lesson::{GroupRef, Lesson, LessonFilter};
use crate::persistence::{LessonSource, LoadLedger, LoadWriter, PersistenceError};
use crate::resource::{Schedule, ScheduleDraft, ScheduleId};
use crate::teaching_load::{
    AssignmentDraft, AssignmentId, BudgetUsage, ContractId, SubjectAssignment, Workload,
    WorkloadDraft, WorkloadId,
};
use crate::warnings::{self, WorkloadWarningReport};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Budget(#[from] BudgetError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Filters for a conflict run. Dates are inclusive; `date` pins both bounds
/// to one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictQuery {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// `None` or empty runs every pass.
    #[serde(default)]
    pub conflict_types: Option<Vec<ConflictType>>,
    #[serde(default)]
    pub schedule_id: Option<ScheduleId>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl ConflictQuery {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn between(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            date_from: Some(date_from),
            date_to: Some(date_to),
            ..Self::default()
        }
    }

    fn window(&self) -> EngineResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        if let Some(date) = self.date {
            return Ok((Some(date), Some(date)));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(EngineError::InvalidQuery(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }
        Ok((self.date_from, self.date_to))
    }

    fn passes(&self) -> Vec<ConflictType> {
        match &self.conflict_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => ConflictType::ALL.to_vec(),
        }
    }
}

pub struct TimetableEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S> TimetableEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_clustering(&mut self, strategy: ClusterStrategy) {
        self.config.clustering = strategy;
    }
}

impl<S> TimetableEngine<S>
where
    S: LessonSource + LoadLedger,
{
    /// Detects and classifies conflicts in the query window.
    ///
    /// Lessons are fetched for every schedule so that conflicts shared with
    /// other schedules stay visible; the schedule scope is applied by the
    /// classifier.
    pub fn detect_conflicts(&self, query: &ConflictQuery) -> EngineResult<ConflictSummary> {
        let (date_from, date_to) = query.window()?;
        let lessons = self.store.lessons(&LessonFilter::between(date_from, date_to))?;
        let mut raw = conflicts::detect(
            &lessons,
            &query.passes(),
            self.config.clustering,
            self.config.parallel_days,
        );
        if let Some(severity) = query.severity {
            raw.retain(|conflict| conflict.severity == severity);
        }
        let summary = conflicts::classify(raw, query.schedule_id);
        debug!(
            lessons = lessons.len(),
            total = summary.total_conflicts,
            single = summary.total_single,
            shared = summary.total_shared,
            "conflict detection finished"
        );
        Ok(summary)
    }

    pub fn validate_workload(
        &self,
        draft: &WorkloadDraft,
        self_id: Option<WorkloadId>,
    ) -> EngineResult<()> {
        Ok(budget_validation::validate_workload(&self.store, draft, self_id)?)
    }

    pub fn validate_assignment(
        &self,
        draft: &AssignmentDraft,
        self_id: Option<AssignmentId>,
    ) -> EngineResult<()> {
        Ok(budget_validation::validate_assignment(&self.store, draft, self_id)?)
    }

    pub fn report_workload_warnings(
        &self,
        schedule_id: ScheduleId,
    ) -> EngineResult<WorkloadWarningReport> {
        let lessons = self.store.lessons(&LessonFilter::for_schedule(schedule_id))?;
        let mut assignments: HashMap<AssignmentId, SubjectAssignment> = HashMap::new();
        for lesson in &lessons {
            if assignments.contains_key(&lesson.subject_assignment_id) {
                continue;
            }
            if let Some(assignment) = self.store.assignment(lesson.subject_assignment_id)? {
                assignments.insert(assignment.id, assignment);
            }
        }
        Ok(warnings::build_report(schedule_id, &lessons, &assignments))
    }

    /// One schedule's lessons in calendar order.
    pub fn calendar_lessons(
        &self,
        schedule_id: ScheduleId,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> EngineResult<Vec<Lesson>> {
        let filter = LessonFilter {
            schedule_id: Some(schedule_id),
            date_from,
            date_to,
        };
        Ok(self.store.lessons(&filter)?)
    }

    /// Distinct groups with lessons in the schedule, ordered by name.
    pub fn schedule_groups(&self, schedule_id: ScheduleId) -> EngineResult<Vec<GroupRef>> {
        let lessons = self.store.lessons(&LessonFilter::for_schedule(schedule_id))?;
        let groups: BTreeMap<(String, i32), GroupRef> = lessons
            .into_iter()
            .filter_map(|lesson| lesson.group)
            .map(|group| ((group.name.clone(), group.id), group))
            .collect();
        Ok(groups.into_values().collect())
    }

    pub fn contract_usage(&self, contract_id: ContractId) -> EngineResult<BudgetUsage> {
        Ok(budget_validation::contract_usage(&self.store, contract_id)?)
    }

    pub fn workload_usage(&self, workload_id: WorkloadId) -> EngineResult<BudgetUsage> {
        Ok(budget_validation::workload_usage(&self.store, workload_id)?)
    }
}

impl<S> TimetableEngine<S>
where
    S: LoadWriter,
{
    pub fn create_workload(&mut self, draft: WorkloadDraft) -> EngineResult<Workload> {
        let workload = self.store.create_workload(draft)?;
        info!(id = workload.id, contract_id = workload.contract_id, "workload created");
        Ok(workload)
    }

    pub fn update_workload(
        &mut self,
        id: WorkloadId,
        draft: WorkloadDraft,
    ) -> EngineResult<Workload> {
        let workload = self.store.update_workload(id, draft)?;
        info!(id, hours = workload.assigned_hours, "workload updated");
        Ok(workload)
    }

    pub fn create_assignment(&mut self, draft: AssignmentDraft) -> EngineResult<SubjectAssignment> {
        let assignment = self.store.create_assignment(draft)?;
        info!(id = assignment.id, workload_id = assignment.workload_id, "subject assignment created");
        Ok(assignment)
    }

    pub fn update_assignment(
        &mut self,
        id: AssignmentId,
        draft: AssignmentDraft,
    ) -> EngineResult<SubjectAssignment> {
        let assignment = self.store.update_assignment(id, draft)?;
        info!(id, hours = assignment.hours_per_subject, "subject assignment updated");
        Ok(assignment)
    }

    pub fn create_schedule(&mut self, draft: ScheduleDraft) -> EngineResult<Schedule> {
        let schedule = self.store.create_schedule(draft)?;
        info!(id = schedule.id, name = %schedule.name, "schedule created");
        Ok(schedule)
    }
}
