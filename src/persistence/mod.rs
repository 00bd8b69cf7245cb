//! Data-access collaborators.
//!
//! The engine only ever asks for explicit projections: resolved lessons
//! through [`LessonSource`] and budget rows through [`LoadLedger`]. Budget
//! writes go through [`LoadWriter`], whose implementations run the
//! validator and the insert under one write lock or transaction.

use std::collections::HashSet;
use std::io;
use thiserror::Error;

use crate::budget_validation::BudgetError;
use crate::lesson::{Lesson, LessonFilter};
use crate::resource::{Schedule, ScheduleDraft};
use crate::teaching_load::{
    AssignmentDraft, AssignmentId, Contract, ContractId, SubjectAssignment, Workload,
    WorkloadDraft, WorkloadId,
};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("{0} not found")]
    NotFound(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait LessonSource {
    /// Resolved lessons matching `filter`, ordered by date, start time, id.
    fn lessons(&self, filter: &LessonFilter) -> PersistenceResult<Vec<Lesson>>;
}

/// Read access to the contract → workload → assignment budget rows.
pub trait LoadLedger {
    fn contract(&self, id: ContractId) -> PersistenceResult<Option<Contract>>;
    fn workload(&self, id: WorkloadId) -> PersistenceResult<Option<Workload>>;
    fn assignment(&self, id: AssignmentId) -> PersistenceResult<Option<SubjectAssignment>>;
    fn workloads_for_contract(&self, contract_id: ContractId) -> PersistenceResult<Vec<Workload>>;
    fn assignments_for_workload(
        &self,
        workload_id: WorkloadId,
    ) -> PersistenceResult<Vec<SubjectAssignment>>;
    fn schedules(&self) -> PersistenceResult<Vec<Schedule>>;
}

/// Validated budget writes. Each call checks and persists atomically.
pub trait LoadWriter {
    fn create_workload(&mut self, draft: WorkloadDraft) -> Result<Workload, BudgetError>;
    fn update_workload(
        &mut self,
        id: WorkloadId,
        draft: WorkloadDraft,
    ) -> Result<Workload, BudgetError>;
    fn create_assignment(&mut self, draft: AssignmentDraft)
    -> Result<SubjectAssignment, BudgetError>;
    fn update_assignment(
        &mut self,
        id: AssignmentId,
        draft: AssignmentDraft,
    ) -> Result<SubjectAssignment, BudgetError>;
    fn create_schedule(&mut self, draft: ScheduleDraft) -> Result<Schedule, BudgetError>;
}

/// Everything the engine and its front ends need from one store.
pub trait Catalog: LessonSource + LoadLedger + LoadWriter + Send + Sync {}

impl<T> Catalog for T where T: LessonSource + LoadLedger + LoadWriter + Send + Sync {}

impl<T: LessonSource + ?Sized> LessonSource for Box<T> {
    fn lessons(&self, filter: &LessonFilter) -> PersistenceResult<Vec<Lesson>> {
        (**self).lessons(filter)
    }
}

impl<T: LoadLedger + ?Sized> LoadLedger for Box<T> {
    fn contract(&self, id: ContractId) -> PersistenceResult<Option<Contract>> {
        (**self).contract(id)
    }

    fn workload(&self, id: WorkloadId) -> PersistenceResult<Option<Workload>> {
        (**self).workload(id)
    }

    fn assignment(&self, id: AssignmentId) -> PersistenceResult<Option<SubjectAssignment>> {
        (**self).assignment(id)
    }

    fn workloads_for_contract(&self, contract_id: ContractId) -> PersistenceResult<Vec<Workload>> {
        (**self).workloads_for_contract(contract_id)
    }

    fn assignments_for_workload(
        &self,
        workload_id: WorkloadId,
    ) -> PersistenceResult<Vec<SubjectAssignment>> {
        (**self).assignments_for_workload(workload_id)
    }

    fn schedules(&self) -> PersistenceResult<Vec<Schedule>> {
        (**self).schedules()
    }
}

impl<T: LoadWriter + ?Sized> LoadWriter for Box<T> {
    fn create_workload(&mut self, draft: WorkloadDraft) -> Result<Workload, BudgetError> {
        (**self).create_workload(draft)
    }

    fn update_workload(
        &mut self,
        id: WorkloadId,
        draft: WorkloadDraft,
    ) -> Result<Workload, BudgetError> {
        (**self).update_workload(id, draft)
    }

    fn create_assignment(
        &mut self,
        draft: AssignmentDraft,
    ) -> Result<SubjectAssignment, BudgetError> {
        (**self).create_assignment(draft)
    }

    fn update_assignment(
        &mut self,
        id: AssignmentId,
        draft: AssignmentDraft,
    ) -> Result<SubjectAssignment, BudgetError> {
        (**self).update_assignment(id, draft)
    }

    fn create_schedule(&mut self, draft: ScheduleDraft) -> Result<Schedule, BudgetError> {
        (**self).create_schedule(draft)
    }
}

/// Rejects a table that carries the same id twice.
pub fn validate_unique_ids<I>(table: &str, ids: I) -> PersistenceResult<()>
where
    I: IntoIterator<Item = i32>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate {table} id {id}"
            )));
        }
    }
    Ok(())
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    CatalogSnapshot, load_catalog_from_json, load_lessons_from_csv, save_catalog_to_json,
    save_lessons_to_csv,
};
pub use memory::InMemoryCatalog;
