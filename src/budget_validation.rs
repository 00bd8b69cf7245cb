//! Write-time checks for the nested hour budget.
//!
//! Checks run only when a workload, assignment or schedule is created or
//! updated. Nothing here is re-run when lessons change or when a parent's
//! capacity later shrinks. Callers must hold a write-isolating transaction
//! (or equivalent lock) around validate + persist.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::persistence::{LoadLedger, PersistenceError};
use crate::resource::{DirectionId, ScheduleId, SemesterId, SubjectId};
use crate::teaching_load::{
    AssignmentDraft, AssignmentId, BudgetUsage, Contract, ContractId, StudyForm, Workload,
    WorkloadDraft, WorkloadId,
};

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLevel {
    Contract,
    Workload,
}

impl fmt::Display for BudgetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetLevel::Contract => f.write_str("contract"),
            BudgetLevel::Workload => f.write_str("workload"),
        }
    }
}

/// A uniqueness key that may hold at most one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    ContractStudyForm {
        contract_id: ContractId,
        study_form: StudyForm,
    },
    WorkloadSubject {
        workload_id: WorkloadId,
        subject_id: SubjectId,
    },
    SemesterDirection {
        semester_id: SemesterId,
        direction_id: DirectionId,
    },
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::ContractStudyForm {
                contract_id,
                study_form,
            } => write!(f, "workload for contract {contract_id} and study form {study_form}"),
            Binding::WorkloadSubject {
                workload_id,
                subject_id,
            } => write!(f, "assignment for workload {workload_id} and subject {subject_id}"),
            Binding::SemesterDirection {
                semester_id,
                direction_id,
            } => write!(f, "schedule for semester {semester_id} and direction {direction_id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error(
        "assigned hours exceed the {level} budget: {parent_id} allows {capacity}h, {allocated}h already allocated, {requested}h requested"
    )]
    BudgetExceeded {
        level: BudgetLevel,
        parent_id: i32,
        capacity: f64,
        allocated: f64,
        requested: f64,
    },
    #[error("{binding} already exists (id {existing_id})")]
    DuplicateBinding { binding: Binding, existing_id: i32 },
    #[error("contract {0} not found")]
    UnknownContract(ContractId),
    #[error("workload {0} not found")]
    UnknownWorkload(WorkloadId),
    #[error("subject assignment {0} not found")]
    UnknownAssignment(AssignmentId),
    #[error(transparent)]
    Storage(#[from] PersistenceError),
}

impl BudgetError {
    pub fn code(&self) -> &'static str {
        match self {
            BudgetError::BudgetExceeded { .. } => "budget_exceeded",
            BudgetError::DuplicateBinding { .. } => "duplicate_binding",
            BudgetError::UnknownContract(_)
            | BudgetError::UnknownWorkload(_)
            | BudgetError::UnknownAssignment(_) => "not_found",
            BudgetError::Storage(_) => "storage_error",
        }
    }
}

fn exceeds(capacity: f64, allocated: f64, requested: f64) -> bool {
    allocated + requested - capacity > EPSILON
}

/// Contract-level hour check.
///
/// `existing_hours` is the contract's current workload total. On update,
/// `prior_hours` is the candidate's stored value, which is taken back out of
/// the total so it does not count against itself.
pub fn check_workload_hours(
    candidate: &WorkloadDraft,
    contract: &Contract,
    existing_hours: f64,
    prior_hours: Option<f64>,
) -> Result<(), BudgetError> {
    let allocated = existing_hours - prior_hours.unwrap_or(0.0);
    if exceeds(contract.total_hours, allocated, candidate.assigned_hours) {
        return Err(BudgetError::BudgetExceeded {
            level: BudgetLevel::Contract,
            parent_id: contract.id,
            capacity: contract.total_hours,
            allocated,
            requested: candidate.assigned_hours,
        });
    }
    Ok(())
}

/// Workload-level hour check; same shape as [`check_workload_hours`].
pub fn check_assignment_hours(
    candidate: &AssignmentDraft,
    workload: &Workload,
    existing_hours: f64,
    prior_hours: Option<f64>,
) -> Result<(), BudgetError> {
    let allocated = existing_hours - prior_hours.unwrap_or(0.0);
    if exceeds(workload.assigned_hours, allocated, candidate.hours_per_subject) {
        return Err(BudgetError::BudgetExceeded {
            level: BudgetLevel::Workload,
            parent_id: workload.id,
            capacity: workload.assigned_hours,
            allocated,
            requested: candidate.hours_per_subject,
        });
    }
    Ok(())
}

/// Full workload write check: parent lookup, uniqueness, then hours.
///
/// `self_id` is `None` for a create and the stored row id for an update.
pub fn validate_workload<L>(
    ledger: &L,
    candidate: &WorkloadDraft,
    self_id: Option<WorkloadId>,
) -> Result<(), BudgetError>
where
    L: LoadLedger + ?Sized,
{
    if let Some(id) = self_id {
        if ledger.workload(id)?.is_none() {
            return Err(BudgetError::UnknownWorkload(id));
        }
    }
    let contract = ledger
        .contract(candidate.contract_id)?
        .ok_or(BudgetError::UnknownContract(candidate.contract_id))?;
    let siblings = ledger.workloads_for_contract(contract.id)?;

    if let Some(existing) = siblings
        .iter()
        .find(|w| w.study_form == candidate.study_form && Some(w.id) != self_id)
    {
        info!(
            contract_id = contract.id,
            study_form = %candidate.study_form,
            existing_id = existing.id,
            "rejecting duplicate workload"
        );
        return Err(BudgetError::DuplicateBinding {
            binding: Binding::ContractStudyForm {
                contract_id: contract.id,
                study_form: candidate.study_form,
            },
            existing_id: existing.id,
        });
    }

    let existing_hours: f64 = siblings.iter().map(|w| w.assigned_hours).sum();
    let prior_hours = self_id.and_then(|id| {
        siblings
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.assigned_hours)
    });
    check_workload_hours(candidate, &contract, existing_hours, prior_hours).inspect_err(|err| {
        info!(contract_id = contract.id, error = %err, "rejecting workload hours");
    })
}

/// Full assignment write check: parent lookup, uniqueness, then hours.
pub fn validate_assignment<L>(
    ledger: &L,
    candidate: &AssignmentDraft,
    self_id: Option<AssignmentId>,
) -> Result<(), BudgetError>
where
    L: LoadLedger + ?Sized,
{
    if let Some(id) = self_id {
        if ledger.assignment(id)?.is_none() {
            return Err(BudgetError::UnknownAssignment(id));
        }
    }
    let workload = ledger
        .workload(candidate.workload_id)?
        .ok_or(BudgetError::UnknownWorkload(candidate.workload_id))?;
    let siblings = ledger.assignments_for_workload(workload.id)?;

    if let Some(existing) = siblings
        .iter()
        .find(|a| a.subject_id == candidate.subject_id && Some(a.id) != self_id)
    {
        info!(
            workload_id = workload.id,
            subject_id = candidate.subject_id,
            existing_id = existing.id,
            "rejecting duplicate subject assignment"
        );
        return Err(BudgetError::DuplicateBinding {
            binding: Binding::WorkloadSubject {
                workload_id: workload.id,
                subject_id: candidate.subject_id,
            },
            existing_id: existing.id,
        });
    }

    let existing_hours: f64 = siblings.iter().map(|a| a.hours_per_subject).sum();
    let prior_hours = self_id.and_then(|id| {
        siblings
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.hours_per_subject)
    });
    check_assignment_hours(candidate, &workload, existing_hours, prior_hours).inspect_err(|err| {
        info!(workload_id = workload.id, error = %err, "rejecting assignment hours");
    })
}

/// At most one schedule per (semester, direction).
pub fn validate_schedule_binding<L>(
    ledger: &L,
    semester_id: SemesterId,
    direction_id: DirectionId,
    self_id: Option<ScheduleId>,
) -> Result<(), BudgetError>
where
    L: LoadLedger + ?Sized,
{
    let schedules = ledger.schedules()?;
    if let Some(existing) = schedules.iter().find(|s| {
        s.semester_id == semester_id && s.direction_id == direction_id && Some(s.id) != self_id
    }) {
        return Err(BudgetError::DuplicateBinding {
            binding: Binding::SemesterDirection {
                semester_id,
                direction_id,
            },
            existing_id: existing.id,
        });
    }
    Ok(())
}

pub fn contract_usage<L>(ledger: &L, contract_id: ContractId) -> Result<BudgetUsage, BudgetError>
where
    L: LoadLedger + ?Sized,
{
    let contract = ledger
        .contract(contract_id)?
        .ok_or(BudgetError::UnknownContract(contract_id))?;
    let hours: Vec<f64> = ledger
        .workloads_for_contract(contract_id)?
        .iter()
        .map(|w| w.assigned_hours)
        .collect();
    Ok(BudgetUsage::new(contract.id, contract.total_hours, &hours))
}

pub fn workload_usage<L>(ledger: &L, workload_id: WorkloadId) -> Result<BudgetUsage, BudgetError>
where
    L: LoadLedger + ?Sized,
{
    let workload = ledger
        .workload(workload_id)?
        .ok_or(BudgetError::UnknownWorkload(workload_id))?;
    let hours: Vec<f64> = ledger
        .assignments_for_workload(workload_id)?
        .iter()
        .map(|a| a.hours_per_subject)
        .collect();
    Ok(BudgetUsage::new(workload.id, workload.assigned_hours, &hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(total_hours: f64) -> Contract {
        Contract {
            id: 1,
            professor_id: 1,
            semester_id: 1,
            total_hours,
        }
    }

    fn draft(hours: f64) -> WorkloadDraft {
        WorkloadDraft {
            contract_id: 1,
            study_form: StudyForm::PartTime,
            assigned_hours: hours,
        }
    }

    #[test]
    fn exact_fit_is_accepted() {
        assert!(check_workload_hours(&draft(120.0), &contract(300.0), 180.0, None).is_ok());
    }

    #[test]
    fn overrun_is_rejected_with_figures() {
        let err = check_workload_hours(&draft(150.0), &contract(300.0), 180.0, None).unwrap_err();
        match err {
            BudgetError::BudgetExceeded {
                level,
                capacity,
                allocated,
                requested,
                ..
            } => {
                assert_eq!(level, BudgetLevel::Contract);
                assert_eq!(capacity, 300.0);
                assert_eq!(allocated, 180.0);
                assert_eq!(requested, 150.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn prior_value_does_not_count_against_itself() {
        // Contract total 300 is fully used by this one workload; raising it
        // by nothing must still pass.
        assert!(check_workload_hours(&draft(300.0), &contract(300.0), 300.0, Some(300.0)).is_ok());
        assert!(check_workload_hours(&draft(301.0), &contract(300.0), 300.0, Some(300.0)).is_err());
    }

    #[test]
    fn float_noise_is_tolerated() {
        assert!(check_workload_hours(&draft(0.3), &contract(0.6), 0.1 + 0.2, None).is_ok());
    }
}
