//! Teaching-load records: the nested hour budget
//! contract → workload → subject assignment.
//!
//! Records carry explicit parent ids. Sibling totals are never cached on the
//! parent; they are summed from the current rows whenever they are needed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::resource::{ProfessorId, SemesterId, SubjectId};

pub type ContractId = i32;
pub type WorkloadId = i32;
pub type AssignmentId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StudyForm {
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "part-time")]
    PartTime,
}

impl StudyForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyForm::FullTime => "full-time",
            StudyForm::PartTime => "part-time",
        }
    }
}

impl fmt::Display for StudyForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "full-time" | "fulltime" => Ok(StudyForm::FullTime),
            "part-time" | "parttime" => Ok(StudyForm::PartTime),
            other => Err(format!("unknown study form '{other}'")),
        }
    }
}

/// A professor's authorized teaching hours for one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub professor_id: ProfessorId,
    pub semester_id: SemesterId,
    pub total_hours: f64,
}

/// A contract's allocation to one study form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub id: WorkloadId,
    pub contract_id: ContractId,
    pub study_form: StudyForm,
    pub assigned_hours: f64,
}

/// A workload's allocation to one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAssignment {
    pub id: AssignmentId,
    pub workload_id: WorkloadId,
    pub subject_id: SubjectId,
    pub hours_per_subject: f64,
}

/// Proposed workload values for a create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDraft {
    pub contract_id: ContractId,
    pub study_form: StudyForm,
    pub assigned_hours: f64,
}

impl WorkloadDraft {
    pub fn into_workload(self, id: WorkloadId) -> Workload {
        Workload {
            id,
            contract_id: self.contract_id,
            study_form: self.study_form,
            assigned_hours: self.assigned_hours,
        }
    }
}

impl From<&Workload> for WorkloadDraft {
    fn from(workload: &Workload) -> Self {
        Self {
            contract_id: workload.contract_id,
            study_form: workload.study_form,
            assigned_hours: workload.assigned_hours,
        }
    }
}

/// Proposed subject assignment values for a create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub workload_id: WorkloadId,
    pub subject_id: SubjectId,
    pub hours_per_subject: f64,
}

impl AssignmentDraft {
    pub fn into_assignment(self, id: AssignmentId) -> SubjectAssignment {
        SubjectAssignment {
            id,
            workload_id: self.workload_id,
            subject_id: self.subject_id,
            hours_per_subject: self.hours_per_subject,
        }
    }
}

impl From<&SubjectAssignment> for AssignmentDraft {
    fn from(assignment: &SubjectAssignment) -> Self {
        Self {
            workload_id: assignment.workload_id,
            subject_id: assignment.subject_id,
            hours_per_subject: assignment.hours_per_subject,
        }
    }
}

/// Capacity of one budget node against the sum of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub id: i32,
    pub capacity_hours: f64,
    pub allocated_hours: f64,
    pub remaining_hours: f64,
    pub children: usize,
}

impl BudgetUsage {
    pub fn new(id: i32, capacity_hours: f64, allocated: &[f64]) -> Self {
        let allocated_hours: f64 = allocated.iter().sum();
        Self {
            id,
            capacity_hours,
            allocated_hours,
            remaining_hours: capacity_hours - allocated_hours,
            children: allocated.len(),
        }
    }

    pub fn to_cli_summary(&self) -> String {
        format!(
            "capacity={:.2}, allocated={:.2}, remaining={:.2}, children={}",
            self.capacity_hours, self.allocated_hours, self.remaining_hours, self.children
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_form_parses_common_spellings() {
        assert_eq!("full-time".parse::<StudyForm>().unwrap(), StudyForm::FullTime);
        assert_eq!("PART_TIME".parse::<StudyForm>().unwrap(), StudyForm::PartTime);
        assert!("evening".parse::<StudyForm>().is_err());
    }

    #[test]
    fn usage_sums_children() {
        let usage = BudgetUsage::new(9, 300.0, &[180.0, 60.0]);
        assert_eq!(usage.allocated_hours, 240.0);
        assert_eq!(usage.remaining_hours, 60.0);
        assert_eq!(usage.children, 2);
    }
}
