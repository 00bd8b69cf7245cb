//! Advisory comparison of scheduled lesson time against each subject
//! assignment's hour budget, scoped to one schedule.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::hours;
use crate::lesson::Lesson;
use crate::resource::{ProfessorId, ScheduleId};
use crate::teaching_load::{AssignmentId, SubjectAssignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    AssignmentExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub subject_assignment_id: AssignmentId,
    pub subject_name: Option<String>,
    pub professor_id: Option<ProfessorId>,
    pub professor_name: Option<String>,
    pub scheduled_hours: f64,
    pub allowed_hours: f64,
    pub excess_hours: f64,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadWarningReport {
    pub warnings: Vec<WorkloadWarning>,
    pub total_warnings: usize,
    pub schedule_id: ScheduleId,
}

impl WorkloadWarningReport {
    pub fn to_cli_summary(&self) -> String {
        let mut lines = vec![format!(
            "schedule {}: {} warning(s)",
            self.schedule_id, self.total_warnings
        )];
        for warning in &self.warnings {
            lines.push(format!(
                "  assignment {} ({}, {}): scheduled {:.2}h of {:.2}h, excess {:.2}h",
                warning.subject_assignment_id,
                warning.subject_name.as_deref().unwrap_or("?"),
                warning.professor_name.as_deref().unwrap_or("?"),
                warning.scheduled_hours,
                warning.allowed_hours,
                warning.excess_hours
            ));
        }
        lines.join("\n")
    }
}

/// Builds the warning report for `schedule_id`.
///
/// Lessons from other schedules are ignored, so an assignment reused across
/// schedules is judged only on its time in this one. `assignments` must
/// hold every assignment referenced by the schedule's lessons; lessons whose
/// assignment is missing are logged and skipped.
pub fn build_report(
    schedule_id: ScheduleId,
    lessons: &[Lesson],
    assignments: &HashMap<AssignmentId, SubjectAssignment>,
) -> WorkloadWarningReport {
    let mut by_assignment: BTreeMap<AssignmentId, Vec<&Lesson>> = BTreeMap::new();
    for lesson in lessons.iter().filter(|l| l.schedule_id == schedule_id) {
        by_assignment
            .entry(lesson.subject_assignment_id)
            .or_default()
            .push(lesson);
    }

    let mut warnings = Vec::new();
    for (assignment_id, scheduled) in by_assignment {
        let Some(assignment) = assignments.get(&assignment_id) else {
            warn!(schedule_id, assignment_id, "lessons reference an unknown subject assignment");
            continue;
        };
        let scheduled_hours = hours::total_hours(scheduled.iter().copied());
        if scheduled_hours <= assignment.hours_per_subject {
            continue;
        }
        let first = scheduled[0];
        warnings.push(WorkloadWarning {
            kind: WarningKind::AssignmentExceeded,
            subject_assignment_id: assignment_id,
            subject_name: first.subject.as_ref().map(|s| s.name.clone()),
            professor_id: first.instructor_id(),
            professor_name: first.instructor.as_ref().map(|i| i.name.clone()),
            scheduled_hours,
            allowed_hours: assignment.hours_per_subject,
            excess_hours: scheduled_hours - assignment.hours_per_subject,
            lessons: scheduled.into_iter().cloned().collect(),
        });
    }

    WorkloadWarningReport {
        total_warnings: warnings.len(),
        warnings,
        schedule_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::GroupRef;
    use chrono::{NaiveDate, NaiveTime};

    fn lesson(id: i32, schedule_id: ScheduleId, start: u32, minutes: i64) -> Lesson {
        let start = NaiveTime::from_hms_opt(start, 0, 0).unwrap();
        Lesson::new(
            id,
            schedule_id,
            GroupRef::new(1, "G1"),
            NaiveDate::from_ymd_opt(2025, 10, 6 + id as u32).unwrap(),
            start,
            start + chrono::Duration::minutes(minutes),
        )
        .with_assignment(3)
    }

    fn budget(hours: f64) -> HashMap<AssignmentId, SubjectAssignment> {
        HashMap::from([(
            3,
            SubjectAssignment {
                id: 3,
                workload_id: 1,
                subject_id: 1,
                hours_per_subject: hours,
            },
        )])
    }

    #[test]
    fn other_schedules_do_not_count() {
        let lessons = vec![lesson(1, 5, 8, 300), lesson(2, 6, 8, 300)];
        let report = build_report(5, &lessons, &budget(6.0));
        assert_eq!(report.total_warnings, 0);
        let report = build_report(5, &lessons, &budget(4.0));
        assert_eq!(report.total_warnings, 1);
        assert_eq!(report.warnings[0].lessons.len(), 1);
        assert_eq!(report.warnings[0].excess_hours, 1.0);
    }

    #[test]
    fn exactly_at_budget_is_not_a_warning() {
        let lessons = vec![lesson(1, 5, 8, 120), lesson(2, 5, 8, 120)];
        assert_eq!(build_report(5, &lessons, &budget(4.0)).total_warnings, 0);
    }

    #[test]
    fn unknown_assignment_is_skipped() {
        let lessons = vec![lesson(1, 5, 8, 600)];
        let report = build_report(5, &lessons, &HashMap::new());
        assert!(report.warnings.is_empty());
        assert_eq!(report.schedule_id, 5);
    }
}
