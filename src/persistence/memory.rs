use std::collections::BTreeMap;
use tracing::warn;

use super::{CatalogSnapshot, LessonSource, LoadLedger, LoadWriter, PersistenceResult};
use crate::budget_validation::{self, BudgetError};
use crate::lesson::{GroupRef, InstructorRef, Lesson, LessonFilter, LessonRecord, RoomRef, SubjectRef};
use crate::resource::{
    Group, GroupId, Professor, ProfessorId, Room, RoomId, Schedule, ScheduleDraft, ScheduleId,
    Subject, SubjectId,
};
use crate::teaching_load::{
    AssignmentDraft, AssignmentId, Contract, ContractId, SubjectAssignment, Workload,
    WorkloadDraft, WorkloadId,
};

/// Normalized tables held in ordered maps.
///
/// Mutation takes `&mut self`, so validate and insert can never interleave
/// with another writer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    rooms: BTreeMap<RoomId, Room>,
    groups: BTreeMap<GroupId, Group>,
    subjects: BTreeMap<SubjectId, Subject>,
    professors: BTreeMap<ProfessorId, Professor>,
    schedules: BTreeMap<ScheduleId, Schedule>,
    contracts: BTreeMap<ContractId, Contract>,
    workloads: BTreeMap<WorkloadId, Workload>,
    assignments: BTreeMap<AssignmentId, SubjectAssignment>,
    lessons: BTreeMap<i32, LessonRecord>,
}

fn next_id<V>(table: &BTreeMap<i32, V>) -> i32 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> PersistenceResult<Self> {
        snapshot.validate()?;
        let mut catalog = Self::new();
        catalog.rooms = snapshot.rooms.into_iter().map(|r| (r.id, r)).collect();
        catalog.groups = snapshot.groups.into_iter().map(|g| (g.id, g)).collect();
        catalog.subjects = snapshot.subjects.into_iter().map(|s| (s.id, s)).collect();
        catalog.professors = snapshot.professors.into_iter().map(|p| (p.id, p)).collect();
        catalog.schedules = snapshot.schedules.into_iter().map(|s| (s.id, s)).collect();
        catalog.contracts = snapshot.contracts.into_iter().map(|c| (c.id, c)).collect();
        catalog.workloads = snapshot.workloads.into_iter().map(|w| (w.id, w)).collect();
        catalog.assignments = snapshot.assignments.into_iter().map(|a| (a.id, a)).collect();
        catalog.lessons = snapshot.lessons.into_iter().map(|l| (l.id, l)).collect();
        Ok(catalog)
    }

    pub fn to_snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            rooms: self.rooms.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
            subjects: self.subjects.values().cloned().collect(),
            professors: self.professors.values().cloned().collect(),
            schedules: self.schedules.values().cloned().collect(),
            contracts: self.contracts.values().cloned().collect(),
            workloads: self.workloads.values().cloned().collect(),
            assignments: self.assignments.values().cloned().collect(),
            lessons: self.lessons.values().cloned().collect(),
        }
    }

    pub fn upsert_room(&mut self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    pub fn upsert_group(&mut self, group: Group) {
        self.groups.insert(group.id, group);
    }

    pub fn upsert_subject(&mut self, subject: Subject) {
        self.subjects.insert(subject.id, subject);
    }

    pub fn upsert_professor(&mut self, professor: Professor) {
        self.professors.insert(professor.id, professor);
    }

    /// Contracts are owned upstream; they carry no check of their own.
    pub fn upsert_contract(&mut self, contract: Contract) {
        self.contracts.insert(contract.id, contract);
    }

    pub fn upsert_lesson(&mut self, lesson: LessonRecord) {
        self.lessons.insert(lesson.id, lesson);
    }

    pub fn remove_lesson(&mut self, id: i32) -> Option<LessonRecord> {
        self.lessons.remove(&id)
    }

    pub fn lesson_records(&self) -> Vec<LessonRecord> {
        self.lessons.values().cloned().collect()
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    fn instructor_for(&self, assignment_id: AssignmentId) -> Option<InstructorRef> {
        let assignment = self.assignments.get(&assignment_id)?;
        let workload = self.workloads.get(&assignment.workload_id)?;
        let contract = self.contracts.get(&workload.contract_id)?;
        let professor = self.professors.get(&contract.professor_id)?;
        Some(InstructorRef {
            id: professor.id,
            name: professor.display_name(),
        })
    }

    fn resolve(&self, record: &LessonRecord) -> Lesson {
        let group = self.groups.get(&record.group_id).map(|group| GroupRef {
            id: group.id,
            name: group.name.clone(),
        });
        if group.is_none() {
            warn!(lesson_id = record.id, group_id = record.group_id, "lesson references an unknown group");
        }
        let room = record.room_id.and_then(|id| self.rooms.get(&id)).map(|room| RoomRef {
            id: room.id,
            number: room.number.clone(),
        });
        let subject = self
            .assignments
            .get(&record.subject_assignment_id)
            .and_then(|a| self.subjects.get(&a.subject_id))
            .map(|s| SubjectRef {
                id: s.id,
                name: s.name.clone(),
            });
        Lesson {
            id: record.id,
            schedule_id: record.schedule_id,
            group,
            subject_assignment_id: record.subject_assignment_id,
            subject,
            instructor: self.instructor_for(record.subject_assignment_id),
            room,
            is_online: record.is_online,
            date: record.date,
            start_time: record.start_time,
            end_time: record.end_time,
            lesson_type: record.lesson_type,
        }
    }
}

impl LessonSource for InMemoryCatalog {
    fn lessons(&self, filter: &LessonFilter) -> PersistenceResult<Vec<Lesson>> {
        let mut lessons: Vec<Lesson> = self
            .lessons
            .values()
            .filter(|record| filter.matches(record))
            .map(|record| self.resolve(record))
            .collect();
        lessons.sort_by_key(|l| (l.date, l.start_time, l.id));
        Ok(lessons)
    }
}

impl LoadLedger for InMemoryCatalog {
    fn contract(&self, id: ContractId) -> PersistenceResult<Option<Contract>> {
        Ok(self.contracts.get(&id).cloned())
    }

    fn workload(&self, id: WorkloadId) -> PersistenceResult<Option<Workload>> {
        Ok(self.workloads.get(&id).cloned())
    }

    fn assignment(&self, id: AssignmentId) -> PersistenceResult<Option<SubjectAssignment>> {
        Ok(self.assignments.get(&id).cloned())
    }

    fn workloads_for_contract(&self, contract_id: ContractId) -> PersistenceResult<Vec<Workload>> {
        Ok(self
            .workloads
            .values()
            .filter(|w| w.contract_id == contract_id)
            .cloned()
            .collect())
    }

    fn assignments_for_workload(
        &self,
        workload_id: WorkloadId,
    ) -> PersistenceResult<Vec<SubjectAssignment>> {
        Ok(self
            .assignments
            .values()
            .filter(|a| a.workload_id == workload_id)
            .cloned()
            .collect())
    }

    fn schedules(&self) -> PersistenceResult<Vec<Schedule>> {
        Ok(self.schedules.values().cloned().collect())
    }
}

impl LoadWriter for InMemoryCatalog {
    fn create_workload(&mut self, draft: WorkloadDraft) -> Result<Workload, BudgetError> {
        budget_validation::validate_workload(&*self, &draft, None)?;
        let workload = draft.into_workload(next_id(&self.workloads));
        self.workloads.insert(workload.id, workload.clone());
        Ok(workload)
    }

    fn update_workload(
        &mut self,
        id: WorkloadId,
        draft: WorkloadDraft,
    ) -> Result<Workload, BudgetError> {
        budget_validation::validate_workload(&*self, &draft, Some(id))?;
        let workload = draft.into_workload(id);
        self.workloads.insert(id, workload.clone());
        Ok(workload)
    }

    fn create_assignment(
        &mut self,
        draft: AssignmentDraft,
    ) -> Result<SubjectAssignment, BudgetError> {
        budget_validation::validate_assignment(&*self, &draft, None)?;
        let assignment = draft.into_assignment(next_id(&self.assignments));
        self.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    fn update_assignment(
        &mut self,
        id: AssignmentId,
        draft: AssignmentDraft,
    ) -> Result<SubjectAssignment, BudgetError> {
        budget_validation::validate_assignment(&*self, &draft, Some(id))?;
        let assignment = draft.into_assignment(id);
        self.assignments.insert(id, assignment.clone());
        Ok(assignment)
    }

    fn create_schedule(&mut self, draft: ScheduleDraft) -> Result<Schedule, BudgetError> {
        budget_validation::validate_schedule_binding(&*self, draft.semester_id, draft.direction_id, None)?;
        let schedule = draft.into_schedule(next_id(&self.schedules));
        self.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }
}
