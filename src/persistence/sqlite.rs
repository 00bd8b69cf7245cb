use super::{
    CatalogSnapshot, LessonSource, LoadLedger, LoadWriter, PersistenceError, PersistenceResult,
};
use crate::budget_validation::{self, BudgetError};
use crate::lesson::{GroupRef, InstructorRef, Lesson, LessonFilter, LessonRecord, RoomRef, SubjectRef};
use crate::resource::{Group, Professor, Room, Schedule, ScheduleDraft, Subject};
use crate::teaching_load::{
    AssignmentDraft, AssignmentId, Contract, ContractId, SubjectAssignment, Workload,
    WorkloadDraft, WorkloadId,
};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use std::str::FromStr;

/// SQLite-backed catalog. Budget writes validate and insert inside one
/// `IMMEDIATE` transaction, so a concurrent writer waits instead of reading
/// a stale sibling total.
pub struct SqliteCatalog {
    connection: Mutex<Connection>,
}

impl SqliteCatalog {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY,
                number TEXT NOT NULL,
                capacity INTEGER
            );
            CREATE TABLE IF NOT EXISTS student_groups (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                code TEXT
            );
            CREATE TABLE IF NOT EXISTS professors (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                surname TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS schedules (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                semester_id INTEGER NOT NULL,
                direction_id INTEGER NOT NULL,
                UNIQUE (semester_id, direction_id)
            );
            CREATE TABLE IF NOT EXISTS contracts (
                id INTEGER PRIMARY KEY,
                professor_id INTEGER NOT NULL,
                semester_id INTEGER NOT NULL,
                total_hours REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workloads (
                id INTEGER PRIMARY KEY,
                contract_id INTEGER NOT NULL,
                study_form TEXT NOT NULL,
                assigned_hours REAL NOT NULL,
                UNIQUE (contract_id, study_form)
            );
            CREATE TABLE IF NOT EXISTS subject_assignments (
                id INTEGER PRIMARY KEY,
                workload_id INTEGER NOT NULL,
                subject_id INTEGER NOT NULL,
                hours_per_subject REAL NOT NULL,
                UNIQUE (workload_id, subject_id)
            );
            CREATE TABLE IF NOT EXISTS lessons (
                id INTEGER PRIMARY KEY,
                schedule_id INTEGER NOT NULL,
                group_id INTEGER NOT NULL,
                subject_assignment_id INTEGER NOT NULL,
                room_id INTEGER,
                is_online INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                lesson_type TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS lessons_by_date ON lessons (date, start_time);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    /// Replaces every table with the snapshot contents.
    pub fn import_snapshot(&self, snapshot: &CatalogSnapshot) -> PersistenceResult<()> {
        snapshot.validate()?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for table in [
            "rooms",
            "student_groups",
            "subjects",
            "professors",
            "schedules",
            "contracts",
            "workloads",
            "subject_assignments",
            "lessons",
        ] {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        for room in &snapshot.rooms {
            tx.execute(
                "INSERT INTO rooms (id, number, capacity) VALUES (?1, ?2, ?3)",
                params![room.id, room.number, room.capacity],
            )?;
        }
        for group in &snapshot.groups {
            tx.execute(
                "INSERT INTO student_groups (id, name) VALUES (?1, ?2)",
                params![group.id, group.name],
            )?;
        }
        for subject in &snapshot.subjects {
            tx.execute(
                "INSERT INTO subjects (id, name, code) VALUES (?1, ?2, ?3)",
                params![subject.id, subject.name, subject.code],
            )?;
        }
        for professor in &snapshot.professors {
            tx.execute(
                "INSERT INTO professors (id, name, surname) VALUES (?1, ?2, ?3)",
                params![professor.id, professor.name, professor.surname],
            )?;
        }
        for schedule in &snapshot.schedules {
            insert_schedule(&tx, schedule)?;
        }
        for contract in &snapshot.contracts {
            tx.execute(
                "INSERT INTO contracts (id, professor_id, semester_id, total_hours) VALUES (?1, ?2, ?3, ?4)",
                params![contract.id, contract.professor_id, contract.semester_id, contract.total_hours],
            )?;
        }
        for workload in &snapshot.workloads {
            upsert_workload(&tx, workload)?;
        }
        for assignment in &snapshot.assignments {
            upsert_assignment(&tx, assignment)?;
        }
        for lesson in &snapshot.lessons {
            upsert_lesson(&tx, lesson)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn export_snapshot(&self) -> PersistenceResult<CatalogSnapshot> {
        let conn = self.connection.lock();
        let ledger = SqlLedger(&conn);
        let mut snapshot = CatalogSnapshot {
            schedules: ledger.schedules()?,
            ..CatalogSnapshot::default()
        };

        let mut stmt = conn.prepare("SELECT id, number, capacity FROM rooms ORDER BY id")?;
        snapshot.rooms = stmt
            .query_map([], |row| {
                Ok(Room {
                    id: row.get(0)?,
                    number: row.get(1)?,
                    capacity: row.get(2)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        let mut stmt = conn.prepare("SELECT id, name FROM student_groups ORDER BY id")?;
        snapshot.groups = stmt
            .query_map([], |row| {
                Ok(Group {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        let mut stmt = conn.prepare("SELECT id, name, code FROM subjects ORDER BY id")?;
        snapshot.subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        let mut stmt = conn.prepare("SELECT id, name, surname FROM professors ORDER BY id")?;
        snapshot.professors = stmt
            .query_map([], |row| Ok(Professor::new(row.get(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<_, _>>()?;
        let mut stmt = conn.prepare(
            "SELECT id, professor_id, semester_id, total_hours FROM contracts ORDER BY id",
        )?;
        snapshot.contracts = stmt.query_map([], contract_from_row)?.collect::<Result<_, _>>()?;
        let mut stmt = conn.prepare(
            "SELECT id, contract_id, study_form, assigned_hours FROM workloads ORDER BY id",
        )?;
        snapshot.workloads = stmt.query_map([], workload_from_row)?.collect::<Result<_, _>>()?;
        let mut stmt = conn.prepare(
            "SELECT id, workload_id, subject_id, hours_per_subject FROM subject_assignments ORDER BY id",
        )?;
        snapshot.assignments = stmt.query_map([], assignment_from_row)?.collect::<Result<_, _>>()?;
        let mut stmt = conn.prepare(
            "SELECT id, schedule_id, group_id, subject_assignment_id, room_id, is_online, date, start_time, end_time, lesson_type
             FROM lessons ORDER BY id",
        )?;
        snapshot.lessons = stmt
            .query_map([], |row| {
                Ok(LessonRecord {
                    id: row.get(0)?,
                    schedule_id: row.get(1)?,
                    group_id: row.get(2)?,
                    subject_assignment_id: row.get(3)?,
                    room_id: row.get(4)?,
                    is_online: row.get(5)?,
                    date: row.get(6)?,
                    start_time: row.get(7)?,
                    end_time: row.get(8)?,
                    lesson_type: parse_column(row, 9)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(snapshot)
    }

    pub fn upsert_lesson(&self, lesson: &LessonRecord) -> PersistenceResult<()> {
        let conn = self.connection.lock();
        upsert_lesson(&conn, lesson)
    }

    pub fn upsert_contract(&self, contract: &Contract) -> PersistenceResult<()> {
        let conn = self.connection.lock();
        conn.execute(
            "INSERT OR REPLACE INTO contracts (id, professor_id, semester_id, total_hours) VALUES (?1, ?2, ?3, ?4)",
            params![contract.id, contract.professor_id, contract.semester_id, contract.total_hours],
        )?;
        Ok(())
    }
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into()))
}

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<Contract> {
    Ok(Contract {
        id: row.get(0)?,
        professor_id: row.get(1)?,
        semester_id: row.get(2)?,
        total_hours: row.get(3)?,
    })
}

fn workload_from_row(row: &Row<'_>) -> rusqlite::Result<Workload> {
    Ok(Workload {
        id: row.get(0)?,
        contract_id: row.get(1)?,
        study_form: parse_column(row, 2)?,
        assigned_hours: row.get(3)?,
    })
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<SubjectAssignment> {
    Ok(SubjectAssignment {
        id: row.get(0)?,
        workload_id: row.get(1)?,
        subject_id: row.get(2)?,
        hours_per_subject: row.get(3)?,
    })
}

fn lesson_from_row(row: &Row<'_>) -> rusqlite::Result<Lesson> {
    let group = match row.get::<_, Option<i32>>(2)? {
        Some(id) => Some(GroupRef {
            id,
            name: row.get(3)?,
        }),
        None => None,
    };
    let subject = match row.get::<_, Option<i32>>(5)? {
        Some(id) => Some(SubjectRef {
            id,
            name: row.get(6)?,
        }),
        None => None,
    };
    let instructor = match row.get::<_, Option<i32>>(7)? {
        Some(id) => {
            let name: String = row.get(8)?;
            let surname: String = row.get(9)?;
            Some(InstructorRef {
                id,
                name: Professor::new(id, name, surname).display_name(),
            })
        }
        None => None,
    };
    let room = match row.get::<_, Option<i32>>(10)? {
        Some(id) => Some(RoomRef {
            id,
            number: row.get(11)?,
        }),
        None => None,
    };
    Ok(Lesson {
        id: row.get(0)?,
        schedule_id: row.get(1)?,
        group,
        subject_assignment_id: row.get(4)?,
        subject,
        instructor,
        room,
        is_online: row.get(12)?,
        date: row.get(13)?,
        start_time: row.get(14)?,
        end_time: row.get(15)?,
        lesson_type: parse_column(row, 16)?,
    })
}

fn insert_schedule(conn: &Connection, schedule: &Schedule) -> PersistenceResult<()> {
    conn.execute(
        "INSERT INTO schedules (id, name, semester_id, direction_id) VALUES (?1, ?2, ?3, ?4)",
        params![schedule.id, schedule.name, schedule.semester_id, schedule.direction_id],
    )?;
    Ok(())
}

fn upsert_workload(conn: &Connection, workload: &Workload) -> PersistenceResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO workloads (id, contract_id, study_form, assigned_hours) VALUES (?1, ?2, ?3, ?4)",
        params![
            workload.id,
            workload.contract_id,
            workload.study_form.as_str(),
            workload.assigned_hours
        ],
    )?;
    Ok(())
}

fn upsert_assignment(conn: &Connection, assignment: &SubjectAssignment) -> PersistenceResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO subject_assignments (id, workload_id, subject_id, hours_per_subject) VALUES (?1, ?2, ?3, ?4)",
        params![
            assignment.id,
            assignment.workload_id,
            assignment.subject_id,
            assignment.hours_per_subject
        ],
    )?;
    Ok(())
}

fn upsert_lesson(conn: &Connection, lesson: &LessonRecord) -> PersistenceResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO lessons
            (id, schedule_id, group_id, subject_assignment_id, room_id, is_online, date, start_time, end_time, lesson_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            lesson.id,
            lesson.schedule_id,
            lesson.group_id,
            lesson.subject_assignment_id,
            lesson.room_id,
            lesson.is_online,
            lesson.date,
            lesson.start_time,
            lesson.end_time,
            lesson.lesson_type.as_str()
        ],
    )?;
    Ok(())
}

fn next_id(conn: &Connection, table: &str) -> PersistenceResult<i32> {
    let id: i32 = conn.query_row(
        &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {table}"),
        [],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Budget reads over one connection or open transaction.
struct SqlLedger<'a>(&'a Connection);

impl LoadLedger for SqlLedger<'_> {
    fn contract(&self, id: ContractId) -> PersistenceResult<Option<Contract>> {
        Ok(self
            .0
            .query_row(
                "SELECT id, professor_id, semester_id, total_hours FROM contracts WHERE id = ?1",
                params![id],
                contract_from_row,
            )
            .optional()?)
    }

    fn workload(&self, id: WorkloadId) -> PersistenceResult<Option<Workload>> {
        Ok(self
            .0
            .query_row(
                "SELECT id, contract_id, study_form, assigned_hours FROM workloads WHERE id = ?1",
                params![id],
                workload_from_row,
            )
            .optional()?)
    }

    fn assignment(&self, id: AssignmentId) -> PersistenceResult<Option<SubjectAssignment>> {
        Ok(self
            .0
            .query_row(
                "SELECT id, workload_id, subject_id, hours_per_subject FROM subject_assignments WHERE id = ?1",
                params![id],
                assignment_from_row,
            )
            .optional()?)
    }

    fn workloads_for_contract(&self, contract_id: ContractId) -> PersistenceResult<Vec<Workload>> {
        let mut stmt = self.0.prepare(
            "SELECT id, contract_id, study_form, assigned_hours FROM workloads WHERE contract_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![contract_id], workload_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn assignments_for_workload(
        &self,
        workload_id: WorkloadId,
    ) -> PersistenceResult<Vec<SubjectAssignment>> {
        let mut stmt = self.0.prepare(
            "SELECT id, workload_id, subject_id, hours_per_subject FROM subject_assignments WHERE workload_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![workload_id], assignment_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn schedules(&self) -> PersistenceResult<Vec<Schedule>> {
        let mut stmt = self
            .0
            .prepare("SELECT id, name, semester_id, direction_id FROM schedules ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Schedule {
                id: row.get(0)?,
                name: row.get(1)?,
                semester_id: row.get(2)?,
                direction_id: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

impl LessonSource for SqliteCatalog {
    fn lessons(&self, filter: &LessonFilter) -> PersistenceResult<Vec<Lesson>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT l.id, l.schedule_id, g.id, g.name, l.subject_assignment_id,
                    s.id, s.name, p.id, p.name, p.surname, r.id, r.number,
                    l.is_online, l.date, l.start_time, l.end_time, l.lesson_type
             FROM lessons l
             LEFT JOIN student_groups g ON g.id = l.group_id
             LEFT JOIN rooms r ON r.id = l.room_id
             LEFT JOIN subject_assignments sa ON sa.id = l.subject_assignment_id
             LEFT JOIN subjects s ON s.id = sa.subject_id
             LEFT JOIN workloads w ON w.id = sa.workload_id
             LEFT JOIN contracts c ON c.id = w.contract_id
             LEFT JOIN professors p ON p.id = c.professor_id
             WHERE (?1 IS NULL OR l.schedule_id = ?1)
               AND (?2 IS NULL OR l.date >= ?2)
               AND (?3 IS NULL OR l.date <= ?3)
             ORDER BY l.date, l.start_time, l.id",
        )?;
        let rows = stmt.query_map(
            params![filter.schedule_id, filter.date_from, filter.date_to],
            lesson_from_row,
        )?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

impl LoadLedger for SqliteCatalog {
    fn contract(&self, id: ContractId) -> PersistenceResult<Option<Contract>> {
        SqlLedger(&self.connection.lock()).contract(id)
    }

    fn workload(&self, id: WorkloadId) -> PersistenceResult<Option<Workload>> {
        SqlLedger(&self.connection.lock()).workload(id)
    }

    fn assignment(&self, id: AssignmentId) -> PersistenceResult<Option<SubjectAssignment>> {
        SqlLedger(&self.connection.lock()).assignment(id)
    }

    fn workloads_for_contract(&self, contract_id: ContractId) -> PersistenceResult<Vec<Workload>> {
        SqlLedger(&self.connection.lock()).workloads_for_contract(contract_id)
    }

    fn assignments_for_workload(
        &self,
        workload_id: WorkloadId,
    ) -> PersistenceResult<Vec<SubjectAssignment>> {
        SqlLedger(&self.connection.lock()).assignments_for_workload(workload_id)
    }

    fn schedules(&self) -> PersistenceResult<Vec<Schedule>> {
        SqlLedger(&self.connection.lock()).schedules()
    }
}

impl SqliteCatalog {
    fn write<T, F>(&self, body: F) -> Result<T, BudgetError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, BudgetError>,
    {
        let mut conn = self.connection.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(PersistenceError::from)?;
        let value = body(&tx)?;
        tx.commit().map_err(PersistenceError::from)?;
        Ok(value)
    }
}

impl LoadWriter for SqliteCatalog {
    fn create_workload(&mut self, draft: WorkloadDraft) -> Result<Workload, BudgetError> {
        self.write(|tx| {
            budget_validation::validate_workload(&SqlLedger(tx), &draft, None)?;
            let workload = draft.into_workload(next_id(tx, "workloads")?);
            upsert_workload(tx, &workload)?;
            Ok(workload)
        })
    }

    fn update_workload(
        &mut self,
        id: WorkloadId,
        draft: WorkloadDraft,
    ) -> Result<Workload, BudgetError> {
        self.write(|tx| {
            budget_validation::validate_workload(&SqlLedger(tx), &draft, Some(id))?;
            let workload = draft.into_workload(id);
            upsert_workload(tx, &workload)?;
            Ok(workload)
        })
    }

    fn create_assignment(
        &mut self,
        draft: AssignmentDraft,
    ) -> Result<SubjectAssignment, BudgetError> {
        self.write(|tx| {
            budget_validation::validate_assignment(&SqlLedger(tx), &draft, None)?;
            let assignment = draft.into_assignment(next_id(tx, "subject_assignments")?);
            upsert_assignment(tx, &assignment)?;
            Ok(assignment)
        })
    }

    fn update_assignment(
        &mut self,
        id: AssignmentId,
        draft: AssignmentDraft,
    ) -> Result<SubjectAssignment, BudgetError> {
        self.write(|tx| {
            budget_validation::validate_assignment(&SqlLedger(tx), &draft, Some(id))?;
            let assignment = draft.into_assignment(id);
            upsert_assignment(tx, &assignment)?;
            Ok(assignment)
        })
    }

    fn create_schedule(&mut self, draft: ScheduleDraft) -> Result<Schedule, BudgetError> {
        self.write(|tx| {
            budget_validation::validate_schedule_binding(
                &SqlLedger(tx),
                draft.semester_id,
                draft.direction_id,
                None,
            )?;
            let schedule = draft.into_schedule(next_id(tx, "schedules")?);
            insert_schedule(tx, &schedule)?;
            Ok(schedule)
        })
    }
}
