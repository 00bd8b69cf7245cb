use chrono::NaiveDate;
use std::io::{self, Write};
use timetable::persistence::{
    InMemoryCatalog, LessonSource, load_catalog_from_json, load_lessons_from_csv, save_catalog_to_json,
    save_lessons_to_csv,
};
use timetable::{
    AssignmentDraft, ClusterStrategy, ConflictQuery, ConflictType, Contract, EngineConfig,
    Lesson, StudyForm, TimetableEngine, WorkloadDraft, telemetry,
};

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_lessons(lessons: &[Lesson]) -> String {
    let rows: Vec<Vec<String>> = lessons
        .iter()
        .map(|l| {
            vec![
                l.id.to_string(),
                l.schedule_id.to_string(),
                l.date.to_string(),
                format!("{}-{}", l.start_time.format("%H:%M"), l.end_time.format("%H:%M")),
                l.group.as_ref().map(|g| g.name.clone()).unwrap_or_default(),
                l.room.as_ref().map(|r| r.number.clone()).unwrap_or_default(),
                l.instructor.as_ref().map(|i| i.name.clone()).unwrap_or_default(),
                if l.is_online { "yes".into() } else { String::new() },
                l.lesson_type.to_string(),
            ]
        })
        .collect();
    render_table(
        &["id", "schedule", "date", "time", "group", "room", "professor", "online", "type"],
        &rows,
    )
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  show                                   Show catalog summary and all lessons\n  lessons <schedule_id>                  Show one schedule's lessons\n  groups <schedule_id>                   Show groups with lessons in a schedule\n  conflicts [from=D] [to=D] [date=D] [types=room,professor,group] [schedule=ID] [severity=error|warning]\n                                         Detect conflicts (dates YYYY-MM-DD)\n  warnings <schedule_id>                 Report assignments over their hours\n  contract add <id> <professor_id> <semester_id> <total_hours>\n                                         Upsert a contract\n  workload add <contract_id> <study_form> <hours>\n  workload set <id> <contract_id> <study_form> <hours>\n  assignment add <workload_id> <subject_id> <hours>\n  assignment set <id> <workload_id> <subject_id> <hours>\n  usage <contract|workload> <id>         Show allocated and remaining hours\n  clustering <connected|star>            Choose overlap grouping\n  load json <path>                       Load catalog snapshot\n  save json <path>                       Save catalog snapshot\n  import lessons <csv_path>              Upsert lessons from CSV\n  export lessons <csv_path>              Write lessons to CSV\n  quit|exit                              Exit"
    );
}

fn parse_conflict_query(args: &[&str]) -> Result<ConflictQuery, String> {
    let mut query = ConflictQuery::default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{arg}'"))?;
        let date = || {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| format!("invalid date '{value}' (YYYY-MM-DD)"))
        };
        match key {
            "from" => query.date_from = Some(date()?),
            "to" => query.date_to = Some(date()?),
            "date" => query.date = Some(date()?),
            "types" => query.conflict_types = Some(ConflictType::parse_list(value)?),
            "schedule" => {
                query.schedule_id = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid schedule id '{value}'"))?,
                )
            }
            "severity" => query.severity = Some(value.parse()?),
            other => return Err(format!("unknown filter '{other}'")),
        }
    }
    Ok(query)
}

fn parse_id(value: &str) -> Option<i32> {
    value.parse().ok()
}

fn parse_hours(value: &str) -> Option<f64> {
    value.parse().ok()
}

fn main() {
    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}; using defaults.");
            EngineConfig::default()
        }
    };
    telemetry::init(&config.log_filter);
    let mut engine = TimetableEngine::new(InMemoryCatalog::new(), config);

    println!("Timetable (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts[0];
        let args = &parts[1..];

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => {
                let catalog = engine.store();
                let snapshot = catalog.to_snapshot();
                println!(
                    "schedules={}, contracts={}, workloads={}, assignments={}, lessons={}, clustering={}",
                    snapshot.schedules.len(),
                    snapshot.contracts.len(),
                    snapshot.workloads.len(),
                    snapshot.assignments.len(),
                    snapshot.lessons.len(),
                    engine.config().clustering
                );
                match engine.store().lessons(&Default::default()) {
                    Ok(lessons) => println!("{}", render_lessons(&lessons)),
                    Err(e) => println!("Error listing lessons: {e}"),
                }
            }
            "lessons" => match args.first().and_then(|v| parse_id(v)) {
                Some(id) => match engine.calendar_lessons(id, None, None) {
                    Ok(lessons) => println!("{}", render_lessons(&lessons)),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: lessons <schedule_id>"),
            },
            "groups" => match args.first().and_then(|v| parse_id(v)) {
                Some(id) => match engine.schedule_groups(id) {
                    Ok(groups) => {
                        for group in groups {
                            println!("  {} {}", group.id, group.name);
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: groups <schedule_id>"),
            },
            "conflicts" => {
                let query = match parse_conflict_query(args) {
                    Ok(query) => query,
                    Err(e) => {
                        println!("Invalid filter: {e}");
                        continue;
                    }
                };
                match engine.detect_conflicts(&query) {
                    Ok(summary) => println!("{}", summary.to_cli_summary()),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "warnings" => match args.first().and_then(|v| parse_id(v)) {
                Some(id) => match engine.report_workload_warnings(id) {
                    Ok(report) => println!("{}", report.to_cli_summary()),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: warnings <schedule_id>"),
            },
            "contract" => match args {
                ["add", id, professor_id, semester_id, hours] => {
                    match (
                        parse_id(id),
                        parse_id(professor_id),
                        parse_id(semester_id),
                        parse_hours(hours),
                    ) {
                        (Some(id), Some(professor_id), Some(semester_id), Some(total_hours)) => {
                            engine.store_mut().upsert_contract(Contract {
                                id,
                                professor_id,
                                semester_id,
                                total_hours,
                            });
                            println!("Contract {id} upserted.");
                        }
                        _ => println!("Invalid contract values"),
                    }
                }
                _ => println!("Usage: contract add <id> <professor_id> <semester_id> <total_hours>"),
            },
            "workload" => {
                let (id, rest) = match args {
                    ["add", rest @ ..] => (None, rest),
                    ["set", id, rest @ ..] => match parse_id(id) {
                        Some(id) => (Some(id), rest),
                        None => {
                            println!("Invalid id");
                            continue;
                        }
                    },
                    _ => {
                        println!("Usage: workload add|set ...");
                        continue;
                    }
                };
                let draft = match rest {
                    [contract_id, form, hours] => {
                        match (parse_id(contract_id), form.parse::<StudyForm>(), parse_hours(hours)) {
                            (Some(contract_id), Ok(study_form), Some(assigned_hours)) => WorkloadDraft {
                                contract_id,
                                study_form,
                                assigned_hours,
                            },
                            _ => {
                                println!("Invalid workload values");
                                continue;
                            }
                        }
                    }
                    _ => {
                        println!("Usage: workload add <contract_id> <study_form> <hours>");
                        continue;
                    }
                };
                let result = match id {
                    Some(id) => engine.update_workload(id, draft),
                    None => engine.create_workload(draft),
                };
                match result {
                    Ok(workload) => println!(
                        "Workload {} saved ({} h, {}).",
                        workload.id, workload.assigned_hours, workload.study_form
                    ),
                    Err(e) => println!("Rejected: {e}"),
                }
            }
            "assignment" => {
                let (id, rest) = match args {
                    ["add", rest @ ..] => (None, rest),
                    ["set", id, rest @ ..] => match parse_id(id) {
                        Some(id) => (Some(id), rest),
                        None => {
                            println!("Invalid id");
                            continue;
                        }
                    },
                    _ => {
                        println!("Usage: assignment add|set ...");
                        continue;
                    }
                };
                let draft = match rest {
                    [workload_id, subject_id, hours] => {
                        match (parse_id(workload_id), parse_id(subject_id), parse_hours(hours)) {
                            (Some(workload_id), Some(subject_id), Some(hours_per_subject)) => AssignmentDraft {
                                workload_id,
                                subject_id,
                                hours_per_subject,
                            },
                            _ => {
                                println!("Invalid assignment values");
                                continue;
                            }
                        }
                    }
                    _ => {
                        println!("Usage: assignment add <workload_id> <subject_id> <hours>");
                        continue;
                    }
                };
                let result = match id {
                    Some(id) => engine.update_assignment(id, draft),
                    None => engine.create_assignment(draft),
                };
                match result {
                    Ok(assignment) => println!(
                        "Assignment {} saved ({} h).",
                        assignment.id, assignment.hours_per_subject
                    ),
                    Err(e) => println!("Rejected: {e}"),
                }
            }
            "usage" => {
                let result = match args {
                    ["contract", id] => parse_id(id).map(|id| engine.contract_usage(id)),
                    ["workload", id] => parse_id(id).map(|id| engine.workload_usage(id)),
                    _ => None,
                };
                match result {
                    Some(Ok(usage)) => println!("{}", usage.to_cli_summary()),
                    Some(Err(e)) => println!("Error: {e}"),
                    None => println!("Usage: usage <contract|workload> <id>"),
                }
            }
            "clustering" => match args.first().map(|v| v.parse::<ClusterStrategy>()) {
                Some(Ok(strategy)) => {
                    engine.set_clustering(strategy);
                    println!("Clustering set to {strategy}.");
                }
                Some(Err(e)) => println!("{e}"),
                None => println!("Usage: clustering <connected|star>"),
            },
            "save" => match args {
                ["json", path] => match save_catalog_to_json(&engine.store().to_snapshot(), path) {
                    Ok(_) => println!("Catalog saved to {path}."),
                    Err(e) => println!("Error saving catalog: {e}"),
                },
                _ => println!("Usage: save json <path>"),
            },
            "load" => match args {
                ["json", path] => {
                    match load_catalog_from_json(path).and_then(InMemoryCatalog::from_snapshot) {
                        Ok(catalog) => {
                            *engine.store_mut() = catalog;
                            println!("Catalog loaded from {path}.");
                        }
                        Err(e) => println!("Error loading catalog: {e}"),
                    }
                }
                _ => println!("Usage: load json <path>"),
            },
            "import" => match args {
                ["lessons", path] => match load_lessons_from_csv(path) {
                    Ok(records) => {
                        let count = records.len();
                        let catalog = engine.store_mut();
                        for record in records {
                            catalog.upsert_lesson(record);
                        }
                        println!("Imported {count} lessons from {path}.");
                    }
                    Err(e) => println!("Error importing lessons: {e}"),
                },
                _ => println!("Usage: import lessons <csv_path>"),
            },
            "export" => match args {
                ["lessons", path] => match save_lessons_to_csv(&engine.store().lesson_records(), path) {
                    Ok(_) => println!("Lessons exported to {path}."),
                    Err(e) => println!("Error exporting lessons: {e}"),
                },
                _ => println!("Usage: export lessons <csv_path>"),
            },
            other => {
                println!("Unknown command '{other}'. Type 'help' for commands.");
            }
        }
    }
}
