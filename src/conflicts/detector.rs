use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::clustering::overlap_clusters;
use super::{ClusterStrategy, Conflict, ConflictType, Severity};
use crate::interval::{bucket_by_date, format_window};
use crate::lesson::Lesson;

/// Runs the requested dimension passes over every date in `lessons`.
///
/// Output is ordered by date, then pass (room, professor, group), then
/// dimension key, then cluster. With `parallel_days` the dates are
/// processed on the rayon pool; the order is the same either way.
pub fn detect(
    lessons: &[Lesson],
    types: &[ConflictType],
    strategy: ClusterStrategy,
    parallel_days: bool,
) -> Vec<Conflict> {
    let days: Vec<(NaiveDate, Vec<&Lesson>)> = bucket_by_date(lessons).into_iter().collect();
    let per_day: Vec<Vec<Conflict>> = if parallel_days {
        days.par_iter()
            .map(|(date, day)| detect_day(*date, day, types, strategy))
            .collect()
    } else {
        days.iter()
            .map(|(date, day)| detect_day(*date, day, types, strategy))
            .collect()
    };
    per_day.into_iter().flatten().collect()
}

fn detect_day(
    date: NaiveDate,
    day: &[&Lesson],
    types: &[ConflictType],
    strategy: ClusterStrategy,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for conflict_type in ConflictType::ALL {
        if !types.contains(&conflict_type) {
            continue;
        }
        let before = conflicts.len();
        match conflict_type {
            ConflictType::Room => room_pass(day, strategy, &mut conflicts),
            ConflictType::Professor => professor_pass(day, strategy, &mut conflicts),
            ConflictType::Group => group_pass(day, strategy, &mut conflicts),
        }
        debug!(
            %date,
            lessons = day.len(),
            pass = %conflict_type,
            found = conflicts.len() - before,
            "conflict pass finished"
        );
    }
    conflicts
}

fn key_lessons<'a, K, F>(day: &[&'a Lesson], key: F) -> BTreeMap<K, Vec<&'a Lesson>>
where
    K: Ord,
    F: Fn(&Lesson) -> Option<K>,
{
    let mut keyed: BTreeMap<K, Vec<&'a Lesson>> = BTreeMap::new();
    for &lesson in day {
        if let Some(k) = key(lesson) {
            keyed.entry(k).or_default().push(lesson);
        }
    }
    keyed
}

fn conflict(conflict_type: ConflictType, message: String, cluster: &[&Lesson]) -> Conflict {
    Conflict {
        conflict_type,
        severity: Severity::Error,
        message,
        lessons: cluster.iter().map(|&lesson| lesson.clone()).collect(),
    }
}

/// Room double-booking. A cluster taught entirely by one instructor is a
/// shared lecture for several groups and is not reported.
fn room_pass(day: &[&Lesson], strategy: ClusterStrategy, out: &mut Vec<Conflict>) {
    for (_, lessons) in key_lessons(day, Lesson::in_room) {
        for cluster in overlap_clusters(&lessons, strategy) {
            let first = cluster[0];
            let instructor = first.instructor_id();
            if instructor.is_some() && cluster.iter().all(|l| l.instructor_id() == instructor) {
                continue;
            }
            let number = first.room.as_ref().map(|r| r.number.as_str()).unwrap_or_default();
            let message = format!(
                "Room '{number}' is double-booked by different professors at {}",
                format_window(first.start_time, first.end_time)
            );
            out.push(conflict(ConflictType::Room, message, &cluster));
        }
    }
}

/// One instructor in more than one place at once. A cluster held in a
/// single physical room with nobody online is a shared lecture.
fn professor_pass(day: &[&Lesson], strategy: ClusterStrategy, out: &mut Vec<Conflict>) {
    for (_, lessons) in key_lessons(day, Lesson::instructor_id) {
        for cluster in overlap_clusters(&lessons, strategy) {
            let rooms: BTreeSet<_> = cluster.iter().filter_map(|l| l.room_id()).collect();
            let any_online = cluster.iter().any(|l| l.is_online);
            if rooms.len() <= 1 && !any_online {
                continue;
            }
            let first = cluster[0];
            let name = first.instructor.as_ref().map(|i| i.name.as_str()).unwrap_or_default();
            let message = format!(
                "Professor {name} teaching in multiple locations simultaneously at {}",
                format_window(first.start_time, first.end_time)
            );
            out.push(conflict(ConflictType::Professor, message, &cluster));
        }
    }
}

/// A group cannot attend two lessons at once; no exceptions. Lessons whose
/// group did not resolve are left to the other passes.
fn group_pass(day: &[&Lesson], strategy: ClusterStrategy, out: &mut Vec<Conflict>) {
    for (_, lessons) in key_lessons(day, |l| l.group.as_ref().map(|g| g.id)) {
        for cluster in overlap_clusters(&lessons, strategy) {
            let first = cluster[0];
            let name = first.group.as_ref().map(|g| g.name.as_str()).unwrap_or_default();
            let message = format!(
                "Group '{name}' has multiple lessons at {}",
                format_window(first.start_time, first.end_time)
            );
            out.push(conflict(ConflictType::Group, message, &cluster));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::GroupRef;
    use chrono::NaiveTime;

    fn at(id: i32, group: i32, h: u32) -> Lesson {
        Lesson::new(
            id,
            1,
            GroupRef::new(group, format!("G{group}")),
            NaiveDate::from_ymd_opt(2025, 10, 6).unwrap(),
            NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(h + 1, 30, 0).unwrap(),
        )
    }

    fn types_of(conflicts: &[Conflict]) -> Vec<ConflictType> {
        conflicts.iter().map(|c| c.conflict_type).collect()
    }

    #[test]
    fn shared_lecture_is_not_a_room_or_professor_conflict() {
        let lessons = vec![
            at(1, 1, 8).with_room(1, "A100").with_instructor(7, "Ada Lovelace"),
            at(2, 2, 8).with_room(1, "A100").with_instructor(7, "Ada Lovelace"),
        ];
        assert!(detect(&lessons, &ConflictType::ALL, ClusterStrategy::Connected, false).is_empty());
    }

    #[test]
    fn unresolved_instructor_does_not_excuse_room_clash() {
        let lessons = vec![
            at(1, 1, 8).with_room(1, "A100"),
            at(2, 2, 8).with_room(1, "A100"),
        ];
        let conflicts = detect(&lessons, &ConflictType::ALL, ClusterStrategy::Connected, false);
        assert_eq!(types_of(&conflicts), vec![ConflictType::Room]);
    }

    #[test]
    fn online_lessons_never_hold_a_room() {
        let lessons = vec![
            at(1, 1, 8).with_room(1, "A100").with_instructor(1, "A"),
            at(2, 2, 8).with_room(1, "A100").with_instructor(2, "B").online(),
        ];
        let conflicts = detect(&lessons, &[ConflictType::Room], ClusterStrategy::Connected, false);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn instructor_split_between_room_and_online_is_flagged() {
        let lessons = vec![
            at(1, 1, 8).with_room(1, "A100").with_instructor(7, "Ada Lovelace"),
            at(2, 2, 8).with_instructor(7, "Ada Lovelace").online(),
        ];
        let conflicts = detect(&lessons, &ConflictType::ALL, ClusterStrategy::Connected, false);
        assert_eq!(types_of(&conflicts), vec![ConflictType::Professor]);
        assert_eq!(
            conflicts[0].message,
            "Professor Ada Lovelace teaching in multiple locations simultaneously at 08:00-09:30"
        );
    }

    #[test]
    fn type_filter_limits_passes() {
        let lessons = vec![
            at(1, 1, 8).with_room(1, "A100").with_instructor(1, "A"),
            at(2, 1, 8).with_room(1, "A100").with_instructor(2, "B"),
        ];
        let all = detect(&lessons, &ConflictType::ALL, ClusterStrategy::Connected, false);
        assert_eq!(types_of(&all), vec![ConflictType::Room, ConflictType::Group]);
        let groups_only = detect(&lessons, &[ConflictType::Group], ClusterStrategy::Connected, false);
        assert_eq!(types_of(&groups_only), vec![ConflictType::Group]);
        assert_eq!(groups_only[0].message, "Group 'G1' has multiple lessons at 08:00-09:30");
    }

    #[test]
    fn unresolved_group_still_clashes_on_room() {
        let mut orphan = at(1, 1, 8).with_room(1, "A100");
        orphan.group = None;
        let lessons = vec![orphan, at(2, 2, 8).with_room(1, "A100")];
        let conflicts = detect(&lessons, &ConflictType::ALL, ClusterStrategy::Connected, false);
        assert_eq!(types_of(&conflicts), vec![ConflictType::Room]);
        assert_eq!(conflicts[0].lesson_ids(), vec![1, 2]);
    }

    #[test]
    fn parallel_days_match_sequential() {
        let mut lessons = Vec::new();
        for day in 1..=5 {
            let date = NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
            for id in 0..3 {
                let mut lesson = at(day as i32 * 10 + id, 1, 8 + id as u32).with_room(1, "A100");
                lesson.date = date;
                lessons.push(lesson);
            }
        }
        let sequential = detect(&lessons, &ConflictType::ALL, ClusterStrategy::Connected, false);
        let parallel = detect(&lessons, &ConflictType::ALL, ClusterStrategy::Connected, true);
        assert_eq!(sequential, parallel);
        assert!(!sequential.is_empty());
    }
}
