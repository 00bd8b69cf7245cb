use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;

use crate::lesson::Lesson;

/// Half-open overlap test on naive times of day.
///
/// Touching endpoints (`a_end == b_start`) do not overlap.
pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && a_end > b_start
}

pub fn lessons_overlap(a: &Lesson, b: &Lesson) -> bool {
    overlaps(a.start_time, a.end_time, b.start_time, b.end_time)
}

/// Partitions lessons by calendar date, keeping input order inside each day.
pub fn bucket_by_date(lessons: &[Lesson]) -> BTreeMap<NaiveDate, Vec<&Lesson>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&Lesson>> = BTreeMap::new();
    for lesson in lessons {
        buckets.entry(lesson.date).or_default().push(lesson);
    }
    buckets
}

/// `HH:MM-HH:MM`, used in conflict messages.
pub fn format_window(start: NaiveTime, end: NaiveTime) -> String {
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        assert!(!overlaps(t(8, 0), t(9, 30), t(9, 30), t(11, 0)));
        assert!(!overlaps(t(9, 30), t(11, 0), t(8, 0), t(9, 30)));
    }

    #[test]
    fn partial_and_contained_windows_overlap() {
        assert!(overlaps(t(8, 0), t(9, 30), t(9, 0), t(10, 0)));
        assert!(overlaps(t(8, 0), t(12, 0), t(9, 0), t(10, 0)));
        assert!(overlaps(t(8, 0), t(9, 30), t(8, 0), t(9, 30)));
    }

    #[test]
    fn disjoint_windows_do_not_overlap() {
        assert!(!overlaps(t(8, 0), t(9, 0), t(10, 0), t(11, 0)));
    }

    #[test]
    fn window_format_is_hours_and_minutes() {
        assert_eq!(format_window(t(8, 0), t(9, 30)), "08:00-09:30");
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in 0u32..1440, a_len in 1u32..240, b in 0u32..1440, b_len in 1u32..240) {
            let to_time = |minutes: u32| {
                let minutes = minutes.min(1439);
                NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap()
            };
            let (a_start, a_end) = (to_time(a), to_time(a + a_len));
            let (b_start, b_end) = (to_time(b), to_time(b + b_len));
            prop_assert_eq!(
                overlaps(a_start, a_end, b_start, b_end),
                overlaps(b_start, b_end, a_start, a_end)
            );
        }
    }
}
