use chrono::{Duration, NaiveTime};

use crate::lesson::Lesson;

/// Duration between two times of day. An end earlier than the start is
/// read as crossing midnight and wraps by 24h.
pub fn span(start: NaiveTime, end: NaiveTime) -> Duration {
    let delta = end - start;
    if delta < Duration::zero() {
        delta + Duration::days(1)
    } else {
        delta
    }
}

pub fn span_hours(start: NaiveTime, end: NaiveTime) -> f64 {
    span(start, end).num_seconds() as f64 / 3600.0
}

/// Total scheduled hours across a set of lesson occurrences.
pub fn total_hours<'a, I>(lessons: I) -> f64
where
    I: IntoIterator<Item = &'a Lesson>,
{
    let seconds: i64 = lessons
        .into_iter()
        .map(|lesson| span(lesson.start_time, lesson.end_time).num_seconds())
        .sum();
    seconds as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn same_day_span() {
        assert_eq!(span_hours(t(8, 0), t(9, 30)), 1.5);
    }

    #[test]
    fn midnight_crossing_wraps() {
        assert_eq!(span_hours(t(23, 0), t(1, 0)), 2.0);
    }

    #[test]
    fn equal_endpoints_are_zero() {
        assert_eq!(span_hours(t(10, 0), t(10, 0)), 0.0);
    }
}
