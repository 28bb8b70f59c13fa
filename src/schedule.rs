//! Evenly spaced drill schedules.
//!
//! `interval = max(1, floor(total_days / count))` where `total_days` is the
//! range rounded up to whole days. Entry `i` lands on `start + i * interval`
//! days and takes catalog entry `i % catalog.len()`.

use chrono::{DateTime, Duration, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// One generated slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDrill {
    /// Position in the requested batch
    pub index: usize,
    pub drill_type: String,
    pub date: DateTime<Utc>,
}

/// Whole days covered by the range, rounded up
pub fn total_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds();
    // ceil for positive and negative spans alike
    -((-millis).div_euclid(MILLIS_PER_DAY))
}

/// Days between consecutive drills, never less than one
pub fn interval_days(total_days: i64, count: usize) -> i64 {
    if count == 0 {
        return 1;
    }
    std::cmp::max(1, total_days.div_euclid(count as i64))
}

/// Spread `count` drills over `[start, end)`, cycling through `catalog`.
///
/// Slots whose date cannot be represented are skipped; the rest of the batch
/// is still produced. An empty catalog yields no slots.
pub fn generate(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    count: usize,
    catalog: &[String],
) -> Vec<ScheduledDrill> {
    if count == 0 || catalog.is_empty() {
        return Vec::new();
    }

    let interval = interval_days(total_days(start, end), count);
    tracing::debug!(count, interval, "Generating drill schedule");

    let mut slots = Vec::with_capacity(count);
    for i in 0..count {
        let offset = (i as i64)
            .checked_mul(interval)
            .and_then(Duration::try_days);
        let date = match offset.and_then(|d| start.checked_add_signed(d)) {
            Some(date) => date,
            None => {
                tracing::warn!(index = i, interval, "Skipping drill with unrepresentable date");
                continue;
            }
        };

        slots.push(ScheduledDrill {
            index: i,
            drill_type: catalog[i % catalog.len()].clone(),
            date,
        });
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_ten_days_five_drills() {
        let start = day(1);
        let slots = generate(start, day(11), 5, &catalog(&["A", "B", "C"]));

        let offsets: Vec<i64> = slots.iter().map(|s| (s.date - start).num_days()).collect();
        assert_eq!(offsets, vec![0, 2, 4, 6, 8]);

        let types: Vec<&str> = slots.iter().map(|s| s.drill_type.as_str()).collect();
        assert_eq!(types, vec!["A", "B", "C", "A", "B"]);
    }

    #[test]
    fn test_zero_count_produces_nothing() {
        assert!(generate(day(1), day(11), 0, &catalog(&["A"])).is_empty());
    }

    #[test]
    fn test_empty_catalog_produces_nothing() {
        assert!(generate(day(1), day(11), 3, &[]).is_empty());
    }

    #[test]
    fn test_interval_is_at_least_one_day() {
        let start = day(1);
        let slots = generate(start, day(3), 5, &catalog(&["A"]));
        assert_eq!(slots.len(), 5);
        assert_eq!((slots[4].date - start).num_days(), 4);
    }

    #[test]
    fn test_partial_days_round_up() {
        let start = day(1);
        let end = start + Duration::hours(24 * 9 + 1);
        assert_eq!(total_days(start, end), 10);
        assert_eq!(total_days(start, start + Duration::days(10)), 10);
    }

    #[test]
    fn test_dates_non_decreasing_and_exact_count() {
        let names = catalog(&["A", "B", "C", "D", "E", "F", "G"]);
        for n in 1..=20 {
            let slots = generate(day(1), day(28), n, &names);
            assert_eq!(slots.len(), n);
            assert!(slots.windows(2).all(|w| w[0].date <= w[1].date));
            for s in &slots {
                assert_eq!(s.drill_type, names[s.index % names.len()]);
            }
        }
    }

    #[test]
    fn test_unrepresentable_dates_are_skipped() {
        let overflow = generate(
            DateTime::<Utc>::MAX_UTC - Duration::days(10),
            DateTime::<Utc>::MAX_UTC - Duration::days(5),
            30,
            &catalog(&["A", "B"]),
        );
        // interval is 1 day; only the first 11 offsets (0..=10) stay in range
        assert_eq!(overflow.len(), 11);
        assert_eq!(overflow.last().map(|s| s.index), Some(10));
        assert_eq!(overflow[1].drill_type, "B");
    }

    #[test]
    fn test_registration_spacing() {
        let start = day(1);
        let slots = generate(start, start + Duration::days(360), 12, &catalog(&["A"]));
        assert!(slots
            .iter()
            .enumerate()
            .all(|(i, s)| (s.date - start).num_days() == 30 * i as i64));
    }
}
