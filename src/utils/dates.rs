use chrono::NaiveDate;

/// Number of rental days between two calendar dates, in either order.
/// A same-day rental still occupies the vehicle and counts as one day.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().abs().max(1)
}

/// Closed-interval overlap: ranges that share a boundary day conflict.
pub fn ranges_overlap(
    start_a: NaiveDate,
    end_a: NaiveDate,
    start_b: NaiveDate,
    end_b: NaiveDate,
) -> bool {
    start_a <= end_b && start_b <= end_a
}
