//! Conversion between abstract "hours since project start" (what the solver
//! reasons about) and real calendar `DateTime<Utc>` values.
//!
//! Two modes:
//! - `respect_weekends = false`: hours are added to `project_start` as a flat
//!   duration.
//! - `respect_weekends = true`: work happens 09:00-local onward, skipping
//!   Saturday/Sunday, `working_hours_per_day` hours consumed per working day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn first_working_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn advance_working_days(start: NaiveDate, days: u32) -> NaiveDate {
    let mut date = start;
    let mut remaining = days;
    while remaining > 0 {
        date = date.succ_opt().expect("date arithmetic in range");
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    date
}

fn working_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut date = start;
    let mut count = 0u32;
    while date < end {
        date = date.succ_opt().expect("date arithmetic in range");
        if !is_weekend(date) {
            count += 1;
        }
    }
    count
}

/// Converts an hours-offset from `project_start` into a concrete instant.
pub fn hours_to_datetime(
    project_start: DateTime<Utc>,
    hours: u32,
    working_hours_per_day: u32,
    respect_weekends: bool,
) -> DateTime<Utc> {
    if !respect_weekends || working_hours_per_day == 0 {
        return project_start + Duration::hours(i64::from(hours));
    }
    let base_date = first_working_day(project_start.date_naive());
    let whole_days = hours / working_hours_per_day;
    let hour_in_day = hours % working_hours_per_day;
    let date = advance_working_days(base_date, whole_days);
    let naive = date
        .and_hms_opt(9, 0, 0)
        .expect("09:00 is a valid time")
        + Duration::hours(i64::from(hour_in_day));
    Utc.from_utc_datetime(&naive)
}

/// Inverse of [`hours_to_datetime`]: how many working hours after
/// `project_start` does `instant` fall. Clamped to zero if `instant` is
/// before the first working instant.
pub fn datetime_to_hours(
    project_start: DateTime<Utc>,
    instant: DateTime<Utc>,
    working_hours_per_day: u32,
    respect_weekends: bool,
) -> u32 {
    if !respect_weekends || working_hours_per_day == 0 {
        let delta = (instant - project_start).num_hours();
        return u32::try_from(delta.max(0)).unwrap_or(u32::MAX);
    }
    let base_date = first_working_day(project_start.date_naive());
    if instant.date_naive() < base_date {
        return 0;
    }
    let whole_days = working_days_between(base_date, instant.date_naive());
    let hour_of_day = (i64::from(instant.hour()) - 9).clamp(0, i64::from(working_hours_per_day.saturating_sub(1)));
    whole_days * working_hours_per_day + u32::try_from(hour_of_day).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn flat_mode_just_adds_hours() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let end = hours_to_datetime(start, 40, 8, false);
        assert_eq!(end, start + Duration::hours(40));
    }

    #[test]
    fn weekend_mode_skips_saturday_and_sunday() {
        // 2026-03-02 is a Monday.
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        // 5 working days * 8h = 40h, landing exactly at the start of the
        // next working day (Monday the following week) at 09:00.
        let end = hours_to_datetime(start, 40, 8, true);
        assert_eq!(end.weekday(), Weekday::Mon);
        assert_eq!(end.hour(), 9);
        assert_eq!(end.date_naive(), start.date_naive() + Duration::days(7));
    }

    #[test]
    fn weekend_mode_does_not_land_on_a_weekend() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        for h in 0..200 {
            let dt = hours_to_datetime(start, h, 8, true);
            assert!(!is_weekend(dt.date_naive()), "hours={h} landed on {dt}");
        }
    }

    #[test]
    fn datetime_to_hours_round_trips_on_working_day_boundaries() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        for h in [0u32, 4, 8, 16, 40] {
            let dt = hours_to_datetime(start, h, 8, true);
            assert_eq!(datetime_to_hours(start, dt, 8, true), h);
        }
    }
}
