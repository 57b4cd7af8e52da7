// crates/core/src/calendar.rs
//! Pure date arithmetic: bucket truncation, cycle-anchor stepping, and
//! recurring-offset resolution. All instants are UTC; the date buckets used
//! for grouping truncate in UTC as well.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RecurrenceInterval;

pub const MINUTES_PER_DAY: i64 = 24 * 60;
pub const MINUTES_PER_WEEK: i64 = 7 * MINUTES_PER_DAY;

/// Bucket size for date grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBucket {
    Year,
    Month,
    Week,
    Day,
}

/// Midnight (00:00 UTC) of the given date.
pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

/// Truncate an instant to its bucket boundary.
///
/// Year → Jan 1 00:00, Month → 1st 00:00, Week → ISO week Monday 00:00,
/// Day → 00:00, all in UTC.
pub fn truncate_to_bucket(instant: DateTime<Utc>, bucket: DateBucket) -> DateTime<Utc> {
    let date = instant.date_naive();
    let floor = match bucket {
        DateBucket::Day => date,
        DateBucket::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        DateBucket::Month => date.with_day(1).unwrap(),
        DateBucket::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap(),
    };
    midnight(floor)
}

/// Number of days in the given month.
pub fn month_length(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    (NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap() - Duration::days(1)).day()
}

/// Build a date, clamping the day to the month's length (Jan 31 + 1 month →
/// Feb 28/29, never a skipped cycle).
pub fn clamped_ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.min(month_length(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// The cycle anchor following `anchor`.
///
/// Monthly and yearly stepping preserve the origin's calendar day, clamped
/// to short months, so a day-31 origin keeps landing on month ends instead
/// of drifting after the first February.
pub fn step_anchor(
    anchor: NaiveDate,
    interval: RecurrenceInterval,
    origin: NaiveDate,
) -> NaiveDate {
    match interval {
        RecurrenceInterval::Daily => anchor + Duration::days(1),
        RecurrenceInterval::Weekly => anchor + Duration::days(7),
        RecurrenceInterval::Monthly => {
            let months = anchor.year() as i64 * 12 + anchor.month0() as i64 + 1;
            let year = months.div_euclid(12) as i32;
            let month = months.rem_euclid(12) as u32 + 1;
            clamped_ymd(year, month, origin.day())
        }
        RecurrenceInterval::Yearly => clamped_ymd(anchor.year() + 1, origin.month(), origin.day()),
    }
}

/// Resolve a recurring-definition offset into an absolute instant.
///
/// - `weekly`: the offset encodes `{weekday 0–6 (Mon=0), hour, minute}` as
///   `weekday * 1440 + hour * 60 + minute` and resolves to the first such
///   weekday at-or-after the anchor.
/// - `daily`: only `{hour, minute}` apply (offset < 1440).
/// - `monthly` / `yearly`: a fixed minute count from the anchor's midnight.
pub fn resolve_offset(
    anchor: NaiveDate,
    interval: RecurrenceInterval,
    minute_offset: i64,
) -> DateTime<Utc> {
    match interval {
        RecurrenceInterval::Daily
        | RecurrenceInterval::Monthly
        | RecurrenceInterval::Yearly => midnight(anchor) + Duration::minutes(minute_offset),
        RecurrenceInterval::Weekly => {
            let weekday = minute_offset.div_euclid(MINUTES_PER_DAY);
            let time_of_day = minute_offset.rem_euclid(MINUTES_PER_DAY);
            let anchor_weekday = anchor.weekday().num_days_from_monday() as i64;
            let days_ahead = (weekday - anchor_weekday).rem_euclid(7);
            midnight(anchor + Duration::days(days_ahead)) + Duration::minutes(time_of_day)
        }
    }
}

/// Inverse of [`resolve_offset`]: recover the minute offset a resolved
/// instant had relative to its cycle anchor.
pub fn offset_from_instant(
    anchor: NaiveDate,
    interval: RecurrenceInterval,
    instant: DateTime<Utc>,
) -> i64 {
    match interval {
        RecurrenceInterval::Daily => {
            (instant.hour() as i64) * 60 + instant.minute() as i64
        }
        RecurrenceInterval::Weekly => {
            let weekday = instant.weekday().num_days_from_monday() as i64;
            weekday * MINUTES_PER_DAY + (instant.hour() as i64) * 60 + instant.minute() as i64
        }
        RecurrenceInterval::Monthly | RecurrenceInterval::Yearly => {
            (instant - midnight(anchor)).num_minutes()
        }
    }
}
