//! Business time zone helpers
//!
//! Stored timestamps are Unix millis; day boundaries are computed in the
//! configured business time zone.

use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Parse an IANA time zone name, e.g. `Europe/Madrid`
pub fn parse_tz(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}

/// Today's date in the business time zone
pub fn business_today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Local midnight of `date` → Unix millis
///
/// DST gap fallback: if local midnight does not exist, use UTC midnight.
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Next day's local midnight → Unix millis (exclusive end)
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}
