//! Calendar-day boundaries for "today" queries.

use chrono::{DateTime, Duration, LocalResult, NaiveTime, Offset, TimeZone, Utc};

/// Start of the calendar day containing `now`, in `now`'s own time zone
///
/// Derived fresh on every call. When local midnight is ambiguous the earlier
/// instant wins. When it falls into a DST gap the day starts at the jump
/// itself: midnight read with the offset in effect before the transition.
pub fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let tz = now.timezone();

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(start) => start.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = match tz.from_local_datetime(&(midnight - Duration::days(1))) {
                LocalResult::Single(prev) | LocalResult::Ambiguous(_, prev) => {
                    prev.offset().fix()
                }
                LocalResult::None => now.offset().fix(),
            };
            tracing::debug!(
                "Local midnight {} does not exist, using offset {}",
                midnight,
                offset
            );
            let utc_naive = midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&utc_naive)
        }
    }
}
