use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Return today's date in the given timezone.
///
/// Availability windows are day-granular DATE columns, so "today" must be
/// anchored to a timezone before comparison to avoid off-by-one days.
///
/// # Example
///```
/// use shared::time::today_in;
/// use chrono_tz::Asia::Ho_Chi_Minh;
/// let today = today_in(Ho_Chi_Minh);
/// ```
pub fn today_in(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}
