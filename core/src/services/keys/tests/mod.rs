mod store_tests;

use chrono::{DateTime, TimeZone, Utc};

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}
