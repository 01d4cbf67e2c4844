//! Trading session calendar
//!
//! Everything day-scoped (idempotency keys, daily counters) uses the
//! exchange-local trading day, not the UTC date.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Regular trading hours in exchange-local time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSession {
    /// Exchange offset from UTC in minutes (-300 = US/Eastern standard time)
    pub utc_offset_minutes: i32,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for TradingSession {
    fn default() -> Self {
        Self {
            utc_offset_minutes: -300,
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }
}

impl TradingSession {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    fn local_time(&self, now: DateTime<Utc>) -> NaiveTime {
        now.with_timezone(&self.offset()).time()
    }

    /// Trading-day key, `YYYYMMDD` in exchange-local time
    pub fn trading_day(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset())
            .format("%Y%m%d")
            .to_string()
    }

    /// Minutes since the open (negative before it)
    pub fn minutes_since_open(&self, now: DateTime<Utc>) -> i64 {
        (self.local_time(now) - self.open).num_minutes()
    }

    /// Minutes until the close (negative after it)
    pub fn minutes_to_close(&self, now: DateTime<Utc>) -> i64 {
        (self.close - self.local_time(now)).num_minutes()
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let t = self.local_time(now);
        t >= self.open && t < self.close
    }

    /// Time left until local midnight, floor of one second
    ///
    /// Used as the TTL of day-scoped keys.
    pub fn until_end_of_day(&self, now: DateTime<Utc>) -> Duration {
        let t = self.local_time(now);
        let elapsed = i64::from(t.num_seconds_from_midnight());
        Duration::seconds((86_400 - elapsed).max(1))
    }
}
