use aegis_core::Timestamp;
use aegis_ports::Clock;
use chrono::Utc;

/// Wall clock for live and paper runs
///
/// Everything that ages state (signal expiry, cooldowns, ban expiry and
/// daily counters) reads time through the `Clock` port, so swapping this
/// for a `ManualClock` is all it takes to replay a session in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
