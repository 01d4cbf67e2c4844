use chrono::{DateTime, Utc};

/// Instant in UTC
///
/// Signal time stops, fills, bans and cooldowns all compare in UTC. The
/// exchange-local view (trading day, open/close) comes only from
/// `TradingSession`, so a run straddling a DST change or UTC midnight
/// never mixes the two.
pub type Timestamp = DateTime<Utc>;
