//! Symbol blacklist
//!
//! Symbols collecting `violation_threshold` violations inside a sliding
//! lookback window are banned for `ban_duration`; every further violation
//! while banned pushes the ban out again. Expiry is checked on every
//! lookup, so a ban lapses on time even if cleanup never runs; cleanup
//! reclaims entries and lookup counters.

use std::collections::VecDeque;

use aegis_core::Timestamp;
use chrono::Duration;
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parameters::BlacklistConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub symbol: String,
    /// Violations recorded since the entry was created
    pub violation_count: u32,
    pub last_violation_time: Timestamp,
    pub blacklisted_until: Option<Timestamp>,
    pub reason: String,
    /// Violation times inside the lookback, oldest first
    #[serde(default)]
    pub recent: VecDeque<Timestamp>,
}

impl BlacklistEntry {
    pub fn is_banned_at(&self, now: Timestamp) -> bool {
        self.blacklisted_until.is_some_and(|until| now < until)
    }

    /// Forget violations older than the lookback
    fn prune(&mut self, now: Timestamp, lookback: Duration) {
        while self.recent.front().is_some_and(|t| now - *t > lookback) {
            self.recent.pop_front();
        }
    }
}

pub struct Blacklist {
    config: BlacklistConfig,
    entries: DashMap<String, BlacklistEntry>,
    /// Rejected lookups per banned symbol, released by cleanup
    lookups: DashMap<String, u64>,
}

impl Blacklist {
    pub fn new(config: BlacklistConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            lookups: DashMap::new(),
        }
    }

    fn lookback(&self) -> Duration {
        Duration::seconds(self.config.lookback_secs)
    }

    fn ban_duration(&self) -> Duration {
        Duration::seconds(self.config.ban_duration_secs)
    }

    /// Count a violation; returns the ban expiry when this one bans the
    /// symbol or extends an active ban
    pub fn record_violation(
        &self,
        symbol: &str,
        reason: &str,
        now: Timestamp,
    ) -> Option<Timestamp> {
        let threshold = self.config.violation_threshold.max(1) as usize;
        let mut entry = self
            .entries
            .entry(symbol.to_string())
            .or_insert_with(|| BlacklistEntry {
                symbol: symbol.to_string(),
                violation_count: 0,
                last_violation_time: now,
                blacklisted_until: None,
                reason: String::new(),
                recent: VecDeque::with_capacity(threshold),
            });

        entry.prune(now, self.lookback());
        entry.recent.push_back(now);
        while entry.recent.len() > threshold {
            entry.recent.pop_front();
        }
        entry.violation_count = entry.violation_count.saturating_add(1);
        entry.last_violation_time = now;
        entry.reason = reason.to_string();

        debug!(
            "[BLACKLIST] Violation {} for {} ({} in window): {}",
            entry.violation_count,
            symbol,
            entry.recent.len(),
            reason
        );

        if entry.recent.len() < threshold && !entry.is_banned_at(now) {
            return None;
        }

        let until = now + self.ban_duration();
        let extended = entry.is_banned_at(now);
        if entry.blacklisted_until.is_none_or(|current| current < until) {
            entry.blacklisted_until = Some(until);
        }
        if extended {
            warn!("[BLACKLIST] {} ban extended to {}: {}", symbol, until, reason);
        } else {
            warn!(
                "[BLACKLIST] {} banned until {} after {} violations: {}",
                symbol,
                until,
                entry.recent.len(),
                reason
            );
        }
        Some(until)
    }

    /// `(true, reason)` while a ban is in force
    pub fn is_blacklisted(&self, symbol: &str, now: Timestamp) -> (bool, Option<String>) {
        let Some(entry) = self.entries.get(symbol) else {
            return (false, None);
        };
        if entry.is_banned_at(now) {
            let reason = entry.reason.clone();
            drop(entry);
            *self.lookups.entry(symbol.to_string()).or_insert(0) += 1;
            return (true, Some(reason));
        }
        (false, None)
    }

    /// Drop expired bans, stale violation counters and their lookup counters
    pub fn cleanup(&self, now: Timestamp) -> usize {
        let lookback = self.lookback();
        let before = self.entries.len();

        self.entries.retain(|_, entry| {
            entry.prune(now, lookback);
            entry.is_banned_at(now) || !entry.recent.is_empty()
        });
        self.lookups.retain(|symbol, _| {
            self.entries
                .get(symbol)
                .is_some_and(|entry| entry.is_banned_at(now))
        });

        let removed = before - self.entries.len();
        if removed > 0 {
            info!("[BLACKLIST] Cleanup released {} entries", removed);
        }
        removed
    }

    pub fn banned_symbols(&self, now: Timestamp) -> Vec<BlacklistEntry> {
        let mut banned: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.is_banned_at(now))
            .map(|e| e.value().clone())
            .collect();
        banned.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        banned
    }

    pub fn entry(&self, symbol: &str) -> Option<BlacklistEntry> {
        self.entries.get(symbol).map(|e| e.value().clone())
    }

    pub fn lookup_count(&self, symbol: &str) -> u64 {
        self.lookups.get(symbol).map(|c| *c).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<BlacklistEntry> {
        let mut all: Vec<_> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        all
    }

    pub fn restore(&self, entries: Vec<BlacklistEntry>) -> Result<()> {
        for entry in &entries {
            if entry.symbol.is_empty() {
                return Err(Error::corrupted("blacklist", "entry with empty symbol"));
            }
            if entry.recent.iter().zip(entry.recent.iter().skip(1)).any(|(a, b)| a > b) {
                return Err(Error::corrupted(
                    "blacklist",
                    format!("{} violation times out of order", entry.symbol),
                ));
            }
        }
        self.entries.clear();
        self.lookups.clear();
        for entry in entries {
            self.entries.insert(entry.symbol.clone(), entry);
        }
        info!("[BLACKLIST] Restored {} entries", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap()
    }

    fn blacklist() -> Blacklist {
        Blacklist::new(BlacklistConfig::default())
    }

    #[test]
    fn test_threshold_bans_only_offending_symbol() {
        let _ = env_logger::try_init();
        let bl = blacklist();
        let now = t0();

        assert!(bl.record_violation("XYZ", "rejected", now).is_none());
        assert!(bl.record_violation("XYZ", "rejected", now).is_none());
        let until = bl.record_violation("XYZ", "halted", now).unwrap();
        assert_eq!(until, now + Duration::hours(4));

        let (banned, reason) = bl.is_blacklisted("XYZ", now);
        assert!(banned);
        assert_eq!(reason.as_deref(), Some("halted"));
        assert_eq!(bl.is_blacklisted("AAPL", now), (false, None));
    }

    #[test]
    fn test_ban_expires_without_cleanup() {
        let bl = blacklist();
        let now = t0();
        for _ in 0..3 {
            bl.record_violation("XYZ", "rejected", now);
        }
        let until = now + Duration::hours(4);
        assert!(bl.is_blacklisted("XYZ", until - Duration::seconds(1)).0);
        assert!(!bl.is_blacklisted("XYZ", until).0);
    }

    #[test]
    fn test_violations_outside_lookback_reset() {
        let bl = blacklist();
        let now = t0();
        bl.record_violation("XYZ", "a", now);
        bl.record_violation("XYZ", "b", now);
        // Third violation arrives after the lookback window
        assert!(bl.record_violation("XYZ", "c", now + Duration::hours(2)).is_none());
        assert!(!bl.is_blacklisted("XYZ", now + Duration::hours(2)).0);
    }

    #[test]
    fn test_spread_out_violations_never_fill_window() {
        let bl = blacklist();
        let now = t0();
        // No 60 minute window holds three of these
        assert!(bl.record_violation("XYZ", "a", now).is_none());
        assert!(bl.record_violation("XYZ", "b", now + Duration::minutes(50)).is_none());
        assert!(bl.record_violation("XYZ", "c", now + Duration::minutes(100)).is_none());
        assert!(!bl.is_blacklisted("XYZ", now + Duration::minutes(100)).0);

        // A fourth inside the window of the last two tips it
        let until = bl
            .record_violation("XYZ", "d", now + Duration::minutes(105))
            .unwrap();
        assert_eq!(until, now + Duration::minutes(105) + Duration::hours(4));
        assert_eq!(bl.snapshot()[0].violation_count, 4);
    }

    #[test]
    fn test_repeat_violation_during_ban_extends_it() {
        let bl = blacklist();
        let now = t0();
        for _ in 0..3 {
            bl.record_violation("XYZ", "rejected", now);
        }
        assert_eq!(bl.snapshot()[0].blacklisted_until, Some(now + Duration::hours(4)));

        let later = now + Duration::hours(1);
        assert_eq!(
            bl.record_violation("XYZ", "rejected again", later),
            Some(later + Duration::hours(4))
        );
        // Even with the window drained, a violation while banned extends
        let much_later = now + Duration::hours(3);
        assert_eq!(
            bl.record_violation("XYZ", "still failing", much_later),
            Some(much_later + Duration::hours(4))
        );
        assert!(bl.is_blacklisted("XYZ", now + Duration::hours(6)).0);
        assert_eq!(bl.snapshot()[0].violation_count, 5);
    }

    #[test]
    fn test_cleanup_releases_entries_and_lookup_counters() {
        let bl = blacklist();
        let now = t0();
        for _ in 0..3 {
            bl.record_violation("XYZ", "rejected", now);
        }
        bl.is_blacklisted("XYZ", now);
        bl.is_blacklisted("XYZ", now);
        assert_eq!(bl.lookup_count("XYZ"), 2);

        assert_eq!(bl.cleanup(now + Duration::hours(1)), 0);
        assert_eq!(bl.lookup_count("XYZ"), 2);

        assert_eq!(bl.cleanup(now + Duration::hours(5)), 1);
        assert!(bl.is_empty());
        assert_eq!(bl.lookup_count("XYZ"), 0);
    }

    #[test]
    fn test_snapshot_restore() {
        let bl = blacklist();
        let now = t0();
        for _ in 0..3 {
            bl.record_violation("XYZ", "rejected", now);
        }
        let snap = bl.snapshot();

        let other = blacklist();
        other.restore(snap).unwrap();
        assert!(other.is_blacklisted("XYZ", now).0);
    }
}
