//! Drawdown tracking
//!
//! Tracks peak portfolio value and the fractional decline from it.
//! Past the warning threshold sizes shrink linearly; at the hard stop
//! new entries are refused until the portfolio recovers.

use std::sync::Mutex;

use log::{error, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parameters::DrawdownConfig;

/// Persisted drawdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawdownState {
    pub peak_value: Decimal,
    pub current_value: Decimal,
    pub current_drawdown: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawdownLevel {
    Normal,
    Warning,
    HardStop,
}

impl DrawdownLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawdownLevel::Normal => "normal",
            DrawdownLevel::Warning => "warning",
            DrawdownLevel::HardStop => "hard_stop",
        }
    }
}

/// Point-in-time view returned by every update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawdownStatus {
    pub state: DrawdownState,
    pub level: DrawdownLevel,
    pub size_multiplier: Decimal,
}

pub struct DrawdownTracker {
    config: DrawdownConfig,
    state: Mutex<DrawdownState>,
}

impl DrawdownTracker {
    pub fn init(initial_capital: Decimal, config: DrawdownConfig) -> Self {
        Self {
            config,
            state: Mutex::new(DrawdownState {
                peak_value: initial_capital,
                current_value: initial_capital,
                current_drawdown: Decimal::ZERO,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DrawdownState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a new portfolio value; the peak only ever rises
    pub fn update_portfolio_value(&self, value: Decimal) -> DrawdownStatus {
        let mut state = self.lock();
        let before = self.level_for(state.current_drawdown);

        if value > state.peak_value {
            state.peak_value = value;
        }
        state.current_value = value;
        state.current_drawdown = drawdown_of(state.peak_value, value);

        let after = self.level_for(state.current_drawdown);
        if before != after {
            match after {
                DrawdownLevel::HardStop => error!(
                    "[DRAWDOWN] Hard stop: drawdown {} >= {} (peak {}, now {})",
                    state.current_drawdown.round_dp(4),
                    self.config.hard_stop_threshold,
                    state.peak_value,
                    value
                ),
                DrawdownLevel::Warning => warn!(
                    "[DRAWDOWN] Warning: drawdown {} (peak {}, now {})",
                    state.current_drawdown.round_dp(4),
                    state.peak_value,
                    value
                ),
                DrawdownLevel::Normal => info!(
                    "[DRAWDOWN] Recovered: drawdown {}",
                    state.current_drawdown.round_dp(4)
                ),
            }
        }

        self.status_of(*state)
    }

    pub fn status(&self) -> DrawdownStatus {
        self.status_of(*self.lock())
    }

    pub fn is_halted(&self) -> bool {
        self.level_for(self.lock().current_drawdown) == DrawdownLevel::HardStop
    }

    pub fn current_drawdown(&self) -> Decimal {
        self.lock().current_drawdown
    }

    pub fn current_value(&self) -> Decimal {
        self.lock().current_value
    }

    pub fn size_multiplier(&self) -> Decimal {
        self.multiplier_for(self.lock().current_drawdown)
    }

    /// Drawdown as a fraction of the hard stop, in [0, 1]
    pub fn portfolio_stress(&self) -> Decimal {
        let dd = self.lock().current_drawdown;
        if self.config.hard_stop_threshold <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (dd / self.config.hard_stop_threshold).clamp(Decimal::ZERO, Decimal::ONE)
    }

    pub fn snapshot(&self) -> DrawdownState {
        *self.lock()
    }

    /// Replace state with a persisted snapshot; drawdown is recomputed
    pub fn restore(&self, snapshot: DrawdownState) -> Result<()> {
        if snapshot.peak_value <= Decimal::ZERO {
            return Err(Error::corrupted(
                "drawdown",
                format!("peak value {} must be positive", snapshot.peak_value),
            ));
        }
        if snapshot.current_value < Decimal::ZERO || snapshot.current_value > snapshot.peak_value {
            return Err(Error::corrupted(
                "drawdown",
                format!(
                    "current value {} outside [0, peak {}]",
                    snapshot.current_value, snapshot.peak_value
                ),
            ));
        }

        let mut state = self.lock();
        *state = DrawdownState {
            current_drawdown: drawdown_of(snapshot.peak_value, snapshot.current_value),
            ..snapshot
        };
        info!(
            "[DRAWDOWN] Restored: peak {}, current {}, drawdown {}",
            state.peak_value,
            state.current_value,
            state.current_drawdown.round_dp(4)
        );
        Ok(())
    }

    fn level_for(&self, drawdown: Decimal) -> DrawdownLevel {
        if drawdown >= self.config.hard_stop_threshold {
            DrawdownLevel::HardStop
        } else if drawdown >= self.config.warning_threshold {
            DrawdownLevel::Warning
        } else {
            DrawdownLevel::Normal
        }
    }

    fn multiplier_for(&self, drawdown: Decimal) -> Decimal {
        match self.level_for(drawdown) {
            DrawdownLevel::Normal => Decimal::ONE,
            DrawdownLevel::HardStop => Decimal::ZERO,
            DrawdownLevel::Warning => {
                // Linear reduction from 1.0 at warning to 0.0 at the hard stop
                let range = self.config.hard_stop_threshold - self.config.warning_threshold;
                if range <= Decimal::ZERO {
                    return Decimal::ONE;
                }
                let excess = (drawdown - self.config.warning_threshold).max(Decimal::ZERO);
                (Decimal::ONE - excess / range).max(Decimal::ZERO)
            }
        }
    }

    fn status_of(&self, state: DrawdownState) -> DrawdownStatus {
        DrawdownStatus {
            state,
            level: self.level_for(state.current_drawdown),
            size_multiplier: self.multiplier_for(state.current_drawdown),
        }
    }
}

fn drawdown_of(peak: Decimal, value: Decimal) -> Decimal {
    if peak <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (Decimal::ONE - value / peak).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tracker() -> DrawdownTracker {
        DrawdownTracker::init(dec!(1_000_000), DrawdownConfig::default())
    }

    #[test]
    fn test_drawdown_sequence() {
        let _ = env_logger::try_init();
        let dd = tracker();

        let s = dd.update_portfolio_value(dec!(1_050_000));
        assert_eq!(s.state.peak_value, dec!(1_050_000));
        assert_eq!(s.state.current_drawdown, Decimal::ZERO);

        let s = dd.update_portfolio_value(dec!(980_000));
        assert_eq!(s.state.peak_value, dec!(1_050_000));
        assert_eq!(s.state.current_drawdown.round_dp(4), dec!(0.0667));
        assert_eq!(s.level, DrawdownLevel::Warning);
        assert!(!dd.is_halted());

        let s = dd.update_portfolio_value(dec!(950_000));
        assert_eq!(s.state.current_drawdown.round_dp(4), dec!(0.0952));
        assert!(!dd.is_halted());

        let s = dd.update_portfolio_value(dec!(900_000));
        assert_eq!(s.state.current_drawdown.round_dp(4), dec!(0.1429));
        assert_eq!(s.level, DrawdownLevel::HardStop);
        assert!(dd.is_halted());
        assert_eq!(s.size_multiplier, Decimal::ZERO);
    }

    #[test]
    fn test_peak_is_monotonic_and_drawdown_bounded() {
        let dd = tracker();
        let mut last_peak = Decimal::ZERO;
        for v in [dec!(900_000), dec!(1_200_000), dec!(0), dec!(1_100_000), dec!(1_300_000)] {
            let s = dd.update_portfolio_value(v);
            assert!(s.state.peak_value >= last_peak);
            assert!(s.state.current_drawdown >= Decimal::ZERO);
            assert!(s.state.current_drawdown <= Decimal::ONE);
            last_peak = s.state.peak_value;
        }
        assert_eq!(last_peak, dec!(1_300_000));
    }

    #[test]
    fn test_recovery_clears_halt() {
        let dd = tracker();
        dd.update_portfolio_value(dec!(850_000));
        assert!(dd.is_halted());

        dd.update_portfolio_value(dec!(990_000));
        assert!(!dd.is_halted());
        assert_eq!(dd.size_multiplier(), Decimal::ONE);
    }

    #[test]
    fn test_size_multiplier_linear_between_thresholds() {
        let dd = tracker();
        // 7.5% drawdown is halfway between 5% and 10%
        dd.update_portfolio_value(dec!(925_000));
        assert_eq!(dd.size_multiplier(), dec!(0.5));
        assert_eq!(dd.portfolio_stress(), dec!(0.75));
    }

    #[test]
    fn test_restore_recomputes_and_validates() {
        let dd = tracker();
        dd.restore(DrawdownState {
            peak_value: dec!(2_000_000),
            current_value: dec!(1_800_000),
            current_drawdown: dec!(0.99),
        })
        .unwrap();
        assert_eq!(dd.current_drawdown(), dec!(0.1));
        assert!(dd.is_halted());

        let err = dd
            .restore(DrawdownState {
                peak_value: dec!(-1),
                current_value: dec!(0),
                current_drawdown: dec!(0),
            })
            .unwrap_err();
        assert!(err.is_fatal());
        // Failed restore leaves the previous state in place
        assert_eq!(dd.snapshot().peak_value, dec!(2_000_000));
    }
}
