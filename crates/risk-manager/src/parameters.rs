//! Risk configuration
//!
//! One config struct per engine, all with conservative defaults.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Drawdown thresholds (fractions of peak value)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawdownConfig {
    /// Sizes start shrinking past this drawdown
    pub warning_threshold: Decimal,
    /// New signals are rejected at or past this drawdown
    pub hard_stop_threshold: Decimal,
}

impl Default for DrawdownConfig {
    fn default() -> Self {
        Self {
            warning_threshold: dec!(0.05),
            hard_stop_threshold: dec!(0.10),
        }
    }
}

/// Volatility sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Volatility at which the size factor is one half
    pub reference_volatility: Decimal,
    /// Assumed when a signal carries no volatility estimate
    pub default_volatility: Decimal,
    /// Hard ceiling on one position as a fraction of total capital
    pub position_size_limit: Decimal,
    /// Quantities are rounded down to a multiple of this
    pub quantity_step: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            reference_volatility: dec!(0.02),
            default_volatility: dec!(0.01),
            position_size_limit: dec!(0.10),
            quantity_step: Decimal::ONE,
        }
    }
}

/// Symbol blacklist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Violations within the lookback that trigger a ban
    pub violation_threshold: u32,
    pub lookback_secs: i64,
    pub ban_duration_secs: i64,
    pub cleanup_interval_secs: u64,
    /// Loss on one symbol, as a fraction of total capital, that counts as
    /// a violation each time it is crossed; zero disables
    pub symbol_loss_limit: Decimal,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            violation_threshold: 3,
            lookback_secs: 3_600,
            ban_duration_secs: 4 * 3_600,
            cleanup_interval_secs: 60,
            symbol_loss_limit: dec!(0.01),
        }
    }
}

/// One strategy's partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAllocationConfig {
    pub name: String,
    /// Share of total capital
    pub fraction: Decimal,
    /// Share of the strategy's available capital per position
    #[serde(default = "default_base_size")]
    pub base_size_fraction: Decimal,
    /// Safety cap per position, fraction of available capital
    #[serde(default = "default_max_position")]
    pub max_position_fraction: Decimal,
}

fn default_base_size() -> Decimal {
    dec!(0.25)
}

fn default_max_position() -> Decimal {
    dec!(0.5)
}

/// Capital allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    pub strategies: Vec<StrategyAllocationConfig>,
    /// Position values at or below this are not worth trading
    pub min_tradable_value: Decimal,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
            min_tradable_value: dec!(1000),
        }
    }
}

impl AllocatorConfig {
    pub fn validate(&self) -> Result<()> {
        let mut total = Decimal::ZERO;
        let mut names = std::collections::HashSet::new();

        for s in &self.strategies {
            if !names.insert(s.name.as_str()) {
                return Err(Error::Config(format!("duplicate allocation for {}", s.name)));
            }
            for (label, value) in [
                ("fraction", s.fraction),
                ("base_size_fraction", s.base_size_fraction),
                ("max_position_fraction", s.max_position_fraction),
            ] {
                if value <= Decimal::ZERO || value > Decimal::ONE {
                    return Err(Error::Config(format!(
                        "{} {} = {} outside (0, 1]",
                        s.name, label, value
                    )));
                }
            }
            total += s.fraction;
        }

        if total > Decimal::ONE {
            return Err(Error::Config(format!(
                "allocated fractions sum to {} > 1",
                total
            )));
        }
        Ok(())
    }
}

/// Root risk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub drawdown: DrawdownConfig,
    pub sizing: SizingConfig,
    pub blacklist: BlacklistConfig,
    pub allocator: AllocatorConfig,
    /// Max exposure to one symbol as a fraction of portfolio value
    pub max_symbol_concentration: Decimal,
    /// Max sum of per-symbol exposure fractions
    pub max_gross_exposure: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            drawdown: DrawdownConfig::default(),
            sizing: SizingConfig::default(),
            blacklist: BlacklistConfig::default(),
            allocator: AllocatorConfig::default(),
            max_symbol_concentration: dec!(0.25),
            max_gross_exposure: dec!(1.0),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        let dd = &self.drawdown;
        if dd.warning_threshold <= Decimal::ZERO
            || dd.warning_threshold >= dd.hard_stop_threshold
            || dd.hard_stop_threshold > Decimal::ONE
        {
            return Err(Error::Config(format!(
                "drawdown thresholds must satisfy 0 < warning ({}) < hard stop ({}) <= 1",
                dd.warning_threshold, dd.hard_stop_threshold
            )));
        }
        if self.sizing.reference_volatility <= Decimal::ZERO
            || self.sizing.quantity_step <= Decimal::ZERO
            || self.sizing.position_size_limit <= Decimal::ZERO
        {
            return Err(Error::Config("sizing parameters must be positive".into()));
        }
        if self.blacklist.violation_threshold == 0
            || self.blacklist.ban_duration_secs <= 0
            || self.blacklist.symbol_loss_limit < Decimal::ZERO
        {
            return Err(Error::Config(
                "blacklist threshold and ban duration must be positive, loss limit non-negative"
                    .into(),
            ));
        }
        if self.max_symbol_concentration <= Decimal::ZERO || self.max_gross_exposure <= Decimal::ZERO
        {
            return Err(Error::Config("concentration limits must be positive".into()));
        }
        self.allocator.validate()
    }
}
