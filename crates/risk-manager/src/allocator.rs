//! Per-strategy capital partitions
//!
//! Each strategy owns `fraction × total_capital`. A strategy's exposure
//! only ever consumes its own partition, so one strategy exhausting its
//! capital leaves the others untouched.

use aegis_core::RejectReason;
use dashmap::DashMap;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parameters::AllocatorConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalAllocation {
    pub strategy_name: String,
    pub allocated_fraction: Decimal,
    pub allocated_capital: Decimal,
    pub used_capital: Decimal,
    pub base_size_fraction: Decimal,
    pub max_position_fraction: Decimal,
}

impl CapitalAllocation {
    pub fn available(&self) -> Decimal {
        (self.allocated_capital - self.used_capital).max(Decimal::ZERO)
    }
}

pub struct CapitalAllocator {
    total_capital: Decimal,
    min_tradable_value: Decimal,
    allocations: DashMap<String, CapitalAllocation>,
}

impl CapitalAllocator {
    pub fn init(total_capital: Decimal, config: &AllocatorConfig) -> Result<Self> {
        config.validate()?;
        if total_capital <= Decimal::ZERO {
            return Err(Error::Config(format!(
                "total capital {} must be positive",
                total_capital
            )));
        }

        let allocations = DashMap::new();
        for s in &config.strategies {
            allocations.insert(
                s.name.clone(),
                CapitalAllocation {
                    strategy_name: s.name.clone(),
                    allocated_fraction: s.fraction,
                    allocated_capital: total_capital * s.fraction,
                    used_capital: Decimal::ZERO,
                    base_size_fraction: s.base_size_fraction,
                    max_position_fraction: s.max_position_fraction,
                },
            );
        }

        info!(
            "[ALLOCATOR] {} strategies across {} capital",
            allocations.len(),
            total_capital
        );
        Ok(Self {
            total_capital,
            min_tradable_value: config.min_tradable_value,
            allocations,
        })
    }

    pub fn total_capital(&self) -> Decimal {
        self.total_capital
    }

    pub fn allocation(&self, strategy: &str) -> Option<CapitalAllocation> {
        self.allocations.get(strategy).map(|a| a.clone())
    }

    /// Allocated minus used for one strategy
    pub fn strategy_capital(&self, strategy: &str) -> Decimal {
        self.allocations
            .get(strategy)
            .map(|a| a.available())
            .unwrap_or(Decimal::ZERO)
    }

    /// Value of the next position for `strategy` at `risk_multiplier`
    pub fn position_value(
        &self,
        strategy: &str,
        risk_multiplier: Decimal,
    ) -> std::result::Result<Decimal, RejectReason> {
        let alloc = self
            .allocations
            .get(strategy)
            .ok_or(RejectReason::InsufficientStrategyCapital)?;

        let available = alloc.available();
        if available <= Decimal::ZERO {
            return Err(RejectReason::InsufficientStrategyCapital);
        }

        let sized = available * alloc.base_size_fraction * risk_multiplier.max(Decimal::ZERO);
        let cap = available * alloc.max_position_fraction;
        let value = sized.min(cap);

        if value <= self.min_tradable_value {
            debug!(
                "[ALLOCATOR] {} position value {} at or below minimum {}",
                strategy, value, self.min_tradable_value
            );
            return Err(RejectReason::BelowMinSize);
        }
        Ok(value)
    }

    /// Atomically add `amount` to used capital if it fits
    pub fn reserve(&self, strategy: &str, amount: Decimal) -> std::result::Result<(), RejectReason> {
        let mut alloc = self
            .allocations
            .get_mut(strategy)
            .ok_or(RejectReason::InsufficientStrategyCapital)?;

        if amount < Decimal::ZERO || alloc.used_capital + amount > alloc.allocated_capital {
            return Err(RejectReason::InsufficientStrategyCapital);
        }
        alloc.used_capital += amount;
        debug!(
            "[ALLOCATOR] {} reserved {} (used {}/{})",
            strategy, amount, alloc.used_capital, alloc.allocated_capital
        );
        Ok(())
    }

    /// Return capital; used never drops below zero
    pub fn release(&self, strategy: &str, amount: Decimal) {
        if let Some(mut alloc) = self.allocations.get_mut(strategy) {
            alloc.used_capital = (alloc.used_capital - amount.max(Decimal::ZERO)).max(Decimal::ZERO);
            debug!(
                "[ALLOCATOR] {} released {} (used {}/{})",
                strategy, amount, alloc.used_capital, alloc.allocated_capital
            );
        }
    }

    /// Consume capital beyond a reservation (fill slippage); capped at the allocation
    pub fn charge(&self, strategy: &str, amount: Decimal) {
        if let Some(mut alloc) = self.allocations.get_mut(strategy) {
            let cap = alloc.allocated_capital;
            alloc.used_capital = (alloc.used_capital + amount.max(Decimal::ZERO)).min(cap);
        }
    }

    pub fn snapshot(&self) -> Vec<CapitalAllocation> {
        let mut all: Vec<_> = self.allocations.iter().map(|a| a.value().clone()).collect();
        all.sort_by(|a, b| a.strategy_name.cmp(&b.strategy_name));
        all
    }

    /// Carry persisted used capital into the configured partitions
    pub fn restore(&self, snapshot: Vec<CapitalAllocation>) -> Result<()> {
        let mut fraction_sum = Decimal::ZERO;
        for a in &snapshot {
            fraction_sum += a.allocated_fraction;
            if a.used_capital < Decimal::ZERO || a.used_capital > a.allocated_capital {
                return Err(Error::corrupted(
                    "allocator",
                    format!(
                        "{} used {} outside [0, {}]",
                        a.strategy_name, a.used_capital, a.allocated_capital
                    ),
                ));
            }
        }
        if fraction_sum > Decimal::ONE {
            return Err(Error::corrupted(
                "allocator",
                format!("fractions sum to {}", fraction_sum),
            ));
        }

        // Usage must fit the partitions as configured now, not as saved
        for a in &snapshot {
            if let Some(current) = self.allocations.get(&a.strategy_name)
                && a.used_capital > current.allocated_capital
            {
                return Err(Error::corrupted(
                    "allocator",
                    format!(
                        "{} restored usage {} exceeds configured allocation {}",
                        a.strategy_name, a.used_capital, current.allocated_capital
                    ),
                ));
            }
        }

        for a in snapshot {
            match self.allocations.get_mut(&a.strategy_name) {
                Some(mut current) => current.used_capital = a.used_capital,
                None => warn!(
                    "[ALLOCATOR] Dropping persisted allocation for unconfigured strategy {}",
                    a.strategy_name
                ),
            }
        }
        Ok(())
    }
}
