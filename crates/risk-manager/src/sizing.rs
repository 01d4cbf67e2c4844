//! Volatility-adjusted position sizing

use rust_decimal::Decimal;

use crate::parameters::SizingConfig;

/// Scales position size down as volatility rises.
///
/// The factor `ref / (ref + vol)` is 1 at zero volatility, 1/2 at the
/// reference volatility, and strictly decreasing in between and beyond.
pub struct VolatilitySizer {
    config: SizingConfig,
}

impl VolatilitySizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    pub fn volatility_factor(&self, volatility: Option<Decimal>) -> Decimal {
        let vol = volatility
            .unwrap_or(self.config.default_volatility)
            .max(Decimal::ZERO);
        let reference = self.config.reference_volatility;
        if reference <= Decimal::ZERO {
            return Decimal::ONE;
        }
        reference / (reference + vol)
    }

    /// Largest single position value allowed against total capital
    pub fn ceiling(&self, total_capital: Decimal) -> Decimal {
        (total_capital * self.config.position_size_limit).max(Decimal::ZERO)
    }

    /// Whole number of `quantity_step` units affordable at `price`
    pub fn quantity_for(&self, value: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO || value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let step = self.config.quantity_step;
        ((value / price) / step).floor() * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizer() -> VolatilitySizer {
        VolatilitySizer::new(SizingConfig {
            position_size_limit: dec!(0.5),
            ..Default::default()
        })
    }

    #[test]
    fn test_factor_strictly_falls_with_volatility() {
        let sizer = sizer();
        let mut last = Decimal::MAX;
        for vol in [dec!(0), dec!(0.005), dec!(0.01), dec!(0.02), dec!(0.05), dec!(0.2)] {
            let factor = sizer.volatility_factor(Some(vol));
            assert!(factor < last, "factor must strictly fall as vol rises");
            last = factor;
        }
    }

    #[test]
    fn test_missing_volatility_uses_default() {
        let sizer = sizer();
        let default = sizer.config().default_volatility;
        assert_eq!(sizer.volatility_factor(None), sizer.volatility_factor(Some(default)));
        assert_eq!(sizer.volatility_factor(Some(dec!(-1))), Decimal::ONE);
    }

    #[test]
    fn test_factor_half_at_reference() {
        let sizer = sizer();
        assert_eq!(sizer.volatility_factor(Some(dec!(0.02))), dec!(0.5));
        assert_eq!(sizer.volatility_factor(Some(dec!(0))), Decimal::ONE);
    }

    #[test]
    fn test_ceiling_from_position_limit() {
        let sizer = VolatilitySizer::new(SizingConfig::default());
        assert_eq!(sizer.ceiling(dec!(1_000_000)), dec!(100_000));
        assert_eq!(sizer.ceiling(dec!(-5)), Decimal::ZERO);
    }

    #[test]
    fn test_quantity_rounds_down_to_step() {
        let sizer = sizer();
        assert_eq!(sizer.quantity_for(dec!(1000), dec!(300)), dec!(3));
        assert_eq!(sizer.quantity_for(dec!(100), dec!(300)), dec!(0));
        assert_eq!(sizer.quantity_for(dec!(100), dec!(0)), dec!(0));
    }
}
