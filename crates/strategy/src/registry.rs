//! Config-driven strategy registry
//!
//! The set of generators is closed: each `kind` tag maps to one
//! implementation. Unknown kinds fail at config load, not at runtime.

use log::info;
use serde::Deserialize;

use crate::error::{Result, StrategyError};
use crate::mean_reversion::{MeanReversion, MeanReversionConfig};
use crate::straddle::{Straddle, StraddleConfig};
use crate::strategy::SignalGenerator;
use crate::volatility_breakout::{VolatilityBreakout, VolatilityBreakoutConfig};

/// One configured strategy, selected by its `kind` tag
///
/// ```json
/// { "kind": "volatility_breakout", "name": "vol-breakout", "symbols": ["AAPL"] }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    VolatilityBreakout(VolatilityBreakoutConfig),
    MeanReversion(MeanReversionConfig),
    Straddle(StraddleConfig),
}

impl StrategyConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::VolatilityBreakout(c) => &c.name,
            Self::MeanReversion(c) => &c.name,
            Self::Straddle(c) => &c.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::VolatilityBreakout(_) => "volatility_breakout",
            Self::MeanReversion(_) => "mean_reversion",
            Self::Straddle(_) => "straddle",
        }
    }

    /// Every symbol the strategy needs quotes for (legs included)
    pub fn required_symbols(&self) -> Vec<String> {
        match self {
            Self::VolatilityBreakout(c) => c.symbols.clone(),
            Self::MeanReversion(c) => c.symbols.clone(),
            Self::Straddle(c) => c
                .legs
                .iter()
                .flat_map(|l| [l.underlying.clone(), l.call.clone(), l.put.clone()])
                .collect(),
        }
    }
}

pub struct StrategyRegistry;

impl StrategyRegistry {
    pub fn build(config: &StrategyConfig) -> Result<Box<dyn SignalGenerator>> {
        if config.name().is_empty() {
            return Err(StrategyError::InvalidConfig {
                name: config.kind().to_string(),
                reason: "empty name".to_string(),
            });
        }
        if config.required_symbols().is_empty() {
            return Err(StrategyError::InvalidConfig {
                name: config.name().to_string(),
                reason: "no symbols".to_string(),
            });
        }

        let generator: Box<dyn SignalGenerator> = match config {
            StrategyConfig::VolatilityBreakout(c) => Box::new(VolatilityBreakout::new(c.clone())),
            StrategyConfig::MeanReversion(c) => Box::new(MeanReversion::new(c.clone())),
            StrategyConfig::Straddle(c) => Box::new(Straddle::new(c.clone())?),
        };

        info!(
            "[REGISTRY] Built {} '{}' on {:?}",
            config.kind(),
            config.name(),
            generator.symbols()
        );
        Ok(generator)
    }

    /// Build all, rejecting duplicate names
    pub fn build_all(configs: &[StrategyConfig]) -> Result<Vec<Box<dyn SignalGenerator>>> {
        let mut seen = std::collections::HashSet::new();
        let mut generators = Vec::with_capacity(configs.len());

        for config in configs {
            if !seen.insert(config.name().to_string()) {
                return Err(StrategyError::InvalidConfig {
                    name: config.name().to_string(),
                    reason: "duplicate strategy name".to_string(),
                });
            }
            generators.push(Self::build(config)?);
        }
        Ok(generators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_json() {
        let json = r#"[
            { "kind": "volatility_breakout", "name": "vb", "symbols": ["AAPL", "MSFT"] },
            { "kind": "mean_reversion", "name": "mr", "symbols": ["MSFT"], "lookback": 10 },
            { "kind": "straddle", "name": "st",
              "legs": [{ "underlying": "SPY", "call": "SPY-C500", "put": "SPY-P500" }] }
        ]"#;
        let configs: Vec<StrategyConfig> = serde_json::from_str(json).unwrap();
        let generators = StrategyRegistry::build_all(&configs).unwrap();

        assert_eq!(generators.len(), 3);
        assert_eq!(generators[0].name(), "vb");
        assert_eq!(generators[1].symbols(), &["MSFT".to_string()]);
        assert_eq!(generators[2].symbols(), &["SPY".to_string()]);
        assert_eq!(configs[2].required_symbols().len(), 3);
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let json = r#"{ "kind": "martingale", "name": "x" }"#;
        assert!(serde_json::from_str::<StrategyConfig>(json).is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = StrategyConfig::MeanReversion(MeanReversionConfig {
            symbols: vec!["AAPL".into()],
            ..Default::default()
        });
        assert!(StrategyRegistry::build_all(&[config.clone(), config]).is_err());
    }
}
