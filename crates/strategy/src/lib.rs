//! Aegis Strategy Framework
//!
//! Pluggable signal generators and the shared machinery they use:
//! - Rolling bar history per symbol
//! - Volatility regime and trigger detection
//! - Quality score, position multiplier and time-stop derivation
//! - Config-driven registry
//!
//! ## Architecture
//!
//! ```text
//!   MarketSnapshot ──► StrategyContext ──┐
//!                                        ▼
//!   MarketTick ──► SignalGenerator ──► BarHistory ──► TriggerDetector
//!                       │                                   │
//!                       │◄──────────── scoring ◄────────────┘
//!                       ▼
//!                  Vec<Signal>  ──► aggregator (order-manager)
//! ```
//!
//! Generators are synchronous and side-effect free toward each other; the
//! orchestrator fans them out across tasks.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aegis_strategy::{StrategyConfig, StrategyRegistry, VolatilityBreakoutConfig};
//!
//! let config = StrategyConfig::VolatilityBreakout(VolatilityBreakoutConfig {
//!     name: "vol-breakout".into(),
//!     symbols: vec!["AAPL".into()],
//!     ..Default::default()
//! });
//! let generator = StrategyRegistry::build(&config)?;
//! ```

pub mod error;
pub mod history;
pub mod mean_reversion;
pub mod registry;
pub mod scoring;
pub mod straddle;
pub mod strategy;
pub mod volatility;
pub mod volatility_breakout;

// Re-export main types
pub use error::{Result, StrategyError};
pub use history::{Bar, BarHistory};
pub use mean_reversion::{MeanReversion, MeanReversionConfig};
pub use registry::{StrategyConfig, StrategyRegistry};
pub use scoring::ScoringConfig;
pub use straddle::{Straddle, StraddleConfig, StraddleLegs};
pub use strategy::{SignalGenerator, StrategyContext};
pub use volatility::{RegimeThresholds, TriggerConfig, TriggerDetector, VolatilityRegime};
pub use volatility_breakout::{VolatilityBreakout, VolatilityBreakoutConfig};
