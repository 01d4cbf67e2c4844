//! Bootstrap - builds the pipeline from configuration
//!
//! Adapters are injected, so tests hand in fakes and the binary hands in
//! the paper set. Building never touches the store; `Orchestrator::start`
//! does the restore.

use std::sync::Arc;

use aegis_clock::SystemClock;
use aegis_gateway::{
    BrokerGateway, MarketDataFeed, PaperBroker, RandomWalkFeed, SessionProvider,
    StaticSessionProvider,
};
use aegis_order_manager::OrderManager;
use aegis_ports::{Clock, StateStore};
use aegis_risk_manager::RiskManager;
use aegis_store::{MemoryStore, RedisStore};
use aegis_strategy::{SignalGenerator, StrategyRegistry};
use log::info;
use rust_decimal_macros::dec;

use crate::config::{PipelineConfig, StoreConfig};
use crate::error::Result;
use crate::orchestrator::{Components, Orchestrator};

/// External collaborators of the pipeline
pub struct Adapters {
    pub clock: Arc<dyn Clock>,
    pub feed: Arc<dyn MarketDataFeed>,
    pub broker: Arc<dyn BrokerGateway>,
    pub sessions: Arc<dyn SessionProvider>,
    pub store: Arc<dyn StateStore>,
}

impl Adapters {
    /// Paper broker, random-walk feed and static session on the wall clock
    pub async fn paper(config: &PipelineConfig) -> Result<Self> {
        let store: Arc<dyn StateStore> = match &config.store {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::Redis { url } => Arc::new(RedisStore::connect(url).await?),
        };

        // Symbols without a configured start price begin at 100
        let mut feed = config.paper.feed.clone();
        for symbol in config.symbols() {
            feed.initial_prices.entry(symbol).or_insert(dec!(100));
        }

        info!(
            "[BOOTSTRAP] Paper adapters: {} symbols, store {}",
            feed.initial_prices.len(),
            store.name()
        );
        Ok(Self {
            clock: Arc::new(SystemClock::new()),
            feed: Arc::new(RandomWalkFeed::new(feed)),
            broker: Arc::new(PaperBroker::new(config.paper.broker.clone())),
            sessions: Arc::new(StaticSessionProvider::new(config.paper.session_token.clone())),
            store,
        })
    }
}

/// Wires config and adapters into an orchestrator
pub struct PipelineBootstrap;

impl PipelineBootstrap {
    /// Validate, build the configured generators and wire everything
    pub fn build(config: &PipelineConfig, adapters: Adapters) -> Result<Orchestrator> {
        config.validate()?;
        let generators = StrategyRegistry::build_all(&config.strategies)?;
        Self::assemble(config, adapters, generators)
    }

    /// Wire already-built generators; `config.strategies` is not consulted
    pub fn assemble(
        config: &PipelineConfig,
        adapters: Adapters,
        generators: Vec<Box<dyn SignalGenerator>>,
    ) -> Result<Orchestrator> {
        let risk = Arc::new(
            RiskManager::new(
                config.risk.clone(),
                config.initial_capital,
                adapters.clock.clone(),
            )?
            .with_store(adapters.store.clone()),
        );
        let orders = Arc::new(OrderManager::new(
            config.orders.clone(),
            adapters.broker.clone(),
            adapters.sessions.clone(),
            adapters.store.clone(),
            risk.clone(),
            adapters.clock.clone(),
            config.session.clone(),
            config.initial_capital,
        ));

        info!(
            "[BOOTSTRAP] {} strategies, capital {}, broker {}",
            generators.len(),
            config.initial_capital,
            adapters.broker.name()
        );
        Ok(Orchestrator::new(
            config,
            Components {
                clock: adapters.clock,
                feed: adapters.feed,
                sessions: adapters.sessions,
                risk,
                orders,
                generators,
            },
        ))
    }
}
