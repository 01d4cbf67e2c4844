//! Adapters
//!
//! In-process implementations of the gateway ports. Real broker and feed
//! adapters plug in behind the same traits.

pub mod paper;

pub use paper::{
    FillMode, PaperBroker, PaperBrokerConfig, RandomWalkConfig, RandomWalkFeed, ScriptedFailure,
    StaticFeed, StaticSessionProvider,
};
