//! Wire message types
//!
//! What crosses the broker boundary. Domain types stay in aegis-core.

pub mod order;
