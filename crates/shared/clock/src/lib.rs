//! Aegis Clock Infrastructure
//!
//! ## Usage
//!
//! ```ignore
//! use aegis_clock::{Clock, ManualClock, SystemClock};
//! use chrono::Duration;
//!
//! // Production
//! let clock = SystemClock::new();
//!
//! // Tests: frozen until moved
//! let clock = ManualClock::new(start);
//! clock.advance(Duration::minutes(5));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use aegis_ports::Clock;
