mod order;
mod order_status;
mod position;
mod reject;
mod side;
mod signal;
mod trigger;

pub use order::{ExitPlan, Order, OrderId, OrderIntent};
pub use order_status::OrderStatus;
pub use position::{FillEffect, Position};
pub use reject::RejectReason;
pub use side::Side;
pub use signal::{LegLink, MAX_QUALITY_SCORE, Signal, SignalMetadata};
pub use trigger::{TriggerType, VolatilityTrigger};
