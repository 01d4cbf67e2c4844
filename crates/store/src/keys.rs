//! Key schema for the shared store

use aegis_core::{OrderId, Side};

/// Documented key layout
///
/// | Key | Value | TTL |
/// |-----|-------|-----|
/// | `executed:{day}:{strategy}:{symbol}:{side}` | order id (or `pending`) | end of trading day |
/// | `risk_state:{component}` | component snapshot JSON | none |
/// | `order:{order_id}` | `Order` JSON | none |
/// | `orders:open` | `KeyIndex` of open order ids | none |
/// | `position:{strategy}:{symbol}` | `Position` JSON | none |
/// | `positions:index` | `KeyIndex` of position keys | none |
pub struct Keys;

impl Keys {
    // Idempotency

    /// `executed:20240304:vol-breakout:AAPL:BUY`
    pub fn executed(day: &str, strategy: &str, symbol: &str, side: Side) -> String {
        format!("executed:{}:{}:{}:{}", day, strategy, symbol, side.as_str())
    }

    // Risk state

    /// `risk_state:drawdown`
    pub fn risk_state(component: &str) -> String {
        format!("risk_state:{}", component)
    }

    pub const DRAWDOWN: &'static str = "drawdown";
    pub const BLACKLIST: &'static str = "blacklist";
    pub const ALLOCATOR: &'static str = "allocator";

    // Orders

    /// `order:{uuid}`
    pub fn order(order_id: &OrderId) -> String {
        format!("order:{}", order_id)
    }

    /// Index of non-terminal orders
    pub const OPEN_ORDERS: &'static str = "orders:open";

    // Positions

    /// `position:vol-breakout:AAPL`
    pub fn position(strategy: &str, symbol: &str) -> String {
        format!("position:{}:{}", strategy, symbol)
    }

    /// Index of position keys
    pub const POSITIONS: &'static str = "positions:index";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            Keys::executed("20240304", "vol-breakout", "AAPL", Side::Buy),
            "executed:20240304:vol-breakout:AAPL:BUY"
        );
        assert_eq!(Keys::risk_state(Keys::DRAWDOWN), "risk_state:drawdown");
        assert_eq!(Keys::position("mr", "MSFT"), "position:mr:MSFT");
    }
}
