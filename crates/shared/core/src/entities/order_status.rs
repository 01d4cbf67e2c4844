use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `Pending -> Submitted -> {Filled | PartiallyFilled -> Filled | Rejected | Cancelled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created and persisted, not yet acknowledged by the broker
    Pending,
    /// Acknowledged by the broker
    Submitted,
    /// Some quantity filled
    PartiallyFilled,
    /// Completely filled
    Filled,
    /// Refused by the broker or abandoned after retries
    Rejected,
    /// Cancelled before completion
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Returns true if the order is still live at the broker (or about to be)
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Submitted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Submitted, PartiallyFilled)
                | (Submitted, Filled)
                | (Submitted, Rejected)
                | (Submitted, Cancelled)
                | (PartiallyFilled, PartiallyFilled)
                | (PartiallyFilled, Filled)
                | (PartiallyFilled, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Submitted => "SUBMITTED",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Filled => "FILLED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }
}
