//! Order vocabulary shared by the execution clients and the strategy.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[display("buy")]
    Buy,
    #[display("sell")]
    Sell,
}

impl Side {
    /// Wire tag used by the venue APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Order type accepted by the venue adapters.
///
/// The strategy only ever sends `Limit`; `Market` is part of the adapter
/// contract for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
}

/// The ternary order state seen by the fill-or-kill executor.
///
/// Venues report richer lifecycles (submitted, partially filled, pending
/// cancel, …); the clients collapse them to this set. `Unknown` covers
/// transient intermediate states and must trigger a re-poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Live,
    Dead,
    Unknown,
}

/// Status report returned by `ExecutionClient::order_status`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderStatus {
    pub state: OrderState,
    /// Filled quantity, non-negative for both buys and sells.
    pub filled_amount: f64,
}

impl OrderStatus {
    pub fn new(state: OrderState, filled_amount: f64) -> Self {
        Self {
            state,
            filled_amount: filled_amount.abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_wire_tags() {
        assert_eq!(Side::Buy.as_str(), "buy");
        assert_eq!(Side::Sell.as_str(), "sell");
    }

    #[test]
    fn test_status_filled_amount_is_absolute() {
        let status = OrderStatus::new(OrderState::Dead, -2.5);
        assert_eq!(status.filled_amount, 2.5);
    }
}
