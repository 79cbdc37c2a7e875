//! The execution client contract and its per-venue implementations.

pub mod bitfinex;
pub mod mock;
pub mod okcoin;

use crate::error::ExecutionError;
use async_trait::async_trait;
use basis_instrument::{OrderStatus, OrderType, Side};

/// Authenticated request/response surface of a venue.
///
/// Implementations own their wire formats and signing schemes; payloads are
/// deserialized into closed local types at this boundary and never leak
/// upward.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Place an order. Returns the venue-assigned order id (positive), or an
    /// error when the venue rejects. An id of zero is treated by callers as a
    /// retriable failure.
    async fn send_order(
        &self,
        action: Side,
        order_type: OrderType,
        amount: f64,
        price: f64,
    ) -> Result<i64, ExecutionError>;

    /// Cancel an order. `true` means the venue acknowledged the cancel. A
    /// cancel of an already-dead order is not distinguished here; the next
    /// status poll reveals the true outcome.
    async fn cancel_order(&self, id: i64) -> Result<bool, ExecutionError>;

    /// Poll an order's state. `Unknown` is transient and must trigger a
    /// re-poll by the caller.
    async fn order_status(&self, id: i64) -> Result<OrderStatus, ExecutionError>;
}
