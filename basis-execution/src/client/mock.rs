//! Scripted execution client for tests.
//!
//! Status polls replay a configured script and then repeat the final entry,
//! so a script ending in `Dead` always terminates a fill-or-kill loop.

use crate::{client::ExecutionClient, error::ExecutionError};
use async_trait::async_trait;
use basis_instrument::{OrderState, OrderStatus, OrderType, Side};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
struct Inner {
    next_id: i64,
    /// Transport errors to return from `send_order` before succeeding.
    send_errors: u32,
    /// `Ok(0)` replies to return from `send_order` before succeeding.
    zero_id_replies: u32,
    statuses: VecDeque<OrderStatus>,
    last_status: OrderStatus,
    send_count: u32,
    cancel_count: u32,
    poll_count: u32,
    sent_orders: Vec<(Side, OrderType, f64, f64)>,
}

/// A scripted [`ExecutionClient`].
#[derive(Debug)]
pub struct MockExecution {
    inner: Mutex<Inner>,
}

impl Default for MockExecution {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecution {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                send_errors: 0,
                zero_id_replies: 0,
                statuses: VecDeque::new(),
                last_status: OrderStatus::new(OrderState::Dead, 0.0),
                send_count: 0,
                cancel_count: 0,
                poll_count: 0,
                sent_orders: Vec::new(),
            }),
        }
    }

    /// Script the sequence of status-poll replies.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.statuses = statuses.into_iter().collect();
            let last = inner.statuses.back().copied();
            if let Some(last) = last {
                inner.last_status = last;
            }
        }
        self
    }

    /// Fail the first `n` sends with a transport error.
    pub fn with_send_errors(self, n: u32) -> Self {
        self.inner.lock().unwrap().send_errors = n;
        self
    }

    /// Answer the first `n` sends with order id zero.
    pub fn with_zero_id_replies(self, n: u32) -> Self {
        self.inner.lock().unwrap().zero_id_replies = n;
        self
    }

    pub fn send_count(&self) -> u32 {
        self.inner.lock().unwrap().send_count
    }

    pub fn cancel_count(&self) -> u32 {
        self.inner.lock().unwrap().cancel_count
    }

    pub fn poll_count(&self) -> u32 {
        self.inner.lock().unwrap().poll_count
    }

    /// Orders that reached the venue, in send order.
    pub fn sent_orders(&self) -> Vec<(Side, OrderType, f64, f64)> {
        self.inner.lock().unwrap().sent_orders.clone()
    }
}

#[async_trait]
impl ExecutionClient for MockExecution {
    async fn send_order(
        &self,
        action: Side,
        order_type: OrderType,
        amount: f64,
        price: f64,
    ) -> Result<i64, ExecutionError> {
        let mut inner = self.inner.lock().unwrap();
        inner.send_count += 1;
        if inner.send_errors > 0 {
            inner.send_errors -= 1;
            return Err(ExecutionError::Transport("scripted send failure".into()));
        }
        if inner.zero_id_replies > 0 {
            inner.zero_id_replies -= 1;
            return Ok(0);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.sent_orders.push((action, order_type, amount, price));
        Ok(id)
    }

    async fn cancel_order(&self, _id: i64) -> Result<bool, ExecutionError> {
        let mut inner = self.inner.lock().unwrap();
        inner.cancel_count += 1;
        Ok(true)
    }

    async fn order_status(&self, _id: i64) -> Result<OrderStatus, ExecutionError> {
        let mut inner = self.inner.lock().unwrap();
        inner.poll_count += 1;
        let status = inner.statuses.pop_front().unwrap_or(inner.last_status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_replays_then_repeats_final_status() {
        let mock = MockExecution::new().with_statuses([
            OrderStatus::new(OrderState::Live, 0.0),
            OrderStatus::new(OrderState::Dead, 1.0),
        ]);

        assert_eq!(mock.order_status(1).await.unwrap().state, OrderState::Live);
        assert_eq!(mock.order_status(1).await.unwrap().state, OrderState::Dead);
        // Script exhausted: final entry repeats
        let again = mock.order_status(1).await.unwrap();
        assert_eq!(again.state, OrderState::Dead);
        assert_eq!(again.filled_amount, 1.0);
    }

    #[tokio::test]
    async fn test_send_failures_then_success() {
        let mock = MockExecution::new().with_send_errors(1).with_zero_id_replies(1);

        assert!(mock
            .send_order(Side::Buy, OrderType::Limit, 1.0, 2.0)
            .await
            .is_err());
        assert_eq!(
            mock.send_order(Side::Buy, OrderType::Limit, 1.0, 2.0)
                .await
                .unwrap(),
            0
        );
        assert!(
            mock.send_order(Side::Buy, OrderType::Limit, 1.0, 2.0)
                .await
                .unwrap()
                > 0
        );
        assert_eq!(mock.send_count(), 3);
    }
}
