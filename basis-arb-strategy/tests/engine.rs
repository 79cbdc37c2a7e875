//! End-to-end scenarios over the hub + strategy pipeline with mock venues.
//!
//! Two venues, same currency, zero fees:
//! - "alpha" starts quoting 1.95 / 2.00, "beta" 2.05 / 2.10, so buying alpha
//!   against beta's bid captures a 0.05 spread;
//! - positions are capped at 50, so one max-order trade saturates both books;
//! - flipping the quotes afterwards unwinds the inventory back to flat.

use basis_arb_strategy::{
    config::OrderLimits,
    hub::Hub,
    strategy::{Strategy, StrategyParams},
};
use basis_data::shutdown;
use basis_execution::client::mock::MockExecution;
use basis_execution::VenueHandle;
use basis_instrument::{Book, BookLevel, Currency, OrderState, OrderStatus, VenueId, VenueSpec};
use smol_str::SmolStr;
use std::sync::Arc;
use tokio::sync::mpsc;

const TOL: f64 = 1e-6;

fn venue(id: &str, mock: Arc<MockExecution>) -> Arc<VenueHandle> {
    Arc::new(VenueHandle::new(
        VenueSpec {
            id: VenueId::from(id),
            name: SmolStr::new(id),
            symbol: SmolStr::new("ltc"),
            currency: Currency::from("usd"),
            priority: 1,
            fee: 0.0,
            max_position: 50.0,
            avail_funds: 0.0,
            avail_short: 0.0,
            has_crypto_fee: false,
        },
        mock,
    ))
}

fn params() -> StrategyParams {
    StrategyParams {
        max_arb: 0.02,
        min_arb: -0.01,
        fx_premium: 0.0,
        min_net_pos: 0.1,
        min_order: 25.0,
        max_order: 50.0,
        print_on: false,
    }
}

fn limits() -> OrderLimits {
    OrderLimits {
        min_order: 25.0,
        max_order: 50.0,
    }
}

fn book(id: &str, bid: f64, ask: f64) -> Book {
    Book::new(
        VenueId::from(id),
        vec![BookLevel::new(bid, 50.0)],
        vec![BookLevel::new(ask, 50.0)],
    )
}

fn filled(amount: f64) -> OrderStatus {
    OrderStatus::new(OrderState::Dead, amount)
}

struct Fixture {
    alpha: Arc<VenueHandle>,
    beta: Arc<VenueHandle>,
    alpha_mock: Arc<MockExecution>,
    beta_mock: Arc<MockExecution>,
    hub: Hub,
    strategy: Strategy,
}

fn fixture() -> Fixture {
    let alpha_mock = Arc::new(MockExecution::new().with_statuses([filled(50.0)]));
    let beta_mock = Arc::new(MockExecution::new().with_statuses([filled(50.0)]));
    let alpha = venue("alpha", alpha_mock.clone());
    let beta = venue("beta", beta_mock.clone());

    let hub = Hub::new(
        [alpha.spec().clone(), beta.spec().clone()],
        limits(),
    );
    let strategy = Strategy::new(vec![alpha.clone(), beta.clone()], params(), 0.0);

    Fixture {
        alpha,
        beta,
        alpha_mock,
        beta_mock,
        hub,
        strategy,
    }
}

#[tokio::test]
async fn test_s1_pair_trade_captures_spread() {
    let mut f = fixture();

    f.hub.on_book(book("alpha", 1.95, 2.00));
    f.hub.on_book(book("beta", 2.05, 2.10));
    f.strategy.on_snapshot(&f.hub.snapshot()).await;

    assert!((f.strategy.net_state().pl - 2.50).abs() < TOL, "P&L = 0.05 * 50");
    assert!((f.alpha.position() - 50.0).abs() < TOL);
    assert!((f.beta.position() + 50.0).abs() < TOL);
    assert!((f.strategy.net_state().net_position).abs() < TOL);
    assert_eq!(f.alpha_mock.send_count(), 1, "one buy on alpha");
    assert_eq!(f.beta_mock.send_count(), 1, "one sell on beta");
}

#[tokio::test]
async fn test_s2_hedged_inventory_stays_quiet() {
    let mut f = fixture();

    f.hub.on_book(book("alpha", 1.95, 2.00));
    f.hub.on_book(book("beta", 2.05, 2.10));
    f.strategy.on_snapshot(&f.hub.snapshot()).await;

    // Same market again: the net position is zero (internally hedged), so no
    // exit fires, and both venues are saturated, so no new entry exists.
    f.strategy.on_snapshot(&f.hub.snapshot()).await;

    assert_eq!(f.alpha_mock.send_count(), 1, "no exit, no second entry");
    assert_eq!(f.beta_mock.send_count(), 1);
    assert!((f.strategy.net_state().pl - 2.50).abs() < TOL);
}

#[tokio::test]
async fn test_s3_flipped_quotes_unwind_to_flat() {
    let mut f = fixture();

    f.hub.on_book(book("alpha", 1.95, 2.00));
    f.hub.on_book(book("beta", 2.05, 2.10));
    f.strategy.on_snapshot(&f.hub.snapshot()).await;

    // Quotes flip: alpha now bids 2.05, beta asks 2.00. With alpha long and
    // beta short, the needed arb collapses to min_arb and the unwind fires.
    f.hub.on_book(book("alpha", 2.05, 2.10));
    f.hub.on_book(book("beta", 1.95, 2.00));
    f.strategy.on_snapshot(&f.hub.snapshot()).await;

    assert!((f.alpha.position()).abs() < TOL, "alpha unwound");
    assert!((f.beta.position()).abs() < TOL, "beta unwound");
    assert!(
        (f.strategy.net_state().pl - 5.00).abs() < TOL,
        "0.05 captured on entry and again on exit"
    );
    assert_eq!(f.alpha_mock.send_count(), 2, "buy then sell on alpha");
    assert_eq!(f.beta_mock.send_count(), 2, "sell then buy on beta");
}

#[tokio::test]
async fn test_channel_pipeline_end_to_end() {
    let alpha_mock = Arc::new(MockExecution::new().with_statuses([filled(50.0)]));
    let beta_mock = Arc::new(MockExecution::new().with_statuses([filled(50.0)]));
    let alpha = venue("alpha", alpha_mock.clone());
    let beta = venue("beta", beta_mock.clone());

    let hub = Hub::new([alpha.spec().clone(), beta.spec().clone()], limits());
    let strategy = Strategy::new(vec![alpha.clone(), beta.clone()], params(), 0.0);

    let (book_tx, book_rx) = mpsc::channel(16);
    let (_fx_tx, fx_rx) = mpsc::channel::<basis_data::FxQuote>(4);
    let (_query_tx, query_rx) = mpsc::channel(4);
    let (snapshot_tx, snapshot_rx) = mpsc::channel(1);
    let (handle, shutdown) = shutdown::channel();

    let hub_task = tokio::spawn(hub.run(book_rx, fx_rx, query_rx, snapshot_tx, shutdown));
    let strategy_task = tokio::spawn(strategy.run(snapshot_rx));

    book_tx.send(book("alpha", 1.95, 2.00)).await.unwrap();
    // Let the strategy drain the one-venue snapshot so the two-venue one is
    // not dropped by the busy gate.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    book_tx.send(book("beta", 2.05, 2.10)).await.unwrap();

    // Give the pipeline a moment to trade, then shut down.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    handle.shutdown();
    hub_task.await.unwrap();
    let final_state = strategy_task.await.unwrap();

    assert!((final_state.pl - 2.50).abs() < TOL);
    assert!((alpha.position() - 50.0).abs() < TOL);
    assert!((beta.position() + 50.0).abs() < TOL);
}
