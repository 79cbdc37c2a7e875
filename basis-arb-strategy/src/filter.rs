//! Book filter: reduce a raw venue book to one executable bid and one
//! executable ask, adjusted for fee and FX.

use crate::config::OrderLimits;
use basis_instrument::{Book, BookLevel, VenueId};
use std::time::Instant;

/// One executable side of a filtered book.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    pub venue: VenueId,
    /// Worst price walked while accumulating `amount`; used as the limit
    /// price when sending an order.
    pub order_price: f64,
    /// Accumulated quantity, in `[min_order, max_order]`.
    pub amount: f64,
    /// Amount-weighted average of walked prices, fee-adjusted and converted
    /// to base currency.
    pub adj_price: f64,
}

/// The filtered view of one venue's book. A side is absent when no prefix of
/// levels accumulates to `min_order`, or when the book is unusable (error
/// book, stale FX).
#[derive(Debug, Clone)]
pub struct FilteredBook {
    pub bid: Option<Market>,
    pub ask: Option<Market>,
    /// Source book time, checked against the staleness gate.
    pub time: Instant,
}

impl FilteredBook {
    pub fn empty(time: Instant) -> Self {
        Self {
            bid: None,
            ask: None,
            time,
        }
    }
}

/// Filter a book using the venue's fee and the current FX price for its
/// quote currency.
///
/// `fx_price` is `None` when the venue quotes in a non-base currency whose FX
/// is missing, stale or zero; the book is then unusable and both sides come
/// back absent.
pub fn filter_book(book: &Book, fee: f64, fx_price: Option<f64>, limits: OrderLimits) -> FilteredBook {
    let mut filtered = FilteredBook::empty(book.time);
    let Some(fx_price) = fx_price else {
        return filtered;
    };
    if book.is_err() {
        return filtered;
    }

    filtered.bid = walk_side(&book.bids, limits).map(|walk| Market {
        venue: book.venue.clone(),
        order_price: walk.order_price,
        amount: walk.amount,
        adj_price: walk.avg_price * (1.0 - fee) / fx_price,
    });
    filtered.ask = walk_side(&book.asks, limits).map(|walk| Market {
        venue: book.venue.clone(),
        order_price: walk.order_price,
        amount: walk.amount,
        adj_price: walk.avg_price * (1.0 + fee) / fx_price,
    });

    filtered
}

struct Walk {
    order_price: f64,
    amount: f64,
    avg_price: f64,
}

/// Accumulate levels up to `max_order`, stopping at the first level where the
/// walked amount reaches `min_order`.
fn walk_side(levels: &[BookLevel], limits: OrderLimits) -> Option<Walk> {
    let mut amount = 0.0;
    let mut cost = 0.0;
    for level in levels {
        let take = (limits.max_order - amount).min(level.amount);
        cost += level.price * take;
        amount += take;
        if amount >= limits.min_order {
            return Some(Walk {
                order_price: level.price,
                amount,
                avg_price: cost / amount,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn limits(min_order: f64, max_order: f64) -> OrderLimits {
        OrderLimits {
            min_order,
            max_order,
        }
    }

    fn levels(raw: &[(f64, f64)]) -> Vec<BookLevel> {
        raw.iter().map(|&(p, a)| BookLevel::new(p, a)).collect()
    }

    fn test_book() -> Book {
        Book::new(
            VenueId::from("okcoin_usd"),
            levels(&[(1.90, 10.0), (1.80, 10.0), (1.70, 100.0)]),
            levels(&[(2.10, 10.0), (2.20, 20.0), (2.30, 10.0)]),
        )
    }

    #[test]
    fn test_filter_walks_to_max_order_and_weights_prices() {
        let filtered = filter_book(&test_book(), 0.002, Some(1.0), limits(25.0, 50.0));

        let bid = filtered.bid.expect("bid side present");
        assert!((bid.order_price - 1.70).abs() < TOL);
        assert!((bid.amount - 50.0).abs() < TOL);
        let expected = ((1.90 * 10.0 + 1.80 * 10.0 + 1.70 * 30.0) / 50.0) * (1.0 - 0.002);
        assert!((bid.adj_price - expected).abs() < TOL);

        let ask = filtered.ask.expect("ask side present");
        assert!((ask.order_price - 2.20).abs() < TOL);
        assert!((ask.amount - 30.0).abs() < TOL);
        let expected = ((2.10 * 10.0 + 2.20 * 20.0) / 30.0) * (1.0 + 0.002);
        assert!((ask.adj_price - expected).abs() < TOL);
    }

    #[test]
    fn test_filter_applies_fx_division_exactly_once() {
        let fx = 2.0;
        let filtered = filter_book(&test_book(), 0.002, Some(fx), limits(25.0, 50.0));

        let bid = filtered.bid.expect("bid side present");
        let expected = ((1.90 * 10.0 + 1.80 * 10.0 + 1.70 * 30.0) / 50.0) * (1.0 - 0.002) / fx;
        assert!((bid.adj_price - expected).abs() < TOL);

        let ask = filtered.ask.expect("ask side present");
        let expected = ((2.10 * 10.0 + 2.20 * 20.0) / 30.0) * (1.0 + 0.002) / fx;
        assert!((ask.adj_price - expected).abs() < TOL);
    }

    #[test]
    fn test_filter_stops_at_first_level_reaching_min_order() {
        let book = Book::new(
            VenueId::from("okcoin_usd"),
            levels(&[(1.90, 30.0), (1.80, 10.0), (1.70, 100.0)]),
            levels(&[(2.10, 100.0), (2.20, 20.0), (2.30, 10.0)]),
        );
        let filtered = filter_book(&book, 0.002, Some(1.0), limits(25.0, 50.0));

        let bid = filtered.bid.expect("bid side present");
        assert!((bid.order_price - 1.90).abs() < TOL);
        assert!((bid.amount - 30.0).abs() < TOL);
        assert!((bid.adj_price - 1.90 * (1.0 - 0.002)).abs() < TOL);

        let ask = filtered.ask.expect("ask side present");
        assert!((ask.order_price - 2.10).abs() < TOL);
        assert!((ask.amount - 50.0).abs() < TOL);
        assert!((ask.adj_price - 2.10 * (1.0 + 0.002)).abs() < TOL);
    }

    #[test]
    fn test_thin_book_yields_absent_side() {
        let book = Book::new(
            VenueId::from("okcoin_usd"),
            levels(&[(1.90, 5.0), (1.80, 5.0)]),
            levels(&[(2.10, 100.0)]),
        );
        let filtered = filter_book(&book, 0.0, Some(1.0), limits(25.0, 50.0));
        assert!(filtered.bid.is_none(), "10 walked < 25 min_order");
        assert!(filtered.ask.is_some());
    }

    #[test]
    fn test_missing_fx_makes_book_unusable() {
        let filtered = filter_book(&test_book(), 0.002, None, limits(25.0, 50.0));
        assert!(filtered.bid.is_none());
        assert!(filtered.ask.is_none());
    }

    #[test]
    fn test_error_book_yields_no_sides() {
        let book = Book::err(VenueId::from("okcoin_usd"), "boom");
        let filtered = filter_book(&book, 0.002, Some(1.0), limits(25.0, 50.0));
        assert!(filtered.bid.is_none() && filtered.ask.is_none());
    }

    #[test]
    fn test_foreign_quote_arithmetic() {
        // A bid of 12.30 x 10 quoted in a currency at 6.0 per base unit.
        let book = Book::new(
            VenueId::from("okcoin_cny"),
            levels(&[(12.30, 10.0)]),
            levels(&[(12.50, 10.0)]),
        );
        let fee = 0.001;
        let filtered = filter_book(&book, fee, Some(6.0), limits(5.0, 10.0));
        let bid = filtered.bid.expect("bid side present");
        assert!((bid.adj_price - 12.30 * (1.0 - fee) / 6.0).abs() < TOL);
    }
}
