//! Top-of-book market data published by the venue adapters.

use crate::venue::VenueId;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A single price level.
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Deserialize, Serialize)]
pub struct BookLevel {
    pub price: f64,
    pub amount: f64,
}

/// A point-in-time view of a venue's order book.
///
/// Bids are sorted price-descending and asks price-ascending on construction;
/// adapters decode whatever level ordering the wire delivers and rely on
/// [`Book::new`] to establish the invariant. When `error` is set the sides
/// must not be consulted.
#[derive(Debug, Clone)]
pub struct Book {
    pub venue: VenueId,
    /// Monotonic receive time, used by the hub's staleness gate.
    pub time: Instant,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub error: Option<String>,
}

impl Book {
    /// Build a book from decoded levels, sorting both sides.
    ///
    /// The sort is not stable; nothing may rely on the relative order of
    /// equal-priced levels.
    pub fn new(venue: VenueId, mut bids: Vec<BookLevel>, mut asks: Vec<BookLevel>) -> Self {
        bids.sort_unstable_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_unstable_by(|a, b| a.price.total_cmp(&b.price));
        Self {
            venue,
            time: Instant::now(),
            bids,
            asks,
            error: None,
        }
    }

    /// Build an error book carrying a failure reason instead of levels.
    pub fn err(venue: VenueId, reason: impl Into<String>) -> Self {
        Self {
            venue,
            time: Instant::now(),
            bids: Vec::new(),
            asks: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}
