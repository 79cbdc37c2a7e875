//! Data-fusion hub: a single event-loop task that fans in venue books and FX
//! quotes, maintains the latest filtered view per venue, and republishes
//! snapshots to the strategy.
//!
//! Publication is backpressured by a capacity-1 channel with drop-if-busy
//! semantics: if the strategy is still chewing on the previous snapshot, the
//! current one is discarded and superseded by the next. FX updates do not
//! re-filter existing books; the next book for a venue picks up the new
//! price.

use crate::config::OrderLimits;
use crate::filter::{filter_book, FilteredBook};
use basis_data::{FxQuote, Shutdown};
use basis_instrument::{Book, Currency, VenueId, VenueSpec};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Books older than this are not handed to the strategy.
pub const BOOK_STALENESS: Duration = Duration::from_secs(60);

/// FX prices older than this make a non-base venue's book unusable.
pub const FX_STALENESS: Duration = Duration::from_secs(60);

/// A consistent point-in-time view of every venue's executable markets.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub markets: HashMap<VenueId, FilteredBook>,
    pub fx: HashMap<Currency, f64>,
    pub taken_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct FxEntry {
    price: f64,
    at: Instant,
}

/// The hub state. Mutated only from [`Hub::run`]'s event loop (or directly in
/// tests); the rest of the engine sees snapshots.
pub struct Hub {
    specs: HashMap<VenueId, VenueSpec>,
    limits: OrderLimits,
    markets: HashMap<VenueId, FilteredBook>,
    fx: HashMap<Currency, FxEntry>,
}

impl Hub {
    pub fn new(specs: impl IntoIterator<Item = VenueSpec>, limits: OrderLimits) -> Self {
        Self {
            specs: specs.into_iter().map(|s| (s.id.clone(), s)).collect(),
            limits,
            markets: HashMap::new(),
            fx: HashMap::new(),
        }
    }

    /// Ingest one book: re-filter it under the current FX and replace the
    /// venue's entry. Error books are dropped so the previous good entry
    /// survives; the staleness gate handles the rest uniformly.
    pub fn on_book(&mut self, book: Book) {
        if let Some(reason) = &book.error {
            debug!(venue = %book.venue, %reason, "dropping error book");
            return;
        }
        let Some(spec) = self.specs.get(&book.venue) else {
            warn!(venue = %book.venue, "book from unknown venue");
            return;
        };
        let fx = self.fx_for(&spec.currency);
        let filtered = filter_book(&book, spec.fee, fx, self.limits);
        self.markets.insert(book.venue, filtered);
    }

    /// Ingest one FX quote. Error quotes are skipped, retaining the previous
    /// good price.
    pub fn on_fx(&mut self, quote: FxQuote) {
        if let Some(reason) = &quote.error {
            debug!(symbol = %quote.symbol, %reason, "dropping error fx quote");
            return;
        }
        self.fx.insert(
            quote.symbol,
            FxEntry {
                price: quote.price,
                at: Instant::now(),
            },
        );
    }

    /// Current FX price for a currency, or `None` when it is missing, stale
    /// or zero. The base currency is pinned at 1.0.
    fn fx_for(&self, currency: &Currency) -> Option<f64> {
        if currency.is_base() {
            return Some(1.0);
        }
        self.fx
            .get(currency)
            .filter(|entry| entry.at.elapsed() < FX_STALENESS && entry.price > 0.0)
            .map(|entry| entry.price)
    }

    /// Build a snapshot of every fresh market.
    pub fn snapshot(&self) -> Snapshot {
        let markets = self
            .markets
            .iter()
            .filter(|(_, fb)| fb.time.elapsed() < BOOK_STALENESS)
            .map(|(id, fb)| (id.clone(), fb.clone()))
            .collect();

        let mut fx: HashMap<Currency, f64> = self
            .fx
            .iter()
            .map(|(currency, entry)| (currency.clone(), entry.price))
            .collect();
        fx.insert(Currency::base(), 1.0);

        Snapshot {
            markets,
            fx,
            taken_at: Instant::now(),
        }
    }

    /// Run the event loop until shutdown.
    ///
    /// `snapshot_tx` must have capacity 1: each book triggers a `try_send`,
    /// and a full buffer means the strategy is busy, so the snapshot is
    /// discarded on this side rather than queued.
    pub async fn run(
        mut self,
        mut book_rx: mpsc::Receiver<Book>,
        mut fx_rx: mpsc::Receiver<FxQuote>,
        mut query_rx: mpsc::Receiver<oneshot::Sender<Snapshot>>,
        snapshot_tx: mpsc::Sender<Snapshot>,
        mut shutdown: Shutdown,
    ) {
        loop {
            tokio::select! {
                book = book_rx.recv() => {
                    let Some(book) = book else { break };
                    let had_error = book.is_err();
                    self.on_book(book);
                    if had_error {
                        continue;
                    }
                    match snapshot_tx.try_send(self.snapshot()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            debug!("strategy busy, snapshot dropped");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => break,
                    }
                }
                quote = fx_rx.recv() => {
                    let Some(quote) = quote else { break };
                    self.on_fx(quote);
                }
                query = query_rx.recv() => {
                    let Some(reply) = query else { break };
                    let _ = reply.send(self.snapshot());
                }
                _ = shutdown.recv() => break,
            }
        }
        debug!("hub loop ended");
        // Dropping snapshot_tx here closes the strategy's input.
    }

    #[cfg(test)]
    fn set_fx_at(&mut self, currency: Currency, price: f64, at: Instant) {
        self.fx.insert(currency, FxEntry { price, at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_data::shutdown;
    use basis_instrument::BookLevel;
    use smol_str::SmolStr;

    fn spec(id: &str, currency: &str, fee: f64) -> VenueSpec {
        VenueSpec {
            id: VenueId::from(id),
            name: SmolStr::new(id),
            symbol: SmolStr::new("ltc"),
            currency: currency.into(),
            priority: 1,
            fee,
            max_position: 500.0,
            avail_funds: 0.0,
            avail_short: 0.0,
            has_crypto_fee: false,
        }
    }

    fn limits() -> OrderLimits {
        OrderLimits {
            min_order: 25.0,
            max_order: 50.0,
        }
    }

    fn book(venue: &str, bid: f64, ask: f64) -> Book {
        Book::new(
            VenueId::from(venue),
            vec![BookLevel::new(bid, 100.0)],
            vec![BookLevel::new(ask, 100.0)],
        )
    }

    fn aged(mut b: Book, age: Duration) -> Book {
        b.time = Instant::now().checked_sub(age).expect("instant in range");
        b
    }

    #[test]
    fn test_book_updates_market_map() {
        let mut hub = Hub::new([spec("a", "usd", 0.0)], limits());
        hub.on_book(book("a", 2.00, 2.05));

        let snapshot = hub.snapshot();
        let market = &snapshot.markets[&VenueId::from("a")];
        assert!((market.bid.as_ref().unwrap().adj_price - 2.00).abs() < 1e-6);
        assert!((market.ask.as_ref().unwrap().adj_price - 2.05).abs() < 1e-6);
        assert_eq!(snapshot.fx[&Currency::base()], 1.0);
    }

    #[test]
    fn test_error_book_retains_previous_entry() {
        let mut hub = Hub::new([spec("a", "usd", 0.0)], limits());
        hub.on_book(book("a", 2.00, 2.05));
        hub.on_book(Book::err(VenueId::from("a"), "decode failure"));

        let snapshot = hub.snapshot();
        let market = &snapshot.markets[&VenueId::from("a")];
        assert!(market.bid.is_some(), "previous good book survives");
    }

    #[test]
    fn test_stale_book_excluded_from_snapshot() {
        let mut hub = Hub::new([spec("a", "usd", 0.0)], limits());
        hub.on_book(aged(book("a", 2.00, 2.05), Duration::from_secs(61)));

        let snapshot = hub.snapshot();
        assert!(snapshot.markets.is_empty(), "stale book must be gated out");
    }

    #[test]
    fn test_stale_fx_makes_foreign_book_unusable() {
        let mut hub = Hub::new([spec("b", "cny", 0.0)], limits());
        hub.set_fx_at(
            Currency::from("cny"),
            6.0,
            Instant::now()
                .checked_sub(Duration::from_secs(61))
                .expect("instant in range"),
        );
        hub.on_book(book("b", 12.30, 12.50));

        let snapshot = hub.snapshot();
        let market = &snapshot.markets[&VenueId::from("b")];
        assert!(market.bid.is_none() && market.ask.is_none());
    }

    #[test]
    fn test_fresh_fx_converts_foreign_book() {
        let mut hub = Hub::new([spec("b", "cny", 0.0)], limits());
        hub.on_fx(FxQuote {
            symbol: Currency::from("cny"),
            price: 6.0,
            error: None,
        });
        hub.on_book(book("b", 12.30, 12.50));

        let snapshot = hub.snapshot();
        let market = &snapshot.markets[&VenueId::from("b")];
        assert!((market.bid.as_ref().unwrap().adj_price - 12.30 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_error_fx_quote_retains_previous_price() {
        let mut hub = Hub::new([spec("b", "cny", 0.0)], limits());
        hub.on_fx(FxQuote {
            symbol: Currency::from("cny"),
            price: 6.0,
            error: None,
        });
        hub.on_fx(FxQuote::err(Currency::from("cny"), "zero price"));
        assert_eq!(hub.fx_for(&Currency::from("cny")), Some(6.0));
    }

    #[tokio::test]
    async fn test_run_publishes_with_drop_if_busy() {
        let hub = Hub::new([spec("a", "usd", 0.0)], limits());
        let (book_tx, book_rx) = mpsc::channel(16);
        let (_fx_tx, fx_rx) = mpsc::channel(16);
        let (query_tx, query_rx) = mpsc::channel(4);
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel(1);
        let (handle, shutdown) = shutdown::channel();

        let hub_task = tokio::spawn(hub.run(book_rx, fx_rx, query_rx, snapshot_tx, shutdown));

        // Three books while the strategy never drains: only one snapshot may
        // be buffered.
        for _ in 0..3 {
            book_tx.send(book("a", 2.00, 2.05)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(snapshot_rx.try_recv().is_ok(), "one snapshot buffered");
        assert!(snapshot_rx.try_recv().is_err(), "intermediate snapshots dropped");

        // Once drained, the next book publishes again.
        book_tx.send(book("a", 2.01, 2.06)).await.unwrap();
        let snapshot = tokio::time::timeout(Duration::from_secs(1), snapshot_rx.recv())
            .await
            .expect("snapshot within timeout")
            .expect("hub alive");
        let market = &snapshot.markets[&VenueId::from("a")];
        assert!((market.bid.as_ref().unwrap().adj_price - 2.01).abs() < 1e-6);

        // Diagnostic pull query answers synchronously with the current view.
        let (reply_tx, reply_rx) = oneshot::channel();
        query_tx.send(reply_tx).await.unwrap();
        let queried = reply_rx.await.expect("query answered");
        assert!(queried.markets.contains_key(&VenueId::from("a")));

        handle.shutdown();
        hub_task.await.unwrap();
    }
}
