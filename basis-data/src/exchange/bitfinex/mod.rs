//! Bitfinex polling book feed.
//!
//! Bitfinex exposes books over HTTP only, so the harness degenerates to a
//! polling loop: fetch, compare per-level timestamps against the previous
//! fetch, and publish only when some level moved by more than half a second.

use crate::shutdown::Shutdown;
use basis_instrument::{Book, BookLevel, VenueId};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.bitfinex.com";
const DEPTH: usize = 20;

/// Two fetches count as the same book when every matched level's timestamp
/// differs by less than this.
const DUPLICATE_WINDOW_SECS: f64 = 0.5;

/// Configuration for the Bitfinex book feed.
#[derive(Debug, Clone)]
pub struct BitfinexBookFeedConfig {
    pub venue: VenueId,
    /// Instrument tag, e.g. `ltc`.
    pub symbol: String,
    /// Quote currency, e.g. `usd`.
    pub currency: String,
    pub base_url: Option<String>,
}

/// Bitfinex book feed.
#[derive(Debug)]
pub struct BitfinexBookFeed {
    venue: VenueId,
    pair: String,
    base_url: String,
    http: reqwest::Client,
    shutdown: Shutdown,
}

#[derive(Debug, Deserialize)]
struct BookResponse {
    #[serde(default)]
    bids: Vec<RawLevel>,
    #[serde(default)]
    asks: Vec<RawLevel>,
}

/// Levels arrive with every number string-encoded.
#[derive(Debug, Deserialize)]
struct RawLevel {
    price: String,
    amount: String,
    timestamp: String,
}

impl BitfinexBookFeed {
    pub fn new(config: BitfinexBookFeedConfig, shutdown: Shutdown) -> Self {
        Self {
            venue: config.venue,
            pair: format!(
                "{}{}",
                config.symbol.to_lowercase(),
                config.currency.to_lowercase()
            ),
            base_url: config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            http: reqwest::Client::new(),
            shutdown,
        }
    }

    /// Fetch the first book, then poll and publish changed books on
    /// `book_tx` until shutdown.
    pub async fn communicate_book(self, book_tx: mpsc::Sender<Book>) -> Book {
        let (first, mut old_timestamps) = self.get_book().await;

        let mut shutdown = self.shutdown.clone();
        let feed = self;
        tokio::spawn(async move {
            loop {
                let (book, timestamps) = tokio::select! {
                    fetched = feed.get_book() => fetched,
                    _ = shutdown.recv() => break,
                };
                if book_changed(&old_timestamps, &timestamps) {
                    if book_tx.send(book).await.is_err() {
                        break;
                    }
                }
                old_timestamps = timestamps;
            }
            debug!(venue = %feed.venue, "poll loop ended");
        });

        first
    }

    /// Fetch one book. Failures yield an error book with zeroed timestamps.
    async fn get_book(&self) -> (Book, Vec<f64>) {
        let zeroed = vec![0.0; 2 * DEPTH];
        let url = format!(
            "{}/v1/book/{}?limit_bids={DEPTH}&limit_asks={DEPTH}",
            self.base_url, self.pair
        );

        let response = match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                let book = Book::err(self.venue.clone(), response.status().to_string());
                return (book, zeroed);
            }
            Err(error) => {
                return (Book::err(self.venue.clone(), error.to_string()), zeroed);
            }
        };

        let decoded: BookResponse = match response.json().await {
            Ok(decoded) => decoded,
            Err(error) => {
                return (Book::err(self.venue.clone(), error.to_string()), zeroed);
            }
        };

        let mut timestamps = zeroed;
        let mut to_levels = |raw: &[RawLevel], offset: usize| {
            raw.iter()
                .take(DEPTH)
                .enumerate()
                .map(|(i, level)| {
                    timestamps[offset + i] = level.timestamp.parse().unwrap_or(0.0);
                    BookLevel::new(
                        level.price.parse().unwrap_or(0.0),
                        level.amount.parse().unwrap_or(0.0),
                    )
                })
                .collect::<Vec<_>>()
        };
        let bids = to_levels(&decoded.bids, 0);
        let asks = to_levels(&decoded.asks, DEPTH);

        (Book::new(self.venue.clone(), bids, asks), timestamps)
    }
}

/// True when any matched level's timestamp moved by the duplicate window or
/// more.
fn book_changed(old: &[f64], new: &[f64]) -> bool {
    old.iter()
        .zip(new)
        .any(|(a, b)| (a - b).abs() > DUPLICATE_WINDOW_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_changed_within_window_is_duplicate() {
        let old = vec![100.0, 200.0, 300.0];
        let new = vec![100.4, 200.0, 300.2];
        assert!(!book_changed(&old, &new));
    }

    #[test]
    fn test_book_changed_outside_window() {
        let old = vec![100.0, 200.0, 300.0];
        let new = vec![100.0, 201.0, 300.0];
        assert!(book_changed(&old, &new));
    }

    #[test]
    fn test_decode_levels_and_sorting() {
        let raw = r#"{
            "bids": [
                {"price": "1.80", "amount": "10.0", "timestamp": "1700000000.0"},
                {"price": "1.90", "amount": "10.0", "timestamp": "1700000001.0"}
            ],
            "asks": [
                {"price": "2.20", "amount": "20.0", "timestamp": "1700000002.0"},
                {"price": "2.10", "amount": "10.0", "timestamp": "1700000003.0"}
            ]
        }"#;
        let decoded: BookResponse = serde_json::from_str(raw).unwrap();
        let bids: Vec<BookLevel> = decoded
            .bids
            .iter()
            .map(|l| BookLevel::new(l.price.parse().unwrap(), l.amount.parse().unwrap()))
            .collect();
        let asks: Vec<BookLevel> = decoded
            .asks
            .iter()
            .map(|l| BookLevel::new(l.price.parse().unwrap(), l.amount.parse().unwrap()))
            .collect();
        let book = Book::new(VenueId::from("bitfinex"), bids, asks);
        assert_eq!(book.bids[0].price, 1.90);
        assert_eq!(book.asks[0].price, 2.10);
    }
}
