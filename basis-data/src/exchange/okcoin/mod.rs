//! OKCoin streaming book feed.
//!
//! Subscribes to the `ok_{symbol}{currency}_depth` channel over the streaming
//! harness. OKCoin requires application-level keep-alives (`{"event":"ping"}`
//! every 15 s) and answers with a pong marker the reader drops.

pub mod message;

use crate::{exchange::HANDSHAKE_TIMEOUT, shutdown::Shutdown, ws};
use basis_instrument::{Book, VenueId};
use tokio::sync::mpsc;
use tracing::debug;

const PING_PAYLOAD: &str = r#"{"event":"ping"}"#;
const PONG_PAYLOAD: &str = r#"{"event":"pong"}"#;

/// Configuration for the OKCoin book feed.
#[derive(Debug, Clone)]
pub struct OkCoinBookFeedConfig {
    pub venue: VenueId,
    /// Instrument tag, e.g. `ltc`.
    pub symbol: String,
    /// Quote currency, `usd` or `cny`; selects the host.
    pub currency: String,
    pub ws_url: Option<String>,
}

impl OkCoinBookFeedConfig {
    pub fn default_ws_url(currency: &str) -> &'static str {
        if currency.eq_ignore_ascii_case("cny") {
            "wss://real.okcoin.cn:10440/websocket/okcoinapi"
        } else {
            "wss://real.okcoin.com:10440/websocket/okcoinapi"
        }
    }
}

/// OKCoin book feed over the WebSocket harness.
#[derive(Debug)]
pub struct OkCoinBookFeed {
    venue: VenueId,
    ws: ws::WsConfig,
    shutdown: Shutdown,
}

impl OkCoinBookFeed {
    pub fn new(config: OkCoinBookFeedConfig, shutdown: Shutdown) -> Self {
        let url = config
            .ws_url
            .unwrap_or_else(|| OkCoinBookFeedConfig::default_ws_url(&config.currency).into());
        let channel = format!(
            "ok_{}{}_depth",
            config.symbol.to_lowercase(),
            config.currency.to_lowercase()
        );

        let mut ws = ws::WsConfig::new(url);
        ws.subscribe = Some(format!(
            r#"{{"event":"addChannel","channel":"{channel}"}}"#
        ));
        ws.ping_payload = Some(PING_PAYLOAD.into());
        ws.pong_payload = Some(PONG_PAYLOAD.into());

        Self {
            venue: config.venue,
            ws,
            shutdown,
        }
    }

    /// Open the stream, return the first book, and publish every further book
    /// on `book_tx` until shutdown.
    pub async fn communicate_book(self, book_tx: mpsc::Sender<Book>) -> Book {
        let mut frames = ws::spawn(self.ws, self.shutdown);

        let first = match tokio::time::timeout(HANDSHAKE_TIMEOUT, frames.recv()).await {
            Ok(Some(text)) => message::decode_book(&self.venue, &text),
            Ok(None) => Book::err(self.venue.clone(), "stream closed during handshake"),
            Err(_) => Book::err(
                self.venue.clone(),
                format!("no depth data within {HANDSHAKE_TIMEOUT:?}"),
            ),
        };

        let venue = self.venue;
        tokio::spawn(async move {
            while let Some(text) = frames.recv().await {
                let book = message::decode_book(&venue, &text);
                if book_tx.send(book).await.is_err() {
                    break;
                }
            }
            debug!(%venue, "book loop ended");
        });

        first
    }
}
