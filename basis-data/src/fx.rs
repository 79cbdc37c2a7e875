//! Foreign-exchange quote provider.
//!
//! Polls an HTTP quote service every 15 seconds for each non-base currency in
//! use. Network failures and zero prices surface as error quotes; the hub
//! skips those and keeps the previous good price. The base currency is never
//! polled and is pinned at 1.0.

use crate::shutdown::Shutdown;
use basis_instrument::Currency;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://finance.yahoo.com/webservice/v1/symbols";
const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// One FX observation: units of base currency per unit of `symbol`.
#[derive(Debug, Clone)]
pub struct FxQuote {
    pub symbol: Currency,
    pub price: f64,
    pub error: Option<String>,
}

impl FxQuote {
    pub fn err(symbol: Currency, reason: impl Into<String>) -> Self {
        Self {
            symbol,
            price: 0.0,
            error: Some(reason.into()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Configuration for the FX poller.
#[derive(Debug, Clone)]
pub struct FxProviderConfig {
    pub base_url: String,
    pub interval: Duration,
}

impl Default for FxProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            interval: POLL_INTERVAL,
        }
    }
}

/// Periodic FX quote poller.
#[derive(Debug, Clone)]
pub struct FxProvider {
    config: FxProviderConfig,
    http: reqwest::Client,
    shutdown: Shutdown,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    list: QuoteList,
}

#[derive(Debug, Deserialize)]
struct QuoteList {
    #[serde(default)]
    resources: Vec<QuoteResource>,
}

#[derive(Debug, Deserialize)]
struct QuoteResource {
    resource: QuoteFields,
}

#[derive(Debug, Deserialize)]
struct QuoteFields {
    fields: QuotePrice,
}

#[derive(Debug, Deserialize)]
struct QuotePrice {
    /// String-encoded on the wire.
    price: String,
}

impl FxProvider {
    pub fn new(config: FxProviderConfig, shutdown: Shutdown) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            shutdown,
        }
    }

    /// Fetch an initial quote for `symbol` and keep publishing fresh quotes
    /// on `fx_tx` every poll interval until shutdown.
    pub async fn communicate_fx(&self, symbol: Currency, fx_tx: mpsc::Sender<FxQuote>) -> FxQuote {
        let first = self.get_quote(&symbol).await;

        let provider = self.clone();
        let mut shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(provider.config.interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let quote = provider.get_quote(&symbol).await;
                        if fx_tx.send(quote).await.is_err() {
                            break;
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
            debug!(%symbol, "fx loop ended");
        });

        first
    }

    async fn get_quote(&self, symbol: &Currency) -> FxQuote {
        let url = format!("{}/{}=x/quote?format=json", self.config.base_url, symbol);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(error) => return FxQuote::err(symbol.clone(), error.to_string()),
        };
        let decoded: QuoteResponse = match response.json().await {
            Ok(decoded) => decoded,
            Err(error) => return FxQuote::err(symbol.clone(), error.to_string()),
        };

        let price = decoded
            .list
            .resources
            .first()
            .and_then(|r| r.resource.fields.price.parse::<f64>().ok())
            .unwrap_or(0.0);
        if price < 1e-6 {
            return FxQuote::err(symbol.clone(), "zero price");
        }

        FxQuote {
            symbol: symbol.clone(),
            price,
            error: None,
        }
    }
}
