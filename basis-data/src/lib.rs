//! Market-data streaming for the basis arbitrage engine.
//!
//! Each venue adapter maintains a resilient feed of top-of-book data and
//! publishes [`basis_instrument::Book`] values onto a fan-in channel owned by
//! the hub:
//!
//! - [`exchange::okcoin::OkCoinBookFeed`]: a WebSocket feed driven by the
//!   [`ws`] streaming harness (connection-owner task, read deadlines,
//!   application-level heartbeats, reconnect with backoff).
//! - [`exchange::bitfinex::BitfinexBookFeed`]: an HTTP polling feed with
//!   per-level timestamp de-duplication.
//! - [`fx::FxProvider`]: a periodic HTTP poller for foreign-exchange quotes.
//!
//! Transport failures are handled inside the adapters (reconnect, retry next
//! tick) and never reach the strategy; decode failures surface as error books
//! or error quotes that downstream consumers skip.

pub mod error;
pub mod exchange;
pub mod fx;
pub mod shutdown;
pub mod ws;

pub use error::DataError;
pub use fx::{FxProvider, FxQuote};
pub use shutdown::{Shutdown, ShutdownHandle};
