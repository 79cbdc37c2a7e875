//! Order execution for the basis arbitrage engine.
//!
//! # Key components
//!
//! - [`ExecutionClient`]: the authenticated request/response contract every
//!   venue implements (order send, cancel, status poll).
//! - [`client::okcoin::OkCoinExecution`] and
//!   [`client::bitfinex::BitfinexExecution`]: concrete signed REST clients.
//! - [`client::mock::MockExecution`]: scripted client for tests.
//! - [`VenueHandle`]: a venue's static spec, mutable position and execution
//!   client bundled behind one shared handle.
//! - [`fok::fill_or_kill`]: the send → poll → cancel-if-live → confirm-dead
//!   state machine used for every order the strategy fires.
//!
//! Transport and venue-business failures surface as [`ExecutionError`];
//! callers treat them as retriable (the fill-or-kill loop re-sends and
//! re-polls, logging each error with its venue code).

pub mod client;
pub mod error;
pub mod fok;
pub mod venue;

pub use client::ExecutionClient;
pub use error::ExecutionError;
pub use venue::VenueHandle;
