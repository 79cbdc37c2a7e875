//! Core domain types for the basis arbitrage engine.
//!
//! This crate defines the vocabulary shared by the market-data, execution and
//! strategy crates:
//!
//! - [`VenueId`], [`Currency`] and [`VenueSpec`]: the static identity and
//!   trading parameters of a venue.
//! - [`Book`] and [`BookLevel`]: top-of-book market data as published by the
//!   venue adapters.
//! - [`Side`], [`OrderType`], [`OrderState`] and [`OrderStatus`]: the order
//!   vocabulary used by the execution clients.
//!
//! Everything here is plain data; all I/O lives in `basis-data` and
//! `basis-execution`.

pub mod book;
pub mod order;
pub mod venue;

pub use book::{Book, BookLevel};
pub use order::{OrderState, OrderStatus, OrderType, Side};
pub use venue::{Currency, CurrencyCode, VenueId, VenueSpec};
