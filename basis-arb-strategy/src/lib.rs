//! Cross-venue arbitrage engine.
//!
//! Continuously ingests top-of-book data from two or more trading venues,
//! detects price dislocations net of fees and FX conversion, and fires paired
//! fill-or-kill orders to capture the spread while respecting per-venue
//! position caps.
//!
//! # Key components
//!
//! - [`Config`]: TOML configuration (`--config`), arb band, order limits and
//!   per-venue parameters.
//! - [`filter`]: converts a raw venue book into one executable bid and ask
//!   adjusted for fee and FX.
//! - [`hub`]: single-task coordinator fanning in books and FX quotes and
//!   publishing consistent snapshots with drop-if-busy backpressure.
//! - [`strategy`]: the decision logic: net-position exits, cross-venue entry
//!   arbitrage with a position-aware threshold, and priority-based pair
//!   sequencing.
//! - [`persist`]: single-row CSV store for positions and P&L across runs.
//! - [`engine`]: supervisor wiring startup, shutdown and persistence.

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hub;
pub mod persist;
pub mod strategy;

pub use config::{Config, EngineConfig, OrderLimits, VenueConfig};
pub use error::EngineError;
pub use filter::{FilteredBook, Market};
pub use hub::{Hub, Snapshot};
pub use strategy::{NetState, Strategy, StrategyParams};
