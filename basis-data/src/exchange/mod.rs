//! Per-venue book feed adapters.
//!
//! Each adapter owns its wire format: payloads are decoded into closed local
//! types here and converted to [`basis_instrument::Book`] before anything
//! leaves the module.

pub mod bitfinex;
pub mod okcoin;

use std::time::Duration;

/// How long `communicate_book` waits for the first frame before returning an
/// error book.
pub(crate) const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
