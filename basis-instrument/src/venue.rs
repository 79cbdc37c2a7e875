//! Venue identity and static trading parameters.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Stable handle identifying a venue for the lifetime of a run.
///
/// Used as the key of the hub's market map and of the persisted position row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Deserialize, Serialize)]
pub struct VenueId(pub SmolStr);

impl VenueId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for VenueId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Quote currency tag, lowercase (e.g. `usd`, `cny`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deserialize, Serialize)]
pub struct Currency(pub SmolStr);

impl Currency {
    /// The base currency all P&L is expressed in.
    pub const BASE: &'static str = "usd";

    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self(tag.into())
    }

    pub fn base() -> Self {
        Self(SmolStr::new_static(Self::BASE))
    }

    pub fn is_base(&self) -> bool {
        self.0 == Self::BASE
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Currency {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Currency family used by the needed-arb FX premium: trades whose legs carry
/// different codes take currency risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyCode {
    /// Quoted in the base currency.
    Base = 0,
    /// Quoted in a non-base fiat currency.
    Foreign = 1,
}

impl CurrencyCode {
    pub fn of(currency: &Currency) -> Self {
        if currency.is_base() {
            CurrencyCode::Base
        } else {
            CurrencyCode::Foreign
        }
    }
}

/// Static configuration of a venue: identity, instrument, fees and limits.
///
/// The mutable `position` lives on the execution-side handle, not here.
#[derive(Debug, Clone, Display, Deserialize, Serialize)]
#[display("{name}")]
pub struct VenueSpec {
    /// Stable venue handle.
    pub id: VenueId,
    /// Display name, e.g. `OKCoin(cny)`.
    pub name: SmolStr,
    /// Traded instrument tag, e.g. `ltc`.
    pub symbol: SmolStr,
    /// Quote currency.
    pub currency: Currency,
    /// Execution ordering tag: lower executes first when paired legs have
    /// unequal priority.
    pub priority: u32,
    /// Taker fee as a fraction, in `[0, 1)`.
    pub fee: f64,
    /// Symmetric cap on `|position|`, in crypto units.
    pub max_position: f64,
    /// Quote-currency funds available for buying.
    pub avail_funds: f64,
    /// Crypto quantity available for short selling.
    pub avail_short: f64,
    /// True when buy-side fees are taken in the crypto asset, reducing the
    /// quantity received.
    pub has_crypto_fee: bool,
}

impl VenueSpec {
    pub fn currency_code(&self) -> CurrencyCode {
        CurrencyCode::of(&self.currency)
    }
}
