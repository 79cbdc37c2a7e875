//! Engine configuration.
//!
//! Loaded from a TOML file named by the single `--config` CLI flag. API
//! credentials never live in the file; each venue block names the environment
//! variables to read them from.

use crate::error::EngineError;
use basis_instrument::{Currency, VenueId, VenueSpec};
use serde::Deserialize;
use smol_str::SmolStr;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub venues: Vec<VenueConfig>,
}

/// Strategy and engine parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Traded instrument tag, e.g. `ltc`.
    pub symbol: String,
    /// Upper bound of the needed-arb band.
    pub max_arb: f64,
    /// Lower bound of the needed-arb band.
    pub min_arb: f64,
    /// Added to the band center when the legs cross currencies.
    #[serde(default)]
    pub fx_premium: f64,
    /// Net positions below this are treated as zero.
    pub min_net_pos: f64,
    /// Minimum executable quantity per side.
    pub min_order: f64,
    /// Maximum quantity walked into a single side.
    pub max_order: f64,
    /// Redraw the terminal dashboard between trades.
    #[serde(default)]
    pub print_on: bool,
    /// Append-only run log; stdout when absent.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Positions/P&L store.
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,
}

fn default_status_file() -> PathBuf {
    PathBuf::from("status.csv")
}

/// Which adapter family a venue uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AdapterKind {
    #[serde(rename = "okcoin")]
    OkCoin,
    #[serde(rename = "bitfinex")]
    Bitfinex,
}

/// One configured venue.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub id: String,
    pub adapter: AdapterKind,
    /// Quote currency, e.g. `usd` or `cny`.
    pub currency: String,
    /// Lower priority executes first when paired legs differ.
    pub priority: u32,
    /// Taker fee as a fraction, in `[0, 1)`.
    pub fee: f64,
    /// Symmetric cap on `|position|`.
    pub max_position: f64,
    #[serde(default)]
    pub avail_funds: f64,
    #[serde(default)]
    pub avail_short: f64,
    /// Buy-side fees taken in the crypto asset.
    #[serde(default)]
    pub has_crypto_fee: bool,
    /// Environment variable holding the API key.
    pub key_env: String,
    /// Environment variable holding the API secret.
    pub secret_env: String,
}

/// The order limits the filter walks with.
#[derive(Debug, Clone, Copy)]
pub struct OrderLimits {
    pub min_order: f64,
    pub max_order: f64,
}

impl Config {
    /// Read and validate a configuration file. Fatal on any failure.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.venues.len() < 2 {
            return Err(EngineError::Config(
                "at least two venues are required".into(),
            ));
        }
        if self.engine.min_order <= 0.0 || self.engine.max_order < self.engine.min_order {
            return Err(EngineError::Config(
                "require 0 < min_order <= max_order".into(),
            ));
        }
        if self.engine.max_arb < self.engine.min_arb {
            return Err(EngineError::Config("require min_arb <= max_arb".into()));
        }
        if self.engine.min_net_pos < 0.0 {
            return Err(EngineError::Config("min_net_pos must be >= 0".into()));
        }
        for venue in &self.venues {
            if !(0.0..1.0).contains(&venue.fee) {
                return Err(EngineError::Config(format!(
                    "venue {}: fee must be in [0, 1)",
                    venue.id
                )));
            }
            if venue.max_position <= 0.0 {
                return Err(EngineError::Config(format!(
                    "venue {}: max_position must be positive",
                    venue.id
                )));
            }
        }
        let mut ids: Vec<&str> = self.venues.iter().map(|v| v.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.venues.len() {
            return Err(EngineError::Config("duplicate venue ids".into()));
        }
        Ok(())
    }

    pub fn order_limits(&self) -> OrderLimits {
        OrderLimits {
            min_order: self.engine.min_order,
            max_order: self.engine.max_order,
        }
    }

    /// Non-base currencies quoted by the configured venues, deduplicated.
    pub fn foreign_currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = self
            .venues
            .iter()
            .map(|v| Currency::from(v.currency.as_str()))
            .filter(|c| !c.is_base())
            .collect();
        currencies.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        currencies.dedup();
        currencies
    }
}

impl VenueConfig {
    /// Build the static venue spec shared with the hub and strategy.
    pub fn venue_spec(&self, symbol: &str) -> VenueSpec {
        let family = match self.adapter {
            AdapterKind::OkCoin => "OKCoin",
            AdapterKind::Bitfinex => "Bitfinex",
        };
        VenueSpec {
            id: VenueId::from(self.id.as_str()),
            name: SmolStr::new(format!("{family}({})", self.currency)),
            symbol: SmolStr::new(symbol),
            currency: Currency::from(self.currency.as_str()),
            priority: self.priority,
            fee: self.fee,
            max_position: self.max_position,
            avail_funds: self.avail_funds,
            avail_short: self.avail_short,
            has_crypto_fee: self.has_crypto_fee,
        }
    }

    /// Resolve credentials from the configured environment variables; absent
    /// variables resolve to empty strings, which public-data paths tolerate.
    pub fn credentials(&self) -> (String, String) {
        (
            std::env::var(&self.key_env).unwrap_or_default(),
            std::env::var(&self.secret_env).unwrap_or_default(),
        )
    }
}
