//! OKCoin REST execution client with MD5 query-signature authentication.
//!
//! Orders are form-POSTs against `trade.do` / `cancel_order.do` /
//! `order_info.do`. Every request carries an uppercase-hex MD5 signature of
//! the alphabetically ordered parameters with the secret key appended.

use crate::{client::ExecutionClient, error::ExecutionError};
use async_trait::async_trait;
use basis_instrument::{OrderState, OrderStatus, OrderType, Side};
use md5::{Digest, Md5};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Configuration for the OKCoin execution client.
#[derive(Debug, Clone)]
pub struct OkCoinExecutionConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Instrument tag, e.g. `ltc`.
    pub symbol: String,
    /// Quote currency, `usd` or `cny`; selects the REST host.
    pub currency: String,
    pub rest_url: String,
}

impl OkCoinExecutionConfig {
    /// REST base for the given quote currency.
    pub fn default_rest_url(currency: &str) -> &'static str {
        if currency.eq_ignore_ascii_case("cny") {
            "https://www.okcoin.cn/api/v1"
        } else {
            "https://www.okcoin.com/api/v1"
        }
    }
}

/// OKCoin execution client.
#[derive(Clone)]
pub struct OkCoinExecution {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    pair: String,
    rest_url: String,
}

impl std::fmt::Debug for OkCoinExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OkCoinExecution")
            .field("pair", &self.pair)
            .field("rest_url", &self.rest_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TradeResponse {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    order_id: i64,
    #[serde(default)]
    error_code: i64,
}

#[derive(Debug, Deserialize)]
struct CancelResponse {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    error_code: i64,
}

#[derive(Debug, Deserialize)]
struct OrderInfoResponse {
    #[serde(default)]
    orders: Vec<OrderInfo>,
    #[serde(default)]
    error_code: i64,
}

#[derive(Debug, Deserialize)]
struct OrderInfo {
    status: i64,
    deal_amount: f64,
}

impl OkCoinExecution {
    pub fn new(config: OkCoinExecutionConfig) -> Self {
        let pair = format!(
            "{}_{}",
            config.symbol.to_lowercase(),
            config.currency.to_lowercase()
        );
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key,
            api_secret: config.api_secret,
            pair,
            rest_url: config.rest_url,
        }
    }

    /// Uppercase-hex MD5 over the sorted query string with the secret
    /// appended as `&secret_key=...`.
    fn sign(&self, params: &BTreeMap<String, String>) -> String {
        let query: String = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let payload = format!("{query}&secret_key={}", self.api_secret);
        let digest = Md5::digest(payload.as_bytes());
        hex::encode_upper(digest)
    }

    /// Signed form POST returning the raw body.
    async fn post(
        &self,
        endpoint: &str,
        mut params: BTreeMap<String, String>,
    ) -> Result<String, ExecutionError> {
        params.insert("api_key".into(), self.api_key.clone());
        let sign = self.sign(&params);
        params.insert("sign".into(), sign);

        let url = format!("{}/{endpoint}", self.rest_url);
        debug!(%url, "okcoin signed POST");
        let resp = self.http.post(&url).form(&params).send().await?;
        if !resp.status().is_success() {
            return Err(ExecutionError::Transport(resp.status().to_string()));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl ExecutionClient for OkCoinExecution {
    async fn send_order(
        &self,
        action: Side,
        order_type: OrderType,
        amount: f64,
        price: f64,
    ) -> Result<i64, ExecutionError> {
        let mut params = BTreeMap::new();
        params.insert("symbol".into(), self.pair.clone());
        // Limit orders use the bare side; market orders suffix it.
        let order_tag = match order_type {
            OrderType::Limit => action.as_str().to_string(),
            OrderType::Market => format!("{}_market", action.as_str()),
        };
        params.insert("type".into(), order_tag);
        params.insert("price".into(), format!("{price}"));
        params.insert("amount".into(), format!("{amount}"));

        let body = self.post("trade.do", params).await?;
        let resp: TradeResponse =
            serde_json::from_str(&body).map_err(|e| ExecutionError::Parse(e.to_string()))?;

        if resp.error_code != 0 {
            return Err(ExecutionError::venue_code(resp.error_code));
        }
        if !resp.result {
            return Err(ExecutionError::venue_message("order not accepted"));
        }
        Ok(resp.order_id)
    }

    async fn cancel_order(&self, id: i64) -> Result<bool, ExecutionError> {
        let mut params = BTreeMap::new();
        params.insert("symbol".into(), self.pair.clone());
        params.insert("order_id".into(), id.to_string());

        let body = self.post("cancel_order.do", params).await?;
        let resp: CancelResponse =
            serde_json::from_str(&body).map_err(|e| ExecutionError::Parse(e.to_string()))?;

        if resp.error_code != 0 {
            return Err(ExecutionError::venue_code(resp.error_code));
        }
        Ok(resp.result)
    }

    async fn order_status(&self, id: i64) -> Result<OrderStatus, ExecutionError> {
        let mut params = BTreeMap::new();
        params.insert("symbol".into(), self.pair.clone());
        params.insert("order_id".into(), id.to_string());

        let body = self.post("order_info.do", params).await?;
        let resp: OrderInfoResponse =
            serde_json::from_str(&body).map_err(|e| ExecutionError::Parse(e.to_string()))?;

        if resp.error_code != 0 {
            return Err(ExecutionError::venue_code(resp.error_code));
        }
        let order = resp
            .orders
            .first()
            .ok_or_else(|| ExecutionError::Parse("empty orders array".into()))?;

        Ok(OrderStatus::new(
            order_state_from_code(order.status),
            order.deal_amount,
        ))
    }
}

/// -1 cancelled and 2 fully filled are terminal; 4 cancel-in-progress and 5
/// cancel-requested are transient.
fn order_state_from_code(status: i64) -> OrderState {
    match status {
        -1 | 2 => OrderState::Dead,
        4 | 5 => OrderState::Unknown,
        _ => OrderState::Live,
    }
}
