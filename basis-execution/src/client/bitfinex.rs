//! Bitfinex REST execution client with HMAC-SHA384 header authentication.
//!
//! Every authenticated call POSTs an empty body; the JSON payload (request
//! path, nonce and parameters) travels base64-encoded in the `X-BFX-PAYLOAD`
//! header, signed with HMAC-SHA384 into `X-BFX-SIGNATURE`. A non-empty
//! `message` field in any response is a venue-business error.

use crate::{client::ExecutionClient, error::ExecutionError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use basis_instrument::{OrderState, OrderStatus, OrderType, Side};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha384;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.bitfinex.com";

/// Configuration for the Bitfinex execution client.
#[derive(Debug, Clone)]
pub struct BitfinexExecutionConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Instrument tag, e.g. `ltc`.
    pub symbol: String,
    /// Quote currency, e.g. `usd`.
    pub currency: String,
    pub base_url: Option<String>,
}

/// Bitfinex execution client.
#[derive(Clone)]
pub struct BitfinexExecution {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    pair: String,
    base_url: String,
}

impl std::fmt::Debug for BitfinexExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitfinexExecution")
            .field("pair", &self.pair)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct NewOrderRequest {
    request: &'static str,
    nonce: String,
    symbol: String,
    amount: String,
    price: String,
    exchange: &'static str,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: String,
}

#[derive(Debug, Serialize)]
struct OrderRefRequest {
    request: &'static str,
    nonce: String,
    order_id: i64,
}

#[derive(Debug, Deserialize)]
struct NewOrderResponse {
    #[serde(default)]
    order_id: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CancelOrderResponse {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct OrderStatusResponse {
    #[serde(default)]
    is_live: bool,
    #[serde(default)]
    executed_amount: String,
    #[serde(default)]
    message: String,
}

impl BitfinexExecution {
    pub fn new(config: BitfinexExecutionConfig) -> Self {
        let pair = format!(
            "{}{}",
            config.symbol.to_lowercase(),
            config.currency.to_lowercase()
        );
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key,
            api_secret: config.api_secret,
            pair,
            base_url: config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        }
    }

    fn nonce() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos().to_string())
            .unwrap_or_else(|_| "0".into())
    }

    /// Authenticated POST: base64 payload in headers, HMAC-SHA384 signature.
    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        payload: &Req,
    ) -> Result<Resp, ExecutionError> {
        let payload_json =
            serde_json::to_vec(payload).map_err(|e| ExecutionError::Parse(e.to_string()))?;
        let payload_b64 = BASE64.encode(payload_json);

        let mut mac = Hmac::<Sha384>::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;
        mac.update(payload_b64.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let url = format!("{}{path}", self.base_url);
        debug!(%url, "bitfinex signed POST");
        let resp = self
            .http
            .post(&url)
            .header("X-BFX-APIKEY", &self.api_key)
            .header("X-BFX-PAYLOAD", payload_b64)
            .header("X-BFX-SIGNATURE", signature)
            .send()
            .await?;

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ExecutionError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ExecutionClient for BitfinexExecution {
    async fn send_order(
        &self,
        action: Side,
        order_type: OrderType,
        amount: f64,
        price: f64,
    ) -> Result<i64, ExecutionError> {
        let request = NewOrderRequest {
            request: "/v1/order/new",
            nonce: Self::nonce(),
            symbol: self.pair.clone(),
            amount: format!("{amount}"),
            price: format!("{price}"),
            exchange: "bitfinex",
            side: action.as_str(),
            order_type: match order_type {
                OrderType::Limit => "exchange limit".into(),
                OrderType::Market => "exchange market".into(),
            },
        };

        let resp: NewOrderResponse = self.post("/v1/order/new", &request).await?;
        if !resp.message.is_empty() {
            return Err(ExecutionError::venue_message(resp.message));
        }
        Ok(resp.order_id)
    }

    async fn cancel_order(&self, id: i64) -> Result<bool, ExecutionError> {
        let request = OrderRefRequest {
            request: "/v1/order/cancel",
            nonce: Self::nonce(),
            order_id: id,
        };

        let resp: CancelOrderResponse = self.post("/v1/order/cancel", &request).await?;
        if !resp.message.is_empty() {
            return Err(ExecutionError::venue_message(resp.message));
        }
        Ok(true)
    }

    async fn order_status(&self, id: i64) -> Result<OrderStatus, ExecutionError> {
        let request = OrderRefRequest {
            request: "/v1/order/status",
            nonce: Self::nonce(),
            order_id: id,
        };

        let resp: OrderStatusResponse = self.post("/v1/order/status", &request).await?;
        if !resp.message.is_empty() {
            return Err(ExecutionError::venue_message(resp.message));
        }

        let state = if resp.is_live {
            OrderState::Live
        } else {
            OrderState::Dead
        };
        let filled = resp.executed_amount.parse::<f64>().unwrap_or(0.0);
        Ok(OrderStatus::new(state, filled))
    }
}
