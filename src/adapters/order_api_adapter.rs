//! Order submission adapters.
//!
//! [`HttpOrderAdapter`] posts a JSON order to the execution endpoint.
//! [`PaperOrderAdapter`] is used in test mode and only logs.

use crate::domain::error::TrailguardError;
use crate::ports::config_port::ConfigPort;
use crate::ports::order_port::{OrderPort, OrderSide};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Exchange pair name on the execution side: `BTCUSDT` → `BTCUSD`.
pub fn trade_pair(symbol: &str) -> String {
    symbol.replace("USDT", "USD")
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OrderRequest<'a> {
    pub trade_pair: String,
    pub order_type: String,
    pub leverage: f64,
    pub api_key: &'a str,
}

pub struct HttpOrderAdapter {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl HttpOrderAdapter {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, TrailguardError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrailguardError::ConfigInvalid {
                section: "orders".into(),
                key: "url".into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrailguardError> {
        let url = config
            .get_string("orders", "url")
            .ok_or_else(|| TrailguardError::ConfigMissing {
                section: "orders".into(),
                key: "url".into(),
            })?;
        let api_key =
            config
                .get_string("orders", "api_key")
                .ok_or_else(|| TrailguardError::ConfigMissing {
                    section: "orders".into(),
                    key: "api_key".into(),
                })?;
        let timeout = config.get_int("market", "timeout_seconds", 10).max(1) as u64;
        Self::new(&url, &api_key, Duration::from_secs(timeout))
    }

    pub fn request<'a>(&'a self, symbol: &str, side: OrderSide, leverage: f64) -> OrderRequest<'a> {
        OrderRequest {
            trade_pair: trade_pair(symbol),
            order_type: side.to_string(),
            leverage,
            api_key: &self.api_key,
        }
    }
}

impl OrderPort for HttpOrderAdapter {
    fn submit(&self, symbol: &str, side: OrderSide, leverage: f64) -> Result<(), TrailguardError> {
        let body = self.request(symbol, side, leverage);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| TrailguardError::Order {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            warn!(symbol, %side, %status, "order endpoint rejected request");
            return Err(TrailguardError::Order {
                symbol: symbol.to_string(),
                reason: format!("HTTP {status}: {text}"),
            });
        }

        info!(symbol, pair = %body.trade_pair, %side, leverage, "order submitted");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PaperOrderAdapter;

impl OrderPort for PaperOrderAdapter {
    fn submit(&self, symbol: &str, side: OrderSide, leverage: f64) -> Result<(), TrailguardError> {
        info!(
            symbol,
            pair = %trade_pair(symbol),
            %side,
            leverage,
            "[TEST MODE] order not sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_usdt_pairs() {
        assert_eq!(trade_pair("BTCUSDT"), "BTCUSD");
        assert_eq!(trade_pair("ETHBTC"), "ETHBTC");
    }

    #[test]
    fn request_body_shape() {
        let adapter =
            HttpOrderAdapter::new("http://127.0.0.1:1/api", "secret", Duration::from_secs(1))
                .unwrap();
        let body = adapter.request("SOLUSDT", OrderSide::Flat, 0.1);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "trade_pair": "SOLUSD",
                "order_type": "FLAT",
                "leverage": 0.1,
                "api_key": "secret",
            })
        );
    }

    #[test]
    fn unreachable_endpoint_is_order_error() {
        let adapter =
            HttpOrderAdapter::new("http://127.0.0.1:1/api", "secret", Duration::from_secs(1))
                .unwrap();
        let err = adapter.submit("BTCUSDT", OrderSide::Long, 0.1).unwrap_err();
        assert!(matches!(err, TrailguardError::Order { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn paper_orders_always_succeed() {
        assert!(PaperOrderAdapter.submit("BTCUSDT", OrderSide::Short, 0.1).is_ok());
    }
}
