// src/services/rate_providers.rs
//
// Provedores externos de câmbio USD -> BRL. O serviço de cotação consome a
// porta `RateProvider`; aqui ficam as duas implementações HTTP reais.
// Falhas destes provedores nunca chegam ao chamador final: o resolvedor
// absorve tudo e segue a cadeia de fallback.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

// Erro interno dos provedores. Nunca atravessa o resolvedor.
#[derive(Debug, Error)]
pub enum RateProviderError {
    #[error("falha de rede: {0}")]
    Network(#[from] reqwest::Error),

    #[error("resposta HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("payload inesperado: {0}")]
    MalformedPayload(String),

    #[error("cotação inválida: {0}")]
    InvalidRate(f64),
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Unidades de moeda local por 1 USD.
    async fn fetch_usd_rate(&self) -> Result<f64, RateProviderError>;
}

fn validate_rate(rate: f64) -> Result<f64, RateProviderError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(RateProviderError::InvalidRate(rate))
    }
}

// --- PROVEDOR PRIMÁRIO: AwesomeAPI ---

const AWESOME_API_BASE_URL: &str = "https://economia.awesomeapi.com.br";

// Formato: { "USDBRL": { "bid": "5.4169", ... } }
#[derive(Debug, Deserialize)]
struct AwesomeApiResponse {
    #[serde(rename = "USDBRL")]
    usd_brl: AwesomeApiQuote,
}

#[derive(Debug, Deserialize)]
struct AwesomeApiQuote {
    bid: String,
}

pub struct AwesomeApiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl AwesomeApiProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: AWESOME_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for AwesomeApiProvider {
    fn name(&self) -> &'static str {
        "AWESOME_API"
    }

    async fn fetch_usd_rate(&self) -> Result<f64, RateProviderError> {
        let url = format!("{}/json/last/USD-BRL", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(RateProviderError::Status(response.status()));
        }

        let payload: AwesomeApiResponse = response
            .json()
            .await
            .map_err(|e| RateProviderError::MalformedPayload(e.to_string()))?;

        // O campo "bid" vem como string
        let rate: f64 = payload
            .usd_brl
            .bid
            .parse()
            .map_err(|_| RateProviderError::MalformedPayload(payload.usd_brl.bid.clone()))?;

        validate_rate(rate)
    }
}

// --- PROVEDOR SECUNDÁRIO: open.er-api.com ---

const OPEN_ER_API_BASE_URL: &str = "https://open.er-api.com";

// Formato: { "result": "success", "rates": { "BRL": 5.41, ... } }
#[derive(Debug, Deserialize)]
struct OpenErApiResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

pub struct OpenErApiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenErApiProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: OPEN_ER_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for OpenErApiProvider {
    fn name(&self) -> &'static str {
        "OPEN_ER_API"
    }

    async fn fetch_usd_rate(&self) -> Result<f64, RateProviderError> {
        let url = format!("{}/v6/latest/USD", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(RateProviderError::Status(response.status()));
        }

        let payload: OpenErApiResponse = response
            .json()
            .await
            .map_err(|e| RateProviderError::MalformedPayload(e.to_string()))?;

        if payload.result != "success" {
            return Err(RateProviderError::MalformedPayload(payload.result));
        }

        let rate = payload
            .rates
            .get("BRL")
            .copied()
            .ok_or_else(|| RateProviderError::MalformedPayload("sem taxa BRL".to_string()))?;

        validate_rate(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_and_non_finite_rates() {
        assert!(validate_rate(5.4169).is_ok());
        assert!(validate_rate(0.0).is_err());
        assert!(validate_rate(-1.2).is_err());
        assert!(validate_rate(f64::NAN).is_err());
        assert!(validate_rate(f64::INFINITY).is_err());
    }

    #[test]
    fn awesome_api_payload_parses() {
        let json = r#"{"USDBRL": {"code": "USD", "bid": "5.4169", "ask": "5.4175"}}"#;
        let payload: AwesomeApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.usd_brl.bid, "5.4169");
    }

    #[test]
    fn open_er_api_payload_parses() {
        let json = r#"{"result": "success", "rates": {"BRL": 5.41, "EUR": 0.92}}"#;
        let payload: OpenErApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.rates.get("BRL"), Some(&5.41));
    }
}
