// src/models/rates.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Origem da cotação devolvida pelo resolvedor. CUSTOM é a trava do
// administrador; STATIC_DEFAULT é o último recurso quando tudo falha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    Custom,
    Cache,
    ProviderPrimary,
    ProviderFallback,
    StaticDefault,
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Custom => "CUSTOM",
            Self::Cache => "CACHE",
            Self::ProviderPrimary => "PROVIDER_PRIMARY",
            Self::ProviderFallback => "PROVIDER_FALLBACK",
            Self::StaticDefault => "STATIC_DEFAULT",
        };
        write!(f, "{}", s)
    }
}

// Cotação resolvida: sempre um número utilizável, nunca um erro.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    // Unidades de moeda local por 1 USD
    pub rate: f64,
    pub source: RateSource,
}

// Configuração persistida na linha "cotacao_dolar_config" da tabela de
// configurações. Os nomes JSON preservam o formato legado gravado no banco.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExchangeRateConfig {
    #[serde(rename = "cotacaoDolar")]
    pub fixed_rate: Option<f64>,

    #[serde(rename = "usarCotacaoCustomizada", default)]
    pub use_fixed_rate: bool,

    #[serde(rename = "ultimaAtualizacao")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        Self {
            fixed_rate: None,
            use_fixed_rate: false,
            last_updated: None,
        }
    }
}

impl ExchangeRateConfig {
    /// A trava só vale com um valor positivo configurado.
    pub fn fixed_rate_if_enabled(&self) -> Option<f64> {
        match self.fixed_rate {
            Some(rate) if self.use_fixed_rate && rate > 0.0 => Some(rate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rate_requires_flag_and_positive_value() {
        let mut config = ExchangeRateConfig::default();
        assert_eq!(config.fixed_rate_if_enabled(), None);

        config.fixed_rate = Some(5.0);
        assert_eq!(config.fixed_rate_if_enabled(), None);

        config.use_fixed_rate = true;
        assert_eq!(config.fixed_rate_if_enabled(), Some(5.0));

        config.fixed_rate = Some(0.0);
        assert_eq!(config.fixed_rate_if_enabled(), None);

        config.fixed_rate = Some(-2.0);
        assert_eq!(config.fixed_rate_if_enabled(), None);
    }

    #[test]
    fn legacy_json_field_names_roundtrip() {
        let json = r#"{"cotacaoDolar": 5.25, "usarCotacaoCustomizada": true, "ultimaAtualizacao": null}"#;
        let config: ExchangeRateConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fixed_rate, Some(5.25));
        assert!(config.use_fixed_rate);

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["cotacaoDolar"], 5.25);
        assert_eq!(back["usarCotacaoCustomizada"], true);
    }
}
