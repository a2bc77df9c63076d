// src/services/rate_service.rs
//
// Resolução da cotação USD -> BRL usada para precificar orçamentos.
// Prioridade: trava do administrador -> cache (TTL 5 min) -> provedor
// primário -> provedor secundário -> constante de último recurso.
// `resolve()` nunca falha: o chamador sempre recebe um número utilizável.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{
    common::{clock::Clock, error::AppError},
    db::store::ConfigStore,
    models::rates::{ExchangeRateConfig, RateSource, ResolvedRate},
    services::rate_providers::RateProvider,
};

/// Chave da configuração persistida (formato legado, ver models/rates.rs).
pub const RATE_CONFIG_KEY: &str = "cotacao_dolar_config";

/// Última cotação conhecida, usada quando nenhum provedor responde.
pub const STATIC_DEFAULT_RATE: f64 = 5.42;

/// Validade de uma entrada de cache.
const CACHE_TTL_SECONDS: i64 = 5 * 60;

const USD: &str = "USD";
const BRL: &str = "BRL";

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    fetched_at: DateTime<Utc>,
}

// Cache explícito, compartilhado entre requisições. Última escrita vence;
// alguns segundos de defasagem entre threads são aceitáveis.
pub struct RateCache {
    entries: Mutex<HashMap<(String, String), CachedRate>>,
    clock: Arc<dyn Clock>,
}

impl RateCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn get(&self, from: &str, to: &str) -> Option<f64> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(&(from.to_string(), to.to_string()))?;
        let age = self.clock.now() - entry.fetched_at;
        if age < Duration::seconds(CACHE_TTL_SECONDS) {
            Some(entry.rate)
        } else {
            None
        }
    }

    fn set(&self, from: &str, to: &str, rate: f64) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            (from.to_string(), to.to_string()),
            CachedRate {
                rate,
                fetched_at: self.clock.now(),
            },
        );
    }

    fn invalidate(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

// Resultado de uma conversão para a camada de apresentação.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub converted_amount: Decimal,
    pub rate: f64,
    pub source: RateSource,
    pub is_custom: bool,
}

pub struct ExchangeRateService {
    config_store: Arc<dyn ConfigStore>,
    cache: Arc<RateCache>,
    primary: Arc<dyn RateProvider>,
    fallback: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
}

impl ExchangeRateService {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        cache: Arc<RateCache>,
        primary: Arc<dyn RateProvider>,
        fallback: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config_store,
            cache,
            primary,
            fallback,
            clock,
        }
    }

    /// Cotação a usar "agora". Nunca falha e nunca devolve valor não positivo.
    pub async fn resolve(&self) -> ResolvedRate {
        // 1. Trava do administrador: curto-circuita qualquer chamada remota.
        match self.load_config().await {
            Ok(config) => {
                if let Some(rate) = config.fixed_rate_if_enabled() {
                    return ResolvedRate {
                        rate,
                        source: RateSource::Custom,
                    };
                }
            }
            Err(e) => {
                tracing::warn!("Falha ao ler a configuração de cotação: {}", e);
            }
        }

        // 2. Cache ainda dentro do TTL
        if let Some(rate) = self.cache.get(USD, BRL) {
            return ResolvedRate {
                rate,
                source: RateSource::Cache,
            };
        }

        // 3. Provedor primário: sucesso alimenta o cache
        match self.primary.fetch_usd_rate().await {
            Ok(rate) if rate.is_finite() && rate > 0.0 => {
                self.cache.set(USD, BRL, rate);
                return ResolvedRate {
                    rate,
                    source: RateSource::ProviderPrimary,
                };
            }
            Ok(rate) => {
                tracing::warn!(
                    provider = self.primary.name(),
                    "Provedor primário devolveu cotação inválida: {}",
                    rate
                );
            }
            Err(e) => {
                tracing::warn!(provider = self.primary.name(), "Provedor primário falhou: {}", e);
            }
        }

        // 4. Secundário. O cache NÃO é alimentado aqui: leituras de fallback
        // são melhor-esforço e a próxima resolução tenta o primário de novo.
        match self.fallback.fetch_usd_rate().await {
            Ok(rate) if rate.is_finite() && rate > 0.0 => {
                return ResolvedRate {
                    rate,
                    source: RateSource::ProviderFallback,
                };
            }
            Ok(rate) => {
                tracing::warn!(
                    provider = self.fallback.name(),
                    "Provedor secundário devolveu cotação inválida: {}",
                    rate
                );
            }
            Err(e) => {
                tracing::warn!(provider = self.fallback.name(), "Provedor secundário falhou: {}", e);
            }
        }

        // 5. Último recurso: constante conhecida
        tracing::error!(
            "Todos os provedores de cotação falharam; usando o valor padrão {}",
            STATIC_DEFAULT_RATE
        );
        ResolvedRate {
            rate: STATIC_DEFAULT_RATE,
            source: RateSource::StaticDefault,
        }
    }

    /// Descarta o cache e resolve de novo.
    pub async fn refresh(&self) -> ResolvedRate {
        self.cache.invalidate();
        self.resolve().await
    }

    /// Configuração tipada. Linha ausente ou JSON corrompido viram o padrão;
    /// corrupção é logada mas não derruba a precificação.
    pub async fn load_config(&self) -> Result<ExchangeRateConfig, AppError> {
        let Some(value) = self.config_store.get(RATE_CONFIG_KEY).await? else {
            return Ok(ExchangeRateConfig::default());
        };

        match serde_json::from_value(value) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Configuração de cotação corrompida ({}); usando padrão", e);
                Ok(ExchangeRateConfig::default())
            }
        }
    }

    /// Grava a trava do administrador, carimbando `ultimaAtualizacao`.
    pub async fn update_config(
        &self,
        fixed_rate: Option<f64>,
        use_fixed_rate: bool,
    ) -> Result<ExchangeRateConfig, AppError> {
        if use_fixed_rate {
            match fixed_rate {
                Some(rate) if rate.is_finite() && rate > 0.0 => {}
                _ => {
                    return Err(AppError::InvalidInput(
                        "Para usar cotação customizada informe um valor positivo.".to_string(),
                    ));
                }
            }
        }

        let config = ExchangeRateConfig {
            fixed_rate,
            use_fixed_rate,
            last_updated: Some(self.clock.now()),
        };

        let value = serde_json::to_value(&config)
            .map_err(|e| anyhow::anyhow!("Falha ao serializar configuração: {}", e))?;
        self.config_store.put(RATE_CONFIG_KEY, value).await?;

        Ok(config)
    }

    /// Conversão entre USD e BRL para a camada de apresentação.
    /// Arredondamento em 2 casas só na fronteira; o cálculo interno usa a
    /// precisão completa do `Decimal`.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        custom_rate: Option<f64>,
    ) -> Result<Conversion, AppError> {
        let from = from.to_uppercase();
        let to = to.to_uppercase();

        for currency in [&from, &to] {
            if currency != USD && currency != BRL {
                return Err(AppError::InvalidInput(format!(
                    "Moeda não suportada: {}",
                    currency
                )));
            }
        }

        let resolved = match custom_rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => ResolvedRate {
                rate,
                source: RateSource::Custom,
            },
            Some(rate) => {
                return Err(AppError::InvalidInput(format!(
                    "Cotação customizada inválida: {}",
                    rate
                )));
            }
            None => self.resolve().await,
        };

        let rate_decimal = Decimal::from_f64(resolved.rate)
            .ok_or_else(|| anyhow::anyhow!("Cotação não representável: {}", resolved.rate))?;

        let converted = if from == to {
            amount
        } else if from == BRL {
            // BRL -> USD
            amount / rate_decimal
        } else {
            // USD -> BRL
            amount * rate_decimal
        };

        Ok(Conversion {
            converted_amount: converted.round_dp(2),
            rate: resolved.rate,
            source: resolved.source,
            is_custom: resolved.source == RateSource::Custom,
        })
    }
}
