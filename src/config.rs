// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use std::{env, time::Duration};

use crate::common::clock::{Clock, SystemClock};
use crate::db::{
    CatalogRepository, QuotationRepository, RepresentationRepository, SequenceRepository,
    SettingsRepository,
    store::{CatalogStore, ConfigStore, QuotationStore, RepresentationStore, SequenceStore},
};
use crate::services::{
    company_service::CompanyService,
    quotation_service::QuotationService,
    rate_providers::{AwesomeApiProvider, OpenErApiProvider},
    rate_service::{ExchangeRateService, RateCache},
    representation_service::RepresentationService,
    sequence_service::SequenceAllocator,
};

// Timeout das chamadas aos provedores externos de câmbio: uma queda deles
// não pode travar a renderização de orçamentos.
const RATE_PROVIDER_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub rate_service: Arc<ExchangeRateService>,
    pub representation_service: Arc<RepresentationService>,
    pub quotation_service: Arc<QuotationService>,
    pub company_service: Arc<CompanyService>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let catalog: Arc<dyn CatalogStore> = Arc::new(CatalogRepository::new(db_pool.clone()));
        let representations: Arc<dyn RepresentationStore> =
            Arc::new(RepresentationRepository::new(db_pool.clone()));
        let quotations: Arc<dyn QuotationStore> =
            Arc::new(QuotationRepository::new(db_pool.clone()));
        let sequences: Arc<dyn SequenceStore> =
            Arc::new(SequenceRepository::new(db_pool.clone()));
        let settings: Arc<dyn ConfigStore> = Arc::new(SettingsRepository::new(db_pool.clone()));

        let http_client = reqwest::Client::builder()
            .timeout(RATE_PROVIDER_TIMEOUT)
            .build()?;

        let rate_service = Arc::new(ExchangeRateService::new(
            settings,
            Arc::new(RateCache::new(clock.clone())),
            Arc::new(AwesomeApiProvider::new(http_client.clone())),
            Arc::new(OpenErApiProvider::new(http_client)),
            clock.clone(),
        ));

        let representation_service = Arc::new(RepresentationService::new(
            representations,
            catalog.clone(),
            clock.clone(),
        ));

        let quotation_service = Arc::new(QuotationService::new(
            quotations,
            catalog.clone(),
            representation_service.clone(),
            SequenceAllocator::new(sequences, clock.clone()),
            rate_service.clone(),
            clock.clone(),
        ));

        let company_service = Arc::new(CompanyService::new(
            catalog,
            representation_service.clone(),
            clock,
        ));

        Ok(Self {
            db_pool,
            jwt_secret,
            rate_service,
            representation_service,
            quotation_service,
            company_service,
        })
    }
}
