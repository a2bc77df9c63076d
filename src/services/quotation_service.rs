// src/services/quotation_service.rs
//
// Orquestra a criação e leitura de orçamentos: escopo do principal,
// validação dos itens contra a empresa, alocação do número e totais na
// moeda base. Conversão de moeda só acontece na leitura, nunca muda o que
// está gravado.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::store::{CatalogStore, QuotationStore},
    models::{
        auth::{Principal, Role},
        quotation::{ConvertedTotal, Quotation, QuotationDetail, QuotationItem, QuotationStatus},
    },
    services::{
        rate_service::ExchangeRateService, representation_service::RepresentationService,
        sequence_service::SequenceAllocator,
    },
};

// Colisões de número são o único erro repetido aqui dentro. O contador
// atômico torna a colisão improvável; o índice único é a rede de segurança.
const MAX_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct CreateQuotationInput {
    pub company_id: Uuid,
    /// Obrigatório quando um administrador cria em nome de um vendedor.
    pub seller_id: Option<Uuid>,
    pub client_id: Uuid,
    pub discount: Option<Decimal>,
    pub items: Vec<CreateQuotationItem>,
}

#[derive(Debug, Clone)]
pub struct CreateQuotationItem {
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Quando ausente, vale o preço de tabela do produto.
    pub unit_price: Option<Decimal>,
}

#[derive(Clone)]
pub struct QuotationService {
    quotations: Arc<dyn QuotationStore>,
    catalog: Arc<dyn CatalogStore>,
    representations: Arc<RepresentationService>,
    allocator: SequenceAllocator,
    rates: Arc<ExchangeRateService>,
    clock: Arc<dyn Clock>,
}

impl QuotationService {
    pub fn new(
        quotations: Arc<dyn QuotationStore>,
        catalog: Arc<dyn CatalogStore>,
        representations: Arc<RepresentationService>,
        allocator: SequenceAllocator,
        rates: Arc<ExchangeRateService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quotations,
            catalog,
            representations,
            allocator,
            rates,
            clock,
        }
    }

    pub async fn create_quotation(
        &self,
        principal: &Principal,
        input: CreateQuotationInput,
    ) -> Result<QuotationDetail, AppError> {
        // 1. Autorização de escopo
        let seller_id = match principal.role {
            Role::Seller => {
                let seller_id = principal.require_seller_profile()?;
                if !self
                    .representations
                    .is_representing(seller_id, input.company_id)
                    .await?
                {
                    return Err(AppError::Forbidden(
                        "O vendedor não representa esta empresa.".to_string(),
                    ));
                }
                seller_id
            }
            Role::Admin => input.seller_id.ok_or_else(|| {
                AppError::InvalidInput(
                    "sellerId é obrigatório quando um administrador cria o orçamento."
                        .to_string(),
                )
            })?,
            Role::Client => {
                return Err(AppError::Forbidden(
                    "Clientes não podem criar orçamentos.".to_string(),
                ));
            }
        };

        self.catalog
            .find_company(input.company_id)
            .await?
            .ok_or(AppError::NotFound("Empresa"))?;
        self.catalog
            .find_seller(seller_id)
            .await?
            .ok_or(AppError::NotFound("Vendedor"))?;
        self.catalog
            .find_client(input.client_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        // 2. Itens: existem, pertencem à empresa do orçamento, quantidades válidas
        if input.items.is_empty() {
            return Err(AppError::InvalidInput(
                "O orçamento precisa de ao menos um item.".to_string(),
            ));
        }

        let product_ids: Vec<Uuid> = input.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, _> = self
            .catalog
            .find_products(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut lines = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let product = products.get(&item.product_id).ok_or_else(|| {
                AppError::InvalidInput(format!("Produto {} não existe.", item.product_id))
            })?;

            if product.company_id != input.company_id {
                return Err(AppError::InvalidInput(format!(
                    "O produto '{}' pertence a outra empresa.",
                    product.name
                )));
            }
            if item.quantity <= Decimal::ZERO {
                return Err(AppError::InvalidInput(format!(
                    "Quantidade inválida para o produto '{}'.",
                    product.name
                )));
            }

            let unit_price = item.unit_price.unwrap_or(product.unit_price);
            if unit_price < Decimal::ZERO {
                return Err(AppError::InvalidInput(format!(
                    "Preço inválido para o produto '{}'.",
                    product.name
                )));
            }

            lines.push((
                product.id,
                product.name.clone(),
                item.quantity,
                unit_price,
                (item.quantity * unit_price).round_dp(2),
            ));
        }

        let subtotal: Decimal = lines.iter().map(|(_, _, _, _, total)| *total).sum();
        let discount = input.discount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO || discount > subtotal {
            return Err(AppError::InvalidInput(
                "O desconto deve ficar entre zero e o subtotal.".to_string(),
            ));
        }
        let total = subtotal - discount;

        // 3-5. Aloca o número e persiste tudo num commit. Uma colisão de
        // número (índice único) gera nova tentativa com o próximo número;
        // o número anterior fica como lacuna, o que é aceitável.
        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let number = self.allocator.next_number().await?;
            let now = self.clock.now();

            let quotation = Quotation {
                id: Uuid::new_v4(),
                number,
                company_id: input.company_id,
                seller_id,
                client_id: input.client_id,
                status: QuotationStatus::Draft,
                subtotal,
                discount,
                total,
                created_at: now,
                updated_at: now,
            };
            let items: Vec<QuotationItem> = lines
                .iter()
                .map(
                    |(product_id, description, quantity, unit_price, line_total)| QuotationItem {
                        id: Uuid::new_v4(),
                        quotation_id: quotation.id,
                        product_id: *product_id,
                        description: description.clone(),
                        quantity: *quantity,
                        unit_price: *unit_price,
                        line_total: *line_total,
                    },
                )
                .collect();

            match self.quotations.insert_quotation(&quotation, &items).await {
                Ok(()) => {
                    tracing::info!("Orçamento {} criado para a empresa {}", quotation.number, quotation.company_id);
                    return Ok(QuotationDetail {
                        quotation,
                        items,
                        conversion: None,
                    });
                }
                Err(AppError::UniqueConstraintViolation(msg)) => {
                    tracing::warn!(
                        "Colisão de número de documento ({}), tentativa {}/{}",
                        msg,
                        attempt,
                        MAX_NUMBER_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::SequenceExhausted)
    }

    /// Leitura com checagem de escopo. `currency` pede a visão convertida;
    /// os valores gravados continuam na moeda base da empresa.
    pub async fn get_quotation(
        &self,
        principal: &Principal,
        id: Uuid,
        currency: Option<&str>,
    ) -> Result<QuotationDetail, AppError> {
        let (quotation, items) = self
            .quotations
            .find_quotation(id)
            .await?
            .ok_or(AppError::NotFound("Orçamento"))?;

        self.authorize_read(principal, &quotation).await?;

        let conversion = match currency {
            Some(requested) => {
                let requested = requested.to_uppercase();
                let company = self
                    .catalog
                    .find_company(quotation.company_id)
                    .await?
                    .ok_or(AppError::NotFound("Empresa"))?;

                if requested == company.base_currency {
                    None
                } else {
                    let converted = self
                        .rates
                        .convert(quotation.total, &company.base_currency, &requested, None)
                        .await?;
                    Some(ConvertedTotal {
                        currency: requested,
                        converted_total: converted.converted_amount,
                        exchange_rate: converted.rate,
                        source: converted.source,
                    })
                }
            }
            None => None,
        };

        Ok(QuotationDetail {
            quotation,
            items,
            conversion,
        })
    }

    /// ADMIN enxerga tudo; VENDEDOR só as empresas que representa;
    /// CLIENTE só os próprios orçamentos.
    pub async fn list_quotations(&self, principal: &Principal) -> Result<Vec<Quotation>, AppError> {
        match principal.role {
            Role::Admin => self.quotations.list_all().await,
            Role::Seller => {
                let seller_id = principal.require_seller_profile()?;
                let company_ids = self.representations.companies_for(seller_id).await?;
                if company_ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.quotations.list_by_companies(&company_ids).await
            }
            Role::Client => {
                let client_id = principal.client_id.ok_or_else(|| {
                    AppError::Forbidden("O usuário não possui perfil de cliente.".to_string())
                })?;
                self.quotations.list_by_client(client_id).await
            }
        }
    }

    pub async fn update_status(
        &self,
        principal: &Principal,
        id: Uuid,
        new_status: QuotationStatus,
    ) -> Result<Quotation, AppError> {
        let (quotation, _) = self
            .quotations
            .find_quotation(id)
            .await?
            .ok_or(AppError::NotFound("Orçamento"))?;

        let allowed = match principal.role {
            Role::Admin => true,
            Role::Seller => principal.seller_id == Some(quotation.seller_id),
            Role::Client => false,
        };
        if !allowed {
            return Err(AppError::Forbidden(
                "Sem permissão para alterar este orçamento.".to_string(),
            ));
        }

        if !quotation.status.can_transition_to(new_status) {
            return Err(AppError::InvalidState(format!(
                "Transição de {:?} para {:?} não é permitida.",
                quotation.status, new_status
            )));
        }

        let now = self.clock.now();
        self.quotations.update_status(id, new_status, now).await?;

        Ok(Quotation {
            status: new_status,
            updated_at: now,
            ..quotation
        })
    }

    async fn authorize_read(
        &self,
        principal: &Principal,
        quotation: &Quotation,
    ) -> Result<(), AppError> {
        match principal.role {
            Role::Admin => Ok(()),
            Role::Seller => {
                let seller_id = principal.require_seller_profile()?;
                let company_ids = self.representations.companies_for(seller_id).await?;
                if company_ids.contains(&quotation.company_id) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "O vendedor não representa a empresa deste orçamento.".to_string(),
                    ))
                }
            }
            Role::Client => {
                if principal.client_id == Some(quotation.client_id) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "Este orçamento pertence a outro cliente.".to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::clock::test_support::FixedClock;
    use crate::db::memory::{
        InMemoryCatalogRepository, InMemoryQuotationRepository, InMemoryRepresentationRepository,
        InMemorySequenceRepository, InMemorySettingsRepository,
    };
    use crate::models::company::{Client, Company, Product, Seller};
    use crate::db::store::ConfigStore;
    use crate::models::rates::RateSource;
    use crate::models::representation::{RequestDecision, RequestOutcome};
    use crate::services::rate_providers::{RateProvider, RateProviderError};
    use crate::services::rate_service::{RATE_CONFIG_KEY, RateCache};
    use crate::services::sequence_service::is_valid_document_number;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    struct DeadProvider;

    #[async_trait]
    impl RateProvider for DeadProvider {
        fn name(&self) -> &'static str {
            "DEAD"
        }

        async fn fetch_usd_rate(&self) -> Result<f64, RateProviderError> {
            Err(RateProviderError::MalformedPayload("fora do ar".to_string()))
        }
    }

    struct Fixture {
        service: QuotationService,
        representations: Arc<RepresentationService>,
        settings: Arc<InMemorySettingsRepository>,
        company: Company,
        seller: Seller,
        client: Client,
        product: Product,
        foreign_product: Product,
        admin: Principal,
    }

    impl Fixture {
        fn seller_principal(&self) -> Principal {
            Principal {
                user_id: self.seller.user_id,
                role: Role::Seller,
                seller_id: Some(self.seller.id),
                client_id: None,
            }
        }

        fn client_principal(&self) -> Principal {
            Principal {
                user_id: Uuid::new_v4(),
                role: Role::Client,
                seller_id: None,
                client_id: Some(self.client.id),
            }
        }

        async fn grant_representation(&self) {
            let outcome = self
                .representations
                .request_representation(self.seller.id, self.company.id, None)
                .await
                .unwrap();
            if let RequestOutcome::Submitted(request) = outcome {
                self.representations
                    .resolve_request(request.id, RequestDecision::Approve, self.admin.user_id)
                    .await
                    .unwrap();
            }
        }

        fn input(&self) -> CreateQuotationInput {
            CreateQuotationInput {
                company_id: self.company.id,
                seller_id: None,
                client_id: self.client.id,
                discount: None,
                items: vec![CreateQuotationItem {
                    product_id: self.product.id,
                    quantity: Decimal::new(10, 0),
                    unit_price: None,
                }],
            }
        }
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::at(
            DateTime::parse_from_rfc3339("2025-09-17T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        ));
        let now = clock.now();

        let catalog = Arc::new(InMemoryCatalogRepository::new());
        let representations_repo = Arc::new(InMemoryRepresentationRepository::new());
        let quotations_repo = Arc::new(InMemoryQuotationRepository::new());
        let settings = Arc::new(InMemorySettingsRepository::new());

        let company = Company {
            id: Uuid::new_v4(),
            legal_name: "OPD Export".to_string(),
            tax_id: "11.111.111/0001-11".to_string(),
            address: None,
            bank_info: None,
            brand_color: None,
            base_currency: "BRL".to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let other_company = Company {
            id: Uuid::new_v4(),
            legal_name: "Outra Empresa".to_string(),
            tax_id: "22.222.222/0001-22".to_string(),
            address: None,
            bank_info: None,
            brand_color: None,
            base_currency: "BRL".to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let seller = Seller {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "Vendedora".to_string(),
            default_commission: Decimal::new(500, 2),
            default_target: None,
            active: true,
            created_at: now,
            updated_at: now,
        };
        let client = Client {
            id: Uuid::new_v4(),
            user_id: None,
            full_name: "Cliente Final".to_string(),
            email: None,
            created_at: now,
        };
        let product = Product {
            id: Uuid::new_v4(),
            company_id: company.id,
            name: "Café torrado 1kg".to_string(),
            unit_price: Decimal::new(9000, 2), // 90.00
            active: true,
            created_at: now,
        };
        let foreign_product = Product {
            id: Uuid::new_v4(),
            company_id: other_company.id,
            name: "Produto alheio".to_string(),
            unit_price: Decimal::new(1000, 2),
            active: true,
            created_at: now,
        };

        catalog.insert_company(&company).await.unwrap();
        catalog.insert_company(&other_company).await.unwrap();
        catalog.insert_seller(&seller).await.unwrap();
        catalog.insert_client(&client).await.unwrap();
        catalog.insert_product(&product).await.unwrap();
        catalog.insert_product(&foreign_product).await.unwrap();

        let representations = Arc::new(RepresentationService::new(
            representations_repo,
            catalog.clone(),
            clock.clone(),
        ));
        let allocator = SequenceAllocator::new(
            Arc::new(InMemorySequenceRepository::new()),
            clock.clone(),
        );
        let rates = Arc::new(ExchangeRateService::new(
            settings.clone(),
            Arc::new(RateCache::new(clock.clone())),
            Arc::new(DeadProvider),
            Arc::new(DeadProvider),
            clock.clone(),
        ));

        let service = QuotationService::new(
            quotations_repo,
            catalog,
            representations.clone(),
            allocator,
            rates,
            clock,
        );

        Fixture {
            service,
            representations,
            settings,
            admin: Principal {
                user_id: Uuid::new_v4(),
                role: Role::Admin,
                seller_id: None,
                client_id: None,
            },
            company,
            seller,
            client,
            product,
            foreign_product,
        }
    }

    #[tokio::test]
    async fn seller_without_representation_is_forbidden() {
        let f = fixture().await;

        let err = f
            .service
            .create_quotation(&f.seller_principal(), f.input())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn approved_seller_creates_numbered_quotation() {
        let f = fixture().await;
        f.grant_representation().await;

        let first = f
            .service
            .create_quotation(&f.seller_principal(), f.input())
            .await
            .unwrap();
        assert!(is_valid_document_number(&first.quotation.number));
        assert_eq!(first.quotation.number, "OPDEXPORT20250917001");
        assert_eq!(first.quotation.subtotal, Decimal::new(90000, 2)); // 10 x 90.00
        assert_eq!(first.quotation.total, Decimal::new(90000, 2));
        assert_eq!(first.quotation.status, QuotationStatus::Draft);
        assert_eq!(first.items.len(), 1);

        // Segundo orçamento no mesmo dia: número distinto
        let second = f
            .service
            .create_quotation(&f.seller_principal(), f.input())
            .await
            .unwrap();
        assert_eq!(second.quotation.number, "OPDEXPORT20250917002");
        assert_ne!(first.quotation.number, second.quotation.number);
    }

    #[tokio::test]
    async fn cross_company_product_is_rejected() {
        let f = fixture().await;
        f.grant_representation().await;

        let mut input = f.input();
        input.items.push(CreateQuotationItem {
            product_id: f.foreign_product.id,
            quantity: Decimal::ONE,
            unit_price: None,
        });

        let err = f
            .service
            .create_quotation(&f.seller_principal(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn admin_must_name_the_acting_seller() {
        let f = fixture().await;

        let err = f
            .service
            .create_quotation(&f.admin, f.input())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let mut input = f.input();
        input.seller_id = Some(f.seller.id);
        let created = f.service.create_quotation(&f.admin, input).await.unwrap();
        assert_eq!(created.quotation.seller_id, f.seller.id);
    }

    #[tokio::test]
    async fn discount_is_bounded_by_subtotal() {
        let f = fixture().await;
        f.grant_representation().await;

        let mut input = f.input();
        input.discount = Some(Decimal::new(100_000_00, 2));
        let err = f
            .service
            .create_quotation(&f.seller_principal(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let mut input = f.input();
        input.discount = Some(Decimal::new(5000, 2)); // 50.00
        let created = f
            .service
            .create_quotation(&f.seller_principal(), input)
            .await
            .unwrap();
        assert_eq!(created.quotation.total, Decimal::new(85000, 2));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let f = fixture().await;
        f.grant_representation().await;

        f.service
            .create_quotation(&f.seller_principal(), f.input())
            .await
            .unwrap();

        // Vendedor com vínculo enxerga o orçamento
        let seller_view = f.service.list_quotations(&f.seller_principal()).await.unwrap();
        assert_eq!(seller_view.len(), 1);

        // Admin enxerga tudo
        let admin_view = f.service.list_quotations(&f.admin).await.unwrap();
        assert_eq!(admin_view.len(), 1);

        // Cliente enxerga os próprios
        let client_view = f.service.list_quotations(&f.client_principal()).await.unwrap();
        assert_eq!(client_view.len(), 1);

        // Outro cliente não enxerga nada
        let stranger = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Client,
            seller_id: None,
            client_id: Some(Uuid::new_v4()),
        };
        assert!(f.service.list_quotations(&stranger).await.unwrap().is_empty());

        // Vendedor sem vínculo não enxerga nada
        let other_seller = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Seller,
            seller_id: Some(Uuid::new_v4()),
            client_id: None,
        };
        assert!(f.service.list_quotations(&other_seller).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn converted_view_does_not_mutate_stored_totals() {
        let f = fixture().await;
        f.grant_representation().await;

        // Trava do administrador: cotação determinística para o teste
        f.settings
            .put(
                RATE_CONFIG_KEY,
                json!({"cotacaoDolar": 5.4169, "usarCotacaoCustomizada": true, "ultimaAtualizacao": null}),
            )
            .await
            .unwrap();

        let created = f
            .service
            .create_quotation(&f.seller_principal(), f.input())
            .await
            .unwrap();

        let viewed = f
            .service
            .get_quotation(&f.seller_principal(), created.quotation.id, Some("USD"))
            .await
            .unwrap();

        let conversion = viewed.conversion.unwrap();
        assert_eq!(conversion.currency, "USD");
        assert_eq!(conversion.source, RateSource::Custom);
        // 900.00 / 5.4169 = 166.1466... -> 166.15 na fronteira
        assert_eq!(conversion.converted_total, Decimal::new(16615, 2));

        // O valor gravado continua na moeda base
        assert_eq!(viewed.quotation.total, Decimal::new(90000, 2));

        let raw = f
            .service
            .get_quotation(&f.seller_principal(), created.quotation.id, None)
            .await
            .unwrap();
        assert!(raw.conversion.is_none());
        assert_eq!(raw.quotation.total, Decimal::new(90000, 2));
    }

    #[tokio::test]
    async fn status_transitions_follow_the_machine() {
        let f = fixture().await;
        f.grant_representation().await;

        let created = f
            .service
            .create_quotation(&f.seller_principal(), f.input())
            .await
            .unwrap();
        let id = created.quotation.id;

        // DRAFT não pula direto para APPROVED
        let err = f
            .service
            .update_status(&f.seller_principal(), id, QuotationStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let sent = f
            .service
            .update_status(&f.seller_principal(), id, QuotationStatus::Sent)
            .await
            .unwrap();
        assert_eq!(sent.status, QuotationStatus::Sent);

        let approved = f
            .service
            .update_status(&f.admin, id, QuotationStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, QuotationStatus::Approved);

        // Estado terminal travado
        let err = f
            .service
            .update_status(&f.admin, id, QuotationStatus::Sent)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn client_cannot_read_another_clients_quotation() {
        let f = fixture().await;
        f.grant_representation().await;

        let created = f
            .service
            .create_quotation(&f.seller_principal(), f.input())
            .await
            .unwrap();

        let stranger = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Client,
            seller_id: None,
            client_id: Some(Uuid::new_v4()),
        };
        let err = f
            .service
            .get_quotation(&stranger, created.quotation.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let owner_view = f
            .service
            .get_quotation(&f.client_principal(), created.quotation.id, None)
            .await
            .unwrap();
        assert_eq!(owner_view.quotation.client_id, f.client.id);
    }
}
