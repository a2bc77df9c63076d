// src/services/company_service.rs
//
// Cadastro básico de empresas, vendedores, clientes e produtos.
// CRUD raso; a regra que importa é a trava referencial na remoção
// de empresas e o escopo da listagem de produtos.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::store::CatalogStore,
    models::{
        auth::{Principal, Role},
        company::{Client, Company, Product, Seller},
    },
    services::representation_service::RepresentationService,
};

const DEFAULT_BASE_CURRENCY: &str = "BRL";
const DEFAULT_COMMISSION: Decimal = Decimal::from_parts(500, 0, 0, false, 2); // 5.00

#[derive(Clone)]
pub struct CompanyService {
    catalog: Arc<dyn CatalogStore>,
    representations: Arc<RepresentationService>,
    clock: Arc<dyn Clock>,
}

impl CompanyService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        representations: Arc<RepresentationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            representations,
            clock,
        }
    }

    pub async fn create_company(
        &self,
        legal_name: String,
        tax_id: String,
        address: Option<String>,
        bank_info: Option<String>,
        brand_color: Option<String>,
        base_currency: Option<String>,
    ) -> Result<Company, AppError> {
        let now = self.clock.now();
        let company = Company {
            id: Uuid::new_v4(),
            legal_name,
            tax_id,
            address,
            bank_info,
            brand_color,
            base_currency: base_currency.unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string()),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_company(&company).await?;
        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.catalog.list_companies().await
    }

    /// Empresas com vendedores, produtos ou orçamentos não podem ser removidas.
    pub async fn delete_company(&self, id: Uuid) -> Result<(), AppError> {
        self.catalog
            .find_company(id)
            .await?
            .ok_or(AppError::NotFound("Empresa"))?;

        if self.catalog.company_has_dependents(id).await? {
            return Err(AppError::InvalidState(
                "A empresa possui vínculos e não pode ser removida.".to_string(),
            ));
        }

        self.catalog.delete_company(id).await?;
        Ok(())
    }

    pub async fn create_seller(
        &self,
        user_id: Uuid,
        full_name: String,
        default_commission: Option<Decimal>,
        default_target: Option<Decimal>,
    ) -> Result<Seller, AppError> {
        let now = self.clock.now();
        let seller = Seller {
            id: Uuid::new_v4(),
            user_id,
            full_name,
            default_commission: default_commission.unwrap_or(DEFAULT_COMMISSION),
            default_target,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_seller(&seller).await?;
        Ok(seller)
    }

    pub async fn create_client(
        &self,
        user_id: Option<Uuid>,
        full_name: String,
        email: Option<String>,
    ) -> Result<Client, AppError> {
        let client = Client {
            id: Uuid::new_v4(),
            user_id,
            full_name,
            email,
            created_at: self.clock.now(),
        };
        self.catalog.insert_client(&client).await?;
        Ok(client)
    }

    pub async fn create_product(
        &self,
        company_id: Uuid,
        name: String,
        unit_price: Decimal,
    ) -> Result<Product, AppError> {
        self.catalog
            .find_company(company_id)
            .await?
            .ok_or(AppError::NotFound("Empresa"))?;

        if unit_price < Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "O preço do produto não pode ser negativo.".to_string(),
            ));
        }

        let product = Product {
            id: Uuid::new_v4(),
            company_id,
            name,
            unit_price,
            active: true,
            created_at: self.clock.now(),
        };
        self.catalog.insert_product(&product).await?;
        Ok(product)
    }

    /// VENDEDOR enxerga só os produtos das empresas que representa;
    /// ADMIN enxerga todos.
    pub async fn list_products(&self, principal: &Principal) -> Result<Vec<Product>, AppError> {
        let company_ids: Vec<Uuid> = match principal.role {
            Role::Admin => self
                .catalog
                .list_companies()
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect(),
            Role::Seller => {
                let seller_id = principal.require_seller_profile()?;
                self.representations.companies_for(seller_id).await?
            }
            Role::Client => {
                return Err(AppError::Forbidden(
                    "Clientes não têm acesso ao catálogo de produtos.".to_string(),
                ));
            }
        };

        if company_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.catalog.list_products_by_companies(&company_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::clock::SystemClock;
    use crate::db::memory::{InMemoryCatalogRepository, InMemoryRepresentationRepository};
    use crate::models::representation::{RequestDecision, RequestOutcome};

    struct Fixture {
        service: CompanyService,
        representations: Arc<RepresentationService>,
    }

    fn fixture() -> Fixture {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let catalog = Arc::new(InMemoryCatalogRepository::new());
        let representations = Arc::new(RepresentationService::new(
            Arc::new(InMemoryRepresentationRepository::new()),
            catalog.clone(),
            clock.clone(),
        ));
        Fixture {
            service: CompanyService::new(catalog, representations.clone(), clock),
            representations,
        }
    }

    #[tokio::test]
    async fn duplicate_tax_id_is_rejected() {
        let f = fixture();

        f.service
            .create_company("Empresa A".into(), "11.111.111/0001-11".into(), None, None, None, None)
            .await
            .unwrap();

        let err = f
            .service
            .create_company("Empresa B".into(), "11.111.111/0001-11".into(), None, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn company_with_products_cannot_be_deleted() {
        let f = fixture();

        let company = f
            .service
            .create_company("Empresa".into(), "11.111.111/0001-11".into(), None, None, None, None)
            .await
            .unwrap();
        f.service
            .create_product(company.id, "Produto".into(), Decimal::new(1000, 2))
            .await
            .unwrap();

        let err = f.service.delete_company(company.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        // Sem vínculos, a remoção passa
        let empty = f
            .service
            .create_company("Vazia".into(), "22.222.222/0001-22".into(), None, None, None, None)
            .await
            .unwrap();
        f.service.delete_company(empty.id).await.unwrap();
    }

    #[tokio::test]
    async fn product_listing_is_scoped_to_represented_companies() {
        let f = fixture();

        let represented = f
            .service
            .create_company("Representada".into(), "11.111.111/0001-11".into(), None, None, None, None)
            .await
            .unwrap();
        let other = f
            .service
            .create_company("Outra".into(), "22.222.222/0001-22".into(), None, None, None, None)
            .await
            .unwrap();
        let seller = f
            .service
            .create_seller(Uuid::new_v4(), "Vendedor".into(), None, None)
            .await
            .unwrap();

        f.service
            .create_product(represented.id, "Visível".into(), Decimal::new(1000, 2))
            .await
            .unwrap();
        f.service
            .create_product(other.id, "Invisível".into(), Decimal::new(1000, 2))
            .await
            .unwrap();

        let outcome = f
            .representations
            .request_representation(seller.id, represented.id, None)
            .await
            .unwrap();
        if let RequestOutcome::Submitted(request) = outcome {
            f.representations
                .resolve_request(request.id, RequestDecision::Approve, Uuid::new_v4())
                .await
                .unwrap();
        }

        let principal = Principal {
            user_id: seller.user_id,
            role: Role::Seller,
            seller_id: Some(seller.id),
            client_id: None,
        };
        let products = f.service.list_products(&principal).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Visível");

        let admin = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
            seller_id: None,
            client_id: None,
        };
        assert_eq!(f.service.list_products(&admin).await.unwrap().len(), 2);
    }
}
