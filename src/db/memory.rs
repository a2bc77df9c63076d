// src/db/memory.rs
//
// Implementações em memória das portas de persistência. Usadas pelos testes
// e por desenvolvimento local sem Postgres. `HashMap` atrás de `RwLock`;
// as operações compostas seguram um único write-lock, o que reproduz a
// atomicidade que a implementação Postgres obtém via transação.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{CatalogStore, ConfigStore, QuotationStore, RepresentationStore, SequenceStore},
    models::{
        company::{Client, Company, Product, Seller},
        quotation::{Quotation, QuotationItem, QuotationStatus},
        representation::{Representation, RepresentationRequest},
    },
};

// --- CATÁLOGO ---

#[derive(Default)]
struct CatalogState {
    companies: HashMap<Uuid, Company>,
    sellers: HashMap<Uuid, Seller>,
    clients: HashMap<Uuid, Client>,
    products: HashMap<Uuid, Product>,
}

#[derive(Clone, Default)]
pub struct InMemoryCatalogRepository {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogRepository {
    async fn insert_company(&self, company: &Company) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.companies.values().any(|c| c.tax_id == company.tax_id) {
            return Err(AppError::UniqueConstraintViolation(format!(
                "CNPJ '{}' já cadastrado.",
                company.tax_id
            )));
        }
        state.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let state = self.state.read().await;
        Ok(state.companies.get(&id).cloned())
    }

    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let state = self.state.read().await;
        let mut companies: Vec<Company> = state.companies.values().cloned().collect();
        companies.sort_by(|a, b| a.legal_name.cmp(&b.legal_name));
        Ok(companies)
    }

    async fn company_has_dependents(&self, id: Uuid) -> Result<bool, AppError> {
        // Este store só enxerga o catálogo; produtos são o vínculo visível
        // aqui. A consulta Postgres também cobre representações e orçamentos.
        let state = self.state.read().await;
        Ok(state.products.values().any(|p| p.company_id == id))
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        Ok(state.companies.remove(&id).is_some())
    }

    async fn insert_seller(&self, seller: &Seller) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.sellers.values().any(|s| s.user_id == seller.user_id) {
            return Err(AppError::UniqueConstraintViolation(
                "Este usuário já possui perfil de vendedor.".to_string(),
            ));
        }
        state.sellers.insert(seller.id, seller.clone());
        Ok(())
    }

    async fn find_seller(&self, id: Uuid) -> Result<Option<Seller>, AppError> {
        let state = self.state.read().await;
        Ok(state.sellers.get(&id).cloned())
    }

    async fn insert_client(&self, client: &Client) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let state = self.state.read().await;
        Ok(state.clients.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn list_products_by_companies(
        &self,
        company_ids: &[Uuid],
    ) -> Result<Vec<Product>, AppError> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| company_ids.contains(&p.company_id))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

// --- REPRESENTAÇÕES ---

#[derive(Default)]
struct RepresentationState {
    representations: HashMap<Uuid, Representation>,
    requests: HashMap<Uuid, RepresentationRequest>,
}

#[derive(Clone, Default)]
pub struct InMemoryRepresentationRepository {
    state: Arc<RwLock<RepresentationState>>,
}

impl InMemoryRepresentationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepresentationStore for InMemoryRepresentationRepository {
    async fn find_representation(&self, id: Uuid) -> Result<Option<Representation>, AppError> {
        let state = self.state.read().await;
        Ok(state.representations.get(&id).cloned())
    }

    async fn find_by_pair(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Representation>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .representations
            .values()
            .find(|r| r.seller_id == seller_id && r.company_id == company_id)
            .cloned())
    }

    async fn set_representation_active(
        &self,
        id: Uuid,
        active: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.representations.get_mut(&id) {
            Some(representation) => {
                representation.active = active;
                representation.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn active_company_ids(&self, seller_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .representations
            .values()
            .filter(|r| r.seller_id == seller_id && r.active)
            .map(|r| r.company_id)
            .collect())
    }

    async fn insert_request(&self, request: &RepresentationRequest) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<RepresentationRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state.requests.get(&id).cloned())
    }

    async fn find_pending_request(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<RepresentationRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .requests
            .values()
            .find(|r| {
                r.seller_id == seller_id
                    && r.company_id == company_id
                    && !r.status.is_terminal()
            })
            .cloned())
    }

    async fn list_pending_requests(&self) -> Result<Vec<RepresentationRequest>, AppError> {
        let state = self.state.read().await;
        let mut pending: Vec<RepresentationRequest> = state
            .requests
            .values()
            .filter(|r| !r.status.is_terminal())
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn update_request(&self, request: &RepresentationRequest) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn commit_approval(
        &self,
        request: &RepresentationRequest,
        representation: &Representation,
    ) -> Result<(), AppError> {
        // Um único write-lock cobre os dois efeitos.
        let mut state = self.state.write().await;

        // Upsert pelo par (vendedor, empresa): reaproveita a linha existente.
        let existing_id = state
            .representations
            .values()
            .find(|r| {
                r.seller_id == representation.seller_id
                    && r.company_id == representation.company_id
            })
            .map(|r| r.id);

        match existing_id {
            Some(id) => {
                if let Some(row) = state.representations.get_mut(&id) {
                    row.active = representation.active;
                    row.updated_at = representation.updated_at;
                }
            }
            None => {
                state
                    .representations
                    .insert(representation.id, representation.clone());
            }
        }

        state.requests.insert(request.id, request.clone());
        Ok(())
    }
}

// --- SEQUÊNCIA DIÁRIA ---

#[derive(Clone, Default)]
pub struct InMemorySequenceRepository {
    counters: Arc<Mutex<HashMap<NaiveDate, i32>>>,
}

impl InMemorySequenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceRepository {
    async fn next_daily_sequence(&self, day: NaiveDate) -> Result<i32, AppError> {
        let mut counters = self.counters.lock().await;
        let seq = counters.entry(day).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}

// --- ORÇAMENTOS ---

#[derive(Default)]
struct QuotationState {
    quotations: HashMap<Uuid, Quotation>,
    items: HashMap<Uuid, Vec<QuotationItem>>,
    numbers: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct InMemoryQuotationRepository {
    state: Arc<RwLock<QuotationState>>,
}

impl InMemoryQuotationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotationStore for InMemoryQuotationRepository {
    async fn insert_quotation(
        &self,
        quotation: &Quotation,
        items: &[QuotationItem],
    ) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if !state.numbers.insert(quotation.number.clone()) {
            return Err(AppError::UniqueConstraintViolation(format!(
                "Número de documento '{}' já utilizado.",
                quotation.number
            )));
        }
        state.quotations.insert(quotation.id, quotation.clone());
        state.items.insert(quotation.id, items.to_vec());
        Ok(())
    }

    async fn find_quotation(
        &self,
        id: Uuid,
    ) -> Result<Option<(Quotation, Vec<QuotationItem>)>, AppError> {
        let state = self.state.read().await;
        Ok(state.quotations.get(&id).cloned().map(|quotation| {
            let items = state.items.get(&id).cloned().unwrap_or_default();
            (quotation, items)
        }))
    }

    async fn list_all(&self) -> Result<Vec<Quotation>, AppError> {
        let state = self.state.read().await;
        let mut quotations: Vec<Quotation> = state.quotations.values().cloned().collect();
        quotations.sort_by_key(|q| std::cmp::Reverse(q.created_at));
        Ok(quotations)
    }

    async fn list_by_companies(&self, company_ids: &[Uuid]) -> Result<Vec<Quotation>, AppError> {
        let state = self.state.read().await;
        let mut quotations: Vec<Quotation> = state
            .quotations
            .values()
            .filter(|q| company_ids.contains(&q.company_id))
            .cloned()
            .collect();
        quotations.sort_by_key(|q| std::cmp::Reverse(q.created_at));
        Ok(quotations)
    }

    async fn list_by_client(&self, client_id: Uuid) -> Result<Vec<Quotation>, AppError> {
        let state = self.state.read().await;
        let mut quotations: Vec<Quotation> = state
            .quotations
            .values()
            .filter(|q| q.client_id == client_id)
            .cloned()
            .collect();
        quotations.sort_by_key(|q| std::cmp::Reverse(q.created_at));
        Ok(quotations)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: QuotationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state.quotations.get_mut(&id) {
            Some(quotation) => {
                quotation.status = status;
                quotation.updated_at = updated_at;
                Ok(())
            }
            None => Err(AppError::NotFound("Orçamento")),
        }
    }
}

// --- CONFIGURAÇÕES ---

#[derive(Clone, Default)]
pub struct InMemorySettingsRepository {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for InMemorySettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), AppError> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn daily_sequence_increments_per_day() {
        let repo = InMemorySequenceRepository::new();
        let day1 = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2025, 9, 18).unwrap();

        assert_eq!(repo.next_daily_sequence(day1).await.unwrap(), 1);
        assert_eq!(repo.next_daily_sequence(day1).await.unwrap(), 2);
        assert_eq!(repo.next_daily_sequence(day2).await.unwrap(), 1);
        assert_eq!(repo.next_daily_sequence(day1).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn approval_commit_reuses_existing_pair_row() {
        let repo = InMemoryRepresentationRepository::new();
        let seller_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let now = Utc::now();

        let original = Representation {
            id: Uuid::new_v4(),
            seller_id,
            company_id,
            active: false,
            commission_override: None,
            target_override: None,
            created_at: now,
            updated_at: now,
        };
        repo.commit_approval(
            &RepresentationRequest {
                id: Uuid::new_v4(),
                seller_id,
                company_id,
                message: None,
                status: crate::models::representation::RequestStatus::Approved,
                resolved_by: Some(Uuid::new_v4()),
                resolved_at: Some(now),
                created_at: now,
            },
            &original,
        )
        .await
        .unwrap();

        // Segunda aprovação para o mesmo par chega com outro id de linha;
        // a linha original deve ser reaproveitada, não duplicada.
        let replacement = Representation {
            id: Uuid::new_v4(),
            active: true,
            updated_at: now,
            ..original.clone()
        };
        repo.commit_approval(
            &RepresentationRequest {
                id: Uuid::new_v4(),
                seller_id,
                company_id,
                message: None,
                status: crate::models::representation::RequestStatus::Approved,
                resolved_by: Some(Uuid::new_v4()),
                resolved_at: Some(now),
                created_at: now,
            },
            &replacement,
        )
        .await
        .unwrap();

        let found = repo.find_by_pair(seller_id, company_id).await.unwrap().unwrap();
        assert_eq!(found.id, original.id);
        assert!(found.active);
    }

    #[tokio::test]
    async fn duplicate_quotation_number_is_rejected() {
        let repo = InMemoryQuotationRepository::new();
        let now = Utc::now();
        let quotation = Quotation {
            id: Uuid::new_v4(),
            number: "OPDEXPORT20250917001".to_string(),
            company_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            status: QuotationStatus::Draft,
            subtotal: rust_decimal::Decimal::ZERO,
            discount: rust_decimal::Decimal::ZERO,
            total: rust_decimal::Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };

        repo.insert_quotation(&quotation, &[]).await.unwrap();

        let clash = Quotation {
            id: Uuid::new_v4(),
            ..quotation.clone()
        };
        let err = repo.insert_quotation(&clash, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }
}
