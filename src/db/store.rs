// src/db/store.rs
//
// Portas de persistência. Os serviços enxergam o banco só através destes
// traits; existe uma implementação Postgres (produção) e uma em memória
// (testes e desenvolvimento local).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        company::{Client, Company, Product, Seller},
        quotation::{Quotation, QuotationItem, QuotationStatus},
        representation::{Representation, RepresentationRequest},
    },
};

// Empresas, vendedores, clientes e produtos. CRUD raso: a parte
// interessante é a trava referencial na remoção de empresas.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_company(&self, company: &Company) -> Result<(), AppError>;
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError>;
    async fn list_companies(&self) -> Result<Vec<Company>, AppError>;
    /// Empresas com vendedores, produtos ou orçamentos não podem ser removidas.
    async fn company_has_dependents(&self, id: Uuid) -> Result<bool, AppError>;
    async fn delete_company(&self, id: Uuid) -> Result<bool, AppError>;

    async fn insert_seller(&self, seller: &Seller) -> Result<(), AppError>;
    async fn find_seller(&self, id: Uuid) -> Result<Option<Seller>, AppError>;

    async fn insert_client(&self, client: &Client) -> Result<(), AppError>;
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError>;

    async fn insert_product(&self, product: &Product) -> Result<(), AppError>;
    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError>;
    async fn list_products_by_companies(
        &self,
        company_ids: &[Uuid],
    ) -> Result<Vec<Product>, AppError>;
}

#[async_trait]
pub trait RepresentationStore: Send + Sync {
    async fn find_representation(&self, id: Uuid) -> Result<Option<Representation>, AppError>;
    async fn find_by_pair(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Representation>, AppError>;
    async fn set_representation_active(
        &self,
        id: Uuid,
        active: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
    /// Empresas com vínculo ativo para o vendedor (escopo de listagens).
    async fn active_company_ids(&self, seller_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    async fn insert_request(&self, request: &RepresentationRequest) -> Result<(), AppError>;
    async fn find_request(&self, id: Uuid) -> Result<Option<RepresentationRequest>, AppError>;
    async fn find_pending_request(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<RepresentationRequest>, AppError>;
    async fn list_pending_requests(&self) -> Result<Vec<RepresentationRequest>, AppError>;
    async fn update_request(&self, request: &RepresentationRequest) -> Result<(), AppError>;

    /// Aprovação: grava a representação (upsert pelo par) e a solicitação
    /// resolvida num único commit. Ou os dois efeitos acontecem, ou nenhum.
    async fn commit_approval(
        &self,
        request: &RepresentationRequest,
        representation: &Representation,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Incremento atômico do contador diário; devolve o valor já incrementado.
    /// Dois chamadores concorrentes nunca observam o mesmo valor.
    async fn next_daily_sequence(&self, day: NaiveDate) -> Result<i32, AppError>;
}

#[async_trait]
pub trait QuotationStore: Send + Sync {
    /// Persiste orçamento e itens num único commit. Colisão no número
    /// único vira `UniqueConstraintViolation` para o chamador decidir repetir.
    async fn insert_quotation(
        &self,
        quotation: &Quotation,
        items: &[QuotationItem],
    ) -> Result<(), AppError>;
    async fn find_quotation(
        &self,
        id: Uuid,
    ) -> Result<Option<(Quotation, Vec<QuotationItem>)>, AppError>;
    async fn list_all(&self) -> Result<Vec<Quotation>, AppError>;
    async fn list_by_companies(&self, company_ids: &[Uuid]) -> Result<Vec<Quotation>, AppError>;
    async fn list_by_client(&self, client_id: Uuid) -> Result<Vec<Quotation>, AppError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: QuotationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

// Configurações genéricas chave/valor (JSON). A configuração de cotação
// vive na chave "cotacao_dolar_config".
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;
    async fn put(&self, key: &str, value: Value) -> Result<(), AppError>;
}
