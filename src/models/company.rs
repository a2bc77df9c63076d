// src/models/company.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Empresa (tenant). Nunca é removida enquanto possuir vendedores,
// produtos ou orçamentos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,

    #[schema(example = "OPD Export Ltda")]
    pub legal_name: String,

    // CNPJ, único no sistema
    #[schema(example = "12.345.678/0001-99")]
    pub tax_id: String,

    pub address: Option<String>,
    pub bank_info: Option<String>,

    #[schema(example = "#0A4D8C")]
    pub brand_color: Option<String>,

    // Moeda em que os valores desta empresa são armazenados
    #[schema(example = "BRL")]
    pub base_currency: String,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: Uuid,

    // Identidade do usuário (resolvida pelo provedor de autenticação)
    pub user_id: Uuid,

    #[schema(example = "João Pereira")]
    pub full_name: String,

    // Comissão padrão aplicada às representações aprovadas
    #[schema(example = "5.00")]
    pub default_commission: Decimal,
    pub default_target: Option<Decimal>,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    // Todo produto pertence a exatamente uma empresa
    pub company_id: Uuid,

    #[schema(example = "Café torrado 1kg")]
    pub name: String,

    #[schema(example = "42.50")]
    pub unit_price: Decimal,

    pub active: bool,
    pub created_at: DateTime<Utc>,
}
