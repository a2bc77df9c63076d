// src/models/quotation.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::rates::RateSource;

// --- ENUMS ---

// Mapeia o CREATE TYPE quotation_status do banco.
//
// DRAFT -> SENT -> {APPROVED, REJECTED, EXPIRED}
//
// Os três últimos são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quotation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Approved,
    Rejected,
    Expired,
}

impl QuotationStatus {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Expired)
    }

    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Sent)
                | (Self::Sent, Self::Approved)
                | (Self::Sent, Self::Rejected)
                | (Self::Sent, Self::Expired)
        )
    }
}

// --- ENTIDADES ---

// Orçamento. Os valores monetários ficam sempre na moeda base da empresa;
// conversão de moeda é assunto de leitura, nunca altera o que está gravado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,

    // Número legível e único, ex.: OPDEXPORT20250917001
    #[schema(example = "OPDEXPORT20250917001")]
    pub number: String,

    pub company_id: Uuid,
    pub seller_id: Uuid,
    pub client_id: Uuid,

    pub status: QuotationStatus,

    #[schema(example = "1250.00")]
    pub subtotal: Decimal,
    #[schema(example = "50.00")]
    pub discount: Decimal,
    #[schema(example = "1200.00")]
    pub total: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItem {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Uuid,

    pub description: String,

    #[schema(example = "10.000")]
    pub quantity: Decimal,
    #[schema(example = "42.50")]
    pub unit_price: Decimal,
    #[schema(example = "425.00")]
    pub line_total: Decimal,
}

// Visão convertida anexada na leitura quando o chamador pede outra moeda.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedTotal {
    #[schema(example = "USD")]
    pub currency: String,
    #[schema(example = "166.15")]
    pub converted_total: Decimal,
    pub exchange_rate: f64,
    pub source: RateSource,
}

// Orçamento completo devolvido pelos endpoints de leitura.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDetail {
    #[serde(flatten)]
    pub quotation: Quotation,

    pub items: Vec<QuotationItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConvertedTotal>,
}
