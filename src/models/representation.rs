// src/models/representation.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE representation_request_status do banco.
// PENDING -> {APPROVED, REJECTED}; os dois últimos são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "representation_request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

// Decisão do administrador sobre uma solicitação pendente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestDecision {
    Approve,
    Reject,
}

// --- ENTIDADES ---

// Vínculo Vendedor x Empresa. No máximo uma linha por par;
// reativar reaproveita a linha existente em vez de duplicar.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Representation {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub company_id: Uuid,

    pub active: bool,

    // Quando nulos, valem os padrões do perfil do vendedor
    pub commission_override: Option<Decimal>,
    pub target_override: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationRequest {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub company_id: Uuid,

    pub message: Option<String>,

    pub status: RequestStatus,

    // Carimbados quando a solicitação sai de PENDING
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

// Resultado de `request_representation`: primeira solicitação passa pela
// aprovação; re-solicitar um vínculo inativo reativa a linha direto.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Submitted(RepresentationRequest),
    Reactivated(Representation),
}
