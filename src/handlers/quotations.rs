// src/handlers/quotations.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::quotation::{Quotation, QuotationDetail, QuotationStatus},
    services::quotation_service::{CreateQuotationInput, CreateQuotationItem},
};

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItemPayload {
    pub product_id: Uuid,

    #[schema(example = "10")]
    pub quantity: Decimal,

    /// Quando ausente, vale o preço de tabela do produto
    #[schema(example = "42.50")]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationPayload {
    pub company_id: Uuid,

    /// Obrigatório quando um administrador cria em nome de um vendedor
    pub seller_id: Option<Uuid>,

    pub client_id: Uuid,

    #[schema(example = "50.00")]
    pub discount: Option<Decimal>,

    #[validate(length(min = 1, message = "O orçamento precisa de ao menos um item"))]
    pub items: Vec<QuotationItemPayload>,
}

// POST /api/quotations
#[utoipa::path(
    post,
    path = "/api/quotations",
    tag = "Quotations",
    request_body = CreateQuotationPayload,
    responses(
        (status = 201, description = "Orçamento criado", body = QuotationDetail),
        (status = 400, description = "Itens inválidos ou de outra empresa"),
        (status = 403, description = "Vendedor sem representação para a empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_quotation(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateQuotationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let input = CreateQuotationInput {
        company_id: payload.company_id,
        seller_id: payload.seller_id,
        client_id: payload.client_id,
        discount: payload.discount,
        items: payload
            .items
            .into_iter()
            .map(|item| CreateQuotationItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
    };

    let detail = app_state
        .quotation_service
        .create_quotation(&principal, input)
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/quotations
#[utoipa::path(
    get,
    path = "/api/quotations",
    tag = "Quotations",
    responses(
        (status = 200, description = "Orçamentos visíveis para o principal", body = Vec<Quotation>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quotations(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let quotations = app_state
        .quotation_service
        .list_quotations(&principal)
        .await?;

    Ok((StatusCode::OK, Json(quotations)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct QuotationViewQuery {
    /// Moeda da visão convertida (ex.: USD)
    pub currency: Option<String>,
}

// GET /api/quotations/{id}
#[utoipa::path(
    get,
    path = "/api/quotations/{id}",
    tag = "Quotations",
    params(
        ("id" = Uuid, Path, description = "ID do orçamento"),
        QuotationViewQuery
    ),
    responses(
        (status = 200, description = "Orçamento com itens (e conversão opcional)", body = QuotationDetail),
        (status = 403, description = "Fora do escopo do principal"),
        (status = 404, description = "Orçamento inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_quotation(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
    Query(query): Query<QuotationViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .quotation_service
        .get_quotation(&principal, id, query.currency.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(detail)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    #[schema(example = "SENT")]
    pub status: QuotationStatus,
}

// PATCH /api/quotations/{id}/status
#[utoipa::path(
    patch,
    path = "/api/quotations/{id}/status",
    tag = "Quotations",
    request_body = UpdateStatusPayload,
    params(
        ("id" = Uuid, Path, description = "ID do orçamento")
    ),
    responses(
        (status = 200, description = "Status atualizado", body = Quotation),
        (status = 409, description = "Transição de status não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quotation_status(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let quotation = app_state
        .quotation_service
        .update_status(&principal, id, payload.status)
        .await?;

    Ok((StatusCode::OK, Json(quotation)))
}
