// src/handlers/companies.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::company::{Client, Company, Product, Seller},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 2, message = "A razão social deve ter no mínimo 2 caracteres"))]
    #[schema(example = "OPD Export Ltda")]
    pub legal_name: String,

    #[validate(length(min = 11, message = "CNPJ inválido"))]
    #[schema(example = "12.345.678/0001-99")]
    pub tax_id: String,

    pub address: Option<String>,
    pub bank_info: Option<String>,

    #[schema(example = "#0A4D8C")]
    pub brand_color: Option<String>,

    #[schema(example = "BRL")]
    pub base_currency: Option<String>,
}

// POST /api/companies
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 409, description = "CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;
    payload.validate()?;

    let company = app_state
        .company_service
        .create_company(
            payload.legal_name,
            payload.tax_id,
            payload.address,
            payload.bank_info,
            payload.brand_color,
            payload.base_currency,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(company)))
}

// GET /api/companies
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses(
        (status = 200, description = "Lista de empresas", body = Vec<Company>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    CurrentPrincipal(_principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let companies = app_state.company_service.list_companies().await?;
    Ok((StatusCode::OK, Json(companies)))
}

// DELETE /api/companies/{id}
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(
        ("id" = Uuid, Path, description = "ID da empresa")
    ),
    responses(
        (status = 204, description = "Empresa removida"),
        (status = 409, description = "Empresa possui vínculos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    app_state.company_service.delete_company(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSellerPayload {
    pub user_id: Uuid,

    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "João Pereira")]
    pub full_name: String,

    #[schema(example = "5.00")]
    pub default_commission: Option<Decimal>,
    pub default_target: Option<Decimal>,
}

// POST /api/sellers
#[utoipa::path(
    post,
    path = "/api/sellers",
    tag = "Companies",
    request_body = CreateSellerPayload,
    responses(
        (status = 201, description = "Perfil de vendedor criado", body = Seller)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_seller(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateSellerPayload>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;
    payload.validate()?;

    let seller = app_state
        .company_service
        .create_seller(
            payload.user_id,
            payload.full_name,
            payload.default_commission,
            payload.default_target,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(seller)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    pub user_id: Option<Uuid>,

    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "Maria da Silva")]
    pub full_name: String,

    #[validate(email(message = "E-mail inválido"))]
    #[schema(example = "maria@email.com")]
    pub email: Option<String>,
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Companies",
    request_body = CreateClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;
    payload.validate()?;

    let client = app_state
        .company_service
        .create_client(payload.user_id, payload.full_name, payload.email)
        .await?;

    Ok((StatusCode::CREATED, Json(client)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub company_id: Uuid,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Café torrado 1kg")]
    pub name: String,

    #[schema(example = "42.50")]
    pub unit_price: Decimal,
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Companies",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 404, description = "Empresa inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;
    payload.validate()?;

    let product = app_state
        .company_service
        .create_product(payload.company_id, payload.name, payload.unit_price)
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Companies",
    responses(
        (status = 200, description = "Produtos no escopo do principal", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.company_service.list_products(&principal).await?;
    Ok((StatusCode::OK, Json(products)))
}
