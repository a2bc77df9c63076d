// src/handlers/rates.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::rates::{ExchangeRateConfig, RateSource, ResolvedRate},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RateQuery {
    /// Moeda de origem (USD ou BRL)
    pub from: String,
    /// Moeda de destino (USD ou BRL)
    pub to: String,
    /// Valor a converter; padrão 1
    pub amount: Option<Decimal>,
    /// Cotação manual só para esta consulta
    pub custom_rate: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    #[schema(example = "166.15")]
    pub converted_amount: Decimal,
    pub exchange_rate: f64,
    pub source: RateSource,
    pub is_custom: bool,
}

// GET /api/rates
#[utoipa::path(
    get,
    path = "/api/rates",
    tag = "Rates",
    params(RateQuery),
    responses(
        (status = 200, description = "Conversão calculada", body = RateResponse),
        (status = 400, description = "Moeda ou cotação inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_rate(
    State(app_state): State<AppState>,
    CurrentPrincipal(_principal): CurrentPrincipal,
    Query(query): Query<RateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let amount = query.amount.unwrap_or(Decimal::ONE);

    let conversion = app_state
        .rate_service
        .convert(amount, &query.from, &query.to, query.custom_rate)
        .await?;

    Ok((
        StatusCode::OK,
        Json(RateResponse {
            converted_amount: conversion.converted_amount,
            exchange_rate: conversion.rate,
            source: conversion.source,
            is_custom: conversion.is_custom,
        }),
    ))
}

// POST /api/rates/refresh
#[utoipa::path(
    post,
    path = "/api/rates/refresh",
    tag = "Rates",
    responses(
        (status = 200, description = "Cache descartado e cotação atualizada", body = ResolvedRate)
    ),
    security(("api_jwt" = []))
)]
pub async fn refresh_rate(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    let resolved = app_state.rate_service.refresh().await;
    Ok((StatusCode::OK, Json(resolved)))
}

// GET /api/rates/config
#[utoipa::path(
    get,
    path = "/api/rates/config",
    tag = "Rates",
    responses(
        (status = 200, description = "Configuração da cotação customizada", body = ExchangeRateConfig)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_rate_config(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    let config = app_state.rate_service.load_config().await?;
    Ok((StatusCode::OK, Json(config)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRateConfigPayload {
    #[schema(example = 5.25)]
    pub cotacao_dolar: Option<f64>,

    #[serde(default)]
    #[schema(example = true)]
    pub usar_cotacao_customizada: bool,
}

// PUT /api/rates/config
#[utoipa::path(
    put,
    path = "/api/rates/config",
    tag = "Rates",
    request_body = UpdateRateConfigPayload,
    responses(
        (status = 200, description = "Configuração gravada", body = ExchangeRateConfig),
        (status = 400, description = "Valor de cotação inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_rate_config(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<UpdateRateConfigPayload>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    let config = app_state
        .rate_service
        .update_config(payload.cotacao_dolar, payload.usar_cotacao_customizada)
        .await?;

    Ok((StatusCode::OK, Json(config)))
}
