// src/handlers/representations.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::representation::{
        Representation, RepresentationRequest, RequestDecision, RequestOutcome,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestRepresentationPayload {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub company_id: Uuid,

    #[validate(length(max = 500, message = "A mensagem deve ter no máximo 500 caracteres"))]
    #[schema(example = "Atuo há 10 anos na região sul.")]
    pub message: Option<String>,
}

// POST /api/representations/requests
#[utoipa::path(
    post,
    path = "/api/representations/requests",
    tag = "Representations",
    request_body = RequestRepresentationPayload,
    responses(
        (status = 201, description = "Solicitação registrada ou vínculo reativado"),
        (status = 409, description = "Vínculo ativo ou solicitação pendente já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_representation(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<RequestRepresentationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let seller_id = principal.require_seller_profile()?;

    let outcome = app_state
        .representation_service
        .request_representation(seller_id, payload.company_id, payload.message)
        .await?;

    let body = match outcome {
        RequestOutcome::Submitted(request) => json!({
            "status": "PENDING_APPROVAL",
            "request": request,
        }),
        RequestOutcome::Reactivated(representation) => json!({
            "status": "REACTIVATED",
            "representation": representation,
        }),
    };

    Ok((StatusCode::CREATED, Json(body)))
}

// GET /api/representations/requests/pending
#[utoipa::path(
    get,
    path = "/api/representations/requests/pending",
    tag = "Representations",
    responses(
        (status = 200, description = "Solicitações aguardando decisão", body = Vec<RepresentationRequest>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending_requests(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    let pending = app_state
        .representation_service
        .list_pending_requests()
        .await?;

    Ok((StatusCode::OK, Json(pending)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequestPayload {
    pub request_id: Uuid,

    #[schema(example = "APPROVE")]
    pub decision: RequestDecision,
}

// POST /api/representations/requests/resolve
#[utoipa::path(
    post,
    path = "/api/representations/requests/resolve",
    tag = "Representations",
    request_body = ResolveRequestPayload,
    responses(
        (status = 200, description = "Solicitação resolvida", body = RepresentationRequest),
        (status = 409, description = "Solicitação já resolvida")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_request(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<ResolveRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    let resolved = app_state
        .representation_service
        .resolve_request(payload.request_id, payload.decision, principal.user_id)
        .await?;

    Ok((StatusCode::OK, Json(resolved)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleActivePayload {
    pub active: bool,
}

// PATCH /api/representations/{id}/active
#[utoipa::path(
    patch,
    path = "/api/representations/{id}/active",
    tag = "Representations",
    request_body = ToggleActivePayload,
    params(
        ("id" = Uuid, Path, description = "ID da representação")
    ),
    responses(
        (status = 200, description = "Representação atualizada", body = Representation),
        (status = 404, description = "Representação inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_representation(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleActivePayload>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    let representation = app_state
        .representation_service
        .toggle_active(id, payload.active)
        .await?;

    Ok((StatusCode::OK, Json(representation)))
}

// GET /api/representations/companies
#[utoipa::path(
    get,
    path = "/api/representations/companies",
    tag = "Representations",
    responses(
        (status = 200, description = "Empresas representadas pelo vendedor autenticado", body = Vec<Uuid>)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_companies(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let seller_id = principal.require_seller_profile()?;

    let company_ids = app_state
        .representation_service
        .companies_for(seller_id)
        .await?;

    Ok((StatusCode::OK, Json(company_ids)))
}
