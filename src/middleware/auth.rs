// src/middleware/auth.rs
//
// Resolução de identidade: o token JWT carrega o papel e os perfis do
// usuário (claims emitidos pelo provedor de autenticação). Aqui ele vira
// um `Principal` disponível para os handlers via extensions.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{Claims, Principal},
};

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();
    let auth_header = headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok());

    if let Some(auth_header) = auth_header {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            let validation = Validation::default();
            let token_data = decode::<Claims>(
                token,
                &DecodingKey::from_secret(app_state.jwt_secret.as_ref()),
                &validation,
            )
            .map_err(|_| AppError::InvalidToken)?;

            let claims = token_data.claims;
            let principal = Principal {
                user_id: claims.sub,
                role: claims.role,
                seller_id: claims.seller_id,
                client_id: claims.client_id,
            };

            // Insere o principal nos "extensions" da requisição
            request.extensions_mut().insert(principal);
            return Ok(next.run(request).await);
        }
    }

    Err(AppError::InvalidToken)
}

// Extrator para obter o principal autenticado diretamente nos handlers
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or(AppError::InvalidToken)
    }
}
