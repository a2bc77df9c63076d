// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// Papel do usuário autenticado. Vem do token, nunca do corpo da requisição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Seller,
    Client,
}

// O principal autenticado, resolvido pelo middleware a partir do JWT.
// `seller_id`/`client_id` só existem quando o usuário tem o perfil correspondente.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub seller_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

impl Principal {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Esta operação exige perfil de administrador.".to_string(),
            ))
        }
    }

    /// Vendedor agindo em nome próprio precisa de um perfil de vendedor.
    pub fn require_seller_profile(&self) -> Result<Uuid, AppError> {
        self.seller_id.ok_or_else(|| {
            AppError::Forbidden("O usuário não possui perfil de vendedor.".to_string())
        })
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // Subject (ID do usuário)
    pub role: Role,
    pub seller_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
