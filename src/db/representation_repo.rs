// src/db/representation_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::RepresentationStore,
    models::representation::{Representation, RepresentationRequest, RequestStatus},
};

const REPRESENTATION_COLUMNS: &str = r#"
    id, seller_id, company_id, active, commission_override, target_override,
    created_at, updated_at
"#;

const REQUEST_COLUMNS: &str = r#"
    id, seller_id, company_id, message, status, resolved_by, resolved_at, created_at
"#;

#[derive(Clone)]
pub struct RepresentationRepository {
    pool: PgPool,
}

impl RepresentationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RepresentationStore for RepresentationRepository {
    async fn find_representation(&self, id: Uuid) -> Result<Option<Representation>, AppError> {
        let representation = sqlx::query_as::<_, Representation>(&format!(
            "SELECT {} FROM representations WHERE id = $1",
            REPRESENTATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(representation)
    }

    async fn find_by_pair(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Representation>, AppError> {
        let representation = sqlx::query_as::<_, Representation>(&format!(
            "SELECT {} FROM representations WHERE seller_id = $1 AND company_id = $2",
            REPRESENTATION_COLUMNS
        ))
        .bind(seller_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(representation)
    }

    async fn set_representation_active(
        &self,
        id: Uuid,
        active: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE representations SET active = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn active_company_ids(&self, seller_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT company_id FROM representations WHERE seller_id = $1 AND active = TRUE",
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn insert_request(&self, request: &RepresentationRequest) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO representation_requests (
                id, seller_id, company_id, message, status, resolved_by,
                resolved_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(request.id)
        .bind(request.seller_id)
        .bind(request.company_id)
        .bind(&request.message)
        .bind(request.status)
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<RepresentationRequest>, AppError> {
        let request = sqlx::query_as::<_, RepresentationRequest>(&format!(
            "SELECT {} FROM representation_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_pending_request(
        &self,
        seller_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<RepresentationRequest>, AppError> {
        let request = sqlx::query_as::<_, RepresentationRequest>(&format!(
            r#"
            SELECT {}
            FROM representation_requests
            WHERE seller_id = $1 AND company_id = $2 AND status = $3
            "#,
            REQUEST_COLUMNS
        ))
        .bind(seller_id)
        .bind(company_id)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn list_pending_requests(&self) -> Result<Vec<RepresentationRequest>, AppError> {
        let requests = sqlx::query_as::<_, RepresentationRequest>(&format!(
            r#"
            SELECT {}
            FROM representation_requests
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
            REQUEST_COLUMNS
        ))
        .bind(RequestStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn update_request(&self, request: &RepresentationRequest) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE representation_requests
            SET status = $2, resolved_by = $3, resolved_at = $4
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(request.status)
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn commit_approval(
        &self,
        request: &RepresentationRequest,
        representation: &Representation,
    ) -> Result<(), AppError> {
        // Os dois efeitos da aprovação ficam na mesma transação:
        // upsert do vínculo + solicitação marcada como resolvida.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO representations (
                id, seller_id, company_id, active, commission_override,
                target_override, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (seller_id, company_id)
            DO UPDATE SET
                active = EXCLUDED.active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(representation.id)
        .bind(representation.seller_id)
        .bind(representation.company_id)
        .bind(representation.active)
        .bind(representation.commission_override)
        .bind(representation.target_override)
        .bind(representation.created_at)
        .bind(representation.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE representation_requests
            SET status = $2, resolved_by = $3, resolved_at = $4
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(request.status)
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
