// src/db/quotation_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{QuotationStore, SequenceStore},
    models::quotation::{Quotation, QuotationItem, QuotationStatus},
};

const QUOTATION_COLUMNS: &str = r#"
    id, number, company_id, seller_id, client_id, status, subtotal, discount,
    total, created_at, updated_at
"#;

#[derive(Clone)]
pub struct QuotationRepository {
    pool: PgPool,
}

impl QuotationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotationStore for QuotationRepository {
    async fn insert_quotation(
        &self,
        quotation: &Quotation,
        items: &[QuotationItem],
    ) -> Result<(), AppError> {
        // Orçamento e itens no mesmo commit. Se o número colidir, nada é
        // gravado e o chamador decide se tenta de novo com outro número.
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            r#"
            INSERT INTO quotations ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            QUOTATION_COLUMNS
        ))
        .bind(quotation.id)
        .bind(&quotation.number)
        .bind(quotation.company_id)
        .bind(quotation.seller_id)
        .bind(quotation.client_id)
        .bind(quotation.status)
        .bind(quotation.subtotal)
        .bind(quotation.discount)
        .bind(quotation.total)
        .bind(quotation.created_at)
        .bind(quotation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation(format!(
                        "Número de documento '{}' já utilizado.",
                        quotation.number
                    ));
                }
            }
            e.into()
        })?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO quotation_items (
                    id, quotation_id, product_id, description, quantity,
                    unit_price, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id)
            .bind(item.quotation_id)
            .bind(item.product_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn find_quotation(
        &self,
        id: Uuid,
    ) -> Result<Option<(Quotation, Vec<QuotationItem>)>, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>(&format!(
            "SELECT {} FROM quotations WHERE id = $1",
            QUOTATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(quotation) = quotation else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, QuotationItem>(
            r#"
            SELECT id, quotation_id, product_id, description, quantity,
                   unit_price, line_total
            FROM quotation_items
            WHERE quotation_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((quotation, items)))
    }

    async fn list_all(&self) -> Result<Vec<Quotation>, AppError> {
        let quotations = sqlx::query_as::<_, Quotation>(&format!(
            "SELECT {} FROM quotations ORDER BY created_at DESC",
            QUOTATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    async fn list_by_companies(&self, company_ids: &[Uuid]) -> Result<Vec<Quotation>, AppError> {
        let quotations = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            SELECT {}
            FROM quotations
            WHERE company_id = ANY($1)
            ORDER BY created_at DESC
            "#,
            QUOTATION_COLUMNS
        ))
        .bind(company_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    async fn list_by_client(&self, client_id: Uuid) -> Result<Vec<Quotation>, AppError> {
        let quotations = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            SELECT {}
            FROM quotations
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#,
            QUOTATION_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: QuotationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE quotations SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Orçamento"));
        }

        Ok(())
    }
}

// Contador diário dos números de documento. O UPDATE dentro do upsert é
// atômico no Postgres: dois chamadores concorrentes recebem valores distintos.
#[derive(Clone)]
pub struct SequenceRepository {
    pool: PgPool,
}

impl SequenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceStore for SequenceRepository {
    async fn next_daily_sequence(&self, day: NaiveDate) -> Result<i32, AppError> {
        let seq = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO document_sequences (day, seq)
            VALUES ($1, 1)
            ON CONFLICT (day)
            DO UPDATE SET seq = document_sequences.seq + 1
            RETURNING seq
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;

        Ok(seq)
    }
}
