// src/db/company_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::CatalogStore,
    models::company::{Client, Company, Product, Seller},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    async fn insert_company(&self, company: &Company) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO companies (
                id, legal_name, tax_id, address, bank_info, brand_color,
                base_currency, active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(company.id)
        .bind(&company.legal_name)
        .bind(&company.tax_id)
        .bind(&company.address)
        .bind(&company.bank_info)
        .bind(&company.brand_color)
        .bind(&company.base_currency)
        .bind(company.active)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Tratamento de erro de chave duplicada (CNPJ único)
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation(format!(
                        "CNPJ '{}' já cadastrado.",
                        company.tax_id
                    ));
                }
            }
            e.into()
        })?;

        Ok(())
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, legal_name, tax_id, address, bank_info, brand_color,
                   base_currency, active, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, legal_name, tax_id, address, bank_info, brand_color,
                   base_currency, active, created_at, updated_at
            FROM companies
            ORDER BY legal_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    async fn company_has_dependents(&self, id: Uuid) -> Result<bool, AppError> {
        let has = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM representations WHERE company_id = $1)
                OR EXISTS (SELECT 1 FROM products WHERE company_id = $1)
                OR EXISTS (SELECT 1 FROM quotations WHERE company_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(has)
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_seller(&self, seller: &Seller) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sellers (
                id, user_id, full_name, default_commission, default_target,
                active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(seller.id)
        .bind(seller.user_id)
        .bind(&seller.full_name)
        .bind(seller.default_commission)
        .bind(seller.default_target)
        .bind(seller.active)
        .bind(seller.created_at)
        .bind(seller.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation(
                        "Este usuário já possui perfil de vendedor.".to_string(),
                    );
                }
            }
            e.into()
        })?;

        Ok(())
    }

    async fn find_seller(&self, id: Uuid) -> Result<Option<Seller>, AppError> {
        let seller = sqlx::query_as::<_, Seller>(
            r#"
            SELECT id, user_id, full_name, default_commission, default_target,
                   active, created_at, updated_at
            FROM sellers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(seller)
    }

    async fn insert_client(&self, client: &Client) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, user_id, full_name, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(client.id)
        .bind(client.user_id)
        .bind(&client.full_name)
        .bind(&client.email)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, user_id, full_name, email, created_at FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, company_id, name, unit_price, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id)
        .bind(product.company_id)
        .bind(&product.name)
        .bind(product.unit_price)
        .bind(product.active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, company_id, name, unit_price, active, created_at
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn list_products_by_companies(
        &self,
        company_ids: &[Uuid],
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, company_id, name, unit_price, active, created_at
            FROM products
            WHERE company_id = ANY($1)
            ORDER BY name ASC
            "#,
        )
        .bind(company_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}
