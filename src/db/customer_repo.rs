// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::common::tenant::TenantScope;
use crate::models::sales::Customer;

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca pelo telefone (já normalizado) ou cria o cliente.
    /// Um cliente existente só ganha nome/e-mail se ainda não tiver.
    pub async fn find_or_create<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        phone: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let default_name = format!("Cliente {phone}");
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (tenant_id, phone, name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, phone)
            DO UPDATE SET
                name = COALESCE(customers.name, EXCLUDED.name),
                email = COALESCE(customers.email, EXCLUDED.email)
            RETURNING id, tenant_id, phone, name, email, created_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(phone)
        .bind(name.unwrap_or(&default_name))
        .bind(email)
        .fetch_one(executor)
        .await?;

        scope.ensure_owns(customer.tenant_id)?;
        Ok(customer)
    }

    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, phone, name, email, created_at
            FROM customers
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope.tenant_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }
}
