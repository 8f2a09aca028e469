// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::tenant::TenantScope;
use crate::models::catalog::{Account, AccountAvailability, Service, ServiceKind};

const SERVICE_COLUMNS: &str = "id, tenant_id, name, image_url, kind, screens_total, \
     default_price, default_commission, is_active, created_at, updated_at";

const ACCOUNT_COLUMNS: &str = "id, tenant_id, service_id, login_email, password, price_override, \
     commission_override, invested_amount, is_active, created_at, updated_at";

/// Dados de entrada de um serviço (criação e edição).
#[derive(Debug, Clone)]
pub struct ServiceData<'a> {
    pub name: &'a str,
    pub image_url: Option<&'a str>,
    pub kind: ServiceKind,
    pub screens_total: i32,
    pub default_price: Decimal,
    pub default_commission: Decimal,
}

#[derive(Debug, Clone)]
pub struct AccountData<'a> {
    pub login_email: &'a str,
    pub password: Option<&'a str>,
    pub price_override: Option<Decimal>,
    pub commission_override: Option<Decimal>,
    pub invested_amount: Option<Decimal>,
}

// Serviços, contas e a criação das telas de cada conta
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Serviços
    // ---
    pub async fn create_service<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        data: &ServiceData<'_>,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (tenant_id, name, image_url, kind, screens_total,
                                  default_price, default_commission)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(scope.tenant_id())
        .bind(data.name)
        .bind(data.image_url)
        .bind(data.kind)
        .bind(data.screens_total)
        .bind(data.default_price)
        .bind(data.default_commission)
        .fetch_one(executor)
        .await?;
        Ok(service)
    }

    pub async fn update_service<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        data: &ServiceData<'_>,
        is_active: bool,
    ) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(&format!(
            r#"
            UPDATE services
            SET name = $3, image_url = $4, kind = $5, screens_total = $6,
                default_price = $7, default_commission = $8, is_active = $9,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .bind(data.name)
        .bind(data.image_url)
        .bind(data.kind)
        .bind(data.screens_total)
        .bind(data.default_price)
        .bind(data.default_commission)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(service)
    }

    pub async fn find_service<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .fetch_optional(executor)
        .await?;
        Ok(service)
    }

    pub async fn list_services(
        &self,
        scope: &TenantScope,
        only_active: bool,
    ) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(&format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services
            WHERE tenant_id = $1 AND (is_active OR NOT $2)
            ORDER BY name
            "#
        ))
        .bind(scope.tenant_id())
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    pub async fn service_has_accounts<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        service_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE service_id = $1 AND tenant_id = $2)",
        )
        .bind(service_id)
        .bind(scope.tenant_id())
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Vendas antigas também seguram o serviço (chave estrangeira).
    pub async fn delete_service<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        service_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM services WHERE id = $1 AND tenant_id = $2")
            .bind(service_id)
            .bind(scope.tenant_id())
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::ServiceInUse;
                    }
                }
                e.into()
            })?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Contas
    // ---
    pub async fn create_account<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        service_id: Uuid,
        data: &AccountData<'_>,
    ) -> Result<Account, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (tenant_id, service_id, login_email, password,
                                  price_override, commission_override, invested_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(scope.tenant_id())
        .bind(service_id)
        .bind(data.login_email)
        .bind(data.password)
        .bind(data.price_override)
        .bind(data.commission_override)
        .bind(data.invested_amount)
        .fetch_one(executor)
        .await?;
        Ok(account)
    }

    /// Senha ausente mantém a atual; os overrides ausentes voltam ao padrão do serviço.
    pub async fn update_account<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        data: &AccountData<'_>,
        is_active: bool,
    ) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
            SET login_email = $3, password = COALESCE($4, password),
                price_override = $5, commission_override = $6, invested_amount = $7,
                is_active = $8, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .bind(data.login_email)
        .bind(data.password)
        .bind(data.price_override)
        .bind(data.commission_override)
        .bind(data.invested_amount)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(account)
    }

    /// Cria as telas `1..=total` de uma conta recém-criada.
    pub async fn create_screens<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        account_id: Uuid,
        total: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO screens (tenant_id, account_id, number)
            SELECT $1, $2, generate_series(1, $3)
            "#,
        )
        .bind(scope.tenant_id())
        .bind(account_id)
        .bind(total)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_account<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .fetch_optional(executor)
        .await?;
        Ok(account)
    }

    /// Conta dona de uma tela (credenciais do e-mail de entrega).
    pub async fn find_account_by_screen<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        screen_id: Uuid,
    ) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT a.id, a.tenant_id, a.service_id, a.login_email, a.password, a.price_override,
                   a.commission_override, a.invested_amount, a.is_active, a.created_at, a.updated_at
            FROM accounts a
            JOIN screens s ON s.account_id = a.id
            WHERE s.id = $1 AND s.tenant_id = $2 AND a.tenant_id = $2
            "#,
        )
        .bind(screen_id)
        .bind(scope.tenant_id())
        .fetch_optional(executor)
        .await?;
        Ok(account)
    }

    pub async fn list_accounts_with_availability(
        &self,
        scope: &TenantScope,
        service_id: Uuid,
    ) -> Result<Vec<AccountAvailability>, AppError> {
        let accounts = sqlx::query_as::<_, AccountAvailability>(
            r#"
            SELECT a.id, a.login_email, a.is_active, a.price_override, a.commission_override,
                   COUNT(s.id) FILTER (WHERE NOT s.sold) AS free,
                   COUNT(s.id) FILTER (WHERE s.sold) AS sold
            FROM accounts a
            LEFT JOIN screens s ON s.account_id = a.id
            WHERE a.tenant_id = $1 AND a.service_id = $2
            GROUP BY a.id
            ORDER BY a.login_email
            "#,
        )
        .bind(scope.tenant_id())
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    pub async fn account_has_sold_screens<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        account_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM screens WHERE account_id = $1 AND tenant_id = $2 AND sold)",
        )
        .bind(account_id)
        .bind(scope.tenant_id())
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Remove a conta (as telas vão junto por cascata).
    pub async fn delete_account<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        account_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND tenant_id = $2")
            .bind(account_id)
            .bind(scope.tenant_id())
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::AccountHasSoldScreens;
                    }
                }
                e.into()
            })?;
        Ok(result.rows_affected() > 0)
    }
}
