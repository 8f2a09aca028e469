// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::tenant::TenantScope;
use crate::models::tenancy::{License, Tenant};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria a empresa. Slug ou documento repetidos viram erros de conflito.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        document_number: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug, document_number)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, document_number, is_active, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(document_number)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("tenants_slug_key") => AppError::SlugAlreadyExists(slug.to_string()),
                        _ => AppError::UniqueConstraintViolation(
                            "Já existe uma empresa com este documento.".into(),
                        ),
                    };
                }
            }
            e.into()
        })
    }

    /// Loja pública: o slug é a única entrada, e a empresa encontrada vira o escopo.
    pub async fn find_active_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, document_number, is_active, created_at, updated_at
            FROM tenants
            WHERE slug = $1 AND is_active
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    /// Busca sem escopo: só o operador da plataforma chega aqui.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, document_number, is_active, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    pub async fn create_license<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        access_days: i32,
    ) -> Result<License, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let license = sqlx::query_as::<_, License>(
            r#"
            INSERT INTO licenses (tenant_id, starts_on, access_days)
            VALUES ($1, CURRENT_DATE, $2)
            RETURNING id, tenant_id, starts_on, access_days, created_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(access_days)
        .fetch_one(executor)
        .await?;
        Ok(license)
    }

    /// Renovação: a contagem recomeça hoje com os dias informados.
    pub async fn renew_license<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        access_days: i32,
    ) -> Result<License, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let license = sqlx::query_as::<_, License>(
            r#"
            INSERT INTO licenses (tenant_id, starts_on, access_days)
            VALUES ($1, CURRENT_DATE, $2)
            ON CONFLICT (tenant_id)
            DO UPDATE SET starts_on = CURRENT_DATE, access_days = EXCLUDED.access_days
            RETURNING id, tenant_id, starts_on, access_days, created_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(access_days)
        .fetch_one(executor)
        .await?;
        Ok(license)
    }

    pub async fn find_license(&self, scope: &TenantScope) -> Result<Option<License>, AppError> {
        let license = sqlx::query_as::<_, License>(
            r#"
            SELECT id, tenant_id, starts_on, access_days, created_at
            FROM licenses
            WHERE tenant_id = $1
            "#,
        )
        .bind(scope.tenant_id())
        .fetch_optional(&self.pool)
        .await?;
        Ok(license)
    }
}
