// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::tenant::TenantScope;

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Concede várias permissões de uma vez
    pub async fn grant_permissions<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        user_id: Uuid,
        slugs: &[&str],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slugs: Vec<String> = slugs.iter().map(|s| s.to_string()).collect();

        // Inserção em massa usando UNNEST
        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, tenant_id, slug)
            SELECT $1, $2, unnest($3::text[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(scope.tenant_id())
        .bind(&slugs)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_user_permissions(
        &self,
        scope: &TenantScope,
        user_id: Uuid,
    ) -> Result<Vec<String>, AppError> {
        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM user_permissions WHERE user_id = $1 AND tenant_id = $2 ORDER BY slug",
        )
        .bind(user_id)
        .bind(scope.tenant_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    pub async fn user_has_permission(
        &self,
        scope: &TenantScope,
        user_id: Uuid,
        permission_slug: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_permissions
                WHERE user_id = $1
                  AND tenant_id = $2
                  AND slug = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(scope.tenant_id())
        .bind(permission_slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
