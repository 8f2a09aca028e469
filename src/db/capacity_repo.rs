// src/db/capacity_repo.rs

use std::future::Future;
use std::pin::Pin;

use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::tenant::TenantScope;
use crate::models::catalog::Screen;

/// Recorte do pool de telas sobre o qual uma operação age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolScope {
    /// Qualquer conta ativa do serviço (checkout automático).
    Service(Uuid),
    /// Uma conta específica escolhida pelo vendedor.
    Account(Uuid),
}

// A alocação trava a tela candidata entre a leitura e a escrita.
// Primeira tentativa com SKIP LOCKED: alocadores concorrentes pulam a tela um do outro.
// Se só restam telas travadas por outra transação, a segunda tentativa espera a trava
// e relê `NOT sold`, já que a outra transação pode ter sido desfeita.
const ALLOCATE_FROM_SERVICE: &str = r#"
    UPDATE screens
    SET sold = TRUE
    WHERE id = (
        SELECT s.id
        FROM screens s
        JOIN accounts a ON a.id = s.account_id
        WHERE s.tenant_id = $1
          AND a.tenant_id = $1
          AND a.service_id = $2
          AND a.is_active
          AND NOT s.sold
        ORDER BY s.number, a.created_at, a.id
        LIMIT 1
        FOR UPDATE OF s {WAIT}
    )
    AND NOT sold
    RETURNING id, tenant_id, account_id, number, sold
"#;

const ALLOCATE_FROM_ACCOUNT: &str = r#"
    UPDATE screens
    SET sold = TRUE
    WHERE id = (
        SELECT s.id
        FROM screens s
        WHERE s.tenant_id = $1
          AND s.account_id = $2
          AND NOT s.sold
        ORDER BY s.number
        LIMIT 1
        FOR UPDATE {WAIT}
    )
    AND NOT sold
    RETURNING id, tenant_id, account_id, number, sold
"#;

#[derive(Clone)]
pub struct CapacityRepository {
    pool: PgPool,
}

impl CapacityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Marca como vendida a tela livre de menor número do recorte.
    /// Deve rodar na mesma transação da mudança de status da venda.
    pub fn allocate_any_free<'a, 'e, A>(
        &'a self,
        executor: A,
        scope: &'a TenantScope,
        pool_scope: PoolScope,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Screen>, AppError>> + Send + 'a>>
    where
        A: Acquire<'e, Database = Postgres> + Send + 'a,
        'e: 'a,
    {
        Box::pin(async move {
            let (template, id) = match pool_scope {
                PoolScope::Service(id) => (ALLOCATE_FROM_SERVICE, id),
                PoolScope::Account(id) => (ALLOCATE_FROM_ACCOUNT, id),
            };
            let mut conn = executor.acquire().await?;

            let mut screen = None;
            for wait in ["SKIP LOCKED", ""] {
                screen = sqlx::query_as::<_, Screen>(&template.replace("{WAIT}", wait))
                    .bind(scope.tenant_id())
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
                if screen.is_some() {
                    break;
                }
            }

            if let Some(screen) = &screen {
                scope.ensure_owns(screen.tenant_id)?;
                tracing::debug!(screen_id = %screen.id, number = screen.number, "tela alocada");
            }
            Ok(screen)
        })
    }

    /// Devolve a tela ao pool. Chamar numa tela já livre não muda nada.
    pub async fn release<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        screen_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE screens SET sold = FALSE WHERE id = $1 AND tenant_id = $2")
            .bind(screen_id)
            .bind(scope.tenant_id())
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn count_free(
        &self,
        scope: &TenantScope,
        pool_scope: PoolScope,
    ) -> Result<i64, AppError> {
        self.count(scope, pool_scope, false).await
    }

    pub async fn count_sold(
        &self,
        scope: &TenantScope,
        pool_scope: PoolScope,
    ) -> Result<i64, AppError> {
        self.count(scope, pool_scope, true).await
    }

    async fn count(
        &self,
        scope: &TenantScope,
        pool_scope: PoolScope,
        sold: bool,
    ) -> Result<i64, AppError> {
        let count = match pool_scope {
            // Telas de contas inativas não são vendáveis, então não contam
            PoolScope::Service(service_id) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*)
                    FROM screens s
                    JOIN accounts a ON a.id = s.account_id
                    WHERE s.tenant_id = $1 AND a.service_id = $2 AND a.is_active AND s.sold = $3
                    "#,
                )
                .bind(scope.tenant_id())
                .bind(service_id)
                .bind(sold)
                .fetch_one(&self.pool)
                .await?
            }
            PoolScope::Account(account_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM screens WHERE tenant_id = $1 AND account_id = $2 AND sold = $3",
                )
                .bind(scope.tenant_id())
                .bind(account_id)
                .bind(sold)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(count)
    }
}
