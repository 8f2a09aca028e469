// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{error::AppError, tenant::TenantScope},
    models::settings::{ConfigLookup, PaymentConfig},
};

const CONFIG_COLUMNS: &str =
    "id, tenant_id, gateway, access_token, public_key, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Configuração do gateway, ativa ou não (tela de configurações).
    pub async fn find_payment_config(
        &self,
        scope: &TenantScope,
        gateway: &str,
    ) -> Result<Option<PaymentConfig>, AppError> {
        let config = sqlx::query_as::<_, PaymentConfig>(&format!(
            "SELECT {CONFIG_COLUMNS} FROM payment_configs WHERE tenant_id = $1 AND gateway = $2"
        ))
        .bind(scope.tenant_id())
        .bind(gateway)
        .fetch_optional(&self.pool)
        .await?;
        Ok(config)
    }

    /// Resolução usada antes de montar o adaptador do gateway.
    pub async fn lookup_active(&self, scope: &TenantScope, gateway: &str) -> Result<ConfigLookup, AppError> {
        let lookup = match self.find_payment_config(scope, gateway).await? {
            Some(cfg) if cfg.is_active => {
                scope.ensure_owns(cfg.tenant_id)?;
                ConfigLookup::Found(cfg)
            }
            _ => ConfigLookup::NotFound,
        };
        Ok(lookup)
    }

    // UPSERT (Insert or Update): uma configuração por (empresa, gateway)
    pub async fn upsert_payment_config<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        gateway: &str,
        access_token: &str,
        public_key: Option<&str>,
        is_active: bool,
    ) -> Result<PaymentConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = sqlx::query_as::<_, PaymentConfig>(&format!(
            r#"
            INSERT INTO payment_configs (tenant_id, gateway, access_token, public_key, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, gateway)
            DO UPDATE SET
                access_token = EXCLUDED.access_token,
                public_key = EXCLUDED.public_key,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING {CONFIG_COLUMNS}
            "#
        ))
        .bind(scope.tenant_id())
        .bind(gateway)
        .bind(access_token)
        .bind(public_key)
        .bind(is_active)
        .fetch_one(executor)
        .await?;

        Ok(config)
    }
}
