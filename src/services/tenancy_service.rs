// src/services/tenancy_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{datetime::business_day, error::AppError, tenant::TenantScope},
    db::{RbacRepository, TenantRepository, UserRepository},
    models::{
        auth::{User, ALL_PERMISSIONS},
        tenancy::{License, Tenant},
    },
    services::auth::hash_password,
};

/// Dados do cadastro de uma nova empresa com o seu administrador.
#[derive(Debug, Clone)]
pub struct NewTenant<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub document_number: Option<&'a str>,
    pub admin_name: &'a str,
    pub admin_email: &'a str,
    pub admin_password: &'a str,
    /// Sem valor, vale o período de teste configurado.
    pub license_days: Option<i32>,
}

/// Membro da equipe criado pelo administrador da empresa.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub permissions: &'a [&'a str],
}

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
    trial_days: i32,
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        pool: PgPool,
        trial_days: i32,
    ) -> Self {
        Self {
            tenant_repo,
            user_repo,
            rbac_repo,
            pool,
            trial_days,
        }
    }

    /// Cria a empresa, o administrador com todas as permissões e a licença
    /// de teste, tudo numa transação.
    pub async fn create_tenant_with_admin(
        &self,
        input: NewTenant<'_>,
    ) -> Result<(Tenant, User, License), AppError> {
        // Hashing fora da transação, pois não toca no banco
        let password_hash = hash_password(input.admin_password).await?;

        let mut tx = self.pool.begin().await?;

        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, input.name, input.slug, input.document_number)
            .await?;
        let scope = TenantScope::of_tenant(&tenant);

        let admin = self
            .user_repo
            .create_user(
                &mut *tx,
                &scope,
                input.admin_name,
                input.admin_email,
                &password_hash,
                true,
            )
            .await?;

        self.rbac_repo
            .grant_permissions(&mut *tx, &scope, admin.id, ALL_PERMISSIONS)
            .await?;

        let access_days = input.license_days.unwrap_or(self.trial_days);
        let license = self
            .tenant_repo
            .create_license(&mut *tx, &scope, access_days)
            .await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            access_days,
            "🏢 Empresa criada"
        );
        Ok((tenant, admin, license))
    }

    /// Licença vigente da empresa. Sem licença ou vencida: `LicenseExpired`.
    pub async fn active_license(&self, scope: &TenantScope) -> Result<License, AppError> {
        let today = business_day(Utc::now());
        match self.tenant_repo.find_license(scope).await? {
            Some(license) if !license.is_expired(today) => Ok(license),
            _ => {
                tracing::warn!(tenant_id = %scope.tenant_id(), "licença vencida ou inexistente");
                Err(AppError::LicenseExpired)
            }
        }
    }

    /// Operador da plataforma renova a licença a partir de hoje.
    pub async fn renew_license(&self, tenant_id: Uuid, access_days: i32) -> Result<License, AppError> {
        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Empresa"))?;
        let scope = TenantScope::of_tenant(&tenant);

        let license = self
            .tenant_repo
            .renew_license(&self.pool, &scope, access_days)
            .await?;

        tracing::info!(
            tenant_id = %tenant.id,
            access_days,
            ends_on = %license.ends_on(),
            "licença renovada"
        );
        Ok(license)
    }

    /// Usuário da equipe: nunca administrador, só com as permissões pedidas.
    pub async fn create_user(
        &self,
        scope: &TenantScope,
        input: NewUser<'_>,
    ) -> Result<(User, Vec<String>), AppError> {
        let password_hash = hash_password(input.password).await?;

        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .create_user(&mut *tx, scope, input.name, input.email, &password_hash, false)
            .await?;
        self.rbac_repo
            .grant_permissions(&mut *tx, scope, user.id, input.permissions)
            .await?;

        tx.commit().await?;

        let permissions = self.rbac_repo.list_user_permissions(scope, user.id).await?;
        tracing::info!(
            user_id = %user.id,
            tenant_id = %scope.tenant_id(),
            permissions = ?permissions,
            "👤 Usuário criado"
        );
        Ok((user, permissions))
    }

    pub async fn list_users(&self, scope: &TenantScope) -> Result<Vec<User>, AppError> {
        self.user_repo.list(scope).await
    }

    pub async fn find_license(&self, scope: &TenantScope) -> Result<Option<License>, AppError> {
        self.tenant_repo.find_license(scope).await
    }

    pub async fn list_permissions(&self, scope: &TenantScope, user: &User) -> Result<Vec<String>, AppError> {
        self.rbac_repo.list_user_permissions(scope, user.id).await
    }
}
