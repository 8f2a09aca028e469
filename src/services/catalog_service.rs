// src/services/catalog_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, tenant::TenantScope},
    db::{
        catalog_repo::{AccountData, ServiceData},
        CapacityRepository, CatalogRepository, PoolScope,
    },
    models::catalog::{Account, AccountAvailability, Service, ServiceAvailability},
};

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
    capacity_repo: CapacityRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository, capacity_repo: CapacityRepository, pool: PgPool) -> Self {
        Self {
            catalog_repo,
            capacity_repo,
            pool,
        }
    }

    /// Serviço individual sempre fica com 1 tela, independente do pedido.
    pub async fn create_service(
        &self,
        scope: &TenantScope,
        data: ServiceData<'_>,
    ) -> Result<Service, AppError> {
        let data = ServiceData {
            screens_total: data.kind.screens_total(data.screens_total),
            ..data
        };
        let service = self
            .catalog_repo
            .create_service(&self.pool, scope, &data)
            .await?;
        tracing::info!(service_id = %service.id, tenant_id = %scope.tenant_id(), "serviço criado");
        Ok(service)
    }

    pub async fn update_service(
        &self,
        scope: &TenantScope,
        id: Uuid,
        data: ServiceData<'_>,
        is_active: bool,
    ) -> Result<Service, AppError> {
        let data = ServiceData {
            screens_total: data.kind.screens_total(data.screens_total),
            ..data
        };
        self.catalog_repo
            .update_service(&self.pool, scope, id, &data, is_active)
            .await?
            .ok_or(AppError::ResourceNotFound("Serviço"))
    }

    /// Serviço com contas cadastradas não pode ser excluído.
    pub async fn delete_service(&self, scope: &TenantScope, service_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let service = self
            .catalog_repo
            .find_service(&mut *tx, scope, service_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Serviço"))?;

        if self
            .catalog_repo
            .service_has_accounts(&mut *tx, scope, service.id)
            .await?
        {
            return Err(AppError::ServiceInUse);
        }

        self.catalog_repo
            .delete_service(&mut *tx, scope, service.id)
            .await?;
        tx.commit().await?;

        tracing::info!(service_id = %service.id, tenant_id = %scope.tenant_id(), "serviço excluído");
        Ok(())
    }

    /// Serviços com o total de telas livres e vendidas de cada um.
    pub async fn list_with_availability(
        &self,
        scope: &TenantScope,
        only_active: bool,
    ) -> Result<Vec<ServiceAvailability>, AppError> {
        let services = self.catalog_repo.list_services(scope, only_active).await?;

        let mut result = Vec::with_capacity(services.len());
        for service in services {
            let pool_scope = PoolScope::Service(service.id);
            let free = self.capacity_repo.count_free(scope, pool_scope).await?;
            let sold = self.capacity_repo.count_sold(scope, pool_scope).await?;
            result.push(ServiceAvailability { service, free, sold });
        }
        Ok(result)
    }

    /// Cria a conta e as telas `1..=screens_total` do serviço na mesma transação.
    pub async fn create_account(
        &self,
        scope: &TenantScope,
        service_id: Uuid,
        data: AccountData<'_>,
    ) -> Result<Account, AppError> {
        let mut tx = self.pool.begin().await?;

        let service = self
            .catalog_repo
            .find_service(&mut *tx, scope, service_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Serviço"))?;
        scope.ensure_owns(service.tenant_id)?;

        let account = self
            .catalog_repo
            .create_account(&mut *tx, scope, service.id, &data)
            .await?;

        let created = self
            .catalog_repo
            .create_screens(&mut *tx, scope, account.id, service.screens_total)
            .await?;

        tx.commit().await?;

        tracing::info!(
            account_id = %account.id,
            service_id = %service.id,
            screens = created,
            "conta criada com as suas telas"
        );
        Ok(account)
    }

    pub async fn list_accounts(
        &self,
        scope: &TenantScope,
        service_id: Uuid,
    ) -> Result<Vec<AccountAvailability>, AppError> {
        self.catalog_repo
            .list_accounts_with_availability(scope, service_id)
            .await
    }

    /// Conta inativa sai do pool: as telas livres dela deixam de ser alocáveis.
    pub async fn update_account(
        &self,
        scope: &TenantScope,
        account_id: Uuid,
        data: AccountData<'_>,
        is_active: bool,
    ) -> Result<Account, AppError> {
        let account = self
            .catalog_repo
            .update_account(&self.pool, scope, account_id, &data, is_active)
            .await?
            .ok_or(AppError::ResourceNotFound("Conta"))?;
        tracing::info!(
            account_id = %account.id,
            is_active = account.is_active,
            password_changed = data.password.is_some(),
            "conta atualizada"
        );
        Ok(account)
    }

    /// Conta com alguma tela vendida não pode ser excluída.
    pub async fn delete_account(&self, scope: &TenantScope, account_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let account = self
            .catalog_repo
            .find_account(&mut *tx, scope, account_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Conta"))?;

        if self
            .catalog_repo
            .account_has_sold_screens(&mut *tx, scope, account.id)
            .await?
        {
            return Err(AppError::AccountHasSoldScreens);
        }

        self.catalog_repo
            .delete_account(&mut *tx, scope, account.id)
            .await?;
        tx.commit().await?;

        tracing::info!(account_id = %account.id, "conta excluída");
        Ok(())
    }
}
