// src/services/sale_service.rs

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{datetime::business_range_utc, error::AppError, tenant::TenantScope},
    db::{
        sales_repo::NewSale, CapacityRepository, CatalogRepository, CustomerRepository, PoolScope,
        SalesRepository,
    },
    models::{
        auth::User,
        catalog::{Account, SalePrice, Service},
        sales::{normalize_phone, Customer, Sale, SaleStatus},
    },
};

/// Venda manual registrada pelo vendedor.
#[derive(Debug, Clone)]
pub struct PendingSaleInput<'a> {
    pub service_id: Uuid,
    pub account_id: Option<Uuid>,
    pub customer_phone: &'a str,
    pub customer_name: Option<&'a str>,
    pub customer_email: Option<&'a str>,
}

/// Resultado do cancelamento: repetir o pedido não é erro, só aviso.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub sale: Sale,
    pub already_cancelled: bool,
}

// ---
// Ciclo de vida da venda (fluxo manual)
// ---
#[derive(Clone)]
pub struct SaleService {
    sales_repo: SalesRepository,
    catalog_repo: CatalogRepository,
    capacity_repo: CapacityRepository,
    customer_repo: CustomerRepository,
    pool: PgPool,
}

impl SaleService {
    pub fn new(
        sales_repo: SalesRepository,
        catalog_repo: CatalogRepository,
        capacity_repo: CapacityRepository,
        customer_repo: CustomerRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            sales_repo,
            catalog_repo,
            capacity_repo,
            customer_repo,
            pool,
        }
    }

    /// A conta precisa ser do mesmo serviço e estar ativa.
    fn check_account(scope: &TenantScope, service: &Service, account: &Account) -> Result<(), AppError> {
        scope.ensure_owns(account.tenant_id)?;
        if account.service_id != service.id || !account.is_active {
            return Err(AppError::ResourceNotFound("Conta"));
        }
        Ok(())
    }

    /// Cria a venda. Com conta escolhida e tela livre, já nasce ATIVA;
    /// caso contrário fica PENDENTE, sem tela.
    pub async fn create_pending(
        &self,
        scope: &TenantScope,
        seller: &User,
        input: PendingSaleInput<'_>,
    ) -> Result<Sale, AppError> {
        let phone = normalize_phone(input.customer_phone);

        let mut tx = self.pool.begin().await?;

        let service = self
            .catalog_repo
            .find_service(&mut *tx, scope, input.service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(AppError::ResourceNotFound("Serviço"))?;
        scope.ensure_owns(service.tenant_id)?;

        let account = match input.account_id {
            Some(account_id) => {
                let account = self
                    .catalog_repo
                    .find_account(&mut *tx, scope, account_id)
                    .await?
                    .ok_or(AppError::ResourceNotFound("Conta"))?;
                Self::check_account(scope, &service, &account)?;
                Some(account)
            }
            None => None,
        };

        let price = SalePrice::resolve(&service, account.as_ref());

        let customer = self
            .customer_repo
            .find_or_create(&mut *tx, scope, &phone, input.customer_name, input.customer_email)
            .await?;

        let screen = match &account {
            Some(account) => {
                self.capacity_repo
                    .allocate_any_free(&mut *tx, scope, PoolScope::Account(account.id))
                    .await?
            }
            None => None,
        };

        let (status, delivered_at) = match &screen {
            Some(_) => (SaleStatus::Ativa, Some(Utc::now())),
            None => (SaleStatus::Pendente, None),
        };

        let sale = self
            .sales_repo
            .insert(
                &mut *tx,
                scope,
                &NewSale {
                    customer_id: customer.id,
                    service_id: service.id,
                    seller_id: Some(seller.id),
                    screen_id: screen.as_ref().map(|s| s.id),
                    sale_amount: price.amount,
                    commission_amount: price.commission,
                    gateway_fee: rust_decimal::Decimal::ZERO,
                    status,
                    delivery_email: input.customer_email,
                    delivered_at,
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            tenant_id = %scope.tenant_id(),
            screen_id = ?sale.screen_id,
            status = sale.status.as_str(),
            "venda registrada"
        );
        Ok(sale)
    }

    /// PENDENTE -> ATIVA com uma tela da conta escolhida.
    pub async fn finalize_manual(
        &self,
        scope: &TenantScope,
        sale_id: Uuid,
        account_id: Uuid,
    ) -> Result<Sale, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .sales_repo
            .lock_by_id(&mut *tx, scope, sale_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Venda"))?;
        scope.ensure_owns(sale.tenant_id)?;

        if !sale.status.can_finalize_manually() {
            tracing::warn!(sale_id = %sale.id, status = sale.status.as_str(), "venda já finalizada");
            return Err(AppError::AlreadyFinalized);
        }

        let service = self
            .catalog_repo
            .find_service(&mut *tx, scope, sale.service_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Serviço"))?;

        let account = self
            .catalog_repo
            .find_account(&mut *tx, scope, account_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Conta"))?;
        Self::check_account(scope, &service, &account)?;

        // Sem tela livre: a transação é desfeita e a venda segue PENDENTE
        let screen = self
            .capacity_repo
            .allocate_any_free(&mut *tx, scope, PoolScope::Account(account.id))
            .await?
            .ok_or(AppError::NoCapacityAvailable)?;

        let price = SalePrice::resolve(&service, Some(&account));

        let sale = self
            .sales_repo
            .activate(&mut *tx, scope, sale.id, screen.id, price.amount, price.commission)
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            tenant_id = %scope.tenant_id(),
            screen_id = %screen.id,
            status = sale.status.as_str(),
            "venda finalizada"
        );
        Ok(sale)
    }

    /// Cancela de qualquer status não terminal, devolvendo a tela ao pool.
    pub async fn cancel(&self, scope: &TenantScope, sale_id: Uuid) -> Result<CancelOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .sales_repo
            .lock_by_id(&mut *tx, scope, sale_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Venda"))?;
        scope.ensure_owns(sale.tenant_id)?;

        match sale.status {
            SaleStatus::Cancelada => {
                tracing::warn!(sale_id = %sale.id, "venda já estava cancelada");
                return Ok(CancelOutcome {
                    sale,
                    already_cancelled: true,
                });
            }
            status if status.is_terminal() => {
                return Err(AppError::InvalidSaleTransition {
                    from: status,
                    action: "cancelar",
                });
            }
            _ => {}
        }

        if let Some(screen_id) = sale.screen_id {
            self.capacity_repo.release(&mut *tx, scope, screen_id).await?;
        }

        let cancelled = self.sales_repo.mark_cancelled(&mut *tx, scope, sale.id).await?;
        tx.commit().await?;

        tracing::info!(
            sale_id = %cancelled.id,
            tenant_id = %scope.tenant_id(),
            released_screen = ?sale.screen_id,
            status = cancelled.status.as_str(),
            "venda cancelada"
        );
        Ok(CancelOutcome {
            sale: cancelled,
            already_cancelled: false,
        })
    }

    pub async fn get(&self, scope: &TenantScope, sale_id: Uuid) -> Result<Sale, AppError> {
        self.sales_repo
            .find_by_id(&self.pool, scope, sale_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Venda"))
    }

    /// Listagem com filtro de status e de período (dias de negócio).
    pub async fn list(
        &self,
        scope: &TenantScope,
        status: Option<SaleStatus>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Sale>, AppError> {
        self.sales_repo
            .list(scope, status, business_range_utc(from, to))
            .await
    }

    pub async fn list_pending(&self, scope: &TenantScope) -> Result<Vec<Sale>, AppError> {
        self.sales_repo.list_pending(scope).await
    }

    pub async fn list_customers(&self, scope: &TenantScope) -> Result<Vec<Customer>, AppError> {
        self.customer_repo.list(scope).await
    }
}
