// src/services/checkout_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, tenant::TenantScope},
    db::{
        sales_repo::{NewSale, PaymentAttachment},
        CapacityRepository, CatalogRepository, CustomerRepository, PoolScope, SalesRepository,
        TenantRepository,
    },
    models::{
        catalog::ServiceAvailability,
        sales::{gateway_fee, normalize_phone, PublicOrderStatus, Sale, SaleAccessToken, SaleStatus},
        tenancy::Tenant,
    },
    services::{catalog_service::CatalogService, payment::GatewayResolver},
};

/// Loja pública de uma empresa.
#[derive(Debug, Clone)]
pub struct Storefront {
    pub tenant: Tenant,
    pub services: Vec<ServiceAvailability>,
}

/// Venda criada pelo checkout, já com o token público.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub sale: Sale,
    pub access_token: String,
}

// ---
// Checkout público (sem login): cria a venda e o pagamento
// ---
#[derive(Clone)]
pub struct CheckoutService {
    tenant_repo: TenantRepository,
    catalog_repo: CatalogRepository,
    capacity_repo: CapacityRepository,
    customer_repo: CustomerRepository,
    sales_repo: SalesRepository,
    catalog_service: CatalogService,
    gateways: Arc<dyn GatewayResolver>,
    pool: PgPool,
}

impl CheckoutService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_repo: TenantRepository,
        catalog_repo: CatalogRepository,
        capacity_repo: CapacityRepository,
        customer_repo: CustomerRepository,
        sales_repo: SalesRepository,
        catalog_service: CatalogService,
        gateways: Arc<dyn GatewayResolver>,
        pool: PgPool,
    ) -> Self {
        Self {
            tenant_repo,
            catalog_repo,
            capacity_repo,
            customer_repo,
            sales_repo,
            catalog_service,
            gateways,
            pool,
        }
    }

    async fn tenant_by_slug(&self, slug: &str) -> Result<Tenant, AppError> {
        self.tenant_repo
            .find_active_by_slug(slug)
            .await?
            .ok_or(AppError::ResourceNotFound("Loja"))
    }

    pub async fn storefront(&self, slug: &str) -> Result<Storefront, AppError> {
        let tenant = self.tenant_by_slug(slug).await?;
        let scope = TenantScope::of_tenant(&tenant);
        let services = self.catalog_service.list_with_availability(&scope, true).await?;
        Ok(Storefront { tenant, services })
    }

    /// Cria a venda AGUARDANDO_PAGAMENTO e o pagamento no gateway.
    /// Nenhuma trava fica aberta durante a chamada HTTP.
    pub async fn checkout(
        &self,
        slug: &str,
        service_id: Uuid,
        email: &str,
        phone: &str,
    ) -> Result<CheckoutReceipt, AppError> {
        let tenant = self.tenant_by_slug(slug).await?;
        let scope = TenantScope::of_tenant(&tenant);

        let service = self
            .catalog_repo
            .find_service(&self.pool, &scope, service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(AppError::ResourceNotFound("Serviço"))?;
        scope.ensure_owns(service.tenant_id)?;

        // Sem estoque: nenhuma venda é criada
        let free = self
            .capacity_repo
            .count_free(&scope, PoolScope::Service(service.id))
            .await?;
        if free == 0 {
            tracing::warn!(service_id = %service.id, tenant_id = %scope.tenant_id(), "checkout sem telas livres");
            return Err(AppError::NoCapacityAvailable);
        }

        let gateway = self.gateways.for_tenant(&scope).await?;

        let phone = normalize_phone(phone);
        let amount = service.default_price;
        let token = SaleAccessToken::generate();

        let mut tx = self.pool.begin().await?;

        let customer = self
            .customer_repo
            .find_or_create(&mut *tx, &scope, &phone, None, Some(email))
            .await?;

        let sale = self
            .sales_repo
            .insert(
                &mut *tx,
                &scope,
                &NewSale {
                    customer_id: customer.id,
                    service_id: service.id,
                    seller_id: None,
                    screen_id: None,
                    sale_amount: amount,
                    commission_amount: Decimal::ZERO,
                    gateway_fee: gateway_fee(amount),
                    status: SaleStatus::AguardandoPagamento,
                    delivery_email: Some(email),
                    delivered_at: None,
                },
            )
            .await?;

        self.sales_repo
            .create_access_token(&mut *tx, &scope, sale.id, &token)
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            tenant_id = %scope.tenant_id(),
            status = sale.status.as_str(),
            "venda do checkout criada, aguardando pagamento"
        );

        // Falha no gateway: a venda fica como criada, sem id de pagamento
        let intent = match gateway
            .create_payment(amount, &format!("Acesso {}", service.name), email)
            .await
        {
            Ok(intent) => intent,
            Err(e) => {
                tracing::error!(sale_id = %sale.id, error = %e, "falha ao criar pagamento no gateway");
                return Err(e);
            }
        };

        let pix = intent.pix.as_ref();
        let sale = self
            .sales_repo
            .attach_payment(
                &self.pool,
                &scope,
                sale.id,
                &PaymentAttachment {
                    payment_id: &intent.external_id,
                    payment_status: &intent.status,
                    payment_method: intent.method,
                    pix_qr_code: pix.and_then(|p| p.qr_code.as_deref()),
                    pix_qr_code_base64: pix.and_then(|p| p.qr_code_base64.as_deref()),
                },
            )
            .await?;

        tracing::info!(
            sale_id = %sale.id,
            payment_id = %intent.external_id,
            payment_status = %intent.status,
            "pagamento vinculado à venda"
        );

        Ok(CheckoutReceipt {
            sale,
            access_token: token,
        })
    }

    /// Consulta pública pelo token do pedido.
    pub async fn order_status(&self, token: &str) -> Result<PublicOrderStatus, AppError> {
        self.sales_repo
            .find_public_status(token)
            .await?
            .map(PublicOrderStatus::without_stale_pix)
            .ok_or(AppError::ResourceNotFound("Pedido"))
    }
}
