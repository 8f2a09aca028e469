// src/db/sales_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::datetime::UtcRange;
use crate::common::error::AppError;
use crate::common::tenant::TenantScope;
use crate::models::sales::{PublicOrderStatus, Sale, SaleStatus};

const SALE_COLUMNS: &str = "id, tenant_id, customer_id, service_id, seller_id, screen_id, \
     sale_amount, commission_amount, gateway_fee, paid_amount, status, payment_id, \
     payment_status, payment_method, pix_qr_code, pix_qr_code_base64, delivery_email, \
     created_at, paid_at, delivered_at, updated_at";

/// Linha nova de venda.
#[derive(Debug, Clone)]
pub struct NewSale<'a> {
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub screen_id: Option<Uuid>,
    pub sale_amount: Decimal,
    pub commission_amount: Decimal,
    pub gateway_fee: Decimal,
    pub status: SaleStatus,
    pub delivery_email: Option<&'a str>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Dados devolvidos pelo gateway ao criar o pagamento.
#[derive(Debug, Clone)]
pub struct PaymentAttachment<'a> {
    pub payment_id: &'a str,
    pub payment_status: &'a str,
    pub payment_method: &'a str,
    pub pix_qr_code: Option<&'a str>,
    pub pix_qr_code_base64: Option<&'a str>,
}

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        new: &NewSale<'_>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            INSERT INTO sales (tenant_id, customer_id, service_id, seller_id, screen_id,
                               sale_amount, commission_amount, gateway_fee, status,
                               delivery_email, delivered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(scope.tenant_id())
        .bind(new.customer_id)
        .bind(new.service_id)
        .bind(new.seller_id)
        .bind(new.screen_id)
        .bind(new.sale_amount)
        .bind(new.commission_amount)
        .bind(new.gateway_fee)
        .bind(new.status)
        .bind(new.delivery_email)
        .bind(new.delivered_at)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    /// Trava a linha da venda até o fim da transação.
    pub async fn lock_by_id<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND tenant_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    // ---
    // Webhook: a única entrada é o id de pagamento externo.
    // A empresa é derivada da venda encontrada (`TenantScope::of_sale`).
    // ---
    pub async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Sale>, AppError> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sale)
    }

    pub async fn lock_by_payment_id<'e, E>(
        &self,
        executor: E,
        payment_id: &str,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE payment_id = $1 FOR UPDATE"
        ))
        .bind(payment_id)
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    // ---
    // Transições
    // ---
    pub async fn attach_payment<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        payment: &PaymentAttachment<'_>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales
            SET payment_id = $3, payment_status = $4, payment_method = $5,
                pix_qr_code = $6, pix_qr_code_base64 = $7, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .bind(payment.payment_id)
        .bind(payment.payment_status)
        .bind(payment.payment_method)
        .bind(payment.pix_qr_code)
        .bind(payment.pix_qr_code_base64)
        .fetch_optional(executor)
        .await?;
        sale.ok_or(AppError::ResourceNotFound("Venda"))
    }

    pub async fn set_payment_status<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        payment_status: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE sales SET payment_status = $3, updated_at = NOW() WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(scope.tenant_id())
        .bind(payment_status)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn mark_paid<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        paid_amount: Decimal,
        payment_status: &str,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales
            SET status = 'PAGO', paid_amount = $3, payment_status = $4,
                paid_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .bind(paid_amount)
        .bind(payment_status)
        .fetch_optional(executor)
        .await?;
        sale.ok_or(AppError::ResourceNotFound("Venda"))
    }

    /// Pagamento aprovado que chegou numa venda já cancelada: grava o valor
    /// e o status do gateway sem reabrir a venda.
    pub async fn record_late_payment<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        paid_amount: Decimal,
        payment_status: &str,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales
            SET paid_amount = $3, payment_status = $4, paid_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'CANCELADA'
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .bind(paid_amount)
        .bind(payment_status)
        .fetch_optional(executor)
        .await?;
        sale.ok_or(AppError::ResourceNotFound("Venda"))
    }

    pub async fn mark_delivered<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        screen_id: Uuid,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales
            SET status = 'ENTREGUE', screen_id = $3, delivered_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .bind(screen_id)
        .fetch_optional(executor)
        .await?;
        sale.ok_or(AppError::ResourceNotFound("Venda"))
    }

    /// Finalização manual: prende a tela e grava valores recalculados.
    pub async fn activate<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
        screen_id: Uuid,
        sale_amount: Decimal,
        commission_amount: Decimal,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales
            SET status = 'ATIVA', screen_id = $3, sale_amount = $4, commission_amount = $5,
                delivered_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .bind(screen_id)
        .bind(sale_amount)
        .bind(commission_amount)
        .fetch_optional(executor)
        .await?;
        sale.ok_or(AppError::ResourceNotFound("Venda"))
    }

    /// Cancela e solta a tela no mesmo comando.
    pub async fn mark_cancelled<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales
            SET status = 'CANCELADA', screen_id = NULL, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(scope.tenant_id())
        .fetch_optional(executor)
        .await?;
        sale.ok_or(AppError::ResourceNotFound("Venda"))
    }

    // ---
    // Token público
    // ---
    pub async fn create_access_token<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        sale_id: Uuid,
        token: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O INSERT ... SELECT garante que a venda é da empresa do escopo
        let result = sqlx::query(
            r#"
            INSERT INTO sale_access_tokens (sale_id, token)
            SELECT id, $3 FROM sales WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(sale_id)
        .bind(scope.tenant_id())
        .bind(token)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Venda"));
        }
        Ok(())
    }

    pub async fn find_public_status(&self, token: &str) -> Result<Option<PublicOrderStatus>, AppError> {
        let status = sqlx::query_as::<_, PublicOrderStatus>(
            r#"
            SELECT sv.name AS service_name, v.status, v.sale_amount, v.payment_status,
                   v.pix_qr_code, v.pix_qr_code_base64, v.created_at, v.paid_at, v.delivered_at
            FROM sale_access_tokens t
            JOIN sales v ON v.id = t.sale_id
            JOIN services sv ON sv.id = v.service_id AND sv.tenant_id = v.tenant_id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    // ---
    // Listagens do painel
    // ---
    pub async fn list(
        &self,
        scope: &TenantScope,
        status: Option<SaleStatus>,
        (from, to): UtcRange,
    ) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE tenant_id = $1
              AND ($2::sale_status IS NULL OR status = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at < $4)
            ORDER BY created_at DESC
            "#
        ))
        .bind(scope.tenant_id())
        .bind(status)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    pub async fn list_pending(&self, scope: &TenantScope) -> Result<Vec<Sale>, AppError> {
        self.list(scope, Some(SaleStatus::Pendente), (None, None)).await
    }
}
