// src/db/report_repo.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::{
        datetime::{UtcRange, BUSINESS_UTC_OFFSET_HOURS},
        error::AppError,
        tenant::TenantScope,
    },
    models::reports::{DailySales, SalesKpis, SellerCommission, REPORTED_STATUSES},
};

fn reported_statuses() -> Vec<String> {
    REPORTED_STATUSES.iter().map(|s| s.as_str().to_string()).collect()
}

// Filtro comum: empresa ($1), status reportados ($2), período UTC ($3, $4)
const SALES_FILTER: &str = r#"
    v.tenant_id = $1
    AND v.status = ANY($2::text[]::sale_status[])
    AND ($3::timestamptz IS NULL OR v.created_at >= $3)
    AND ($4::timestamptz IS NULL OR v.created_at < $4)
"#;

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn kpis(&self, scope: &TenantScope, range: UtcRange) -> Result<SalesKpis, AppError> {
        // Mesma transação para as duas consultas
        let mut tx = self.pool.begin().await?;

        let (count, sold, commission, fees): (i64, Decimal, Decimal, Decimal) =
            sqlx::query_as(&format!(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(v.sale_amount), 0),
                       COALESCE(SUM(v.commission_amount), 0),
                       COALESCE(SUM(v.gateway_fee), 0)
                FROM sales v
                WHERE {SALES_FILTER}
                "#
            ))
            .bind(scope.tenant_id())
            .bind(reported_statuses())
            .bind(range.0)
            .bind(range.1)
            .fetch_one(&mut *tx)
            .await?;

        let invested: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(invested_amount), 0) FROM accounts WHERE tenant_id = $1 AND is_active",
        )
        .bind(scope.tenant_id())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SalesKpis::compute(count, sold, commission, fees, invested))
    }

    pub async fn commission_by_seller(
        &self,
        scope: &TenantScope,
        range: UtcRange,
    ) -> Result<Vec<SellerCommission>, AppError> {
        let rows = sqlx::query_as::<_, SellerCommission>(&format!(
            r#"
            SELECT u.id AS seller_id, u.name AS seller_name,
                   COUNT(v.id) AS sales_count,
                   COALESCE(SUM(v.commission_amount), 0) AS total_commission
            FROM sales v
            JOIN users u ON u.id = v.seller_id AND u.tenant_id = v.tenant_id
            WHERE {SALES_FILTER}
            GROUP BY u.id, u.name
            ORDER BY total_commission DESC
            "#
        ))
        .bind(scope.tenant_id())
        .bind(reported_statuses())
        .bind(range.0)
        .bind(range.1)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Agrupa pelo dia de negócio (UTC deslocado pelo fuso fixo).
    pub async fn sales_by_day(
        &self,
        scope: &TenantScope,
        range: UtcRange,
    ) -> Result<Vec<DailySales>, AppError> {
        let rows = sqlx::query_as::<_, DailySales>(&format!(
            r#"
            SELECT ((v.created_at AT TIME ZONE 'UTC') + make_interval(hours => $5))::date AS day,
                   COUNT(*) AS sales_count,
                   COALESCE(SUM(v.sale_amount), 0) AS total_sold
            FROM sales v
            WHERE {SALES_FILTER}
            GROUP BY day
            ORDER BY day
            "#
        ))
        .bind(scope.tenant_id())
        .bind(reported_statuses())
        .bind(range.0)
        .bind(range.1)
        .bind(BUSINESS_UTC_OFFSET_HOURS)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

