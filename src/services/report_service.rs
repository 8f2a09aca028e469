// src/services/report_service.rs

use crate::{
    common::{datetime::business_range_utc, error::AppError, tenant::TenantScope},
    db::ReportRepository,
    models::reports::{ReportPeriod, SalesReport},
};

#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
}

impl ReportService {
    pub fn new(report_repo: ReportRepository) -> Self {
        Self { report_repo }
    }

    /// Relatório do período (dias de negócio, `from..=to`).
    pub async fn sales_report(
        &self,
        scope: &TenantScope,
        period: &ReportPeriod,
    ) -> Result<SalesReport, AppError> {
        let range = business_range_utc(period.from, period.to);

        let kpis = self.report_repo.kpis(scope, range).await?;
        let by_seller = self.report_repo.commission_by_seller(scope, range).await?;
        let by_day = self.report_repo.sales_by_day(scope, range).await?;

        tracing::debug!(
            tenant_id = %scope.tenant_id(),
            sales = kpis.sales_count,
            "relatório de vendas gerado"
        );

        Ok(SalesReport {
            from: period.from,
            to: period.to,
            kpis,
            by_seller,
            by_day,
        })
    }
}
