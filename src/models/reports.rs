// src/models/reports.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::sales::SaleStatus;

/// Status que entram nos relatórios (vendas válidas, pagas ou não).
pub const REPORTED_STATUSES: [SaleStatus; 4] = [
    SaleStatus::Pendente,
    SaleStatus::Ativa,
    SaleStatus::Pago,
    SaleStatus::Entregue,
];

// Filtro de período (dias de negócio, inclusivo)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportPeriod {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesKpis {
    pub sales_count: i64,
    pub total_sold: Decimal,
    pub total_commission: Decimal,
    pub total_gateway_fees: Decimal,
    pub total_invested: Decimal,
    pub profit: Decimal,
}

impl SalesKpis {
    /// Lucro = vendido - comissões - taxas do gateway - investido.
    pub fn compute(
        sales_count: i64,
        total_sold: Decimal,
        total_commission: Decimal,
        total_gateway_fees: Decimal,
        total_invested: Decimal,
    ) -> Self {
        Self {
            sales_count,
            total_sold,
            total_commission,
            total_gateway_fees,
            total_invested,
            profit: total_sold - total_commission - total_gateway_fees - total_invested,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerCommission {
    pub seller_id: Uuid,
    pub seller_name: String,
    pub sales_count: i64,
    pub total_commission: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub day: NaiveDate,
    pub sales_count: i64,
    pub total_sold: Decimal,
}

// Resposta do relatório: indicadores, comissões e vendas por dia
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kpis: SalesKpis,
    pub by_seller: Vec<SellerCommission>,
    pub by_day: Vec<DailySales>,
}
