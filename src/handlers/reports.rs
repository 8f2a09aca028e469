// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermAdminRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::reports::{ReportPeriod, SalesReport},
};

#[utoipa::path(
    get,
    path = "/api/reports/sales",
    tag = "Reports",
    params(ReportPeriod),
    responses(
        (status = 200, description = "Indicadores, comissões por vendedor e vendas por dia", body = SalesReport),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn sales_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminRead>,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    if let (Some(from), Some(to)) = (period.from, period.to) {
        if from > to {
            let mut errors = validator::ValidationErrors::new();
            let mut err = validator::ValidationError::new("range");
            err.message = Some("A data inicial deve ser anterior à final.".into());
            errors.add("from", err);
            return Err(AppError::ValidationError(errors).to_api_error(&locale, &app_state.i18n_store));
        }
    }

    let report = app_state
        .report_service
        .sales_report(&tenant.0, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
