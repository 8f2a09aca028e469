// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermAdminEdit, PermAdminRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::settings::{PaymentConfigView, UpdatePaymentConfigRequest, GATEWAY_MERCADOPAGO},
};

// GET /api/settings/payment
#[utoipa::path(
    get,
    path = "/api/settings/payment",
    tag = "Settings",
    responses(
        (status = 200, description = "Configuração do gateway (token mascarado)", body = PaymentConfigView),
        (status = 404, description = "Empresa ainda sem configuração")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_payment_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminRead>,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .settings_repo
        .find_payment_config(&tenant.0, GATEWAY_MERCADOPAGO)
        .await
        .and_then(|cfg| cfg.ok_or(AppError::ResourceNotFound("Configuração de pagamento")))
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(PaymentConfigView::from(&config))))
}

// PUT /api/settings/payment
#[utoipa::path(
    put,
    path = "/api/settings/payment",
    tag = "Settings",
    request_body = UpdatePaymentConfigRequest,
    responses(
        (status = 200, description = "Configuração salva", body = PaymentConfigView)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_payment_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminEdit>,
    Json(payload): Json<UpdatePaymentConfigRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .settings_repo
        .upsert_payment_config(
            &app_state.db_pool,
            &tenant.0,
            GATEWAY_MERCADOPAGO,
            payload.access_token.trim(),
            payload.public_key.as_deref(),
            payload.is_active,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!(
        tenant_id = %tenant.0.tenant_id(),
        is_active = updated.is_active,
        is_test = updated.is_test_credential(),
        "configuração do gateway atualizada"
    );

    Ok((StatusCode::OK, Json(PaymentConfigView::from(&updated))))
}
