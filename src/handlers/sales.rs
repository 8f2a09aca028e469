// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSaleCreate, PermSaleEdit, PermSaleRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::sales::{Customer, Sale, SaleFilter},
    services::sale_service::PendingSaleInput,
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    pub service_id: Uuid,

    // Com conta escolhida e tela livre, a venda já nasce ATIVA
    pub account_id: Option<Uuid>,

    #[validate(length(min = 8, message = "Informe o telefone do cliente com DDD."))]
    #[schema(example = "(11) 99999-8888")]
    pub customer_phone: String,

    pub customer_name: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub customer_email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeSalePayload {
    pub account_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelSaleResponse {
    pub sale: Sale,
    pub already_cancelled: bool,
}

// ---
// Handlers
// ---
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda registrada (PENDENTE ou ATIVA)", body = Sale),
        (status = 404, description = "Serviço ou conta não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleCreate>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .sale_service
        .create_pending(
            &tenant.0,
            &user.0,
            PendingSaleInput {
                service_id: payload.service_id,
                account_id: payload.account_id,
                customer_phone: &payload.customer_phone,
                customer_name: payload.customer_name.as_deref(),
                customer_email: payload.customer_email.as_deref(),
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[utoipa::path(
    post,
    path = "/api/sales/{sale_id}/finalize",
    tag = "Sales",
    request_body = FinalizeSalePayload,
    responses(
        (status = 200, description = "Venda ATIVA com tela alocada", body = Sale),
        (status = 409, description = "Venda já finalizada ou conta sem telas livres")
    ),
    params(
        ("sale_id" = Uuid, Path, description = "ID da Venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleEdit>,
    Path(sale_id): Path<Uuid>,
    Json(payload): Json<FinalizeSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sale_service
        .finalize_manual(&tenant.0, sale_id, payload.account_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sale))
}

#[utoipa::path(
    post,
    path = "/api/sales/{sale_id}/cancel",
    tag = "Sales",
    responses(
        (status = 200, description = "Venda cancelada (ou já estava)", body = CancelSaleResponse),
        (status = 409, description = "Venda entregue não pode ser cancelada")
    ),
    params(
        ("sale_id" = Uuid, Path, description = "ID da Venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleEdit>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .sale_service
        .cancel(&tenant.0, sale_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(CancelSaleResponse {
        sale: outcome.sale,
        already_cancelled: outcome.already_cancelled,
    }))
}

#[utoipa::path(
    get,
    path = "/api/sales/{sale_id}",
    tag = "Sales",
    responses(
        (status = 200, description = "Venda", body = Sale),
        (status = 404, description = "Venda não encontrada")
    ),
    params(
        ("sale_id" = Uuid, Path, description = "ID da Venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleRead>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sale_service
        .get(&tenant.0, sale_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sale))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleFilter),
    responses(
        (status = 200, description = "Vendas da empresa", body = Vec<Sale>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleRead>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .sale_service
        .list(&tenant.0, filter.status, filter.from, filter.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

#[utoipa::path(
    get,
    path = "/api/sales/pending",
    tag = "Sales",
    responses(
        (status = 200, description = "Vendas PENDENTES aguardando uma tela", body = Vec<Sale>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleRead>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .sale_service
        .list_pending(&tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Sales",
    responses(
        (status = 200, description = "Clientes da empresa", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleRead>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .sale_service
        .list_customers(&tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customers))
}
