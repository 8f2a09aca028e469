// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::catalog_repo::{AccountData, ServiceData},
    middleware::{
        i18n::Locale,
        rbac::{PermAdminCreate, PermAdminDelete, PermAdminEdit, PermAdminRead, PermSaleRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::catalog::{Account, AccountAvailability, Service, ServiceAvailability, ServiceKind},
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Netflix Compartilhado")]
    pub name: String,

    pub image_url: Option<String>,

    pub kind: ServiceKind,

    // Ignorado para serviço individual (sempre 1)
    #[validate(range(min = 1, max = 50, message = "A quantidade de telas deve ficar entre 1 e 50."))]
    #[serde(default = "default_screens")]
    #[schema(example = 4)]
    pub screens_total: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 29.90)]
    pub default_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(value_type = f64, example = 5.00)]
    pub default_commission: Decimal,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_screens() -> i32 {
    1
}

fn default_active() -> bool {
    true
}

impl ServicePayload {
    fn as_data(&self) -> ServiceData<'_> {
        ServiceData {
            name: &self.name,
            image_url: self.image_url.as_deref(),
            kind: self.kind,
            screens_total: self.screens_total,
            default_price: self.default_price,
            default_commission: self.default_commission,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountPayload {
    #[validate(length(min = 1, message = "O login da conta é obrigatório."))]
    #[schema(example = "conta01@provedor.com")]
    pub login_email: String,

    pub password: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub price_override: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub commission_override: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>, example = 55.90)]
    pub invested_amount: Option<Decimal>,
}

// Senha ausente mantém a atual
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountPayload {
    #[validate(length(min = 1, message = "O login da conta é obrigatório."))]
    #[schema(example = "conta01@provedor.com")]
    pub login_email: String,

    #[validate(length(min = 1, message = "A senha não pode ser vazia."))]
    pub password: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub price_override: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub commission_override: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>, example = 55.90)]
    pub invested_amount: Option<Decimal>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ServiceListQuery {
    /// Só os serviços ativos
    #[serde(default)]
    pub only_active: bool,
}

// ---
// Serviços
// ---
#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Catalog",
    request_body = ServicePayload,
    responses(
        (status = 201, description = "Serviço criado", body = Service)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminCreate>,
    Json(payload): Json<ServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .catalog_service
        .create_service(&tenant.0, payload.as_data())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Catalog",
    params(ServiceListQuery),
    responses(
        (status = 200, description = "Serviços com telas livres e vendidas", body = Vec<ServiceAvailability>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaleRead>,
    Query(query): Query<ServiceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .catalog_service
        .list_with_availability(&tenant.0, query.only_active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(services))
}

// Também serve para desativar (isActive = false)
#[utoipa::path(
    put,
    path = "/api/services/{service_id}",
    tag = "Catalog",
    request_body = ServicePayload,
    responses(
        (status = 200, description = "Serviço atualizado", body = Service),
        (status = 404, description = "Serviço não encontrado")
    ),
    params(
        ("service_id" = Uuid, Path, description = "ID do Serviço")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminEdit>,
    Path(service_id): Path<Uuid>,
    Json(payload): Json<ServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .catalog_service
        .update_service(&tenant.0, service_id, payload.as_data(), payload.is_active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(service))
}

#[utoipa::path(
    delete,
    path = "/api/services/{service_id}",
    tag = "Catalog",
    responses(
        (status = 204, description = "Serviço excluído"),
        (status = 404, description = "Serviço não encontrado"),
        (status = 409, description = "O serviço ainda possui contas ou vendas")
    ),
    params(
        ("service_id" = Uuid, Path, description = "ID do Serviço")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminDelete>,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_service(&tenant.0, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Contas (e as suas telas)
// ---
#[utoipa::path(
    post,
    path = "/api/services/{service_id}/accounts",
    tag = "Catalog",
    request_body = CreateAccountPayload,
    responses(
        (status = 201, description = "Conta criada com as suas telas", body = Account),
        (status = 404, description = "Serviço não encontrado")
    ),
    params(
        ("service_id" = Uuid, Path, description = "ID do Serviço")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_account(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminCreate>,
    Path(service_id): Path<Uuid>,
    Json(payload): Json<CreateAccountPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let account = app_state
        .catalog_service
        .create_account(
            &tenant.0,
            service_id,
            AccountData {
                login_email: &payload.login_email,
                password: payload.password.as_deref(),
                price_override: payload.price_override,
                commission_override: payload.commission_override,
                invested_amount: payload.invested_amount,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    get,
    path = "/api/services/{service_id}/accounts",
    tag = "Catalog",
    responses(
        (status = 200, description = "Contas do serviço com telas livres e vendidas", body = Vec<AccountAvailability>)
    ),
    params(
        ("service_id" = Uuid, Path, description = "ID do Serviço")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_accounts(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminRead>,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = app_state
        .catalog_service
        .list_accounts(&tenant.0, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(accounts))
}

// Também serve para tirar a conta do pool (isActive = false)
#[utoipa::path(
    put,
    path = "/api/accounts/{account_id}",
    tag = "Catalog",
    request_body = UpdateAccountPayload,
    responses(
        (status = 200, description = "Conta atualizada", body = Account),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("account_id" = Uuid, Path, description = "ID da Conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_account(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminEdit>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<UpdateAccountPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let account = app_state
        .catalog_service
        .update_account(
            &tenant.0,
            account_id,
            AccountData {
                login_email: &payload.login_email,
                password: payload.password.as_deref(),
                price_override: payload.price_override,
                commission_override: payload.commission_override,
                invested_amount: payload.invested_amount,
            },
            payload.is_active,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(account))
}

#[utoipa::path(
    delete,
    path = "/api/accounts/{account_id}",
    tag = "Catalog",
    responses(
        (status = 204, description = "Conta excluída"),
        (status = 409, description = "A conta possui telas vendidas")
    ),
    params(
        ("account_id" = Uuid, Path, description = "ID da Conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_account(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminDelete>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_account(&tenant.0, account_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
