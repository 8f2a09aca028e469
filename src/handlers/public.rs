// src/handlers/public.rs

use axum::{
    extract::{Path, State},
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
    middleware::i18n::Locale,
    models::{
        catalog::ServiceAvailability,
        sales::{PublicOrderStatus, SaleStatus},
    },
};

// ---
// Loja pública (sem login)
// ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontResponse {
    pub name: String,
    pub slug: String,
    pub services: Vec<ServiceAvailability>,
}

// Campos em português: é o formulário da loja
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "cliente@email.com")]
    pub email: String,

    #[validate(length(min = 8, message = "Informe o telefone com DDD."))]
    #[schema(example = "(11) 99999-8888")]
    pub telefone: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Token do pedido, usado em /pedido/{token}
    pub token: String,
    pub status: SaleStatus,
    pub payment_status: Option<String>,
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_base64: Option<String>,
}

#[utoipa::path(
    get,
    path = "/loja/{slug}",
    tag = "Storefront",
    responses(
        (status = 200, description = "Serviços ativos da loja", body = StorefrontResponse),
        (status = 404, description = "Loja não encontrada")
    ),
    params(
        ("slug" = String, Path, description = "Endereço da loja")
    )
)]
pub async fn storefront(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .checkout_service
        .storefront(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(StorefrontResponse {
        name: store.tenant.name,
        slug: store.tenant.slug,
        services: store.services,
    }))
}

#[utoipa::path(
    post,
    path = "/loja/{slug}/checkout/{service_id}",
    tag = "Storefront",
    request_body = CheckoutPayload,
    responses(
        (status = 201, description = "Pedido criado, aguardando pagamento", body = CheckoutResponse),
        (status = 409, description = "Sem telas disponíveis"),
        (status = 422, description = "Loja sem configuração de pagamento"),
        (status = 502, description = "Falha no gateway de pagamento"),
        (status = 504, description = "Gateway não respondeu a tempo")
    ),
    params(
        ("slug" = String, Path, description = "Endereço da loja"),
        ("service_id" = Uuid, Path, description = "ID do Serviço")
    )
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, service_id)): Path<(String, Uuid)>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .checkout_service
        .checkout(&slug, service_id, &payload.email, &payload.telefone)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sale = receipt.sale;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            token: receipt.access_token,
            status: sale.status,
            payment_status: sale.payment_status,
            pix_qr_code: sale.pix_qr_code,
            pix_qr_code_base64: sale.pix_qr_code_base64,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/pedido/{token}",
    tag = "Storefront",
    responses(
        (status = 200, description = "Situação do pedido", body = PublicOrderStatus),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("token" = String, Path, description = "Token do pedido")
    )
)]
pub async fn order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .checkout_service
        .order_status(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(status))
}
