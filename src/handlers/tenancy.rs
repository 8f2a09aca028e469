// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        auth::User,
        tenancy::{License, Tenant},
    },
    services::tenancy_service::NewTenant,
};

// O slug vira o endereço da loja: /loja/{slug}
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if !valid {
        let mut err = ValidationError::new("slug");
        err.message = Some("Use apenas letras minúsculas, números e hífen.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// 1. "Payload" (O "Formulário" da API)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    #[schema(example = "STV Streaming")]
    pub name: String,

    #[validate(
        length(min = 3, max = 60, message = "O slug deve ter entre 3 e 60 caracteres."),
        custom(function = "validate_slug")
    )]
    #[schema(example = "stv-streaming")]
    pub slug: String,

    pub document_number: Option<String>,

    #[validate(length(min = 1, message = "O nome do administrador é obrigatório."))]
    pub admin_name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub admin_email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub admin_password: String,

    // Sem valor: período de teste
    #[validate(range(min = 1, max = 3650, message = "Os dias de licença devem ficar entre 1 e 3650."))]
    #[schema(example = 30)]
    pub license_days: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenewLicensePayload {
    #[validate(range(min = 1, max = 3650, message = "Os dias de licença devem ficar entre 1 e 3650."))]
    #[schema(example = 30)]
    pub access_days: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantResponse {
    pub tenant: Tenant,
    pub admin: User,
    pub license: License,
    pub token: String,
}

// ---
// 2. Os "Handlers" - rotas do operador da plataforma
// ---
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Empresa, administrador e licença criados", body = CreateTenantResponse),
        (status = 401, description = "Token de operador ausente ou inválido"),
        (status = 409, description = "Slug ou e-mail já em uso"),
        (status = 503, description = "Acesso de operador não configurado")
    ),
    security(("operator_token" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (tenant, admin, license) = app_state
        .tenant_service
        .create_tenant_with_admin(NewTenant {
            name: &payload.name,
            slug: &payload.slug,
            document_number: payload.document_number.as_deref(),
            admin_name: &payload.admin_name,
            admin_email: &payload.admin_email,
            admin_password: &payload.admin_password,
            license_days: payload.license_days,
        })
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // O administrador já sai logado
    let token = app_state
        .auth_service
        .create_token(admin.id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTenantResponse {
            tenant,
            admin,
            license,
            token,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/tenants/{tenant_id}/license",
    tag = "Tenancy",
    request_body = RenewLicensePayload,
    responses(
        (status = 200, description = "Licença renovada a partir de hoje", body = License),
        (status = 401, description = "Token de operador ausente ou inválido"),
        (status = 404, description = "Empresa não encontrada"),
        (status = 503, description = "Acesso de operador não configurado")
    ),
    params(
        ("tenant_id" = Uuid, Path, description = "ID da Empresa")
    ),
    security(("operator_token" = []))
)]
pub async fn renew_license(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<RenewLicensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let license = app_state
        .tenant_service
        .renew_license(tenant_id, payload.access_days)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(license))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_words_joined_by_hyphens() {
        assert!(validate_slug("stv-streaming").is_ok());
        assert!(validate_slug("loja2025").is_ok());
        assert!(validate_slug("Minha Loja").is_err());
        assert!(validate_slug("-loja").is_err());
        assert!(validate_slug("loja_01").is_err());
    }

    #[test]
    fn renewal_needs_at_least_one_day() {
        assert!(RenewLicensePayload { access_days: 30 }.validate().is_ok());
        assert!(RenewLicensePayload { access_days: 0 }.validate().is_err());
    }
}
