// src/handlers/users.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermAdminCreate, PermAdminRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::auth::{User, ALL_PERMISSIONS},
    services::tenancy_service::NewUser,
};

fn validate_permissions(permissions: &[String]) -> Result<(), ValidationError> {
    if let Some(unknown) = permissions
        .iter()
        .find(|p| !ALL_PERMISSIONS.contains(&p.as_str()))
    {
        let mut err = ValidationError::new("permission");
        err.add_param("value".into(), unknown);
        err.message = Some(format!("Permissão desconhecida: '{unknown}'.").into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Vendedor 01")]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    #[validate(custom(function = "validate_permissions"))]
    #[serde(default)]
    #[schema(example = json!(["venda:ver", "venda:criar"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub user: User,
    pub permissions: Vec<String>,
}

// Cadastro da equipe pelo administrador da empresa
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado com as permissões pedidas", body = CreateUserResponse),
        (status = 400, description = "Dados inválidos ou permissão desconhecida"),
        (status = 409, description = "E-mail já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminCreate>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let permissions: Vec<&str> = payload.permissions.iter().map(String::as_str).collect();
    let (user, permissions) = app_state
        .tenant_service
        .create_user(
            &tenant.0,
            NewUser {
                name: &payload.name,
                email: &payload.email,
                password: &payload.password,
                permissions: &permissions,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(CreateUserResponse { user, permissions })))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários da empresa", body = Vec<User>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermAdminRead>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .tenant_service
        .list_users(&tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}
