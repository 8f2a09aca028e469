// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::{error::{ApiError, AppError}, tenant::TenantScope},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// O middleware em si: valida o Bearer e guarda o usuário na requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
    };

    let user = app_state
        .auth_service
        .validate_token(bearer.token())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Roda depois do `auth_guard`: bloqueia empresas com licença vencida.
pub async fn license_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    app_state
        .tenant_service
        .active_license(&TenantScope::of_user(&user.0))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(next.run(request).await)
}

/// Rotas do operador da plataforma (acima das empresas).
/// Sem token configurado elas ficam indisponíveis.
pub async fn operator_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = app_state.platform_admin_token.as_deref() else {
        return Err(AppError::OperatorAuthUnavailable.to_api_error(&locale, &app_state.i18n_store));
    };

    match bearer {
        Some(TypedHeader(Authorization(bearer))) if bearer.token() == expected => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!("acesso de operador recusado");
            Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
        }
    }
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
