// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::{error::AppError, tenant::TenantScope},
    middleware::auth::AuthenticatedUser,
};

// A empresa do pedido sai do usuário autenticado, nunca de um
// cabeçalho ou parâmetro enviado pelo cliente.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub TenantScope);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        Ok(TenantContext(TenantScope::of_user(&user.0)))
    }
}
