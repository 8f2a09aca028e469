// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::{
        error::{ApiError, AppError},
        tenant::TenantScope,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
        let reject = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        let user = AuthenticatedUser::from_request_parts(parts, state)
            .await
            .map_err(reject)?;

        let required_perm = T::slug();
        let has_permission = app_state
            .rbac_repo
            .user_has_permission(&TenantScope::of_user(&user.0), user.0.id, required_perm)
            .await
            .map_err(reject)?;

        if !has_permission {
            tracing::warn!(user_id = %user.0.id, permission = required_perm, "acesso negado");
            return Err(reject(AppError::Forbidden(required_perm.to_string())));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermSaleRead;
impl PermissionDef for PermSaleRead {
    fn slug() -> &'static str { "venda:ver" }
}

pub struct PermSaleCreate;
impl PermissionDef for PermSaleCreate {
    fn slug() -> &'static str { "venda:criar" }
}

pub struct PermSaleEdit;
impl PermissionDef for PermSaleEdit {
    fn slug() -> &'static str { "venda:editar" }
}

pub struct PermAdminRead;
impl PermissionDef for PermAdminRead {
    fn slug() -> &'static str { "administrativo:ver" }
}

pub struct PermAdminCreate;
impl PermissionDef for PermAdminCreate {
    fn slug() -> &'static str { "administrativo:criar" }
}

pub struct PermAdminEdit;
impl PermissionDef for PermAdminEdit {
    fn slug() -> &'static str { "administrativo:editar" }
}

pub struct PermAdminDelete;
impl PermissionDef for PermAdminDelete {
    fn slug() -> &'static str { "administrativo:excluir" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::ALL_PERMISSIONS;

    #[test]
    fn every_guard_slug_is_a_known_permission() {
        for slug in [
            PermSaleRead::slug(),
            PermSaleCreate::slug(),
            PermSaleEdit::slug(),
            PermAdminRead::slug(),
            PermAdminCreate::slug(),
            PermAdminEdit::slug(),
            PermAdminDelete::slug(),
        ] {
            assert!(ALL_PERMISSIONS.contains(&slug), "{slug}");
        }
    }
}
