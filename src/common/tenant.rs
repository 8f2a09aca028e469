// src/common/tenant.rs

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::{auth::User, sales::Sale, tenancy::Tenant};

// ---
// Escopo de Empresa: a "chave" para o banco de dados
// ---
/// Todo método de repositório que lê ou grava dados de uma empresa recebe
/// um `TenantScope`. Ele só pode ser obtido a partir de um registro já
/// carregado (empresa, usuário autenticado ou venda casada pelo id de
/// pagamento), nunca de um id vindo do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantScope(Uuid);

impl TenantScope {
    /// Loja pública resolvida pelo slug.
    pub fn of_tenant(tenant: &Tenant) -> Self {
        Self(tenant.id)
    }

    /// Empresa do usuário autenticado.
    pub fn of_user(user: &User) -> Self {
        Self(user.tenant_id)
    }

    /// Webhook: a empresa vem estritamente da venda encontrada.
    pub fn of_sale(sale: &Sale) -> Self {
        Self(sale.tenant_id)
    }

    pub fn tenant_id(&self) -> Uuid {
        self.0
    }

    /// Confere que uma linha carregada pertence a este escopo.
    pub fn ensure_owns(&self, row_tenant_id: Uuid) -> Result<(), AppError> {
        if row_tenant_id != self.0 {
            tracing::error!(
                scope = %self.0,
                row_tenant = %row_tenant_id,
                "linha de outra empresa alcançou um caminho com escopo"
            );
            return Err(AppError::TenantIsolationViolation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tenant(id: Uuid) -> Tenant {
        Tenant {
            id,
            name: "Loja".into(),
            slug: "loja".into(),
            document_number: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn rows_of_the_same_tenant_pass() {
        let id = Uuid::new_v4();
        let scope = TenantScope::of_tenant(&tenant(id));
        assert!(scope.ensure_owns(id).is_ok());
    }

    #[test]
    fn rows_of_another_tenant_are_a_violation() {
        let scope = TenantScope::of_tenant(&tenant(Uuid::new_v4()));
        let err = scope.ensure_owns(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::TenantIsolationViolation));
    }
}
