// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_kind", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum ServiceKind {
    Compartilhado, // Vira "compartilhado"
    Individual,    // Vira "individual"
}

impl ServiceKind {
    /// Quantidade de telas de cada conta: serviço individual sempre tem 1.
    pub fn screens_total(self, requested: i32) -> i32 {
        match self {
            ServiceKind::Individual => 1,
            ServiceKind::Compartilhado => requested,
        }
    }
}

// --- 1. Serviço (produto vendável) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Netflix Compartilhado")]
    pub name: String,
    pub image_url: Option<String>,
    pub kind: ServiceKind,
    #[schema(example = 4)]
    pub screens_total: i32,
    #[schema(example = "29.90")]
    pub default_price: Decimal,
    #[schema(example = "5.00")]
    pub default_commission: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Conta (pool de credenciais de um serviço) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    #[schema(example = "conta01@provedor.com")]
    pub login_email: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password: Option<String>,
    pub price_override: Option<Decimal>,
    pub commission_override: Option<Decimal>,
    pub invested_amount: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Tela (unidade de capacidade) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    #[schema(example = 1)]
    pub number: i32,
    pub sold: bool,
}

/// Valor de venda e comissão efetivos de uma venda.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalePrice {
    pub amount: Decimal,
    pub commission: Decimal,
}

impl SalePrice {
    /// O override da conta vence o padrão do serviço, campo a campo.
    pub fn resolve(service: &Service, account: Option<&Account>) -> Self {
        let amount = account
            .and_then(|a| a.price_override)
            .unwrap_or(service.default_price);
        let commission = account
            .and_then(|a| a.commission_override)
            .unwrap_or(service.default_commission);
        Self { amount, commission }
    }
}

// Vitrine / painel: quantas telas livres e vendidas um serviço tem
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAvailability {
    pub service: Service,
    pub free: i64,
    pub sold: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountAvailability {
    pub id: Uuid,
    pub login_email: String,
    pub is_active: bool,
    pub price_override: Option<Decimal>,
    pub commission_override: Option<Decimal>,
    pub free: i64,
    pub sold: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> Service {
        Service {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Netflix".into(),
            image_url: None,
            kind: ServiceKind::Compartilhado,
            screens_total: 4,
            default_price: Decimal::new(2990, 2),
            default_commission: Decimal::new(500, 2),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn account(service: &Service, price: Option<Decimal>, commission: Option<Decimal>) -> Account {
        Account {
            id: Uuid::new_v4(),
            tenant_id: service.tenant_id,
            service_id: service.id,
            login_email: "conta@provedor.com".into(),
            password: Some("segredo".into()),
            price_override: price,
            commission_override: commission,
            invested_amount: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn without_account_the_service_defaults_apply() {
        let s = service();
        let price = SalePrice::resolve(&s, None);
        assert_eq!(price.amount, Decimal::new(2990, 2));
        assert_eq!(price.commission, Decimal::new(500, 2));
    }

    #[test]
    fn account_overrides_are_applied_field_by_field() {
        let s = service();
        let a = account(&s, Some(Decimal::new(3500, 2)), None);
        let price = SalePrice::resolve(&s, Some(&a));
        assert_eq!(price.amount, Decimal::new(3500, 2));
        assert_eq!(price.commission, Decimal::new(500, 2));

        let b = account(&s, None, Some(Decimal::ZERO));
        let price = SalePrice::resolve(&s, Some(&b));
        assert_eq!(price.amount, Decimal::new(2990, 2));
        assert_eq!(price.commission, Decimal::ZERO);
    }

    #[test]
    fn individual_services_always_have_a_single_screen() {
        assert_eq!(ServiceKind::Individual.screens_total(5), 1);
        assert_eq!(ServiceKind::Compartilhado.screens_total(5), 5);
    }
}
