// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Único gateway suportado hoje.
pub const GATEWAY_MERCADOPAGO: &str = "mercadopago";

// Credenciais do gateway de pagamento de uma empresa
#[derive(Debug, Clone, FromRow)]
pub struct PaymentConfig {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub gateway: String,
    pub access_token: String,
    pub public_key: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentConfig {
    /// Tokens de teste do Mercado Pago começam com "TEST-".
    pub fn is_test_credential(&self) -> bool {
        self.access_token.starts_with("TEST-")
    }
}

/// Resultado da resolução de credenciais, consumido antes de montar o adaptador.
#[derive(Debug, Clone)]
pub enum ConfigLookup {
    Found(PaymentConfig),
    NotFound,
}

// O que o painel enxerga: o token nunca sai inteiro
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigView {
    #[schema(example = "mercadopago")]
    pub gateway: String,
    #[schema(example = "APP_USR-****************5678")]
    pub access_token_masked: String,
    pub public_key: Option<String>,
    pub is_active: bool,
    pub is_test: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&PaymentConfig> for PaymentConfigView {
    fn from(cfg: &PaymentConfig) -> Self {
        Self {
            gateway: cfg.gateway.clone(),
            access_token_masked: mask_secret(&cfg.access_token),
            public_key: cfg.public_key.clone(),
            is_active: cfg.is_active,
            is_test: cfg.is_test_credential(),
            updated_at: cfg.updated_at,
        }
    }
}

/// Mantém o prefixo (até o primeiro '-') e os 4 últimos caracteres.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let prefix_len = secret
        .find('-')
        .map(|i| secret[..=i].chars().count())
        .filter(|n| *n < chars.len() - 4)
        .unwrap_or(0);
    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}{}{suffix}", "*".repeat(chars.len() - prefix_len - 4))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentConfigRequest {
    #[validate(length(min = 10, message = "O access token do Mercado Pago é obrigatório."))]
    #[schema(example = "APP_USR-1234567890-abcdef")]
    pub access_token: String,
    pub public_key: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}
