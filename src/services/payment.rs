// src/services/payment.rs

pub mod mercadopago;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    common::{error::AppError, tenant::TenantScope},
    db::SettingsRepository,
    models::settings::{ConfigLookup, GATEWAY_MERCADOPAGO},
};

pub use mercadopago::MercadoPagoClient;

/// Status do provedor que libera a entrega.
pub const STATUS_APPROVED: &str = "approved";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPayload {
    /// Código "copia e cola".
    pub qr_code: Option<String>,
    /// Imagem PNG do QR Code em base64.
    pub qr_code_base64: Option<String>,
}

/// Resposta normalizada da criação de pagamento, igual nos dois caminhos
/// (cartão de teste e PIX).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub external_id: String,
    pub status: String,
    pub method: &'static str,
    pub pix: Option<PixPayload>,
}

/// Verdade do provedor sobre um pagamento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSnapshot {
    pub status: String,
    pub paid_amount: Decimal,
}

impl PaymentSnapshot {
    pub fn is_approved(&self) -> bool {
        self.status == STATUS_APPROVED
    }
}

// ---
// Capacidade de um provedor de pagamento
// ---
/// Nenhuma implementação repete chamadas nem deduplica: cada requisição
/// leva uma chave de idempotência nova e a política de retry é de quem chama.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(
        &self,
        amount: Decimal,
        description: &str,
        payer_email: &str,
    ) -> Result<PaymentIntent, AppError>;

    async fn query_payment(&self, external_id: &str) -> Result<PaymentSnapshot, AppError>;
}

/// Monta o adaptador com as credenciais da empresa.
/// Sem configuração ativa: `AppError::ConfigMissing`.
#[async_trait]
pub trait GatewayResolver: Send + Sync {
    async fn for_tenant(&self, scope: &TenantScope) -> Result<Arc<dyn PaymentGateway>, AppError>;
}

#[derive(Clone)]
pub struct MercadoPagoResolver {
    settings_repo: SettingsRepository,
    http: reqwest::Client,
    base_url: String,
}

impl MercadoPagoResolver {
    pub fn new(
        settings_repo: SettingsRepository,
        base_url: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            settings_repo,
            http,
            base_url,
        })
    }
}

#[async_trait]
impl GatewayResolver for MercadoPagoResolver {
    async fn for_tenant(&self, scope: &TenantScope) -> Result<Arc<dyn PaymentGateway>, AppError> {
        match self.settings_repo.lookup_active(scope, GATEWAY_MERCADOPAGO).await? {
            ConfigLookup::Found(config) => Ok(Arc::new(MercadoPagoClient::new(
                self.http.clone(),
                self.base_url.clone(),
                config.access_token,
            ))),
            ConfigLookup::NotFound => {
                tracing::warn!(tenant_id = %scope.tenant_id(), "empresa sem configuração do gateway");
                Err(AppError::ConfigMissing)
            }
        }
    }
}

/// Ids do provedor chegam como número ou string.
pub fn external_id_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
