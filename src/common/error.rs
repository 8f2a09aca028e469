use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::sales::SaleStatus;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Permissão '{0}' necessária")]
    Forbidden(String),

    #[error("Licença da empresa expirada")]
    LicenseExpired,

    #[error("{0} não encontrado(a)")]
    ResourceNotFound(&'static str),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("O identificador '{0}' já está em uso")]
    SlugAlreadyExists(String),

    #[error("A conta possui telas vendidas")]
    AccountHasSoldScreens,

    #[error("O serviço ainda possui contas ou vendas")]
    ServiceInUse,

    #[error("Acesso de operador da plataforma não configurado")]
    OperatorAuthUnavailable,

    // --- Núcleo de vendas / pagamentos ---
    /// Nunca deve acontecer em código correto: uma linha de outra empresa
    /// chegou a um caminho de consulta com escopo.
    #[error("Violação de isolamento entre empresas")]
    TenantIsolationViolation,

    #[error("Empresa sem configuração ativa do gateway de pagamento")]
    ConfigMissing,

    #[error("Erro na requisição ao gateway de pagamento: {0}")]
    GatewayRequestError(String),

    #[error("Tempo esgotado na requisição ao gateway de pagamento")]
    GatewayTimeout,

    #[error("Sem telas disponíveis")]
    NoCapacityAvailable,

    #[error("Esta venda já foi finalizada")]
    AlreadyFinalized,

    #[error("Esta venda já está cancelada")]
    AlreadyCancelled,

    #[error("Transição inválida: não é possível {action} uma venda {from:?}")]
    InvalidSaleTransition { from: SaleStatus, action: &'static str },

    #[error("Valor pago ({paid}) diverge do valor da venda ({expected})")]
    AmountMismatch { expected: Decimal, paid: Decimal },

    #[error("Notificação sem id de pagamento")]
    MissingPaymentId,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Erro já pronto para a resposta HTTP (mensagem traduzida).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Chave usada no catálogo de mensagens do `I18nStore`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::LicenseExpired => "license_expired",
            AppError::ResourceNotFound(_) => "not_found",
            AppError::UniqueConstraintViolation(_) => "unique_violation",
            AppError::SlugAlreadyExists(_) => "slug_already_exists",
            AppError::AccountHasSoldScreens => "account_has_sold_screens",
            AppError::ServiceInUse => "service_in_use",
            AppError::OperatorAuthUnavailable => "operator_auth_unavailable",
            AppError::TenantIsolationViolation => "internal_error",
            AppError::ConfigMissing => "payment_config_missing",
            AppError::GatewayRequestError(_) => "gateway_request_error",
            AppError::GatewayTimeout => "gateway_timeout",
            AppError::NoCapacityAvailable => "no_capacity_available",
            AppError::AlreadyFinalized => "already_finalized",
            AppError::AlreadyCancelled => "already_cancelled",
            AppError::InvalidSaleTransition { .. } => "invalid_sale_transition",
            AppError::AmountMismatch { .. } => "amount_mismatch",
            AppError::MissingPaymentId => "missing_payment_id",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) | AppError::LicenseExpired => StatusCode::FORBIDDEN,
            AppError::UniqueConstraintViolation(_)
            | AppError::SlugAlreadyExists(_)
            | AppError::AccountHasSoldScreens
            | AppError::ServiceInUse => StatusCode::CONFLICT,
            AppError::OperatorAuthUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ConfigMissing => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::GatewayRequestError(_) => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::NoCapacityAvailable
            | AppError::AlreadyFinalized
            | AppError::AlreadyCancelled
            | AppError::InvalidSaleTransition { .. } => StatusCode::CONFLICT,
            AppError::AmountMismatch { .. } | AppError::MissingPaymentId => {
                StatusCode::BAD_REQUEST
            }
            AppError::TenantIsolationViolation
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro numa resposta traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            match self {
                AppError::TenantIsolationViolation => {
                    tracing::error!("🚨 Violação de isolamento entre empresas detectada")
                }
                e => tracing::error!("Erro Interno do Servidor: {:?}", e),
            }
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            AppError::Forbidden(slug) => Some(json!({ "permission": slug })),
            AppError::AmountMismatch { expected, paid } => {
                Some(json!({ "expected": expected, "paid": paid }))
            }
            _ => None,
        };

        ApiError {
            status,
            error: store.translate(&locale.0, self.code()).to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Chamadas ao gateway: tempo esgotado tem um tipo próprio.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::GatewayTimeout
        } else if let Some(status) = err.status() {
            AppError::GatewayRequestError(format!("HTTP {status}"))
        } else {
            AppError::GatewayRequestError(err.to_string())
        }
    }
}

// Caminhos sem idioma (ex.: extratores) respondem no idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_failures_map_to_the_documented_status_codes() {
        let mismatch = AppError::AmountMismatch {
            expected: Decimal::new(2990, 2),
            paid: Decimal::new(100, 2),
        };
        assert_eq!(mismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingPaymentId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoCapacityAvailable.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn gateway_timeout_is_distinct_from_request_error() {
        assert_eq!(AppError::GatewayTimeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::GatewayRequestError("500".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_ne!(AppError::GatewayTimeout.code(), AppError::GatewayRequestError(String::new()).code());
    }

    #[test]
    fn isolation_violation_never_leaks_details() {
        let api = AppError::TenantIsolationViolation
            .to_api_error(&Locale("en".into()), &I18nStore::default());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.details.is_none());
        assert!(!api.error.to_lowercase().contains("tenant"));
    }

    #[test]
    fn unset_operator_token_is_unavailable_not_unauthorized() {
        assert_eq!(
            AppError::OperatorAuthUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::ServiceInUse.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn amount_mismatch_carries_both_amounts() {
        let api = AppError::AmountMismatch {
            expected: Decimal::new(2990, 2),
            paid: Decimal::new(1000, 2),
        }
        .to_api_error(&Locale::default(), &I18nStore::default());
        let details = api.details.expect("detalhes presentes");
        assert!(details.get("expected").is_some());
        assert!(details.get("paid").is_some());
    }
}
