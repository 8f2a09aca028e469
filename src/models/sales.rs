// src/models/sales.rs

use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Status da venda ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum SaleStatus {
    AguardandoPagamento, // Checkout público, esperando o gateway
    Pendente,            // Venda manual sem tela
    Ativa,               // Tela alocada no fluxo manual
    Pago,                // Pagamento confirmado, alocação ainda não aplicada
    Entregue,            // Pago e tela entregue
    Cancelada,
}

impl SaleStatus {
    /// Rótulo do enum `sale_status` no banco.
    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::AguardandoPagamento => "AGUARDANDO_PAGAMENTO",
            SaleStatus::Pendente => "PENDENTE",
            SaleStatus::Ativa => "ATIVA",
            SaleStatus::Pago => "PAGO",
            SaleStatus::Entregue => "ENTREGUE",
            SaleStatus::Cancelada => "CANCELADA",
        }
    }

    /// `screen_id` só é preenchido nestes status.
    pub fn holds_screen(self) -> bool {
        matches!(self, SaleStatus::Ativa | SaleStatus::Entregue)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SaleStatus::Entregue | SaleStatus::Cancelada)
    }

    pub fn can_finalize_manually(self) -> bool {
        self == SaleStatus::Pendente
    }

    pub fn payment_settled(self) -> bool {
        matches!(self, SaleStatus::Entregue | SaleStatus::Pago)
    }
}

// --- Venda ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub screen_id: Option<Uuid>,
    #[schema(example = "29.90")]
    pub sale_amount: Decimal,
    #[schema(example = "5.00")]
    pub commission_amount: Decimal,
    #[schema(example = "0.30")]
    pub gateway_fee: Decimal,
    pub paid_amount: Option<Decimal>,
    pub status: SaleStatus,
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub payment_method: Option<String>,
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_base64: Option<String>,
    pub delivery_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Notificações de pagamento repetidas não mexem mais na venda.
    /// Cancelada só conta quando o pagamento já foi registrado nela.
    pub fn webhook_already_processed(&self) -> bool {
        self.status.payment_settled()
            || (self.status == SaleStatus::Cancelada && self.paid_at.is_some())
    }
}

// --- Cliente ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "11999998888")]
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mantém só os dígitos e remove um "55" (DDI do Brasil) do início.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix("55") {
        Some(rest) => rest.to_string(),
        None => digits,
    }
}

/// Taxa do gateway no checkout automático: 1% do valor, em centavos.
pub fn gateway_fee(amount: Decimal) -> Decimal {
    (amount * Decimal::new(1, 2)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// --- Token público do pedido ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SaleAccessToken {
    pub sale_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl SaleAccessToken {
    /// 256 bits aleatórios em base64url (43 caracteres).
    pub fn generate() -> String {
        let mut random_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut random_bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }
}

// Visão pública do pedido (consulta pelo token): nunca expõe credenciais
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicOrderStatus {
    pub service_name: String,
    pub status: SaleStatus,
    pub sale_amount: Decimal,
    pub payment_status: Option<String>,
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_base64: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl PublicOrderStatus {
    /// O QR Code só interessa enquanto o pagamento não chegou.
    pub fn without_stale_pix(mut self) -> Self {
        if self.status != SaleStatus::AguardandoPagamento {
            self.pix_qr_code = None;
            self.pix_qr_code_base64 = None;
        }
        self
    }
}

// Filtro da listagem de vendas do painel
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SaleStatus; 6] = [
        SaleStatus::AguardandoPagamento,
        SaleStatus::Pendente,
        SaleStatus::Ativa,
        SaleStatus::Pago,
        SaleStatus::Entregue,
        SaleStatus::Cancelada,
    ];

    #[test]
    fn only_active_and_delivered_sales_hold_a_screen() {
        let holding: Vec<_> = ALL.into_iter().filter(|s| s.holds_screen()).collect();
        assert_eq!(holding, vec![SaleStatus::Ativa, SaleStatus::Entregue]);
    }

    #[test]
    fn only_pending_sales_can_be_finalized_manually() {
        let finalizable: Vec<_> = ALL.into_iter().filter(|s| s.can_finalize_manually()).collect();
        assert_eq!(finalizable, vec![SaleStatus::Pendente]);
    }

    fn sale_in(status: SaleStatus, paid_at: Option<DateTime<Utc>>) -> Sale {
        let now = Utc::now();
        Sale {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            seller_id: None,
            screen_id: None,
            sale_amount: Decimal::new(2990, 2),
            commission_amount: Decimal::ZERO,
            gateway_fee: Decimal::new(30, 2),
            paid_amount: None,
            status,
            payment_id: Some("123".into()),
            payment_status: None,
            payment_method: Some("pix".into()),
            pix_qr_code: None,
            pix_qr_code_base64: None,
            delivery_email: None,
            created_at: now,
            paid_at,
            delivered_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn awaiting_payment_is_not_a_processed_webhook_state() {
        assert!(!sale_in(SaleStatus::AguardandoPagamento, None).webhook_already_processed());
        assert!(sale_in(SaleStatus::Entregue, Some(Utc::now())).webhook_already_processed());
        assert!(sale_in(SaleStatus::Pago, Some(Utc::now())).webhook_already_processed());
    }

    #[test]
    fn cancelled_sale_is_processed_only_after_payment_was_recorded() {
        // Cancelada pelo painel antes do PIX cair: a notificação ainda precisa ser lida
        assert!(!sale_in(SaleStatus::Cancelada, None).webhook_already_processed());
        // Cancelada por falta de estoque depois do pagamento
        assert!(sale_in(SaleStatus::Cancelada, Some(Utc::now())).webhook_already_processed());
    }

    #[test]
    fn status_uses_the_screaming_snake_case_wire_format() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn phone_keeps_digits_and_drops_country_code() {
        assert_eq!(normalize_phone("+55 (11) 99999-8888"), "11999998888");
        assert_eq!(normalize_phone("(21) 98888-7777"), "21988887777");
        // só o primeiro "55" é removido
        assert_eq!(normalize_phone("5555912345678"), "55912345678");
    }

    #[test]
    fn gateway_fee_is_one_percent_rounded_to_cents() {
        assert_eq!(gateway_fee(Decimal::new(2990, 2)), Decimal::new(30, 2));
        assert_eq!(gateway_fee(Decimal::new(1000, 2)), Decimal::new(10, 2));
        assert_eq!(gateway_fee(Decimal::new(4950, 2)), Decimal::new(50, 2));
    }

    #[test]
    fn access_tokens_carry_256_bits_and_do_not_repeat() {
        let a = SaleAccessToken::generate();
        let b = SaleAccessToken::generate();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(&a).unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn pix_payload_is_hidden_once_the_sale_moved_on() {
        let status = PublicOrderStatus {
            service_name: "Netflix".into(),
            status: SaleStatus::Entregue,
            sale_amount: Decimal::new(2990, 2),
            payment_status: Some("approved".into()),
            pix_qr_code: Some("000201...".into()),
            pix_qr_code_base64: Some("iVBOR...".into()),
            created_at: Utc::now(),
            paid_at: Some(Utc::now()),
            delivered_at: Some(Utc::now()),
        };
        let view = status.without_stale_pix();
        assert!(view.pix_qr_code.is_none());
        assert!(view.pix_qr_code_base64.is_none());
    }
}
