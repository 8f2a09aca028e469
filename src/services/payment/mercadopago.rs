// src/services/payment/mercadopago.rs

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{external_id_from_json, PaymentGateway, PaymentIntent, PaymentSnapshot, PixPayload};
use crate::common::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.mercadopago.com";

// Cartão de teste aprovado automaticamente no sandbox
const TEST_CARD_NUMBER: &str = "4235647728025682";
const TEST_CARD_HOLDER: &str = "APRO";

// --- Respostas da API (só o que usamos) ---
#[derive(Debug, Deserialize)]
struct MpPayment {
    id: Value,
    status: String,
    transaction_amount: Option<serde_json::Number>,
    point_of_interaction: Option<MpPointOfInteraction>,
}

#[derive(Debug, Deserialize)]
struct MpPointOfInteraction {
    transaction_data: Option<MpTransactionData>,
}

#[derive(Debug, Deserialize)]
struct MpTransactionData {
    qr_code: Option<String>,
    qr_code_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpCardToken {
    id: String,
}

/// Cliente do Mercado Pago com as credenciais de uma empresa.
///
/// Token "TEST-" usa o caminho de cartão de teste; qualquer outro usa PIX.
#[derive(Clone)]
pub struct MercadoPagoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl MercadoPagoClient {
    pub fn new(http: reqwest::Client, base_url: String, access_token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    pub fn is_test(&self) -> bool {
        self.access_token.starts_with("TEST-")
    }

    // Cabeçalhos sempre novos: bearer + chave de idempotência por tentativa
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .header("X-Idempotency-Key", Uuid::new_v4().to_string())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, context: &str) -> Result<T, AppError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Mercado Pago recusou {context}");
            return Err(AppError::GatewayRequestError(format!("{context}: HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::GatewayRequestError(format!("{context}: resposta inválida ({e})")))
    }

    async fn create_test_card_token(&self) -> Result<String, AppError> {
        let payload = json!({
            "card_number": TEST_CARD_NUMBER,
            "expiration_month": 11,
            "expiration_year": 2030,
            "security_code": "123",
            "cardholder": { "name": TEST_CARD_HOLDER }
        });

        let token: MpCardToken = self
            .send(self.request(Method::POST, "/v1/card_tokens").json(&payload), "token do cartão de teste")
            .await?;
        Ok(token.id)
    }

    fn into_intent(payment: MpPayment, method: &'static str) -> Result<PaymentIntent, AppError> {
        let external_id = external_id_from_json(&payment.id)
            .ok_or_else(|| AppError::GatewayRequestError("pagamento sem id".into()))?;

        let pix = payment
            .point_of_interaction
            .and_then(|poi| poi.transaction_data)
            .map(|data| PixPayload {
                qr_code: data.qr_code,
                qr_code_base64: data.qr_code_base64,
            });

        Ok(PaymentIntent {
            external_id,
            status: payment.status,
            method,
            pix,
        })
    }
}

/// Valor decimal exato a partir do número JSON (sem passar por f64).
fn parse_amount(number: Option<&serde_json::Number>) -> Result<Decimal, AppError> {
    match number {
        None => Ok(Decimal::ZERO),
        Some(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| AppError::GatewayRequestError(format!("valor inválido: {text}")))
        }
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_payment(
        &self,
        amount: Decimal,
        description: &str,
        payer_email: &str,
    ) -> Result<PaymentIntent, AppError> {
        if self.is_test() {
            let card_token = self.create_test_card_token().await?;
            let payload = json!({
                "transaction_amount": amount,
                "token": card_token,
                "description": description,
                "installments": 1,
                "payment_method_id": "visa",
                "payer": { "email": payer_email }
            });
            let payment: MpPayment = self
                .send(self.request(Method::POST, "/v1/payments").json(&payload), "pagamento com cartão de teste")
                .await?;
            return Self::into_intent(payment, "credit_card");
        }

        let payload = json!({
            "transaction_amount": amount,
            "description": description,
            "payment_method_id": "pix",
            "payer": { "email": payer_email }
        });
        let payment: MpPayment = self
            .send(self.request(Method::POST, "/v1/payments").json(&payload), "pagamento PIX")
            .await?;
        Self::into_intent(payment, "pix")
    }

    async fn query_payment(&self, external_id: &str) -> Result<PaymentSnapshot, AppError> {
        let path = format!("/v1/payments/{external_id}");
        let payment: MpPayment = self
            .send(self.request(Method::GET, &path), "consulta de pagamento")
            .await?;

        Ok(PaymentSnapshot {
            status: payment.status,
            paid_amount: parse_amount(payment.transaction_amount.as_ref())?,
        })
    }
}
