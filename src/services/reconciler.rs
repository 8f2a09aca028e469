// src/services/reconciler.rs

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, tenant::TenantScope},
    db::{CapacityRepository, CatalogRepository, PoolScope, SalesRepository},
    models::sales::{Sale, SaleStatus},
    services::{
        email_service::{credential_email, Mailer},
        payment::{external_id_from_json, GatewayResolver},
    },
};

// Corpo enviado pelo provedor: `{ "type": "payment", "data": { "id": ... } }`
#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "type")]
    kind: Option<String>,
    action: Option<String>,
    data: Option<NotificationData>,
}

#[derive(Debug, Deserialize)]
struct NotificationData {
    id: Option<Value>,
}

/// Extrai o id de pagamento da notificação.
/// `Ok(None)`: evento que não é de pagamento (ignorado).
pub fn parse_notification(body: &[u8]) -> Result<Option<String>, AppError> {
    let notification: Notification = match serde_json::from_slice(body) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "notificação com corpo ilegível, ignorada");
            return Ok(None);
        }
    };

    let is_payment = notification.kind.as_deref() == Some("payment")
        || notification
            .action
            .as_deref()
            .is_some_and(|a| a.starts_with("payment."));
    if !is_payment {
        return Ok(None);
    }

    notification
        .data
        .and_then(|d| d.id)
        .as_ref()
        .and_then(external_id_from_json)
        .map(Some)
        .ok_or(AppError::MissingPaymentId)
}

/// Desfecho de uma notificação processada sem erro.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Ignored,
    SaleNotFound { payment_id: String },
    AlreadyProcessed { payment_id: String, status: SaleStatus },
    NotApproved { payment_id: String, payment_status: String },
    /// Pagamento capturado mas sem tela: venda cancelada, exige estorno manual.
    OutOfStock { payment_id: String },
    /// Pagamento aprovado numa venda cancelada antes: exige estorno manual.
    PaidAfterCancel { payment_id: String },
    Delivered { payment_id: String, sale: Box<Sale> },
}

impl WebhookOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookOutcome::OutOfStock { .. } | WebhookOutcome::PaidAfterCancel { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::OK,
        }
    }

    /// Resposta legível por máquina; o provedor só olha o status HTTP.
    pub fn body(&self) -> Value {
        match self {
            WebhookOutcome::Ignored => json!({ "status": "ignored" }),
            WebhookOutcome::SaleNotFound { payment_id } => {
                json!({ "status": "not_found", "paymentId": payment_id })
            }
            WebhookOutcome::AlreadyProcessed { payment_id, status } => {
                json!({ "status": "already_processed", "paymentId": payment_id, "saleStatus": status })
            }
            WebhookOutcome::NotApproved {
                payment_id,
                payment_status,
            } => json!({
                "status": "not_approved",
                "paymentId": payment_id,
                "paymentStatus": payment_status
            }),
            WebhookOutcome::OutOfStock { payment_id } => {
                json!({ "status": "out_of_stock", "paymentId": payment_id })
            }
            WebhookOutcome::PaidAfterCancel { payment_id } => {
                json!({ "status": "paid_after_cancel", "paymentId": payment_id })
            }
            WebhookOutcome::Delivered { payment_id, sale } => json!({
                "status": "delivered",
                "paymentId": payment_id,
                "saleId": sale.id
            }),
        }
    }
}

// Credenciais a enviar depois do commit
struct Delivery {
    to: String,
    subject: String,
    body: String,
}

// ---
// Reconciliador de notificações de pagamento
// ---
#[derive(Clone)]
pub struct WebhookReconciler {
    sales_repo: SalesRepository,
    catalog_repo: CatalogRepository,
    capacity_repo: CapacityRepository,
    gateways: Arc<dyn GatewayResolver>,
    mailer: Arc<dyn Mailer>,
    pool: PgPool,
}

impl WebhookReconciler {
    pub fn new(
        sales_repo: SalesRepository,
        catalog_repo: CatalogRepository,
        capacity_repo: CapacityRepository,
        gateways: Arc<dyn GatewayResolver>,
        mailer: Arc<dyn Mailer>,
        pool: PgPool,
    ) -> Self {
        Self {
            sales_repo,
            catalog_repo,
            capacity_repo,
            gateways,
            mailer,
            pool,
        }
    }

    pub async fn handle_notification(&self, body: &[u8]) -> Result<WebhookOutcome, AppError> {
        let Some(payment_id) = parse_notification(body)? else {
            return Ok(WebhookOutcome::Ignored);
        };
        self.reconcile(payment_id).await
    }

    /// Fase 1 sem travas (consulta ao gateway), fase 2 numa transação com a
    /// venda travada. Um erro em qualquer ponto da fase 2 desfaz tudo.
    pub async fn reconcile(&self, payment_id: String) -> Result<WebhookOutcome, AppError> {
        let Some(sale) = self.sales_repo.find_by_payment_id(&payment_id).await? else {
            tracing::info!(payment_id = %payment_id, "notificação sem venda correspondente");
            return Ok(WebhookOutcome::SaleNotFound { payment_id });
        };

        if sale.webhook_already_processed() {
            tracing::info!(payment_id = %payment_id, sale_id = %sale.id, "notificação repetida, nada a fazer");
            return Ok(WebhookOutcome::AlreadyProcessed {
                payment_id,
                status: sale.status,
            });
        }

        // A empresa vem da venda encontrada, nunca do corpo da notificação
        let scope = TenantScope::of_sale(&sale);
        let gateway = self.gateways.for_tenant(&scope).await?;
        let snapshot = gateway.query_payment(&payment_id).await.inspect_err(|e| {
            tracing::error!(payment_id = %payment_id, sale_id = %sale.id, error = %e, "falha ao consultar o pagamento");
        })?;

        let mut tx = self.pool.begin().await?;

        let Some(sale) = self.sales_repo.lock_by_payment_id(&mut *tx, &payment_id).await? else {
            return Ok(WebhookOutcome::SaleNotFound { payment_id });
        };
        scope.ensure_owns(sale.tenant_id)?;

        // Outra entrega pode ter concluído entre a leitura e a trava
        if sale.webhook_already_processed() {
            tracing::info!(payment_id = %payment_id, sale_id = %sale.id, "venda processada por outra entrega");
            return Ok(WebhookOutcome::AlreadyProcessed {
                payment_id,
                status: sale.status,
            });
        }

        if !snapshot.is_approved() {
            self.sales_repo
                .set_payment_status(&mut *tx, &scope, sale.id, &snapshot.status)
                .await?;
            tx.commit().await?;
            tracing::info!(
                payment_id = %payment_id,
                sale_id = %sale.id,
                payment_status = %snapshot.status,
                "pagamento ainda não aprovado"
            );
            return Ok(WebhookOutcome::NotApproved {
                payment_id,
                payment_status: snapshot.status,
            });
        }

        // Cancelada antes do pagamento: registra o dinheiro, não reabre a venda
        if sale.status == SaleStatus::Cancelada {
            let sale = self
                .sales_repo
                .record_late_payment(&mut *tx, &scope, sale.id, snapshot.paid_amount, &snapshot.status)
                .await?;
            tx.commit().await?;
            tracing::error!(
                payment_id = %payment_id,
                sale_id = %sale.id,
                tenant_id = %scope.tenant_id(),
                paid = %snapshot.paid_amount,
                "🚨 pagamento aprovado em venda cancelada, estorno manual necessário"
            );
            return Ok(WebhookOutcome::PaidAfterCancel { payment_id });
        }

        if snapshot.paid_amount != sale.sale_amount {
            tracing::error!(
                payment_id = %payment_id,
                sale_id = %sale.id,
                expected = %sale.sale_amount,
                paid = %snapshot.paid_amount,
                "🚨 valor pago diverge do valor da venda"
            );
            return Err(AppError::AmountMismatch {
                expected: sale.sale_amount,
                paid: snapshot.paid_amount,
            });
        }

        let sale = self
            .sales_repo
            .mark_paid(&mut *tx, &scope, sale.id, snapshot.paid_amount, &snapshot.status)
            .await?;

        let Some(screen) = self
            .capacity_repo
            .allocate_any_free(&mut *tx, &scope, PoolScope::Service(sale.service_id))
            .await?
        else {
            let sale = self.sales_repo.mark_cancelled(&mut *tx, &scope, sale.id).await?;
            tx.commit().await?;
            tracing::error!(
                payment_id = %payment_id,
                sale_id = %sale.id,
                tenant_id = %scope.tenant_id(),
                status = sale.status.as_str(),
                "pagamento aprovado sem tela disponível, estorno manual necessário"
            );
            return Ok(WebhookOutcome::OutOfStock { payment_id });
        };

        let sale = self
            .sales_repo
            .mark_delivered(&mut *tx, &scope, sale.id, screen.id)
            .await?;

        let account = self
            .catalog_repo
            .find_account_by_screen(&mut *tx, &scope, screen.id)
            .await?
            .ok_or(AppError::ResourceNotFound("Conta"))?;
        let service = self
            .catalog_repo
            .find_service(&mut *tx, &scope, sale.service_id)
            .await?
            .ok_or(AppError::ResourceNotFound("Serviço"))?;

        let delivery = sale.delivery_email.clone().map(|to| {
            let (subject, body) =
                credential_email(&service.name, &account.login_email, account.password.as_deref());
            Delivery { to, subject, body }
        });

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment_id,
            sale_id = %sale.id,
            tenant_id = %scope.tenant_id(),
            screen_id = %screen.id,
            status = sale.status.as_str(),
            "✅ venda paga e entregue"
        );

        // Só depois do commit as credenciais saem, fora do caminho da resposta
        match delivery {
            Some(d) => {
                let mailer = Arc::clone(&self.mailer);
                let sale_id = sale.id;
                tokio::spawn(async move {
                    if let Err(e) = mailer.send(&d.to, &d.subject, &d.body).await {
                        tracing::error!(sale_id = %sale_id, error = %e, "falha ao enviar e-mail de entrega");
                    }
                });
            }
            None => tracing::warn!(sale_id = %sale.id, "venda entregue sem e-mail de entrega"),
        }

        Ok(WebhookOutcome::Delivered {
            payment_id,
            sale: Box::new(sale),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_events_yield_their_id() {
        let body = br#"{"type":"payment","data":{"id":123456}}"#;
        assert_eq!(parse_notification(body).unwrap(), Some("123456".into()));

        let body = br#"{"action":"payment.updated","data":{"id":"987"}}"#;
        assert_eq!(parse_notification(body).unwrap(), Some("987".into()));
    }

    #[test]
    fn other_events_are_ignored() {
        let body = br#"{"type":"merchant_order","data":{"id":1}}"#;
        assert_eq!(parse_notification(body).unwrap(), None);
        assert_eq!(parse_notification(b"not json").unwrap(), None);
        assert_eq!(parse_notification(b"{}").unwrap(), None);
    }

    #[test]
    fn payment_event_without_id_is_rejected() {
        for body in [
            &br#"{"type":"payment"}"#[..],
            br#"{"type":"payment","data":{}}"#,
            br#"{"type":"payment","data":{"id":""}}"#,
        ] {
            assert!(matches!(
                parse_notification(body),
                Err(AppError::MissingPaymentId)
            ));
        }
    }

    #[test]
    fn only_money_without_delivery_is_a_conflict() {
        let id = || "1".to_string();
        assert_eq!(
            WebhookOutcome::OutOfStock { payment_id: id() }.status_code(),
            StatusCode::CONFLICT
        );
        let late = WebhookOutcome::PaidAfterCancel { payment_id: id() };
        assert_eq!(late.status_code(), StatusCode::CONFLICT);
        assert_eq!(late.body()["status"], "paid_after_cancel");
        for outcome in [
            WebhookOutcome::Ignored,
            WebhookOutcome::SaleNotFound { payment_id: id() },
            WebhookOutcome::AlreadyProcessed {
                payment_id: id(),
                status: SaleStatus::Entregue,
            },
            WebhookOutcome::NotApproved {
                payment_id: id(),
                payment_status: "pending".into(),
            },
        ] {
            assert_eq!(outcome.status_code(), StatusCode::OK);
        }
    }

    #[test]
    fn bodies_name_the_outcome() {
        let body = WebhookOutcome::SaleNotFound {
            payment_id: "55".into(),
        }
        .body();
        assert_eq!(body["status"], "not_found");
        assert_eq!(body["paymentId"], "55");
        assert_eq!(WebhookOutcome::Ignored.body()["status"], "ignored");
    }
}
