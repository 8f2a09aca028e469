// src/handlers/webhook.rs

use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::config::AppState;

// Chamada servidor a servidor: sem sessão e sem mensagens traduzidas,
// só status HTTP e um JSON legível por máquina.
#[utoipa::path(
    post,
    path = "/webhooks/mercadopago",
    tag = "Webhooks",
    request_body(content = String, description = "Notificação `{ type, data: { id } }`", content_type = "application/json"),
    responses(
        (status = 200, description = "Ignorada, sem venda, já processada, não aprovada ou entregue"),
        (status = 400, description = "Sem id de pagamento ou valor divergente"),
        (status = 409, description = "Pagamento aprovado sem estoque (venda cancelada)")
    )
)]
pub async fn mercadopago_webhook(
    State(app_state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    match app_state.reconciler.handle_notification(&body).await {
        Ok(outcome) => (outcome.status_code(), Json(outcome.body())),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                tracing::error!(error = ?e, "falha ao processar notificação de pagamento");
            } else {
                tracing::warn!(error = %e, "notificação de pagamento rejeitada");
            }
            (status, Json(json!({ "status": "error", "code": e.code() })))
        }
    }
}
