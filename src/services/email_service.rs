// src/services/email_service.rs

use anyhow::anyhow;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::common::error::AppError;

/// Envio de e-mail. O reconciliador só chama depois do commit.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Assunto e corpo do e-mail com as credenciais da conta entregue.
pub fn credential_email(service_name: &str, login: &str, password: Option<&str>) -> (String, String) {
    let subject = format!("Acesso liberado - {service_name}");
    let body = format!(
        "Olá!\n\n\
         Seu pagamento foi confirmado com sucesso.\n\n\
         Serviço: {service_name}\n\
         Login: {login}\n\
         Senha: {}\n\n\
         Qualquer dúvida, estamos à disposição.\n",
        password.unwrap_or("-")
    );
    (subject, body)
}

// ---
// SMTP (lettre)
// ---
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from: String,
    ) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow!("SMTP relay inválido: {e}"))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| anyhow!("Remetente inválido: {e}"))?,
            )
            .to(to.parse().map_err(|e| anyhow!("Destinatário inválido: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| anyhow!("Falha ao montar o e-mail: {e}"))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow!("Falha no envio SMTP: {e}"))?;

        tracing::info!(to = %to, subject = %subject, "📧 E-mail enviado");
        Ok(())
    }
}

// ---
// Sem SMTP configurado: só registra no log
// ---
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        tracing::info!(to = %to, subject = %subject, "📧 E-mail (sem SMTP configurado)");
        tracing::debug!(body = %body, "corpo do e-mail");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_email_carries_login_and_password() {
        let (subject, body) = credential_email("Netflix", "conta@provedor.com", Some("s3nha"));
        assert_eq!(subject, "Acesso liberado - Netflix");
        assert!(body.contains("Login: conta@provedor.com"));
        assert!(body.contains("Senha: s3nha"));
    }

    #[tokio::test]
    async fn log_mailer_never_fails() {
        assert!(LogMailer.send("a@b.com", "x", "y").await.is_ok());
    }
}
