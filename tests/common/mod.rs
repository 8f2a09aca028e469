// Utilitários compartilhados pelos testes de integração.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use stv_backend::{
    common::{error::AppError, tenant::TenantScope},
    config::{AppState, Config},
    db::catalog_repo::{AccountData, ServiceData},
    models::{
        auth::User,
        catalog::{Account, Service, ServiceKind},
        tenancy::Tenant,
    },
    services::{
        email_service::Mailer,
        payment::{GatewayResolver, PaymentGateway, PaymentIntent, PaymentSnapshot, PixPayload},
        tenancy_service::NewTenant,
    },
};

pub const OPERATOR_TOKEN: &str = "token-do-operador";

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: "segredo-de-teste".into(),
        server_addr: "127.0.0.1:0".into(),
        db_max_connections: 10,
        mercadopago_base_url: "http://127.0.0.1:9".into(),
        gateway_timeout: Duration::from_secs(2),
        license_trial_days: 7,
        smtp: None,
        mail_sender: "no-reply@stv.local".into(),
        platform_admin_token: Some(OPERATOR_TOKEN.into()),
    }
}

/// Pool do banco de testes com as migrações aplicadas.
/// Sem `DATABASE_URL` o teste é pulado.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL não definida: teste de banco pulado");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&url)
        .await
        .expect("conexão com o banco de testes");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrações do banco de testes");
    Some(pool)
}

// ---
// Gateway falso: ids sequenciais, verdade do pagamento definida pelo teste
// ---
#[derive(Default)]
struct GatewayInner {
    next_id: AtomicU64,
    payments: Mutex<HashMap<String, PaymentSnapshot>>,
    fail_create: Mutex<bool>,
    queries: AtomicU64,
}

#[derive(Clone, Default)]
pub struct MockGateway {
    inner: Arc<GatewayInner>,
}

impl MockGateway {
    pub fn set_payment(&self, external_id: &str, status: &str, paid_amount: Decimal) {
        self.inner.payments.lock().unwrap().insert(
            external_id.to_string(),
            PaymentSnapshot {
                status: status.to_string(),
                paid_amount,
            },
        );
    }

    pub fn fail_next_creations(&self, fail: bool) {
        *self.inner.fail_create.lock().unwrap() = fail;
    }

    pub fn query_count(&self) -> u64 {
        self.inner.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment(
        &self,
        _amount: Decimal,
        _description: &str,
        _payer_email: &str,
    ) -> Result<PaymentIntent, AppError> {
        if *self.inner.fail_create.lock().unwrap() {
            return Err(AppError::GatewayRequestError("HTTP 500".into()));
        }
        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentIntent {
            external_id: format!("mock-{}-{n}", Uuid::new_v4().simple()),
            status: "pending".into(),
            method: "pix",
            pix: Some(PixPayload {
                qr_code: Some("00020126-pix-copia-e-cola".into()),
                qr_code_base64: Some("iVBORw0KGgo=".into()),
            }),
        })
    }

    async fn query_payment(&self, external_id: &str) -> Result<PaymentSnapshot, AppError> {
        self.inner.queries.fetch_add(1, Ordering::SeqCst);
        self.inner
            .payments
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .ok_or_else(|| AppError::GatewayRequestError("HTTP 404".into()))
    }
}

#[async_trait]
impl GatewayResolver for MockGateway {
    async fn for_tenant(&self, _scope: &TenantScope) -> Result<Arc<dyn PaymentGateway>, AppError> {
        Ok(Arc::new(self.clone()))
    }
}

// ---
// Mailer que só guarda o que seria enviado
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// O envio roda numa task à parte: espera até `n` e-mails ou 2s.
    pub async fn wait_for(&self, n: usize) -> Vec<SentEmail> {
        for _ in 0..40 {
            let sent = self.sent();
            if sent.len() >= n {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        });
        Ok(())
    }
}

/// Mailer que demora a responder, como um SMTP lento.
#[derive(Clone)]
pub struct SlowMailer {
    pub delay: Duration,
    pub inner: RecordingMailer,
}

#[async_trait]
impl Mailer for SlowMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        tokio::time::sleep(self.delay).await;
        self.inner.send(to, subject, body).await
    }
}

/// Estado completo da aplicação com gateway e mailer falsos.
pub struct TestApp {
    pub state: AppState,
    pub gateway: MockGateway,
    pub mailer: RecordingMailer,
    pub pool: PgPool,
}

pub async fn test_app() -> Option<TestApp> {
    test_app_with_mailer(|recorder| Arc::new(recorder)).await
}

/// Como `test_app`, mas o mailer entregue ao estado embrulha o gravador.
pub async fn test_app_with_mailer(
    wrap: impl FnOnce(RecordingMailer) -> Arc<dyn Mailer>,
) -> Option<TestApp> {
    let pool = test_pool().await?;
    let gateway = MockGateway::default();
    let mailer = RecordingMailer::default();
    let state = AppState::with_collaborators(
        pool.clone(),
        &test_config("postgres://unused"),
        Arc::new(gateway.clone()),
        wrap(mailer.clone()),
    );
    Some(TestApp {
        state,
        gateway,
        mailer,
        pool,
    })
}

// ---
// Dados de apoio
// ---
pub struct Shop {
    pub tenant: Tenant,
    pub admin: User,
    pub scope: TenantScope,
}

pub async fn seed_shop(app: &TestApp) -> Shop {
    let unique = Uuid::new_v4().simple().to_string();
    let slug = format!("loja-{}", &unique[..12]);
    let email = format!("admin-{unique}@teste.com");
    let (tenant, admin, _license) = app
        .state
        .tenant_service
        .create_tenant_with_admin(NewTenant {
            name: "Loja de Teste",
            slug: &slug,
            document_number: None,
            admin_name: "Admin",
            admin_email: &email,
            admin_password: "senha-forte",
            license_days: None,
        })
        .await
        .expect("empresa de teste");
    let scope = TenantScope::of_tenant(&tenant);
    Shop {
        tenant,
        admin,
        scope,
    }
}

pub fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub async fn seed_service(app: &TestApp, shop: &Shop, screens: i32, default_price: Decimal) -> Service {
    app.state
        .catalog_service
        .create_service(
            &shop.scope,
            ServiceData {
                name: "Netflix Compartilhado",
                image_url: None,
                kind: ServiceKind::Compartilhado,
                screens_total: screens,
                default_price,
                default_commission: price(500),
            },
        )
        .await
        .expect("serviço de teste")
}

pub async fn seed_account(app: &TestApp, shop: &Shop, service: &Service) -> Account {
    seed_account_with(app, shop, service, None, None).await
}

pub async fn seed_account_with(
    app: &TestApp,
    shop: &Shop,
    service: &Service,
    price_override: Option<Decimal>,
    commission_override: Option<Decimal>,
) -> Account {
    let login = format!("conta-{}@provedor.com", Uuid::new_v4().simple());
    app.state
        .catalog_service
        .create_account(
            &shop.scope,
            service.id,
            AccountData {
                login_email: &login,
                password: Some("senha-da-conta"),
                price_override,
                commission_override,
                invested_amount: Some(price(2000)),
            },
        )
        .await
        .expect("conta de teste")
}

/// Número da tela alocada a uma venda.
pub async fn screen_number(pool: &PgPool, screen_id: Uuid) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT number FROM screens WHERE id = $1")
        .bind(screen_id)
        .fetch_one(pool)
        .await
        .expect("tela existente")
}
