// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CapacityRepository, CatalogRepository, CustomerRepository, RbacRepository, ReportRepository,
        SalesRepository, SettingsRepository, TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        catalog_service::CatalogService,
        checkout_service::CheckoutService,
        email_service::{LogMailer, Mailer, SmtpMailer},
        payment::{mercadopago::DEFAULT_BASE_URL, GatewayResolver, MercadoPagoResolver},
        reconciler::WebhookReconciler,
        report_service::ReportService,
        sale_service::SaleService,
        tenancy_service::TenantService,
    },
};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

// Configurações lidas do ambiente (.env)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub mercadopago_base_url: String,
    pub gateway_timeout: Duration,
    pub license_trial_days: i32,
    pub smtp: Option<SmtpConfig>,
    pub mail_sender: String,
    /// Bearer do operador da plataforma (cadastro de empresas e licenças).
    pub platform_admin_token: Option<String>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} inválido: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        // SMTP só é usado com host definido; sem ele os e-mails vão para o log
        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: parsed_or("SMTP_PORT", 587)?,
                username: var_or("SMTP_USERNAME", ""),
                password: var_or("SMTP_PASSWORD", ""),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:3000"),
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 5)?,
            mercadopago_base_url: var_or("MERCADOPAGO_BASE_URL", DEFAULT_BASE_URL),
            gateway_timeout: Duration::from_secs(parsed_or("GATEWAY_TIMEOUT_SECS", 20)?),
            license_trial_days: parsed_or("LICENSE_TRIAL_DAYS", 7)?,
            smtp,
            mail_sender: var_or("MAIL_DEFAULT_SENDER", "no-reply@stv.local"),
            platform_admin_token: env::var("PLATFORM_ADMIN_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        })
    }
}

// O estado compartilhado, acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,
    pub platform_admin_token: Option<Arc<str>>,

    // Repositórios usados direto pelos extratores/handlers
    pub user_repo: UserRepository,
    pub rbac_repo: RbacRepository,
    pub settings_repo: SettingsRepository,

    // Serviços
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub catalog_service: CatalogService,
    pub sale_service: SaleService,
    pub checkout_service: CheckoutService,
    pub reconciler: WebhookReconciler,
    pub report_service: ReportService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let gateways: Arc<dyn GatewayResolver> = Arc::new(MercadoPagoResolver::new(
            SettingsRepository::new(db_pool.clone()),
            config.mercadopago_base_url.clone(),
            config.gateway_timeout,
        )?);

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => {
                tracing::info!(host = %smtp.host, port = smtp.port, "📧 SMTP configurado");
                Arc::new(SmtpMailer::new(
                    &smtp.host,
                    smtp.port,
                    smtp.username.clone(),
                    smtp.password.clone(),
                    config.mail_sender.clone(),
                )?)
            }
            None => {
                tracing::warn!("SMTP_HOST ausente: e-mails serão apenas registrados no log");
                Arc::new(LogMailer)
            }
        };

        if config.platform_admin_token.is_none() {
            tracing::warn!("PLATFORM_ADMIN_TOKEN ausente: cadastro de empresas e licenças indisponível");
        }

        Ok(Self::with_collaborators(db_pool, config, gateways, mailer))
    }

    /// Monta o gráfico de dependências com gateway e mailer já prontos.
    pub fn with_collaborators(
        db_pool: PgPool,
        config: &Config,
        gateways: Arc<dyn GatewayResolver>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let capacity_repo = CapacityRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone());
        let tenant_service = TenantService::new(
            tenant_repo.clone(),
            user_repo.clone(),
            rbac_repo.clone(),
            db_pool.clone(),
            config.license_trial_days,
        );
        let catalog_service =
            CatalogService::new(catalog_repo.clone(), capacity_repo.clone(), db_pool.clone());
        let sale_service = SaleService::new(
            sales_repo.clone(),
            catalog_repo.clone(),
            capacity_repo.clone(),
            customer_repo.clone(),
            db_pool.clone(),
        );
        let checkout_service = CheckoutService::new(
            tenant_repo,
            catalog_repo.clone(),
            capacity_repo.clone(),
            customer_repo,
            sales_repo.clone(),
            catalog_service.clone(),
            gateways.clone(),
            db_pool.clone(),
        );
        let reconciler = WebhookReconciler::new(
            sales_repo,
            catalog_repo,
            capacity_repo,
            gateways,
            mailer,
            db_pool.clone(),
        );
        let report_service = ReportService::new(report_repo);

        Self {
            db_pool,
            i18n_store: I18nStore::new(),
            platform_admin_token: config.platform_admin_token.as_deref().map(Arc::from),
            user_repo,
            rbac_repo,
            settings_repo,
            auth_service,
            tenant_service,
            catalog_service,
            sale_service,
            checkout_service,
            reconciler,
            report_service,
        }
    }
}
