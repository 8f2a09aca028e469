// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::users::create_user,
        handlers::users::list_users,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::renew_license,

        // --- Catalog ---
        handlers::catalog::create_service,
        handlers::catalog::list_services,
        handlers::catalog::update_service,
        handlers::catalog::delete_service,
        handlers::catalog::create_account,
        handlers::catalog::list_accounts,
        handlers::catalog::update_account,
        handlers::catalog::delete_account,

        // --- Sales ---
        handlers::sales::create_sale,
        handlers::sales::finalize_sale,
        handlers::sales::cancel_sale,
        handlers::sales::get_sale,
        handlers::sales::list_sales,
        handlers::sales::list_pending,
        handlers::sales::list_customers,

        // --- Storefront ---
        handlers::public::storefront,
        handlers::public::checkout,
        handlers::public::order_status,

        // --- Webhooks ---
        handlers::webhook::mercadopago_webhook,

        // --- Settings ---
        handlers::settings::get_payment_settings,
        handlers::settings::update_payment_settings,

        // --- Reports ---
        handlers::reports::sales_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            handlers::auth::MeResponse,
            handlers::users::CreateUserPayload,
            handlers::users::CreateUserResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::License,
            handlers::tenancy::CreateTenantPayload,
            handlers::tenancy::CreateTenantResponse,
            handlers::tenancy::RenewLicensePayload,

            // --- Catalog ---
            models::catalog::ServiceKind,
            models::catalog::Service,
            models::catalog::Account,
            models::catalog::Screen,
            models::catalog::ServiceAvailability,
            models::catalog::AccountAvailability,
            handlers::catalog::ServicePayload,
            handlers::catalog::CreateAccountPayload,
            handlers::catalog::UpdateAccountPayload,

            // --- Sales ---
            models::sales::SaleStatus,
            models::sales::Sale,
            models::sales::Customer,
            models::sales::PublicOrderStatus,
            handlers::sales::CreateSalePayload,
            handlers::sales::FinalizeSalePayload,
            handlers::sales::CancelSaleResponse,

            // --- Storefront ---
            handlers::public::StorefrontResponse,
            handlers::public::CheckoutPayload,
            handlers::public::CheckoutResponse,

            // --- Settings ---
            models::settings::PaymentConfigView,
            models::settings::UpdatePaymentConfigRequest,

            // --- Reports ---
            models::reports::SalesKpis,
            models::reports::SellerCommission,
            models::reports::DailySales,
            models::reports::SalesReport,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Dados do Usuário, Permissões e Licença"),
        (name = "Tenancy", description = "Cadastro de Empresas e Licenças (operador da plataforma)"),
        (name = "Catalog", description = "Serviços, Contas e Telas"),
        (name = "Sales", description = "Vendas Manuais e Clientes"),
        (name = "Storefront", description = "Loja Pública, Checkout e Consulta de Pedido"),
        (name = "Webhooks", description = "Notificações do Gateway de Pagamento"),
        (name = "Settings", description = "Configuração do Gateway de Pagamento"),
        (name = "Reports", description = "Indicadores de Vendas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
        components.add_security_scheme(
            "operator_token",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_webhook_and_checkout_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/webhooks/mercadopago"));
        assert!(doc.paths.paths.contains_key("/loja/{slug}/checkout/{service_id}"));
        assert!(doc.paths.paths.contains_key("/pedido/{token}"));
    }

    #[test]
    fn document_lists_the_operator_and_team_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/tenants/{tenant_id}/license"));
        assert!(doc.paths.paths.contains_key("/api/users"));
        assert!(doc.paths.paths.contains_key("/api/accounts/{account_id}"));
    }
}
