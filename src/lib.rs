// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, license_guard, operator_guard};

/// Monta o router completo da aplicação.
pub fn app(app_state: AppState) -> Router {
    // Rotas do painel: exigem token e licença vigente.
    // A última camada adicionada roda primeiro (auth antes da licença).
    let panel_routes = Router::new()
        .route(
            "/services",
            post(handlers::catalog::create_service).get(handlers::catalog::list_services),
        )
        .route(
            "/services/{service_id}",
            put(handlers::catalog::update_service).delete(handlers::catalog::delete_service),
        )
        .route(
            "/services/{service_id}/accounts",
            post(handlers::catalog::create_account).get(handlers::catalog::list_accounts),
        )
        .route(
            "/accounts/{account_id}",
            put(handlers::catalog::update_account).delete(handlers::catalog::delete_account),
        )
        .route(
            "/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route(
            "/sales",
            post(handlers::sales::create_sale).get(handlers::sales::list_sales),
        )
        .route("/sales/pending", get(handlers::sales::list_pending))
        .route("/sales/{sale_id}", get(handlers::sales::get_sale))
        .route("/sales/{sale_id}/finalize", post(handlers::sales::finalize_sale))
        .route("/sales/{sale_id}/cancel", post(handlers::sales::cancel_sale))
        .route("/customers", get(handlers::sales::list_customers))
        .route(
            "/settings/payment",
            get(handlers::settings::get_payment_settings)
                .put(handlers::settings::update_payment_settings),
        )
        .route("/reports/sales", get(handlers::reports::sales_report))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            license_guard,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // O /me fica fora da checagem de licença
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Operador da plataforma: cadastro de empresas e renovação de licenças
    let operator_routes = Router::new()
        .route("/", post(handlers::tenancy::create_tenant))
        .route("/{tenant_id}/license", put(handlers::tenancy::renew_license))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            operator_guard,
        ));

    // Loja pública, consulta de pedido e webhook: sem sessão
    let public_routes = Router::new()
        .route("/loja/{slug}", get(handlers::public::storefront))
        .route(
            "/loja/{slug}/checkout/{service_id}",
            post(handlers::public::checkout),
        )
        .route("/pedido/{token}", get(handlers::public::order_status))
        .route(
            "/webhooks/mercadopago",
            post(handlers::webhook::mercadopago_webhook),
        );

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login))
        .nest("/api/tenants", operator_routes)
        .nest("/api/users", user_routes)
        .nest("/api", panel_routes)
        .merge(public_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
