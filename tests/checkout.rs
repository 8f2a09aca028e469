mod common;

use std::sync::Arc;
use std::time::Duration;

use stv_backend::{
    common::error::AppError,
    config::AppState,
    db::SettingsRepository,
    models::sales::SaleStatus,
    services::payment::MercadoPagoResolver,
};

use common::{
    price, seed_account, seed_service, seed_shop, test_app, test_config, RecordingMailer,
};

async fn sales_count(pool: &sqlx::PgPool, tenant_id: uuid::Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn checkout_without_stock_creates_no_sale() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 2, price(2500)).await;

    let result = app
        .state
        .checkout_service
        .checkout(&shop.tenant.slug, service.id, "comprador@teste.com", "11999990000")
        .await;
    assert!(matches!(result, Err(AppError::NoCapacityAvailable)));
    assert_eq!(sales_count(&app.pool, shop.tenant.id).await, 0);
}

#[tokio::test]
async fn checkout_without_gateway_config_fails_with_config_missing() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 2, price(2500)).await;
    seed_account(&app, &shop, &service).await;

    let config = test_config("postgres://unused");
    let resolver = MercadoPagoResolver::new(
        SettingsRepository::new(app.pool.clone()),
        config.mercadopago_base_url.clone(),
        Duration::from_secs(1),
    )
    .unwrap();
    let state = AppState::with_collaborators(
        app.pool.clone(),
        &config,
        Arc::new(resolver),
        Arc::new(RecordingMailer::default()),
    );

    let result = state
        .checkout_service
        .checkout(&shop.tenant.slug, service.id, "comprador@teste.com", "11999990000")
        .await;
    assert!(matches!(result, Err(AppError::ConfigMissing)));
    assert_eq!(sales_count(&app.pool, shop.tenant.id).await, 0);
}

#[tokio::test]
async fn successful_checkout_stores_payment_and_exposes_the_order() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 2, price(2990)).await;
    seed_account(&app, &shop, &service).await;

    let receipt = app
        .state
        .checkout_service
        .checkout(&shop.tenant.slug, service.id, "comprador@teste.com", "(11) 99999-0000")
        .await
        .unwrap();

    let sale = &receipt.sale;
    assert_eq!(sale.status, SaleStatus::AguardandoPagamento);
    assert_eq!(sale.sale_amount, price(2990));
    assert_eq!(sale.seller_id, None);
    assert_eq!(sale.screen_id, None);
    assert!(sale.payment_id.as_deref().is_some_and(|id| id.starts_with("mock-")));
    assert_eq!(sale.payment_method.as_deref(), Some("pix"));
    assert_eq!(sale.delivery_email.as_deref(), Some("comprador@teste.com"));
    assert!(sale.pix_qr_code.is_some());

    let order = app
        .state
        .checkout_service
        .order_status(&receipt.access_token)
        .await
        .unwrap();
    assert_eq!(order.service_name, service.name);
    assert_eq!(order.status, SaleStatus::AguardandoPagamento);
    assert!(order.pix_qr_code.is_some());

    let unknown = app.state.checkout_service.order_status("token-inexistente").await;
    assert!(matches!(unknown, Err(AppError::ResourceNotFound("Pedido"))));
}

#[tokio::test]
async fn gateway_failure_leaves_the_sale_without_payment() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 2, price(2500)).await;
    seed_account(&app, &shop, &service).await;
    app.gateway.fail_next_creations(true);

    let result = app
        .state
        .checkout_service
        .checkout(&shop.tenant.slug, service.id, "comprador@teste.com", "11999990000")
        .await;
    assert!(matches!(result, Err(AppError::GatewayRequestError(_))));

    let payment_ids = sqlx::query_scalar::<_, Option<String>>(
        "SELECT payment_id FROM sales WHERE tenant_id = $1",
    )
    .bind(shop.tenant.id)
    .fetch_all(&app.pool)
    .await
    .unwrap();
    assert_eq!(payment_ids, vec![None]);
}

#[tokio::test]
async fn storefront_lists_active_services_with_stock() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 3, price(2500)).await;
    seed_account(&app, &shop, &service).await;

    let storefront = app
        .state
        .checkout_service
        .storefront(&shop.tenant.slug)
        .await
        .unwrap();
    assert_eq!(storefront.tenant.id, shop.tenant.id);
    assert_eq!(storefront.services.len(), 1);
    assert_eq!(storefront.services[0].free, 3);
    assert_eq!(storefront.services[0].sold, 0);

    let missing = app.state.checkout_service.storefront("loja-que-nao-existe").await;
    assert!(matches!(missing, Err(AppError::ResourceNotFound("Loja"))));
}
