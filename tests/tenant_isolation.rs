mod common;

use stv_backend::{
    common::error::AppError,
    db::{CapacityRepository, PoolScope},
    services::sale_service::PendingSaleInput,
};

use common::{price, seed_account, seed_service, seed_shop, test_app};

#[tokio::test]
async fn one_shop_never_sees_or_touches_another_shops_sales() {
    let Some(app) = test_app().await else { return };
    let shop_a = seed_shop(&app).await;
    let shop_b = seed_shop(&app).await;
    let service_a = seed_service(&app, &shop_a, 2, price(2500)).await;
    let account_a = seed_account(&app, &shop_a, &service_a).await;
    let sales = &app.state.sale_service;

    let sale_a = sales
        .create_pending(
            &shop_a.scope,
            &shop_a.admin,
            PendingSaleInput {
                service_id: service_a.id,
                account_id: None,
                customer_phone: "11977776666",
                customer_name: None,
                customer_email: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        sales.get(&shop_b.scope, sale_a.id).await,
        Err(AppError::ResourceNotFound("Venda"))
    ));
    assert!(matches!(
        sales.finalize_manual(&shop_b.scope, sale_a.id, account_a.id).await,
        Err(AppError::ResourceNotFound("Venda"))
    ));
    assert!(matches!(
        sales.cancel(&shop_b.scope, sale_a.id).await,
        Err(AppError::ResourceNotFound("Venda"))
    ));

    assert!(sales.list(&shop_b.scope, None, None, None).await.unwrap().is_empty());
    assert!(sales.list_customers(&shop_b.scope).await.unwrap().is_empty());
    assert_eq!(sales.list(&shop_a.scope, None, None, None).await.unwrap().len(), 1);

    // O serviço de A também não existe para B
    let foreign_service = sales
        .create_pending(
            &shop_b.scope,
            &shop_b.admin,
            PendingSaleInput {
                service_id: service_a.id,
                account_id: None,
                customer_phone: "11977776666",
                customer_name: None,
                customer_email: None,
            },
        )
        .await;
    assert!(matches!(foreign_service, Err(AppError::ResourceNotFound("Serviço"))));

    // A venda de A segue intacta
    let stored = sales.get(&shop_a.scope, sale_a.id).await.unwrap();
    assert_eq!(stored.status, sale_a.status);
}

#[tokio::test]
async fn allocation_is_confined_to_the_callers_shop() {
    let Some(app) = test_app().await else { return };
    let shop_a = seed_shop(&app).await;
    let shop_b = seed_shop(&app).await;
    let service_a = seed_service(&app, &shop_a, 2, price(2500)).await;
    let account_a = seed_account(&app, &shop_a, &service_a).await;
    let repo = CapacityRepository::new(app.pool.clone());

    for pool_scope in [PoolScope::Service(service_a.id), PoolScope::Account(account_a.id)] {
        let screen = repo
            .allocate_any_free(&app.pool, &shop_b.scope, pool_scope)
            .await
            .unwrap();
        assert!(screen.is_none());
        assert_eq!(repo.count_free(&shop_b.scope, pool_scope).await.unwrap(), 0);
        assert_eq!(repo.count_free(&shop_a.scope, pool_scope).await.unwrap(), 2);
    }

    let catalog = app
        .state
        .catalog_service
        .list_with_availability(&shop_b.scope, false)
        .await
        .unwrap();
    assert!(catalog.is_empty());
}
