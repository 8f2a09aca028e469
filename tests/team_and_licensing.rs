mod common;

use stv_backend::{
    common::error::AppError,
    services::{
        sale_service::PendingSaleInput,
        tenancy_service::{NewTenant, NewUser},
    },
};

use common::{price, seed_service, seed_shop, test_app};

fn seller<'a>(email: &'a str, permissions: &'a [&'a str]) -> NewUser<'a> {
    NewUser {
        name: "Vendedor",
        email,
        password: "senha-do-vendedor",
        permissions,
    }
}

#[tokio::test]
async fn admin_creates_a_seller_with_only_the_requested_permissions() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 2, price(2500)).await;
    let email = format!("vendedor-{}@loja.com", uuid::Uuid::new_v4().simple());
    let tenants = &app.state.tenant_service;

    let (user, permissions) = tenants
        .create_user(&shop.scope, seller(&email, &["venda:ver", "venda:criar"]))
        .await
        .unwrap();
    assert!(!user.is_tenant_admin);
    assert_eq!(user.tenant_id, shop.tenant.id);
    assert_eq!(permissions, vec!["venda:criar".to_string(), "venda:ver".to_string()]);

    let rbac = &app.state.rbac_repo;
    assert!(rbac.user_has_permission(&shop.scope, user.id, "venda:criar").await.unwrap());
    assert!(!rbac.user_has_permission(&shop.scope, user.id, "administrativo:criar").await.unwrap());
    assert!(!rbac.user_has_permission(&shop.scope, user.id, "administrativo:excluir").await.unwrap());

    // Entra no painel e registra venda em nome próprio
    app.state
        .auth_service
        .login_user(&email, "senha-do-vendedor")
        .await
        .unwrap();
    let sale = app
        .state
        .sale_service
        .create_pending(
            &shop.scope,
            &user,
            PendingSaleInput {
                service_id: service.id,
                account_id: None,
                customer_phone: "11955554444",
                customer_name: None,
                customer_email: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(sale.seller_id, Some(user.id));

    let team = tenants.list_users(&shop.scope).await.unwrap();
    assert_eq!(team.len(), 2);
}

#[tokio::test]
async fn duplicate_email_creates_nothing() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let tenants = &app.state.tenant_service;

    let result = tenants
        .create_user(&shop.scope, seller(&shop.admin.email, &["venda:ver"]))
        .await;
    assert!(matches!(result, Err(AppError::EmailAlreadyExists)));
    assert_eq!(tenants.list_users(&shop.scope).await.unwrap().len(), 1);
}

#[tokio::test]
async fn team_listing_is_confined_to_the_callers_shop() {
    let Some(app) = test_app().await else { return };
    let shop_a = seed_shop(&app).await;
    let shop_b = seed_shop(&app).await;
    let email = format!("vendedor-{}@loja.com", uuid::Uuid::new_v4().simple());
    app.state
        .tenant_service
        .create_user(&shop_a.scope, seller(&email, &["venda:ver"]))
        .await
        .unwrap();

    let team_b = app.state.tenant_service.list_users(&shop_b.scope).await.unwrap();
    assert_eq!(team_b.len(), 1);
    assert_eq!(team_b[0].id, shop_b.admin.id);
}

#[tokio::test]
async fn renewing_an_expired_license_reopens_the_panel() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let tenants = &app.state.tenant_service;

    sqlx::query(
        "UPDATE licenses SET starts_on = CURRENT_DATE - 30, access_days = 7 WHERE tenant_id = $1",
    )
    .bind(shop.tenant.id)
    .execute(&app.pool)
    .await
    .unwrap();
    assert!(matches!(
        tenants.active_license(&shop.scope).await,
        Err(AppError::LicenseExpired)
    ));

    let renewed = tenants.renew_license(shop.tenant.id, 30).await.unwrap();
    assert_eq!(renewed.access_days, 30);
    assert_eq!(renewed.tenant_id, shop.tenant.id);

    let active = tenants.active_license(&shop.scope).await.unwrap();
    assert_eq!(active.id, renewed.id);
}

#[tokio::test]
async fn renewing_an_unknown_tenant_is_not_found() {
    let Some(app) = test_app().await else { return };
    let result = app
        .state
        .tenant_service
        .renew_license(uuid::Uuid::new_v4(), 30)
        .await;
    assert!(matches!(result, Err(AppError::ResourceNotFound("Empresa"))));
}

#[tokio::test]
async fn operator_can_grant_a_longer_first_license() {
    let Some(app) = test_app().await else { return };
    let unique = uuid::Uuid::new_v4().simple().to_string();
    let slug = format!("loja-{}", &unique[..12]);
    let email = format!("admin-{unique}@teste.com");

    let (_tenant, _admin, license) = app
        .state
        .tenant_service
        .create_tenant_with_admin(NewTenant {
            name: "Loja Anual",
            slug: &slug,
            document_number: None,
            admin_name: "Admin",
            admin_email: &email,
            admin_password: "senha-forte",
            license_days: Some(365),
        })
        .await
        .unwrap();
    assert_eq!(license.access_days, 365);
}
