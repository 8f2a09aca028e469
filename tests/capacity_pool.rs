mod common;

use std::collections::HashSet;

use stv_backend::db::{CapacityRepository, PoolScope};

use common::{price, seed_account, seed_service, seed_shop, test_app};

#[tokio::test]
async fn allocates_lowest_number_first_and_release_is_idempotent() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 3, price(2500)).await;
    let account = seed_account(&app, &shop, &service).await;
    let repo = CapacityRepository::new(app.pool.clone());
    let pool_scope = PoolScope::Account(account.id);

    let first = repo
        .allocate_any_free(&app.pool, &shop.scope, pool_scope)
        .await
        .unwrap()
        .expect("tela livre");
    let second = repo
        .allocate_any_free(&app.pool, &shop.scope, pool_scope)
        .await
        .unwrap()
        .expect("tela livre");
    assert_eq!(first.number, 1);
    assert_eq!(second.number, 2);
    assert!(first.sold && second.sold);

    repo.release(&app.pool, &shop.scope, first.id).await.unwrap();
    repo.release(&app.pool, &shop.scope, first.id).await.unwrap();
    assert_eq!(repo.count_free(&shop.scope, pool_scope).await.unwrap(), 2);
    assert_eq!(repo.count_sold(&shop.scope, pool_scope).await.unwrap(), 1);

    // A tela devolvida volta a ser a de menor número
    let again = repo
        .allocate_any_free(&app.pool, &shop.scope, pool_scope)
        .await
        .unwrap()
        .expect("tela livre");
    assert_eq!(again.id, first.id);
}

#[tokio::test]
async fn exhausted_pool_yields_none() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 1, price(1500)).await;
    seed_account(&app, &shop, &service).await;
    let repo = CapacityRepository::new(app.pool.clone());
    let pool_scope = PoolScope::Service(service.id);

    assert!(repo
        .allocate_any_free(&app.pool, &shop.scope, pool_scope)
        .await
        .unwrap()
        .is_some());
    assert!(repo
        .allocate_any_free(&app.pool, &shop.scope, pool_scope)
        .await
        .unwrap()
        .is_none());
    assert_eq!(repo.count_free(&shop.scope, pool_scope).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_allocations_never_share_a_screen() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 4, price(2000)).await;
    seed_account(&app, &shop, &service).await;
    seed_account(&app, &shop, &service).await;
    let repo = CapacityRepository::new(app.pool.clone());

    // 10 disputas por 8 telas
    let mut handles = Vec::new();
    for _ in 0..10 {
        let repo = repo.clone();
        let pool = app.pool.clone();
        let scope = shop.scope;
        let service_id = service.id;
        handles.push(tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let screen = repo
                .allocate_any_free(&mut *tx, &scope, PoolScope::Service(service_id))
                .await
                .unwrap();
            tx.commit().await.unwrap();
            screen
        }));
    }

    let mut allocated = HashSet::new();
    let mut misses = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Some(screen) => assert!(allocated.insert(screen.id), "tela alocada duas vezes"),
            None => misses += 1,
        }
    }
    assert_eq!(allocated.len(), 8);
    assert_eq!(misses, 2);
}

#[tokio::test]
async fn screen_held_by_an_aborted_allocation_is_not_reported_sold_out() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 1, price(2000)).await;
    seed_account(&app, &shop, &service).await;
    let repo = CapacityRepository::new(app.pool.clone());
    let pool_scope = PoolScope::Service(service.id);

    // Primeira transação segura a única tela e depois desiste
    let mut holder = app.pool.begin().await.unwrap();
    let held = repo
        .allocate_any_free(&mut *holder, &shop.scope, pool_scope)
        .await
        .unwrap()
        .expect("tela livre");

    let contender = {
        let repo = repo.clone();
        let pool = app.pool.clone();
        let scope = shop.scope;
        tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let screen = repo.allocate_any_free(&mut *tx, &scope, pool_scope).await.unwrap();
            tx.commit().await.unwrap();
            screen
        })
    };

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    holder.rollback().await.unwrap();

    let screen = contender.await.unwrap().expect("tela liberada pelo rollback");
    assert_eq!(screen.id, held.id);
    assert_eq!(repo.count_free(&shop.scope, pool_scope).await.unwrap(), 0);
}

#[tokio::test]
async fn screen_held_by_a_committed_allocation_stays_sold() {
    let Some(app) = test_app().await else { return };
    let shop = seed_shop(&app).await;
    let service = seed_service(&app, &shop, 1, price(2000)).await;
    seed_account(&app, &shop, &service).await;
    let repo = CapacityRepository::new(app.pool.clone());
    let pool_scope = PoolScope::Service(service.id);

    let mut holder = app.pool.begin().await.unwrap();
    repo.allocate_any_free(&mut *holder, &shop.scope, pool_scope)
        .await
        .unwrap()
        .expect("tela livre");

    let contender = {
        let repo = repo.clone();
        let pool = app.pool.clone();
        let scope = shop.scope;
        tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let screen = repo.allocate_any_free(&mut *tx, &scope, pool_scope).await.unwrap();
            tx.commit().await.unwrap();
            screen
        })
    };

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    holder.commit().await.unwrap();

    assert!(contender.await.unwrap().is_none());
    assert_eq!(repo.count_sold(&shop.scope, pool_scope).await.unwrap(), 1);
}
