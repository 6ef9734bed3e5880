mod common;

use chrono::Utc;
use rust_decimal_macros::dec;
use salon_storefront_api::{
    dto::cart::{AddToCartRequest, UpdateQuantityRequest},
    error::AppError,
    models::MAX_LINE_QUANTITY,
    services::cart_service,
    store::{CatalogRepository, ProductChanges},
};
use serde_json::json;
use uuid::Uuid;

use common::{seed_product, shopper, test_app};

#[tokio::test]
async fn adding_twice_bumps_a_single_line() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-alice-001");
    let product = seed_product(&app.state, dec!(20), 10).await;

    for _ in 0..2 {
        cart_service::add_to_cart(
            &app.state,
            &user,
            AddToCartRequest {
                product_id: product.id,
            },
        )
        .await?;
    }

    let cart = cart_service::load_cart(&app.state, &user.user_id).await?;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[0].price_at_time, dec!(18.00));
    assert_eq!(cart.total, dec!(36.00));
    assert_eq!(cart.count, 2);
    Ok(())
}

#[tokio::test]
async fn snapshot_price_ignores_later_catalog_edits() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-bob-0002");
    let product = seed_product(&app.state, dec!(20), 10).await;

    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;

    app.state
        .store
        .update_product(
            product.id,
            ProductChanges {
                price: Some(dec!(99)),
                discount: Some(50),
                title: Some("Renamed".into()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await?;

    // A second add must keep the original snapshot too.
    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;

    let cart = cart_service::load_cart(&app.state, &user.user_id).await?;
    assert_eq!(cart.items[0].price_at_time, dec!(18.00));
    assert_eq!(cart.items[0].product_title, product.title);
    assert_eq!(cart.items[0].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn carts_are_scoped_per_user() -> anyhow::Result<()> {
    let app = test_app();
    let alice = shopper("uid-alice-001");
    let bob = shopper("uid-bob-0002");
    let product = seed_product(&app.state, dec!(5), 0).await;

    cart_service::add_to_cart(
        &app.state,
        &alice,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;

    let bobs = cart_service::load_cart(&app.state, &bob.user_id).await?;
    assert!(bobs.items.is_empty());
    assert_eq!(bobs.total, dec!(0));
    Ok(())
}

#[tokio::test]
async fn unknown_or_inactive_products_cannot_be_added() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-carol-03");

    let missing = cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let product = seed_product(&app.state, dec!(12), 0).await;
    app.state
        .store
        .update_product(
            product.id,
            ProductChanges {
                is_active: Some(false),
                ..Default::default()
            },
            Utc::now(),
        )
        .await?;
    let inactive = cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await;
    assert!(matches!(inactive, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn quantity_updates_are_validated() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-dan-0004");
    let product = seed_product(&app.state, dec!(10), 0).await;
    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;

    for bad in [json!(0), json!(-1), json!(2.5), json!("3"), json!(1000)] {
        let result = cart_service::update_quantity(
            &app.state,
            &user,
            product.id,
            UpdateQuantityRequest { quantity: bad },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    let updated = cart_service::update_quantity(
        &app.state,
        &user,
        product.id,
        UpdateQuantityRequest { quantity: json!(7) },
    )
    .await?;
    assert_eq!(updated.data.unwrap().quantity, 7);

    let absent = cart_service::update_quantity(
        &app.state,
        &user,
        Uuid::new_v4(),
        UpdateQuantityRequest { quantity: json!(1) },
    )
    .await;
    assert!(matches!(absent, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn a_full_line_refuses_another_unit() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-fay-0006");
    let product = seed_product(&app.state, dec!(4), 0).await;
    let add = || AddToCartRequest {
        product_id: product.id,
    };
    cart_service::add_to_cart(&app.state, &user, add()).await?;
    cart_service::update_quantity(
        &app.state,
        &user,
        product.id,
        UpdateQuantityRequest {
            quantity: json!(MAX_LINE_QUANTITY),
        },
    )
    .await?;

    let result = cart_service::add_to_cart(&app.state, &user, add()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let cart = cart_service::load_cart(&app.state, &user.user_id).await?;
    assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);
    Ok(())
}

#[tokio::test]
async fn removing_is_idempotent() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-erin-005");
    let product = seed_product(&app.state, dec!(10), 0).await;
    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;

    cart_service::remove_item(&app.state, &user, product.id).await?;
    cart_service::remove_item(&app.state, &user, product.id).await?;

    let cart = cart_service::load_cart(&app.state, &user.user_id).await?;
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn subscription_sees_own_cart_changes() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-fay-0006");
    let other = shopper("uid-gus-0007");
    let product = seed_product(&app.state, dec!(4.50), 0).await;

    let mut subscription = cart_service::subscribe(&app.state, &user);
    assert!(subscription.current().await?.items.is_empty());

    // Changes to someone else's cart are skipped.
    cart_service::add_to_cart(
        &app.state,
        &other,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;

    let snapshot = subscription
        .next_snapshot()
        .await
        .expect("channel open")?;
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.total, dec!(4.50));
    Ok(())
}

#[tokio::test]
async fn mutations_are_audited() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-hal-0008");
    let product = seed_product(&app.state, dec!(10), 0).await;
    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await?;
    cart_service::remove_item(&app.state, &user, product.id).await?;

    let actions: Vec<String> = app
        .store
        .audit_entries()
        .await
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, ["cart_add", "cart_remove"]);
    Ok(())
}
