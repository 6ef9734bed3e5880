mod common;

use rust_decimal_macros::dec;
use salon_storefront_api::{
    dto::{cart::AddToCartRequest, orders::CheckoutRequest},
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentMethod, PaymentStatus},
    routes::params::OrderListQuery,
    services::{cart_service, order_service},
    store::{CartRepository, CatalogRepository},
};

use uuid::Uuid;

use common::{TestApp, checkout_form, seed_product, seed_profile, shopper, test_app};

async fn add(app: &TestApp, user: &AuthUser, product_id: Uuid) {
    cart_service::add_to_cart(&app.state, user, AddToCartRequest { product_id })
        .await
        .expect("add to cart");
}

fn is_order_number(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == 3
        && parts[0] == "ORDER"
        && parts[1].len() == 14
        && parts[1].bytes().all(|b| b.is_ascii_digit())
        && parts[2].len() == 6
        && parts[2].bytes().all(|b| b.is_ascii_alphanumeric())
}

#[tokio::test]
async fn card_checkout_scenario() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uidA1b2c3d4");
    let product = seed_product(&app.state, dec!(20), 10).await;

    add(&app, &user, product.id).await;
    add(&app, &user, product.id).await;

    let order = order_service::checkout(&app.state, &user, checkout_form("Card"))
        .await?
        .data
        .expect("order");

    assert_eq!(order.total_price, dec!(36.00));
    assert_eq!(order.payment_method, PaymentMethod::Card);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.currency, "USD");
    assert_eq!(order.user_email, "uidA1b2c3d4@example.com");
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].price_at_time, dec!(18.00));
    assert_eq!(order.items[0].product_ref, format!("/products/{}", product.id));
    assert!(is_order_number(&order.order_number), "{}", order.order_number);
    assert!(order.order_number.ends_with("-uidA1b"));

    assert!(app.state.store.list_cart_items(&user.user_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn total_is_the_sum_of_snapshot_lines() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-total-01");
    let ten = seed_product(&app.state, dec!(10.00), 0).await;
    let five_fifty = seed_product(&app.state, dec!(5.50), 0).await;

    add(&app, &user, ten.id).await;
    add(&app, &user, ten.id).await;
    add(&app, &user, five_fifty.id).await;

    let order = order_service::checkout(&app.state, &user, checkout_form("Cash on delivery"))
        .await?
        .data
        .expect("order");
    assert_eq!(order.total_price, dec!(25.50));
    assert_eq!(order.payment_status, PaymentStatus::NotPaid);
    assert!(is_order_number(&order.order_number), "{}", order.order_number);
    assert!(order.order_number.ends_with("-uidtot"));
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() {
    let app = test_app();
    let user = shopper("uid-empty-01");
    let result = order_service::checkout(&app.state, &user, checkout_form("Card")).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn form_is_validated_and_prefilled_from_profile() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-form-001");
    let product = seed_product(&app.state, dec!(8), 0).await;
    add(&app, &user, product.id).await;

    let unknown_method = order_service::checkout(&app.state, &user, checkout_form("Bitcoin")).await;
    assert!(matches!(unknown_method, Err(AppError::Validation(_))));

    let no_city = CheckoutRequest {
        city: " ".into(),
        ..checkout_form("Card")
    };
    assert!(matches!(
        order_service::checkout(&app.state, &user, no_city).await,
        Err(AppError::Validation(_))
    ));

    // Without a profile a blank name has nothing to fall back on.
    let anonymous = CheckoutRequest {
        name: None,
        ..checkout_form("Card")
    };
    assert!(matches!(
        order_service::checkout(&app.state, &user, anonymous.clone()).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(app.state.store.list_cart_items(&user.user_id).await?.len(), 1);

    seed_profile(&app.state, &user.user_id, false).await;
    let order = order_service::checkout(&app.state, &user, anonymous)
        .await?
        .data
        .expect("order");
    assert_eq!(order.name, "Ana");
    assert_eq!(order.city, "Lyon");
    Ok(())
}

#[tokio::test]
async fn orders_survive_product_deletion() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-keep-001");
    let product = seed_product(&app.state, dec!(15), 0).await;
    add(&app, &user, product.id).await;

    let order = order_service::checkout(&app.state, &user, checkout_form("Card"))
        .await?
        .data
        .expect("order");
    assert!(app.state.store.delete_product(product.id).await?);

    let fetched = order_service::get_order(&app.state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.items[0].title, product.title);
    assert_eq!(fetched.total_price, dec!(15));
    Ok(())
}

#[tokio::test]
async fn orders_are_private_to_their_owner() -> anyhow::Result<()> {
    let app = test_app();
    let owner = shopper("uid-owner-01");
    let stranger = shopper("uid-other-02");
    let product = seed_product(&app.state, dec!(3), 0).await;
    add(&app, &owner, product.id).await;

    let order = order_service::checkout(&app.state, &owner, checkout_form("Card"))
        .await?
        .data
        .expect("order");

    assert!(matches!(
        order_service::get_order(&app.state, &stranger, order.id).await,
        Err(AppError::NotFound)
    ));

    let mine = order_service::list_orders(&app.state, &owner, OrderListQuery::default()).await?;
    assert_eq!(mine.data.expect("list").items.len(), 1);
    let theirs =
        order_service::list_orders(&app.state, &stranger, OrderListQuery::default()).await?;
    assert!(theirs.data.expect("list").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn short_user_ids_still_give_well_formed_order_numbers() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("u-7");
    let product = seed_product(&app.state, dec!(2), 0).await;
    add(&app, &user, product.id).await;

    let order = order_service::checkout(&app.state, &user, checkout_form("Card"))
        .await?
        .data
        .expect("order");
    assert!(is_order_number(&order.order_number), "{}", order.order_number);
    assert!(order.order_number.ends_with("-u70000"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_cart_is_checked_out_at_most_once() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-twice-01");
    let product = seed_product(&app.state, dec!(9), 0).await;
    add(&app, &user, product.id).await;

    let first = tokio::spawn({
        let state = app.state.clone();
        let user = user.clone();
        async move { order_service::checkout(&state, &user, checkout_form("Card")).await }
    });
    let second = tokio::spawn({
        let state = app.state.clone();
        let user = user.clone();
        async move { order_service::checkout(&state, &user, checkout_form("Card")).await }
    });
    let outcomes = [first.await?, second.await?];

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::Validation(_))))
    );

    let listed = order_service::list_orders(&app.state, &user, OrderListQuery::default()).await?;
    assert_eq!(listed.data.expect("list").items.len(), 1);
    assert!(app.state.store.list_cart_items(&user.user_id).await?.is_empty());
    Ok(())
}
