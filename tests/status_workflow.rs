mod common;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use salon_storefront_api::{
    dto::{
        admin::{
            UpdateAppointmentStatusRequest, UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
        },
        appointments::BookAppointmentRequest,
        cart::AddToCartRequest,
    },
    error::AppError,
    models::{AppointmentStatus, Order, OrderStatus, PaymentStatus},
    routes::params::{AppointmentListQuery, OrderListQuery},
    services::{admin_service, appointment_service, cart_service, order_service},
    store::{AppointmentRepository, OrderRepository},
};

use common::{TestApp, checkout_form, seed_product, seed_profile, seed_service, shopper, test_app};

async fn place_order(app: &TestApp, user_id: &str) -> Order {
    let user = shopper(user_id);
    let product = seed_product(&app.state, dec!(12.50), 0).await;
    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: product.id,
        },
    )
    .await
    .expect("add");
    order_service::checkout(&app.state, &user, checkout_form("Card"))
        .await
        .expect("checkout")
        .data
        .expect("order")
}

fn status(value: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: value.into(),
    }
}

#[tokio::test]
async fn order_moves_forward_and_stamps_timestamps() -> anyhow::Result<()> {
    let app = test_app();
    let admin = shopper("uid-admin-01");
    seed_profile(&app.state, &admin.user_id, true).await;
    let order = place_order(&app, "uid-buyer-01").await;

    for next in ["processing", "shipped"] {
        admin_service::update_order_status(&app.state, &admin, order.id, status(next)).await?;
    }
    let shipped = admin_service::get_order(&app.state, &admin, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(shipped.shipped_at.is_some());
    assert!(shipped.delivered_at.is_none());

    let delivered =
        admin_service::update_order_status(&app.state, &admin, order.id, status("delivered"))
            .await?
            .data
            .expect("order");
    assert!(delivered.delivered_at.is_some());
    assert!(delivered.updated_at >= shipped.updated_at);
    assert_eq!(delivered.total_price, order.total_price);

    let terminal =
        admin_service::update_order_status(&app.state, &admin, order.id, status("cancelled")).await;
    assert!(matches!(terminal, Err(AppError::InvalidTransition { .. })));
    Ok(())
}

#[tokio::test]
async fn illegal_jumps_are_rejected() -> anyhow::Result<()> {
    let app = test_app();
    let admin = shopper("uid-admin-01");
    seed_profile(&app.state, &admin.user_id, true).await;
    let order = place_order(&app, "uid-buyer-02").await;

    let skip =
        admin_service::update_order_status(&app.state, &admin, order.id, status("delivered")).await;
    assert!(matches!(skip, Err(AppError::InvalidTransition { .. })));

    let unknown =
        admin_service::update_order_status(&app.state, &admin, order.id, status("lost")).await;
    assert!(matches!(unknown, Err(AppError::Validation(_))));

    let cancelled =
        admin_service::update_order_status(&app.state, &admin, order.id, status("Cancelled"))
            .await?
            .data
            .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_cancel_and_ship_settle_on_one_outcome() -> anyhow::Result<()> {
    let app = test_app();
    let admin = shopper("uid-admin-01");
    seed_profile(&app.state, &admin.user_id, true).await;
    let order = place_order(&app, "uid-buyer-06").await;
    admin_service::update_order_status(&app.state, &admin, order.id, status("processing")).await?;

    let id = order.id;
    let spawn_move = |next: &'static str| {
        let state = app.state.clone();
        let admin = admin.clone();
        tokio::spawn(async move {
            admin_service::update_order_status(&state, &admin, id, status(next)).await
        })
    };
    let cancel = spawn_move("cancelled");
    let ship = spawn_move("shipped");
    let outcomes = [cancel.await?, ship.await?];

    let applied = outcomes.iter().filter(|r| r.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|r| matches!(r, Err(AppError::InvalidTransition { .. })))
        .count();
    assert_eq!((applied, refused), (1, 1));

    let settled = app.state.store.get_order(order.id).await?.expect("order");
    match settled.status {
        OrderStatus::Cancelled => assert!(settled.shipped_at.is_none()),
        OrderStatus::Shipped => assert!(settled.shipped_at.is_some()),
        other => panic!("unexpected status {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn store_checks_the_move_against_the_stored_status() -> anyhow::Result<()> {
    let app = test_app();
    let order = place_order(&app, "uid-buyer-07").await;

    app.state
        .store
        .transition_order(order.id, OrderStatus::Cancelled, Utc::now())
        .await?;
    // The caller still believes the order is pending.
    let stale = app
        .state
        .store
        .transition_order(order.id, OrderStatus::Processing, Utc::now())
        .await;
    assert!(matches!(stale, Err(AppError::InvalidTransition { .. })));

    let stored = app.state.store.get_order(order.id).await?.expect("order");
    assert_eq!(stored.status, OrderStatus::Cancelled);

    let missing = app
        .state
        .store
        .transition_order(uuid::Uuid::new_v4(), OrderStatus::Processing, Utc::now())
        .await?;
    assert!(missing.is_none());
    Ok(())
}

#[tokio::test]
async fn payment_status_is_independent() -> anyhow::Result<()> {
    let app = test_app();
    let admin = shopper("uid-admin-01");
    seed_profile(&app.state, &admin.user_id, true).await;
    let order = place_order(&app, "uid-buyer-03").await;

    let paid = admin_service::update_payment_status(
        &app.state,
        &admin,
        order.id,
        UpdatePaymentStatusRequest {
            payment_status: "Paid".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::Pending);

    let back = admin_service::update_payment_status(
        &app.state,
        &admin,
        order.id,
        UpdatePaymentStatusRequest {
            payment_status: "Not paid".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(back.payment_status, PaymentStatus::NotPaid);
    Ok(())
}

#[tokio::test]
async fn admin_surface_requires_the_admin_flag() -> anyhow::Result<()> {
    let app = test_app();
    let shopper_only = shopper("uid-plain-01");
    let order = place_order(&app, "uid-plain-01").await;

    assert!(matches!(
        admin_service::list_all_orders(&app.state, &shopper_only, OrderListQuery::default()).await,
        Err(AppError::Forbidden)
    ));

    seed_profile(&app.state, &shopper_only.user_id, false).await;
    assert!(matches!(
        admin_service::update_order_status(&app.state, &shopper_only, order.id, status("processing"))
            .await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        admin_service::dashboard_stats(&app.state, &shopper_only).await,
        Err(AppError::Forbidden)
    ));
    Ok(())
}

async fn book(app: &TestApp) -> salon_storefront_api::models::AppointmentRequest {
    let service = seed_service(&app.state, true).await;
    appointment_service::book_appointment(
        &app.state,
        BookAppointmentRequest {
            name: "Ana".into(),
            surname: "Martin".into(),
            phone: "+33612345678".into(),
            service_ids: vec![service.id],
            preferred_date: Utc::now() + Duration::days(3),
            comment: Some("Morning if possible".into()),
        },
    )
    .await
    .expect("book")
    .data
    .expect("appointment")
}

#[tokio::test]
async fn confirming_an_appointment_only_touches_status() -> anyhow::Result<()> {
    let app = test_app();
    let admin = shopper("uid-admin-01");
    seed_profile(&app.state, &admin.user_id, true).await;
    let booked = book(&app).await;

    admin_service::update_appointment_status(
        &app.state,
        &admin,
        booked.id,
        UpdateAppointmentStatusRequest {
            status: "confirmed".into(),
        },
    )
    .await?;

    let stored = app
        .state
        .store
        .get_appointment(booked.id)
        .await?
        .expect("appointment");
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
    assert!(stored.updated_at >= booked.updated_at);
    let untouched = salon_storefront_api::models::AppointmentRequest {
        status: booked.status,
        updated_at: booked.updated_at,
        ..stored.clone()
    };
    assert_eq!(untouched, booked);

    let back = admin_service::update_appointment_status(
        &app.state,
        &admin,
        booked.id,
        UpdateAppointmentStatusRequest {
            status: "pending".into(),
        },
    )
    .await;
    assert!(matches!(back, Err(AppError::InvalidTransition { .. })));

    let done = admin_service::update_appointment_status(
        &app.state,
        &admin,
        booked.id,
        UpdateAppointmentStatusRequest {
            status: "completed".into(),
        },
    )
    .await?
    .data
    .expect("appointment");
    assert_eq!(done.status, AppointmentStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn dashboard_and_listings_reflect_activity() -> anyhow::Result<()> {
    let app = test_app();
    let admin = shopper("uid-admin-01");
    seed_profile(&app.state, &admin.user_id, true).await;
    place_order(&app, "uid-buyer-04").await;
    place_order(&app, "uid-buyer-05").await;
    let first = book(&app).await;
    book(&app).await;

    admin_service::update_appointment_status(
        &app.state,
        &admin,
        first.id,
        UpdateAppointmentStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await?;

    let stats = admin_service::dashboard_stats(&app.state, &admin)
        .await?
        .data
        .expect("stats");
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.total_revenue, dec!(25.00));
    assert_eq!(stats.total_appointments, 2);
    assert_eq!(stats.pending_appointments, 1);

    let pending = admin_service::list_appointments(
        &app.state,
        &admin,
        AppointmentListQuery {
            status: Some("pending".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(pending.data.expect("list").items.len(), 1);

    let all_orders =
        admin_service::list_all_orders(&app.state, &admin, OrderListQuery::default()).await?;
    assert_eq!(all_orders.meta.expect("meta").total, Some(2));
    Ok(())
}
