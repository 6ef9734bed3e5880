mod common;

use chrono::{Duration, Utc};
use salon_storefront_api::{
    dto::{
        appointments::BookAppointmentRequest,
        profile::{CreateProfileRequest, UpdateProfileRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::AppointmentStatus,
    services::{appointment_service, catalog_service, profile_service},
};
use uuid::Uuid;

use common::{seed_profile, seed_service, shopper, test_app};

fn create_request() -> CreateProfileRequest {
    CreateProfileRequest {
        name: "Ana".into(),
        surname: "Martin".into(),
        phone: "+33612345678".into(),
    }
}

#[tokio::test]
async fn profile_is_created_once_from_the_identity() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-prof-001");

    assert!(matches!(
        profile_service::get_profile(&app.state, &user).await,
        Err(AppError::NotFound)
    ));

    let created = profile_service::create_profile(&app.state, &user, create_request())
        .await?
        .data
        .expect("profile");
    assert_eq!(created.email, "uid-prof-001@example.com");
    assert!(!created.is_admin);

    let again = profile_service::create_profile(&app.state, &user, create_request()).await;
    assert!(matches!(again, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn partial_update_merges_given_fields() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-prof-002");
    let original = seed_profile(&app.state, &user.user_id, false).await;

    let updated = profile_service::update_profile(
        &app.state,
        &user,
        UpdateProfileRequest {
            phone: Some("0698765432".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("profile");

    assert_eq!(updated.phone, "0698765432");
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.surname, original.surname);
    assert_eq!(updated.email, original.email);
    Ok(())
}

#[tokio::test]
async fn invalid_profile_fields_are_rejected() -> anyhow::Result<()> {
    let app = test_app();
    let user = shopper("uid-prof-003");
    let original = seed_profile(&app.state, &user.user_id, false).await;

    for request in [
        UpdateProfileRequest {
            name: Some("A".into()),
            ..Default::default()
        },
        UpdateProfileRequest {
            surname: Some("x".repeat(51)),
            ..Default::default()
        },
        UpdateProfileRequest {
            phone: Some("12345".into()),
            ..Default::default()
        },
    ] {
        let result = profile_service::update_profile(&app.state, &user, request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    let stored = profile_service::get_profile(&app.state, &user)
        .await?
        .data
        .expect("profile");
    assert_eq!(stored, original);

    let missing = profile_service::update_profile(
        &app.state,
        &AuthUser::new("uid-nobody-9"),
        UpdateProfileRequest {
            name: Some("Bea".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

fn booking(service_ids: Vec<Uuid>) -> BookAppointmentRequest {
    BookAppointmentRequest {
        name: "Ana".into(),
        surname: "Martin".into(),
        phone: "+33612345678".into(),
        service_ids,
        preferred_date: Utc::now() + Duration::days(2),
        comment: None,
    }
}

#[tokio::test]
async fn booking_creates_a_pending_request() -> anyhow::Result<()> {
    let app = test_app();
    let cut = seed_service(&app.state, true).await;
    let nails = seed_service(&app.state, true).await;

    let appointment =
        appointment_service::book_appointment(&app.state, booking(vec![cut.id, nails.id, cut.id]))
            .await?
            .data
            .expect("appointment");
    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.service_ids, vec![cut.id, nails.id]);
    Ok(())
}

#[tokio::test]
async fn booking_form_is_validated() {
    let app = test_app();
    let active = seed_service(&app.state, true).await;
    let retired = seed_service(&app.state, false).await;

    let cases = [
        booking(vec![]),
        booking(vec![Uuid::new_v4()]),
        booking(vec![retired.id]),
        BookAppointmentRequest {
            preferred_date: Utc::now() - Duration::hours(1),
            ..booking(vec![active.id])
        },
        BookAppointmentRequest {
            phone: "phone".into(),
            ..booking(vec![active.id])
        },
        BookAppointmentRequest {
            name: "A".into(),
            ..booking(vec![active.id])
        },
        BookAppointmentRequest {
            comment: Some("x".repeat(501)),
            ..booking(vec![active.id])
        },
    ];

    for case in cases {
        let result = appointment_service::book_appointment(&app.state, case).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

#[tokio::test]
async fn only_active_services_are_listed() -> anyhow::Result<()> {
    let app = test_app();
    let active = seed_service(&app.state, true).await;
    seed_service(&app.state, false).await;

    let services = catalog_service::list_services(&app.state)
        .await?
        .data
        .expect("services");
    assert_eq!(services.items.len(), 1);
    assert_eq!(services.items[0].id, active.id);
    Ok(())
}
