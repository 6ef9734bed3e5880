#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use salon_storefront_api::{
    dto::orders::CheckoutRequest,
    middleware::auth::AuthUser,
    models::{Product, Service, UserProfile},
    state::AppState,
    store::{CatalogRepository, MemoryStore, ProfileRepository},
};
use uuid::Uuid;

pub const SECRET: &str = "test-secret";

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), SECRET);
    TestApp { state, store }
}

pub fn shopper(user_id: &str) -> AuthUser {
    AuthUser::new(user_id).with_email(format!("{user_id}@example.com"))
}

pub async fn seed_product(state: &AppState, price: Decimal, discount: i32) -> Product {
    let now = Utc::now();
    let id = Uuid::new_v4();
    state
        .store
        .create_product(Product {
            id,
            title: format!("Product {}", &id.to_string()[..8]),
            brand: "Maison Lune".into(),
            sku: id.to_string(),
            description: None,
            price,
            discount,
            stock: 5,
            category_id: None,
            images: vec!["/img/product.png".into()],
            tags: vec![],
            is_active: true,
            featured: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("seed product")
}

pub async fn seed_service(state: &AppState, is_active: bool) -> Service {
    state
        .store
        .create_service(Service {
            id: Uuid::new_v4(),
            title: "Manicure".into(),
            description: "Classic manicure".into(),
            duration_minutes: 45,
            price: Decimal::new(3000, 2),
            currency: "USD".into(),
            image: None,
            is_active,
        })
        .await
        .expect("seed service")
}

pub async fn seed_profile(state: &AppState, user_id: &str, is_admin: bool) -> UserProfile {
    state
        .store
        .create_profile(UserProfile {
            user_id: user_id.to_string(),
            name: "Ana".into(),
            surname: "Martin".into(),
            phone: "+33612345678".into(),
            email: format!("{user_id}@example.com"),
            is_admin,
            created_at: Utc::now(),
        })
        .await
        .expect("seed profile")
}

pub fn checkout_form(payment_method: &str) -> CheckoutRequest {
    CheckoutRequest {
        name: Some("Ana".into()),
        surname: Some("Martin".into()),
        phone: Some("+33612345678".into()),
        address: "12 rue des Lilas".into(),
        city: "Lyon".into(),
        payment_method: payment_method.into(),
        coupon: None,
    }
}
