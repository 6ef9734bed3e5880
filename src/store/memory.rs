//! Process-local store. Each call takes the single lock once, so every method
//! is atomic with respect to the others.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AppointmentCounts, AppointmentFilter, AppointmentRepository, AuditRepository,
    CartRepository, CatalogRepository, OrderFilter, OrderRepository, OrderTotals, Page, Paged,
    ProductChanges, ProductFilter, ProfileChanges, ProfileRepository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        AppointmentRequest, AppointmentStatus, AuditEntry, CartItem, Category, Order, OrderDraft,
        OrderStatus, PaymentStatus, Product, Service, UserProfile, bumped_quantity,
    },
};

#[derive(Default)]
struct Collections {
    products: Vec<Product>,
    categories: Vec<Category>,
    services: Vec<Service>,
    carts: HashMap<String, Vec<CartItem>>,
    orders: Vec<Order>,
    appointments: Vec<AppointmentRequest>,
    profiles: HashMap<String, UserProfile>,
    audit: Vec<AuditEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit trail recorded so far, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.data.read().await.audit.clone()
    }
}

/// Creation order reversed, then a stable sort so equal timestamps stay newest first.
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

fn oldest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out = items.to_vec();
    out.sort_by_key(|item| created_at(item));
    out
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(&self, filter: ProductFilter, page: Page) -> AppResult<Paged<Product>> {
        let data = self.data.read().await;
        let ordered = newest_first(&data.products, |p| p.created_at);
        let matching = ordered.into_iter().filter(|p| filter.matches(p)).collect();
        Ok(Paged::slice(matching, page))
    }

    async fn create_product(&self, product: Product) -> AppResult<Product> {
        let mut data = self.data.write().await;
        if data.products.iter().any(|p| p.id == product.id || p.sku == product.sku) {
            return Err(AppError::validation(format!(
                "product with sku {} already exists",
                product.sku
            )));
        }
        data.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Product>> {
        let mut data = self.data.write().await;
        let Some(product) = data.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            product.title = title;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(discount) = changes.discount {
            product.discount = discount;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(is_active) = changes.is_active {
            product.is_active = is_active;
        }
        if let Some(featured) = changes.featured {
            product.featured = featured;
        }
        product.updated_at = at;
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let mut data = self.data.write().await;
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        Ok(data.products.len() != before)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let data = self.data.read().await;
        let mut categories = data.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_category(&self, category: Category) -> AppResult<Category> {
        let mut data = self.data.write().await;
        data.categories.push(category.clone());
        Ok(category)
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>> {
        let data = self.data.read().await;
        Ok(data.services.iter().find(|s| s.id == id).cloned())
    }

    async fn list_services(&self, active_only: bool) -> AppResult<Vec<Service>> {
        let data = self.data.read().await;
        let mut services: Vec<Service> = data
            .services
            .iter()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(services)
    }

    async fn create_service(&self, service: Service) -> AppResult<Service> {
        let mut data = self.data.write().await;
        data.services.push(service.clone());
        Ok(service)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn list_cart_items(&self, user_id: &str) -> AppResult<Vec<CartItem>> {
        let data = self.data.read().await;
        Ok(data.carts.get(user_id).cloned().unwrap_or_default())
    }

    async fn upsert_cart_item(&self, user_id: &str, item: CartItem) -> AppResult<CartItem> {
        let mut data = self.data.write().await;
        let cart = data.carts.entry(user_id.to_string()).or_default();
        if let Some(existing) = cart.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = bumped_quantity(existing.quantity, item.quantity)?;
            existing.updated_at = item.updated_at;
            return Ok(existing.clone());
        }
        cart.push(item.clone());
        Ok(item)
    }

    async fn set_cart_quantity(
        &self,
        user_id: &str,
        product_id: Uuid,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<CartItem>> {
        let mut data = self.data.write().await;
        let item = data
            .carts
            .get_mut(user_id)
            .and_then(|cart| cart.iter_mut().find(|i| i.product_id == product_id));
        Ok(item.map(|item| {
            item.quantity = quantity;
            item.updated_at = at;
            item.clone()
        }))
    }

    async fn delete_cart_item(&self, user_id: &str, product_id: Uuid) -> AppResult<()> {
        let mut data = self.data.write().await;
        if let Some(cart) = data.carts.get_mut(user_id) {
            cart.retain(|i| i.product_id != product_id);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place_order(&self, draft: OrderDraft) -> AppResult<Order> {
        let mut data = self.data.write().await;
        let lines = data.carts.get(&draft.user_id).cloned().unwrap_or_default();
        let order = draft.freeze(&lines)?;
        data.carts.remove(&order.user_id);
        data.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        let data = self.data.read().await;
        Ok(data.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, filter: OrderFilter, page: Page) -> AppResult<Paged<Order>> {
        let data = self.data.read().await;
        let ordered = if filter.oldest_first {
            oldest_first(&data.orders, |o| o.created_at)
        } else {
            newest_first(&data.orders, |o| o.created_at)
        };
        let matching = ordered
            .into_iter()
            .filter(|o| filter.user_id.as_deref().is_none_or(|uid| o.user_id == uid))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .collect();
        Ok(Paged::slice(matching, page))
    }

    async fn transition_order(
        &self,
        id: Uuid,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Order>> {
        let mut data = self.data.write().await;
        let Some(stored) = data.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        stored.advance(next, at)?;
        Ok(Some(stored.clone()))
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Order>> {
        let mut data = self.data.write().await;
        let Some(stored) = data.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        stored.payment_status = status;
        stored.updated_at = at;
        Ok(Some(stored.clone()))
    }

    async fn order_totals(&self) -> AppResult<OrderTotals> {
        let data = self.data.read().await;
        Ok(OrderTotals {
            count: data.orders.len() as u64,
            revenue: data.orders.iter().map(|o| o.total_price).sum(),
        })
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn create_appointment(
        &self,
        appointment: AppointmentRequest,
    ) -> AppResult<AppointmentRequest> {
        let mut data = self.data.write().await;
        data.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, id: Uuid) -> AppResult<Option<AppointmentRequest>> {
        let data = self.data.read().await;
        Ok(data.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: Page,
    ) -> AppResult<Paged<AppointmentRequest>> {
        let data = self.data.read().await;
        let ordered = if filter.oldest_first {
            oldest_first(&data.appointments, |a| a.created_at)
        } else {
            newest_first(&data.appointments, |a| a.created_at)
        };
        let matching = ordered
            .into_iter()
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .collect();
        Ok(Paged::slice(matching, page))
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<AppointmentRequest>> {
        let mut data = self.data.write().await;
        let Some(stored) = data.appointments.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        stored.advance(status, at)?;
        Ok(Some(stored.clone()))
    }

    async fn appointment_counts(&self) -> AppResult<AppointmentCounts> {
        let data = self.data.read().await;
        Ok(AppointmentCounts {
            total: data.appointments.len() as u64,
            pending: data
                .appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Pending)
                .count() as u64,
        })
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        let data = self.data.read().await;
        Ok(data.profiles.get(user_id).cloned())
    }

    async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let mut data = self.data.write().await;
        if data.profiles.contains_key(&profile.user_id) {
            return Err(AppError::validation("profile already exists"));
        }
        data.profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChanges,
    ) -> AppResult<Option<UserProfile>> {
        let mut data = self.data.write().await;
        Ok(data.profiles.get_mut(user_id).map(|profile| {
            changes.apply(profile);
            profile.clone()
        }))
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        self.data.write().await.audit.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartItem;
    use rust_decimal_macros::dec;

    fn line(product_id: Uuid, quantity: i32) -> CartItem {
        CartItem {
            product_id,
            product_title: "Rosewater Toner".into(),
            image: String::new(),
            price_at_time: dec!(18.90),
            quantity,
            product_ref: crate::models::product_ref(product_id),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_keeps_one_line_per_product() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.upsert_cart_item("u1", line(id, 1)).await.unwrap();
        let bumped = store.upsert_cart_item("u1", line(id, 1)).await.unwrap();
        assert_eq!(bumped.quantity, 2);
        assert_eq!(store.list_cart_items("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bump_past_the_line_limit_is_rejected() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.upsert_cart_item("u1", line(id, 1)).await.unwrap();
        store
            .set_cart_quantity("u1", id, crate::models::MAX_LINE_QUANTITY, Utc::now())
            .await
            .unwrap();

        let result = store.upsert_cart_item("u1", line(id, 1)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        let lines = store.list_cart_items("u1").await.unwrap();
        assert_eq!(lines[0].quantity, crate::models::MAX_LINE_QUANTITY);
    }

    #[test]
    fn slices_pages_and_keeps_total() {
        let paged = Paged::slice((1..=7).collect::<Vec<_>>(), Page::new(3, 3));
        assert_eq!(paged.items, vec![4, 5, 6]);
        assert_eq!(paged.total, 7);
    }
}
