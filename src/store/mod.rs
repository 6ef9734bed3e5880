//! Repository traits over the document collections the storefront works with.
//!
//! Services only ever talk to `dyn Store`, so the same code runs against
//! Postgres in production and the in-memory store in tests. Every user-owned
//! collection (cart, orders, profile) is scoped by the caller's user id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        AppointmentRequest, AppointmentStatus, AuditEntry, CartItem, Category, Order, OrderDraft,
        OrderStatus, PaymentStatus, Product, Service, UserProfile,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Offset window into an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub const fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Paged<T> {
    /// Cut `page` out of an already filtered and ordered sequence.
    pub fn slice(all: Vec<T>, page: Page) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Self { items, total }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub active_only: bool,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub featured: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if self.active_only && !product.is_active {
            return false;
        }
        if let Some(category_id) = self.category_id {
            if product.category_id != Some(category_id) {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if product.featured != featured {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(q) => product.title.to_lowercase().contains(&q.to_lowercase()),
            None => true,
        }
    }
}

/// Partial update of a catalog product; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<i32>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub oldest_first: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub oldest_first: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.surname.is_none() && self.phone.is_none()
    }

    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(surname) = &self.surname {
            profile.surname = surname.clone();
        }
        if let Some(phone) = &self.phone {
            profile.phone = phone.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub count: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentCounts {
    pub total: u64,
    pub pending: u64,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;
    /// Newest first.
    async fn list_products(&self, filter: ProductFilter, page: Page) -> AppResult<Paged<Product>>;
    async fn create_product(&self, product: Product) -> AppResult<Product>;
    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Product>>;
    /// Returns whether a product was removed. Cart lines and orders that
    /// point at it are left alone.
    async fn delete_product(&self, id: Uuid) -> AppResult<bool>;
    /// Ordered by name.
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn create_category(&self, category: Category) -> AppResult<Category>;
    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>>;
    /// Ordered by title.
    async fn list_services(&self, active_only: bool) -> AppResult<Vec<Service>>;
    async fn create_service(&self, service: Service) -> AppResult<Service>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Insertion order.
    async fn list_cart_items(&self, user_id: &str) -> AppResult<Vec<CartItem>>;
    /// Insert `item` if the user has no line for its product yet, otherwise
    /// atomically bump the existing quantity by `item.quantity` and refresh
    /// `updated_at`, keeping the original snapshot fields. A bump past
    /// `MAX_LINE_QUANTITY` is a validation error.
    async fn upsert_cart_item(&self, user_id: &str, item: CartItem) -> AppResult<CartItem>;
    /// `None` when the user has no line for the product.
    async fn set_cart_quantity(
        &self,
        user_id: &str,
        product_id: Uuid,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<CartItem>>;
    /// Idempotent.
    async fn delete_cart_item(&self, user_id: &str, product_id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Read and lock the owner's cart lines, freeze them into an order,
    /// persist it and remove exactly those lines, all in one unit of work.
    /// An empty cart is a validation error.
    async fn place_order(&self, draft: OrderDraft) -> AppResult<Order>;
    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>>;
    async fn list_orders(&self, filter: OrderFilter, page: Page) -> AppResult<Paged<Order>>;
    /// Check the move against the stored status and apply it while the row
    /// is held, so concurrent moves cannot both pass. `None` when missing.
    async fn transition_order(
        &self,
        id: Uuid,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Order>>;
    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Order>>;
    async fn order_totals(&self) -> AppResult<OrderTotals>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create_appointment(
        &self,
        appointment: AppointmentRequest,
    ) -> AppResult<AppointmentRequest>;
    async fn get_appointment(&self, id: Uuid) -> AppResult<Option<AppointmentRequest>>;
    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: Page,
    ) -> AppResult<Paged<AppointmentRequest>>;
    /// Same guarantees as `OrderRepository::transition_order`.
    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<AppointmentRequest>>;
    async fn appointment_counts(&self) -> AppResult<AppointmentCounts>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>>;
    async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile>;
    /// Merge the provided fields into the stored profile.
    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChanges,
    ) -> AppResult<Option<UserProfile>>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()>;
}

/// Everything the storefront persists.
pub trait Store:
    CatalogRepository
    + CartRepository
    + OrderRepository
    + AppointmentRepository
    + ProfileRepository
    + AuditRepository
{
}

impl<T> Store for T where
    T: CatalogRepository
        + CartRepository
        + OrderRepository
        + AppointmentRepository
        + ProfileRepository
        + AuditRepository
{
}
