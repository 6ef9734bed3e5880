use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Currency recorded on every order.
pub const ORDER_CURRENCY: &str = "USD";

/// Most units a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub brand: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Percentage off the list price, 0..=100.
    pub discount: i32,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a shopper pays right now: list price with the discount applied once,
    /// rounded to cents.
    pub fn current_price(&self) -> Decimal {
        let off = self.price * Decimal::from(self.discount) / Decimal::ONE_HUNDRED;
        (self.price - off).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn reference(&self) -> String {
        product_ref(self.id)
    }

    pub fn cover_image(&self) -> String {
        self.images.first().cloned().unwrap_or_default()
    }
}

/// Non-owning path pointer to a product document.
pub fn product_ref(id: Uuid) -> String {
    format!("/products/{id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub currency: String,
    pub image: Option<String>,
    pub is_active: bool,
}

/// One line of a user's cart. The title, image and price are snapshots taken
/// when the product was first added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: Uuid,
    pub product_title: String,
    pub image: String,
    pub price_at_time: Decimal,
    pub quantity: i32,
    pub product_ref: String,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    pub fn snapshot(product: &Product, now: DateTime<Utc>) -> Self {
        Self {
            product_id: product.id,
            product_title: product.title.clone(),
            image: product.cover_image(),
            price_at_time: product.current_price(),
            quantity: 1,
            product_ref: product.reference(),
            updated_at: now,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price_at_time * Decimal::from(self.quantity)
    }
}

/// Quantity of a line after `added` more units, bounded by [`MAX_LINE_QUANTITY`].
pub fn bumped_quantity(current: i32, added: i32) -> Result<i32, AppError> {
    current
        .checked_add(added)
        .filter(|quantity| (1..=MAX_LINE_QUANTITY).contains(quantity))
        .ok_or_else(|| {
            AppError::validation(format!(
                "a cart line holds at most {MAX_LINE_QUANTITY} units"
            ))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    #[serde(rename = "Cash on delivery")]
    CashOnDelivery,
    #[serde(rename = "Card")]
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on delivery",
            PaymentMethod::Card => "Card",
        }
    }

    /// Payment status an order starts with for this method.
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            PaymentMethod::Card => PaymentStatus::Pending,
            PaymentMethod::CashOnDelivery => PaymentStatus::NotPaid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentStatus {
    #[serde(rename = "Not paid")]
    NotPaid,
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Paid")]
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::NotPaid => "Not paid",
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// pending -> processing | cancelled, processing -> shipped | cancelled,
    /// shipped -> delivered. Delivered and cancelled are terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed)
        )
    }
}

macro_rules! impl_str_enum {
    ($ty:ident, $label:literal, [$($variant:ident),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(AppError::validation(format!("invalid {}: {s}", $label)))
            }
        }
    };
}

impl_str_enum!(PaymentMethod, "payment method", [CashOnDelivery, Card]);
impl_str_enum!(PaymentStatus, "payment status", [NotPaid, Pending, Paid]);
impl_str_enum!(
    OrderStatus,
    "order status",
    [Pending, Processing, Shipped, Delivered, Cancelled]
);
impl_str_enum!(
    AppointmentStatus,
    "appointment status",
    [Pending, Confirmed, Cancelled, Completed]
);

/// Frozen copy of a cart line inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_ref: String,
    pub title: String,
    pub image_url: String,
    pub price_at_time: Decimal,
    pub quantity: i32,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            product_ref: product_ref(item.product_id),
            title: item.product_title.clone(),
            image_url: item.image.clone(),
            price_at_time: item.price_at_time,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub user_email: String,
    pub order_number: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub currency: String,
    pub coupon: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Move along the workflow, stamping `shipped_at` / `delivered_at`.
    /// Leaves the order untouched when the move is not allowed.
    pub fn advance(&mut self, next: OrderStatus, at: DateTime<Utc>) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::transition(self.status, next));
        }
        self.status = next;
        self.updated_at = at;
        match next {
            OrderStatus::Shipped => self.shipped_at = Some(at),
            OrderStatus::Delivered => self.delivered_at = Some(at),
            _ => {}
        }
        Ok(())
    }
}

/// Checkout form data waiting for the cart it will be built from.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub id: Uuid,
    pub user_id: String,
    pub user_email: String,
    pub order_number: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub payment_method: PaymentMethod,
    pub coupon: Option<String>,
    pub placed_at: DateTime<Utc>,
}

impl OrderDraft {
    /// Build the order from the cart lines read in the same unit of work
    /// that removes them.
    pub fn freeze(self, lines: &[CartItem]) -> Result<Order, AppError> {
        if lines.is_empty() {
            return Err(AppError::validation("Cart is empty"));
        }
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            user_email: self.user_email,
            order_number: self.order_number,
            name: self.name,
            surname: self.surname,
            phone: self.phone,
            address: self.address,
            city: self.city,
            payment_method: self.payment_method,
            payment_status: self.payment_method.initial_payment_status(),
            status: OrderStatus::Pending,
            total_price: cart_total(lines),
            currency: ORDER_CURRENCY.to_string(),
            coupon: self.coupon,
            items: lines.iter().map(OrderItem::from).collect(),
            created_at: self.placed_at,
            updated_at: self.placed_at,
            shipped_at: None,
            delivered_at: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRequest {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub service_ids: Vec<Uuid>,
    pub preferred_date: DateTime<Utc>,
    pub comment: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentRequest {
    pub fn advance(&mut self, next: AppointmentStatus, at: DateTime<Utc>) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::transition(self.status, next));
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuditEntry {
    pub user_id: Option<String>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

/// Sum of the cart lines at their snapshot prices, unrounded.
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}
