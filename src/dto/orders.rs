use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Order;

/// Checkout form. Missing name, surname or phone are prefilled from the
/// caller's profile.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    /// `Cash on delivery` or `Card`.
    pub payment_method: String,
    pub coupon: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
