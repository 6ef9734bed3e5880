use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
}

/// `quantity` is taken as raw JSON so floats and strings can be rejected
/// with a validation error instead of a parse failure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    #[schema(value_type = i64, minimum = 1)]
    pub quantity: Value,
}

/// The caller's cart with its display total (rounded to cents) and the
/// number of units in it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub count: i64,
}
