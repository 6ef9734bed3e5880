use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartList, UpdateQuantityRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, MAX_LINE_QUANTITY, cart_total},
    response::{ApiResponse, Meta},
    state::{AppState, CartChanged},
    store::{CartRepository, CatalogRepository},
};

/// Snapshot of `user_id`'s cart as shown to the shopper.
pub async fn load_cart(state: &AppState, user_id: &str) -> AppResult<CartList> {
    let items = state.store.list_cart_items(user_id).await?;
    Ok(summarize(items))
}

fn summarize(items: Vec<CartItem>) -> CartList {
    let total =
        cart_total(&items).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let count = items.iter().map(|item| i64::from(item.quantity)).sum();
    CartList {
        items,
        total,
        count,
    }
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let cart = load_cart(state, &user.user_id).await?;
    let meta = Meta::whole(cart.items.len());
    Ok(ApiResponse::success("OK", cart, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let product = state
        .store
        .get_product(payload.product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound)?;

    let snapshot = CartItem::snapshot(&product, Utc::now());
    let item = state
        .store
        .upsert_cart_item(&user.user_id, snapshot)
        .await?;
    state.notify_cart_changed(&user.user_id);

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %item.product_id,
        quantity = item.quantity,
        "cart line added"
    );

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({
            "product_id": item.product_id,
            "quantity": item.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Added to cart", item, Some(Meta::empty())))
}

/// Accept only JSON integers between one and [`MAX_LINE_QUANTITY`].
pub fn parse_quantity(raw: &Value) -> AppResult<i32> {
    let quantity = raw
        .as_i64()
        .ok_or_else(|| AppError::validation("quantity must be an integer"))?;
    if quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1"));
    }
    i32::try_from(quantity)
        .ok()
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or_else(|| {
            AppError::validation(format!("quantity must be at most {MAX_LINE_QUANTITY}"))
        })
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let quantity = parse_quantity(&payload.quantity)?;

    let item = state
        .store
        .set_cart_quantity(&user.user_id, product_id, quantity, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;
    state.notify_cart_changed(&user.user_id);

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Cart updated", item, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state
        .store
        .delete_cart_item(&user.user_id, product_id)
        .await?;
    state.notify_cart_changed(&user.user_id);

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed",
        serde_json::json!({ "product_id": product_id }),
        Some(Meta::empty()),
    ))
}

/// Live view of one user's cart. Dropping it unsubscribes.
pub struct CartSubscription {
    state: AppState,
    user_id: String,
    events: broadcast::Receiver<CartChanged>,
}

impl CartSubscription {
    /// Current cart, read after the subscription is registered so no change
    /// between the two is missed.
    pub async fn current(&self) -> AppResult<CartList> {
        load_cart(&self.state, &self.user_id).await
    }

    /// Wait for the next change to this user's cart and return a fresh
    /// snapshot. `None` once the channel is closed.
    pub async fn next_snapshot(&mut self) -> Option<AppResult<CartList>> {
        loop {
            match self.events.recv().await {
                Ok(event) if event.user_id == self.user_id => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id = %self.user_id, skipped, "cart stream lagged, resyncing");
                    break;
                }
                Err(RecvError::Closed) => return None,
            }
        }
        Some(self.current().await)
    }
}

pub fn subscribe(state: &AppState, user: &AuthUser) -> CartSubscription {
    CartSubscription {
        events: state.cart_events.subscribe(),
        state: state.clone(),
        user_id: user.user_id.clone(),
    }
}
