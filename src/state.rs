use std::sync::Arc;

use tokio::sync::broadcast;

use crate::store::Store;

/// Capacity of the cart-change fan-out; slow subscribers resync on lag.
const CART_EVENT_CAPACITY: usize = 256;

/// Notice that a user's cart was mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChanged {
    pub user_id: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cart_events: broadcast::Sender<CartChanged>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt_secret: impl Into<Arc<str>>) -> Self {
        let (cart_events, _) = broadcast::channel(CART_EVENT_CAPACITY);
        Self {
            store,
            cart_events,
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Tell live cart subscribers that `user_id`'s cart changed.
    pub fn notify_cart_changed(&self, user_id: &str) {
        // No receivers is the common case outside of open streams.
        let _ = self.cart_events.send(CartChanged {
            user_id: user_id.to_string(),
        });
    }
}
