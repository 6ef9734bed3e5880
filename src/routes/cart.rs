use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, patch},
};
use futures::{Stream, stream};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList, UpdateQuantityRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart))
        .route("/stream", get(cart_stream))
        .route(
            "/{product_id}",
            patch(update_quantity).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with total and unit count", body = ApiResponse<CartList>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Line added or quantity bumped", body = ApiResponse<CartItem>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity set", body = ApiResponse<CartItem>),
        (status = 404, description = "No such cart line"),
        (status = 422, description = "Quantity is not an integer of at least 1"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::update_quantity(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line removed (or was already absent)", body = ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_item(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart/stream",
    responses(
        (status = 200, description = "Server-sent `cart` events carrying the full cart", content_type = "text/event-stream", body = CartList)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_stream(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let subscription = cart_service::subscribe(&state, &user);
    let initial = subscription.current().await?;

    let events = stream::unfold(
        (subscription, Some(initial)),
        |(mut subscription, pending)| async move {
            let cart = match pending {
                Some(cart) => cart,
                None => match subscription.next_snapshot().await? {
                    Ok(cart) => cart,
                    Err(err) => {
                        tracing::warn!(error = %err, "cart stream closed after read failure");
                        return None;
                    }
                },
            };
            let event = match Event::default().event("cart").json_data(&cart) {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to encode cart event");
                    return None;
                }
            };
            Some((Ok(event), (subscription, None)))
        },
    );

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
