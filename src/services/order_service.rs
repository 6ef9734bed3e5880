use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutRequest, OrderList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderDraft, PaymentMethod},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    store::{OrderFilter, OrderRepository, ProfileRepository},
};

/// `ORDER-<YYYYMMDDHHMMSS>-<suffix>`, where the suffix is the first six ASCII
/// alphanumerics of the user id, right-padded with `0`.
pub fn build_order_number(now: DateTime<Utc>, user_id: &str) -> String {
    let suffix: String = user_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(6)
        .collect();
    format!("ORDER-{}-{suffix:0<6}", now.format("%Y%m%d%H%M%S"))
}

fn prefill(given: Option<String>, stored: Option<&str>) -> Option<String> {
    given
        .filter(|v| !v.trim().is_empty())
        .or_else(|| stored.map(str::to_owned))
}

fn required(field: &str, value: Option<String>) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<Order>> {
    let payment_method: PaymentMethod = payload.payment_method.trim().parse()?;

    // The profile only prefills blanks; the order keeps what the form says.
    let profile = state.store.get_profile(&user.user_id).await?;
    let name = required(
        "name",
        prefill(payload.name, profile.as_ref().map(|p| p.name.as_str())),
    )?;
    let surname = required(
        "surname",
        prefill(payload.surname, profile.as_ref().map(|p| p.surname.as_str())),
    )?;
    let phone = required(
        "phone",
        prefill(payload.phone, profile.as_ref().map(|p| p.phone.as_str())),
    )?;
    let address = required("address", Some(payload.address))?;
    let city = required("city", Some(payload.city))?;
    let user_email = user
        .email
        .clone()
        .or_else(|| profile.as_ref().map(|p| p.email.clone()))
        .unwrap_or_default();

    // The cart is read inside the store's unit of work, so the order freezes
    // exactly the lines it removes.
    let now = Utc::now();
    let draft = OrderDraft {
        id: Uuid::new_v4(),
        user_id: user.user_id.clone(),
        user_email,
        order_number: build_order_number(now, &user.user_id),
        name,
        surname,
        phone,
        address,
        city,
        payment_method,
        coupon: payload.coupon.filter(|c| !c.trim().is_empty()),
        placed_at: now,
    };

    let order = state.store.place_order(draft).await?;
    state.notify_cart_changed(&user.user_id);

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = %order.total_price,
        "order placed"
    );

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "order_number": order.order_number,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, per_page, window) = query.pagination().window();
    let filter = OrderFilter {
        user_id: Some(user.user_id.clone()),
        status: query.status()?,
        oldest_first: matches!(query.sort_order, Some(SortOrder::Asc)),
    };

    let result = state.store.list_orders(filter, window).await?;
    let total = i64::try_from(result.total).unwrap_or(i64::MAX);
    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList {
            items: result.items,
        },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    // Someone else's order is indistinguishable from a missing one.
    let order = state
        .store
        .get_order(id)
        .await?
        .filter(|o| o.user_id == user.user_id)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Ok", order, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_number_uses_compact_timestamp_and_uid_prefix() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            build_order_number(at, "Xy12Zq99abc"),
            "ORDER-20240309070501-Xy12Zq"
        );
    }

    #[test]
    fn short_user_ids_are_padded() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(build_order_number(at, "ab"), "ORDER-20240101000000-ab0000");
        assert_eq!(build_order_number(at, ""), "ORDER-20240101000000-000000");
    }

    #[test]
    fn separators_in_user_ids_are_skipped() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            build_order_number(at, "uid-alice-001"),
            "ORDER-20240101000000-uidali"
        );
        assert_eq!(
            build_order_number(at, "auth0|é-x"),
            "ORDER-20240101000000-auth0x"
        );
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(matches!(required("city", Some("  ".into())), Err(AppError::Validation(_))));
        assert_eq!(required("city", Some(" Paris ".into())).unwrap(), "Paris");
    }
}
