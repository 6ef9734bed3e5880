use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        admin::{
            DashboardStats, UpdateAppointmentStatusRequest, UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
        },
        appointments::AppointmentList,
        orders::OrderList,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{AppointmentRequest, AppointmentStatus, Order, OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    routes::params::{AppointmentListQuery, OrderListQuery, SortOrder},
    state::AppState,
    store::{AppointmentFilter, AppointmentRepository, OrderFilter, OrderRepository},
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(state, user).await?;

    let (page, per_page, window) = query.pagination().window();
    let filter = OrderFilter {
        user_id: None,
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
    ensure_admin(state, user).await?;
    let order = state.store.get_order(id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Ok", order, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(state, user).await?;
    let next: OrderStatus = payload.status.trim().parse()?;

    // The store checks the move against the row it locks, so a racing update
    // cannot slip an illegal transition past the check.
    let order = state
        .store
        .transition_order(id, next, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(order_id = %id, to = %next, "order status changed");

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "order_status",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": id,
            "to": next.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order status updated",
        order,
        Some(Meta::empty()),
    ))
}

/// Payment status moves freely; it is not tied to the delivery workflow.
pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(state, user).await?;
    let status: PaymentStatus = payload.payment_status.trim().parse()?;

    let order = state
        .store
        .update_payment_status(id, status, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "payment_status",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "payment_status": status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment status updated",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_appointments(
    state: &AppState,
    user: &AuthUser,
    query: AppointmentListQuery,
) -> AppResult<ApiResponse<AppointmentList>> {
    ensure_admin(state, user).await?;

    let (page, per_page, window) = query.pagination().window();
    let filter = AppointmentFilter {
        status: query.status()?,
        oldest_first: matches!(query.sort_order, Some(SortOrder::Asc)),
    };
    let result = state.store.list_appointments(filter, window).await?;
    let total = i64::try_from(result.total).unwrap_or(i64::MAX);
    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success(
        "Ok",
        AppointmentList {
            items: result.items,
        },
        Some(meta),
    ))
}

pub async fn update_appointment_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAppointmentStatusRequest,
) -> AppResult<ApiResponse<AppointmentRequest>> {
    ensure_admin(state, user).await?;
    let next: AppointmentStatus = payload.status.trim().parse()?;

    let appointment = state
        .store
        .update_appointment_status(id, next, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "appointment_status",
        Some("appointment_requests"),
        Some(serde_json::json!({
            "appointment_id": id,
            "to": next.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Appointment status updated",
        appointment,
        Some(Meta::empty()),
    ))
}

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(state, user).await?;

    let orders = state.store.order_totals().await?;
    let appointments = state.store.appointment_counts().await?;
    Ok(ApiResponse::ok(DashboardStats {
        total_orders: orders.count,
        total_revenue: orders.revenue,
        total_appointments: appointments.total,
        pending_appointments: appointments.pending,
    }))
}
