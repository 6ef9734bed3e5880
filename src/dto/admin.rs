use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatusRequest {
    pub status: String,
}

/// Figures shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub total_appointments: u64,
    pub pending_appointments: u64,
}
