use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::AppointmentRequest;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookAppointmentRequest {
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub service_ids: Vec<Uuid>,
    pub preferred_date: DateTime<Utc>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentList {
    pub items: Vec<AppointmentRequest>,
}
