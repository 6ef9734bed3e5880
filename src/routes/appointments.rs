use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::appointments::BookAppointmentRequest,
    error::AppResult,
    models::AppointmentRequest,
    response::ApiResponse,
    services::appointment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(book_appointment))
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 200, description = "Booking request recorded as pending", body = ApiResponse<AppointmentRequest>),
        (status = 422, description = "Invalid booking form"),
    ),
    tag = "Appointments"
)]
pub async fn book_appointment(
    State(state): State<AppState>,
    Json(payload): Json<BookAppointmentRequest>,
) -> AppResult<Json<ApiResponse<AppointmentRequest>>> {
    let resp = appointment_service::book_appointment(&state, payload).await?;
    Ok(Json(resp))
}
