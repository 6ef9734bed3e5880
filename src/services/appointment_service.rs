use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::appointments::BookAppointmentRequest,
    error::{AppError, AppResult},
    models::{AppointmentRequest, AppointmentStatus},
    response::{ApiResponse, Meta},
    services::profile_service::{validate_name, validate_phone},
    state::AppState,
    store::{AppointmentRepository, CatalogRepository},
};

const MAX_COMMENT_CHARS: usize = 500;

/// Record a booking request from the public form. The salon confirms it later.
pub async fn book_appointment(
    state: &AppState,
    payload: BookAppointmentRequest,
) -> AppResult<ApiResponse<AppointmentRequest>> {
    let name = validate_name("name", &payload.name)?;
    let surname = validate_name("surname", &payload.surname)?;
    let phone = validate_phone(&payload.phone)?;

    if payload.service_ids.is_empty() {
        return Err(AppError::validation("select at least one service"));
    }
    let mut service_ids: Vec<Uuid> = Vec::with_capacity(payload.service_ids.len());
    for id in payload.service_ids {
        if service_ids.contains(&id) {
            continue;
        }
        match state.store.get_service(id).await? {
            Some(service) if service.is_active => service_ids.push(id),
            _ => return Err(AppError::validation(format!("unknown service {id}"))),
        }
    }

    let now = Utc::now();
    if payload.preferred_date <= now {
        return Err(AppError::validation("preferred date must be in the future"));
    }

    let comment = payload
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
    {
        return Err(AppError::validation(format!(
            "comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }

    let appointment = AppointmentRequest {
        id: Uuid::new_v4(),
        name,
        surname,
        phone,
        service_ids,
        preferred_date: payload.preferred_date,
        comment,
        status: AppointmentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    let appointment = state.store.create_appointment(appointment).await?;

    tracing::info!(appointment_id = %appointment.id, "appointment requested");

    if let Err(err) = log_audit(
        state.store.as_ref(),
        None,
        "appointment_book",
        Some("appointment_requests"),
        Some(serde_json::json!({
            "appointment_id": appointment.id,
            "services": appointment.service_ids,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Appointment requested",
        appointment,
        Some(Meta::empty()),
    ))
}
