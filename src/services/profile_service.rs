use chrono::Utc;

use crate::{
    audit::log_audit,
    dto::profile::{CreateProfileRequest, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::UserProfile,
    response::{ApiResponse, Meta},
    state::AppState,
    store::{ProfileChanges, ProfileRepository},
};

/// Names and surnames are 2 to 50 characters once trimmed.
pub fn validate_name(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if !(2..=50).contains(&len) {
        return Err(AppError::validation(format!(
            "{field} must be between 2 and 50 characters"
        )));
    }
    Ok(value.to_string())
}

/// Optional leading `+` followed by 10 to 15 digits.
pub fn validate_phone(value: &str) -> AppResult<String> {
    let value = value.trim();
    let digits = value.strip_prefix('+').unwrap_or(value);
    let valid = (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return Err(AppError::validation("phone must be 10 to 15 digits"));
    }
    Ok(value.to_string())
}

pub async fn get_profile(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state
        .store
        .get_profile(&user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(profile))
}

pub async fn create_profile(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = UserProfile {
        user_id: user.user_id.clone(),
        name: validate_name("name", &payload.name)?,
        surname: validate_name("surname", &payload.surname)?,
        phone: validate_phone(&payload.phone)?,
        email: user.email.clone().unwrap_or_default(),
        is_admin: false,
        created_at: Utc::now(),
    };

    let profile = state.store.create_profile(profile).await?;

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "profile_create",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Profile created",
        profile,
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let changes = ProfileChanges {
        name: payload
            .name
            .as_deref()
            .map(|v| validate_name("name", v))
            .transpose()?,
        surname: payload
            .surname
            .as_deref()
            .map(|v| validate_name("surname", v))
            .transpose()?,
        phone: payload.phone.as_deref().map(validate_phone).transpose()?,
    };

    let updated_fields: Vec<&str> = [
        changes.name.as_ref().map(|_| "name"),
        changes.surname.as_ref().map(|_| "surname"),
        changes.phone.as_ref().map(|_| "phone"),
    ]
    .into_iter()
    .flatten()
    .collect();

    let profile = state
        .store
        .update_profile(&user.user_id, changes)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(&user.user_id),
        "profile_update",
        Some("users"),
        Some(serde_json::json!({ "fields": updated_fields })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Profile updated",
        profile,
        Some(Meta::empty()),
    ))
}
