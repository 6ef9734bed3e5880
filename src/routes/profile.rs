use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::profile::{CreateProfileRequest, UpdateProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_profile).post(create_profile).patch(update_profile),
    )
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "The caller's profile", body = ApiResponse<UserProfile>),
        (status = 404, description = "No profile yet"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    Ok(Json(profile_service::get_profile(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/profile",
    request_body = CreateProfileRequest,
    responses(
        (status = 200, description = "Profile created", body = ApiResponse<UserProfile>),
        (status = 422, description = "Invalid fields or profile already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn create_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    Ok(Json(
        profile_service::create_profile(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserProfile>),
        (status = 404, description = "No profile yet"),
        (status = 422, description = "Invalid fields"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    Ok(Json(
        profile_service::update_profile(&state, &user, payload).await?,
    ))
}
